use crate::mode::ReferenceFrame;
use embedded_time::{Clock, Instant};
use nalgebra::{UnitQuaternion, Vector3, Vector4};

/// Capture time and frame of a measurement or command.
pub struct Header<C: Clock> {
    pub stamp: Instant<C>,
    pub frame: ReferenceFrame,
}

impl<C: Clock> Header<C> {
    pub fn new(stamp: Instant<C>, frame: ReferenceFrame) -> Self {
        Self { stamp, frame }
    }
}

impl<C: Clock> Clone for Header<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C: Clock> Copy for Header<C> {}

/// A value with the [`Header`] it was captured with.
pub struct Stamped<T, C: Clock> {
    pub header: Header<C>,
    pub value: T,
}

impl<T, C: Clock> Stamped<T, C> {
    pub fn new(value: T, stamp: Instant<C>, frame: ReferenceFrame) -> Self {
        Self {
            header: Header::new(stamp, frame),
            value,
        }
    }
}

impl<T: Clone, C: Clock> Clone for Stamped<T, C> {
    fn clone(&self) -> Self {
        Self {
            header: self.header,
            value: self.value.clone(),
        }
    }
}

impl<T: Copy, C: Clock> Copy for Stamped<T, C> {}

/// Last known state of the vehicle in the working frame.
pub struct VehicleState<C: Clock> {
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
    pub attitude: UnitQuaternion<f64>,
    /// Header of the pose the position and attitude came from.
    pub pose_header: Option<Header<C>>,
    pub velocity_header: Option<Header<C>>,
}

impl<C: Clock> Default for VehicleState<C> {
    fn default() -> Self {
        Self {
            position: Vector3::zeros(),
            velocity: Vector3::zeros(),
            attitude: UnitQuaternion::identity(),
            pose_header: None,
            velocity_header: None,
        }
    }
}

impl<C: Clock> Clone for VehicleState<C> {
    fn clone(&self) -> Self {
        Self {
            position: self.position,
            velocity: self.velocity,
            attitude: self.attitude,
            pose_header: self.pose_header,
            velocity_header: self.velocity_header,
        }
    }
}

/// Desired trajectory point in the working frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TrajectoryReference {
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
    pub acceleration: Vector3<f64>,
    /// Yaw angle, rate and acceleration.
    pub yaw: Vector3<f64>,
}

impl TrajectoryReference {
    /// Create a reference from `(x, y, z, yaw)` position, velocity and acceleration points.
    pub fn from_points(
        position: Vector4<f64>,
        velocity: Vector4<f64>,
        acceleration: Vector4<f64>,
    ) -> Self {
        Self {
            position: position.xyz(),
            velocity: velocity.xyz(),
            acceleration: acceleration.xyz(),
            yaw: Vector3::new(position.w, velocity.w, acceleration.w),
        }
    }

    pub fn yaw_angle(&self) -> f64 {
        self.yaw.x
    }

    pub fn yaw_rate(&self) -> f64 {
        self.yaw.y
    }
}

/// Body rates (in radians per second) and collective thrust along body +Z.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ControlCommand {
    pub angular_rate: Vector3<f64>,
    pub thrust: f64,
}

/// A [`ControlCommand`] stamped for transmission.
pub struct Output<C: Clock> {
    pub angular_rate: Stamped<Vector3<f64>, C>,
    pub thrust: Stamped<f64, C>,
}

impl<C: Clock> Output<C> {
    pub fn new(command: ControlCommand, header: Header<C>) -> Self {
        Self {
            angular_rate: Stamped {
                header,
                value: command.angular_rate,
            },
            thrust: Stamped {
                header,
                value: command.thrust,
            },
        }
    }

    pub fn command(&self) -> ControlCommand {
        ControlCommand {
            angular_rate: self.angular_rate.value,
            thrust: self.thrust.value,
        }
    }
}
