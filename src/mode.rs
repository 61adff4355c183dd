use core::fmt;

/// The kind of reference the controller is asked to track.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ControlMode {
    #[default]
    Unset,
    Hover,
    Position,
    Speed,
    SpeedInAPlane,
    Attitude,
    Acro,
    Trajectory,
}

/// How the yaw component of the reference is interpreted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum YawMode {
    #[default]
    None,
    /// Track the reference yaw as an absolute angle.
    Angle,
    /// Integrate the reference yaw rate from the current heading.
    Rate,
}

/// Coordinate frame a vector is expressed in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReferenceFrame {
    #[default]
    Undefined,
    /// Ground fixed east-north-up frame.
    LocalEnu,
    /// Vehicle fixed forward-left-up frame.
    BodyFlu,
    GlobalLatLonAsl,
}

/// A control mode together with its yaw submode and reference frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Mode {
    pub control: ControlMode,
    pub yaw: YawMode,
    pub frame: ReferenceFrame,
}

impl Mode {
    pub const fn new(control: ControlMode, yaw: YawMode, frame: ReferenceFrame) -> Self {
        Self {
            control,
            yaw,
            frame,
        }
    }

    /// Trajectory tracking in the local ENU frame.
    pub const fn trajectory(yaw: YawMode) -> Self {
        Self::new(ControlMode::Trajectory, yaw, ReferenceFrame::LocalEnu)
    }

    /// Hover always holds the yaw angle in the local ENU frame.
    pub const fn hover() -> Self {
        Self::new(ControlMode::Hover, YawMode::Angle, ReferenceFrame::LocalEnu)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({:?} yaw, {:?})", self.control, self.yaw, self.frame)
    }
}
