use crate::control::Pid3;
use crate::mode::{Mode, ReferenceFrame};
use crate::parameter::{Gains, ParameterSet};
use crate::readiness::Readiness;
use crate::state::{ControlCommand, TrajectoryReference, VehicleState};
use crate::DifferentialFlatnessController;
use embedded_time::Clock;
use nalgebra::Vector3;

/// Builder for a [`DifferentialFlatnessController`].
pub struct Builder<C> {
    clock: C,
    gains: Gains,
    pid: Pid3,
    gravity: Vector3<f64>,
    awaiting: ParameterSet,
    working_frame: ReferenceFrame,
    output_frame: ReferenceFrame,
}

impl<C> Builder<C>
where
    C: Clock,
{
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            gains: Gains::default(),
            pid: Pid3::default(),
            gravity: Vector3::new(0., 0., -9.81),
            awaiting: ParameterSet::all(),
            working_frame: ReferenceFrame::LocalEnu,
            output_frame: ReferenceFrame::BodyFlu,
        }
    }

    pub fn mass(mut self, mass: f64) -> Self {
        self.gains.mass = mass;
        self
    }

    /// Gravity acceleration in the working frame.
    pub fn gravity(mut self, gravity: Vector3<f64>) -> Self {
        self.gravity = gravity;
        self
    }

    /// Roll, pitch and yaw attitude gains.
    pub fn angular_gains(mut self, gains: Vector3<f64>) -> Self {
        self.gains.set_angular(gains);
        self
    }

    pub fn pid(mut self, pid: Pid3) -> Self {
        self.pid = pid;
        self
    }

    /// Parameters that must be set before any output is computed.
    pub fn awaiting(mut self, parameters: ParameterSet) -> Self {
        self.awaiting = parameters;
        self
    }

    /// Frame the state and reference are expressed in.
    pub fn working_frame(mut self, frame: ReferenceFrame) -> Self {
        self.working_frame = frame;
        self
    }

    /// Frame the output is stamped with.
    pub fn output_frame(mut self, frame: ReferenceFrame) -> Self {
        self.output_frame = frame;
        self
    }

    pub fn build(self) -> DifferentialFlatnessController<C> {
        DifferentialFlatnessController {
            clock: self.clock,
            gains: self.gains,
            pid: self.pid,
            gravity: self.gravity,
            readiness: Readiness::new(self.awaiting),
            working_frame: self.working_frame,
            output_frame: self.output_frame,
            mode_in: Mode::default(),
            mode_out: Mode::default(),
            state: VehicleState::default(),
            reference: TrajectoryReference::default(),
            command: ControlCommand::default(),
            last_error: None,
        }
    }
}
