use crate::control::{flatness, Pid3};
use crate::error::Error;
use crate::hal::VelocityTransform;
use crate::mode::{ControlMode, Mode, ReferenceFrame, YawMode};
use crate::parameter::{self, Gains, ParamValue, Parameter, SetParametersResult};
use crate::readiness::Readiness;
use crate::state::{
    ControlCommand, Header, Output, Stamped, TrajectoryReference, VehicleState,
};
use crate::Builder;
use core::mem::{self, Discriminant};
use embedded_time::Clock;
use log::{debug, error, trace, warn};
use nalgebra::{UnitQuaternion, Vector3};

/// Trajectory tracking controller producing body rates and thrust.
///
/// State, reference and parameter updates may arrive in any order between
/// ticks; [`compute_output`](Self::compute_output) refuses to produce a
/// command until all of them are available for the active mode.
/// The controller does no locking of its own, wrap it in a mutex to share it
/// between threads.
pub struct DifferentialFlatnessController<C: Clock> {
    pub(crate) clock: C,
    pub(crate) gains: Gains,
    pub(crate) pid: Pid3,
    pub(crate) gravity: Vector3<f64>,
    pub(crate) readiness: Readiness,
    pub(crate) working_frame: ReferenceFrame,
    pub(crate) output_frame: ReferenceFrame,
    pub(crate) mode_in: Mode,
    pub(crate) mode_out: Mode,
    pub(crate) state: VehicleState<C>,
    pub(crate) reference: TrajectoryReference,
    pub(crate) command: ControlCommand,
    /// Kind of the last reported failure, to warn once per cause.
    pub(crate) last_error: Option<Discriminant<Error>>,
}

impl<C: Clock> DifferentialFlatnessController<C> {
    /// Create a controller with default gains that waits for every parameter.
    pub fn new(clock: C) -> Self {
        Builder::new(clock).build()
    }

    pub fn builder(clock: C) -> Builder<C> {
        Builder::new(clock)
    }

    pub fn gains(&self) -> &Gains {
        &self.gains
    }

    /// The translational PID.
    pub fn pid(&self) -> &Pid3 {
        &self.pid
    }

    pub fn gravity(&self) -> Vector3<f64> {
        self.gravity
    }

    pub fn readiness(&self) -> &Readiness {
        &self.readiness
    }

    /// The active input mode.
    pub fn mode(&self) -> Mode {
        self.mode_in
    }

    pub fn output_mode(&self) -> Mode {
        self.mode_out
    }

    pub fn state(&self) -> &VehicleState<C> {
        &self.state
    }

    pub fn reference(&self) -> &TrajectoryReference {
        &self.reference
    }

    /// The last computed command.
    pub fn command(&self) -> ControlCommand {
        self.command
    }

    /// Replace the vehicle state.
    ///
    /// `velocity` must already be expressed in the working frame,
    /// see [`update_state_with_transform`](Self::update_state_with_transform) otherwise.
    pub fn update_state(
        &mut self,
        position: Stamped<Vector3<f64>, C>,
        velocity: Stamped<Vector3<f64>, C>,
        attitude: UnitQuaternion<f64>,
    ) {
        self.state = VehicleState {
            position: position.value,
            velocity: velocity.value,
            attitude,
            pose_header: Some(position.header),
            velocity_header: Some(velocity.header),
        };
        self.readiness.receive_state();
    }

    /// Replace the vehicle state, converting `velocity` into the working frame first.
    pub fn update_state_with_transform<T>(
        &mut self,
        position: Stamped<Vector3<f64>, C>,
        velocity: Stamped<Vector3<f64>, C>,
        attitude: UnitQuaternion<f64>,
        transform: &mut T,
    ) where
        T: VelocityTransform<C>,
    {
        let velocity = transform.convert(velocity, self.working_frame);
        self.update_state(position, velocity, attitude);
    }

    /// Replace the trajectory reference. Ignored unless tracking a trajectory.
    pub fn update_reference(&mut self, reference: TrajectoryReference) {
        if self.mode_in.control != ControlMode::Trajectory {
            trace!("Ignoring reference in {:?} mode", self.mode_in.control);
            return;
        }

        self.reference = reference;
        self.readiness.receive_reference();
    }

    /// Switch the input and output modes and reset the runtime state.
    ///
    /// Hover always holds the yaw angle in the local frame whatever yaw mode is
    /// requested. Any other mode waits for fresh state and reference.
    /// Gains are kept. Always returns `true`.
    pub fn set_mode(&mut self, in_mode: Mode, out_mode: Mode) -> bool {
        if in_mode.control == ControlMode::Hover {
            self.mode_in = Mode::hover();
        } else {
            self.readiness.clear_inputs();
            self.mode_in = in_mode;
        }
        self.mode_out = out_mode;
        debug!("Mode changed to {}, output {}", self.mode_in, self.mode_out);

        self.reset();
        true
    }

    /// Clear the state, reference, command and PID memory.
    ///
    /// The reference is reset to hold the (reset) state.
    pub fn reset(&mut self) {
        self.state = VehicleState::default();
        self.reference = TrajectoryReference {
            position: self.state.position,
            yaw: Vector3::new(flatness::yaw(&self.state.attitude), 0., 0.),
            ..TrajectoryReference::default()
        };
        self.command = ControlCommand::default();
        self.pid.reset();
        self.last_error = None;
    }

    /// Apply named parameters, absorbing unknown names and mistyped values.
    ///
    /// ```
    /// # use embedded_time::{rate::Fraction, Clock, Instant};
    /// # struct ExampleClock;
    /// # impl Clock for ExampleClock {
    /// #     type T = u32;
    /// #     const SCALING_FACTOR: Fraction = Fraction::new(1, 1);
    /// #     fn try_now(&self) -> Result<Instant<Self>, embedded_time::clock::Error> {
    /// #         Ok(Instant::new(0))
    /// #     }
    /// # }
    /// use flatness_control::{DifferentialFlatnessController, ParamValue};
    ///
    /// let mut controller = DifferentialFlatnessController::new(ExampleClock);
    /// let result = controller.update_parameters([
    ///     ("mass", ParamValue::Double(1.5)),
    ///     ("trajectory_control.reset_integral", ParamValue::Bool(true)),
    ///     ("trajectory_control.kp.w", ParamValue::Double(1.)),
    /// ]);
    ///
    /// assert!(result.successful);
    /// assert_eq!((result.applied, result.ignored), (2, 1));
    /// assert_eq!(controller.gains().mass, 1.5);
    /// ```
    pub fn update_parameters<I, N, V>(&mut self, parameters: I) -> SetParametersResult
    where
        I: IntoIterator<Item = (N, V)>,
        N: AsRef<str>,
        V: Into<ParamValue>,
    {
        let mut result = SetParametersResult::default();

        for (name, value) in parameters {
            let name = name.as_ref();
            let value = value.into();

            match Parameter::from_name(name) {
                Some(parameter)
                    if parameter::apply(parameter, value, &mut self.gains, &mut self.pid) =>
                {
                    debug!("Parameter {} set to {:?}", parameter, value);
                    self.readiness.parameter_read(parameter);
                    result.applied += 1;
                }
                Some(parameter) => {
                    warn!("Parameter {} cannot be set to {:?}", parameter, value);
                    result.ignored += 1;
                }
                None => {
                    trace!("Ignoring unknown parameter {}", name);
                    result.ignored += 1;
                }
            }
        }

        result
    }

    /// Compute the body rate and thrust command for a time step `dt` in seconds.
    pub fn compute_output(&mut self, dt: f64) -> Result<Output<C>, Error> {
        match self.try_compute_output(dt) {
            Ok(output) => {
                self.last_error = None;
                Ok(output)
            }
            Err(error) => {
                self.report(&error);
                Err(error)
            }
        }
    }

    fn try_compute_output(&mut self, dt: f64) -> Result<Output<C>, Error> {
        self.readiness.check()?;

        match self.mode_in.yaw {
            YawMode::Angle | YawMode::Rate => {}
            yaw_mode => return Err(Error::UnknownYawMode(yaw_mode)),
        }
        if self.mode_in.control != ControlMode::Trajectory {
            return Err(Error::UnknownControlMode(self.mode_in.control));
        }

        let stamp = self.clock.try_now()?;
        debug!("dt: {}", dt);

        self.command = ControlCommand::default();

        if self.mode_in.yaw == YawMode::Rate {
            // Rate command as the angle one step ahead
            self.reference.yaw.x = flatness::yaw(&self.state.attitude) + self.reference.yaw_rate() * dt;
        }

        self.command = self.trajectory_control(dt);
        trace!(
            "Command rates {:?} thrust {}",
            self.command.angular_rate,
            self.command.thrust
        );

        Ok(Output::new(self.command, Header::new(stamp, self.output_frame)))
    }

    fn trajectory_control(&mut self, dt: f64) -> ControlCommand {
        let force_error = self.pid.compute_control(
            dt,
            self.state.position,
            self.reference.position,
            self.state.velocity,
            self.reference.velocity,
        );
        let force = flatness::desired_force(
            force_error,
            self.gains.mass,
            self.reference.acceleration,
            self.gravity,
        );

        flatness::control(
            force,
            self.reference.yaw_angle(),
            &self.state.attitude,
            &self.gains.angular,
        )
    }

    fn report(&mut self, error: &Error) {
        let kind = mem::discriminant(error);
        if self.last_error == Some(kind) {
            return;
        }
        self.last_error = Some(kind);

        match error {
            Error::ParametersIncomplete(awaiting) => {
                warn!("Parameters not read yet");
                for parameter in awaiting.iter() {
                    warn!("Parameter {} not read yet", parameter);
                }
            }
            error if error.is_not_ready() => warn!("{}", error),
            error => error!("{}", error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::ParameterSet;
    use crate::readiness::Stage;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use embedded_time::{clock, rate::Fraction, Instant};

    const GRAVITY: f64 = 9.81;

    struct TestClock;

    impl Clock for TestClock {
        type T = u32;

        const SCALING_FACTOR: Fraction = Fraction::new(1, 1_000);

        fn try_now(&self) -> Result<Instant<Self>, clock::Error> {
            Ok(Instant::new(42))
        }
    }

    struct StoppedClock;

    impl Clock for StoppedClock {
        type T = u32;

        const SCALING_FACTOR: Fraction = Fraction::new(1, 1_000);

        fn try_now(&self) -> Result<Instant<Self>, clock::Error> {
            Err(clock::Error::Unspecified)
        }
    }

    fn stamped<C: Clock<T = u32>>(value: Vector3<f64>) -> Stamped<Vector3<f64>, C> {
        Stamped::new(value, Instant::new(7), ReferenceFrame::LocalEnu)
    }

    fn parameters() -> [(&'static str, ParamValue); 16] {
        [
            ("mass", ParamValue::Double(1.5)),
            ("trajectory_control.reset_integral", ParamValue::Bool(false)),
            ("trajectory_control.antiwindup_cte", ParamValue::Double(5.)),
            ("trajectory_control.alpha", ParamValue::Double(0.1)),
            ("trajectory_control.kp.x", ParamValue::Double(6.)),
            ("trajectory_control.kp.y", ParamValue::Double(6.)),
            ("trajectory_control.kp.z", ParamValue::Double(6.)),
            ("trajectory_control.ki.x", ParamValue::Double(0.01)),
            ("trajectory_control.ki.y", ParamValue::Double(0.01)),
            ("trajectory_control.ki.z", ParamValue::Double(0.01)),
            ("trajectory_control.kd.x", ParamValue::Double(3.)),
            ("trajectory_control.kd.y", ParamValue::Double(3.)),
            ("trajectory_control.kd.z", ParamValue::Double(3.)),
            ("trajectory_control.roll_control.kp", ParamValue::Double(10.)),
            ("trajectory_control.pitch_control.kp", ParamValue::Double(11.)),
            ("trajectory_control.yaw_control.kp", ParamValue::Integer(12)),
        ]
    }

    fn controller() -> DifferentialFlatnessController<TestClock> {
        DifferentialFlatnessController::builder(TestClock)
            .gravity(Vector3::new(0., 0., -GRAVITY))
            .build()
    }

    fn ready_controller(yaw_mode: YawMode) -> DifferentialFlatnessController<TestClock> {
        let mut controller = controller();
        controller.set_mode(Mode::trajectory(yaw_mode), Mode::default());
        controller.update_parameters(parameters());
        controller.update_state(
            stamped(Vector3::zeros()),
            stamped(Vector3::zeros()),
            UnitQuaternion::identity(),
        );
        controller.update_reference(TrajectoryReference::default());
        controller
    }

    #[test]
    fn waits_for_state_then_parameters_then_reference() {
        let mut controller = controller();
        controller.set_mode(Mode::trajectory(YawMode::Angle), Mode::default());

        for dt in [0., 0.01, 1.] {
            assert!(matches!(
                controller.compute_output(dt),
                Err(Error::StateNotAvailable)
            ));
        }

        controller.update_state(
            stamped(Vector3::zeros()),
            stamped(Vector3::zeros()),
            UnitQuaternion::identity(),
        );
        controller.update_parameters([("mass", 1.)]);
        match controller.compute_output(0.01) {
            Err(Error::ParametersIncomplete(awaiting)) => {
                assert_eq!(awaiting.len(), 15);
                assert!(!awaiting.contains(Parameter::Mass));
                assert!(awaiting.contains(Parameter::YawKp));
            }
            _ => panic!("expected missing parameters"),
        }

        controller.update_parameters(parameters());
        assert!(matches!(
            controller.compute_output(0.01),
            Err(Error::ReferenceNotAvailable)
        ));

        controller.update_reference(TrajectoryReference::default());
        assert!(controller.compute_output(0.01).is_ok());
        assert_eq!(controller.readiness().stage(), Stage::Ready);
    }

    #[test]
    fn hover_reference_gives_weight_thrust() {
        let mut controller = ready_controller(YawMode::Angle);

        let output = match controller.compute_output(0.01) {
            Ok(output) => output,
            Err(error) => panic!("{}", error),
        };

        assert_abs_diff_eq!(output.angular_rate.value, Vector3::zeros());
        assert_relative_eq!(output.thrust.value, 1.5 * GRAVITY);
        assert!(output.thrust.header.stamp == Instant::new(42));
        assert_eq!(output.angular_rate.header.frame, ReferenceFrame::BodyFlu);
        assert_eq!(output.command(), controller.command());
    }

    #[test]
    fn position_error_tilts_towards_reference() {
        let mut controller = ready_controller(YawMode::Angle);
        controller.update_reference(TrajectoryReference {
            position: Vector3::new(1., 0., 0.),
            ..TrajectoryReference::default()
        });

        let command = match controller.compute_output(0.01) {
            Ok(output) => output.command(),
            Err(error) => panic!("{}", error),
        };

        // Pitch forward to accelerate along +X
        assert!(command.angular_rate.y > 0.);
        assert_abs_diff_eq!(command.angular_rate.x, 0., epsilon = 1e-12);
        assert_abs_diff_eq!(command.angular_rate.z, 0., epsilon = 1e-12);
    }

    #[test]
    fn hover_mode_overrides_yaw_and_frame() {
        let mut controller = ready_controller(YawMode::Angle);
        let gains = controller.gains().clone();

        assert!(controller.set_mode(
            Mode::new(ControlMode::Hover, YawMode::Rate, ReferenceFrame::BodyFlu),
            Mode::default(),
        ));

        assert_eq!(controller.mode(), Mode::hover());
        assert!(controller.readiness().state_received());
        assert!(controller.readiness().reference_received());
        assert_eq!(controller.gains(), &gains);

        // Hover does not produce trajectory output
        assert!(matches!(
            controller.compute_output(0.01),
            Err(Error::UnknownControlMode(ControlMode::Hover))
        ));
    }

    #[test]
    fn mode_change_clears_inputs_but_keeps_gains() {
        let mut controller = ready_controller(YawMode::Angle);
        controller.update_reference(TrajectoryReference {
            position: Vector3::new(0., 0., 1.),
            ..TrajectoryReference::default()
        });
        controller.compute_output(0.5).ok();
        assert!(controller.pid().integrator().z > 0.);
        let gains = controller.gains().clone();
        let kp = controller.pid().kp;

        let out_mode = Mode::new(ControlMode::Acro, YawMode::Rate, ReferenceFrame::BodyFlu);
        assert!(controller.set_mode(Mode::trajectory(YawMode::Rate), out_mode));

        assert_eq!(controller.mode(), Mode::trajectory(YawMode::Rate));
        assert_eq!(controller.output_mode(), out_mode);
        assert!(!controller.readiness().state_received());
        assert!(!controller.readiness().reference_received());
        assert!(controller.readiness().parameters_read());
        assert_eq!(controller.gains(), &gains);
        assert_eq!(controller.pid().kp, kp);
        assert_eq!(controller.pid().integrator(), Vector3::zeros());
        assert_eq!(controller.command(), ControlCommand::default());
        assert!(controller.state().pose_header.is_none());
    }

    #[test]
    fn reference_is_ignored_outside_trajectory_mode() {
        let mut controller = controller();
        controller.set_mode(Mode::hover(), Mode::default());

        controller.update_reference(TrajectoryReference {
            position: Vector3::new(1., 2., 3.),
            ..TrajectoryReference::default()
        });
        assert!(!controller.readiness().reference_received());
        assert_eq!(controller.reference().position, Vector3::zeros());
    }

    #[test]
    fn parameter_updates_are_idempotent() {
        let mut once = controller();
        let mut twice = controller();

        once.update_parameters(parameters());
        twice.update_parameters(parameters());
        let result = twice.update_parameters(parameters());

        assert!(result.successful);
        assert_eq!(result.applied, 16);
        assert_eq!(once.gains(), twice.gains());
        assert_eq!(once.pid(), twice.pid());
        assert_eq!(
            once.gains().angular_diagonal(),
            Vector3::new(10., 11., 12.)
        );
        assert_eq!(once.pid().kd, Vector3::new(3., 3., 3.));
    }

    #[test]
    fn unknown_and_mistyped_parameters_are_absorbed() {
        let mut controller = controller();
        let result = controller.update_parameters([
            ("position_control.kp.x", ParamValue::Double(1.)),
            ("trajectory_control.kp.q", ParamValue::Double(1.)),
            ("trajectory_control.kp.x", ParamValue::Bool(true)),
        ]);

        assert!(result.successful);
        assert_eq!(result.reason, "success");
        assert_eq!((result.applied, result.ignored), (0, 3));
        assert_eq!(controller.pid().kp, Vector3::zeros());
        assert_eq!(controller.readiness().awaiting(), ParameterSet::all());
    }

    #[test]
    fn yaw_rate_is_integrated_from_current_yaw() {
        let mut controller = ready_controller(YawMode::Rate);
        controller.update_state(
            stamped(Vector3::zeros()),
            stamped(Vector3::zeros()),
            UnitQuaternion::from_euler_angles(0., 0., 0.3),
        );
        controller.update_reference(TrajectoryReference {
            yaw: Vector3::new(-2., 0.5, 0.),
            ..TrajectoryReference::default()
        });

        assert!(controller.compute_output(0.1).is_ok());
        assert_relative_eq!(controller.reference().yaw_angle(), 0.35, epsilon = 1e-12);

        // Turning left at the commanded rate
        assert!(controller.command().angular_rate.z > 0.);
    }

    #[test]
    fn unset_yaw_mode_is_rejected() {
        let mut controller = ready_controller(YawMode::Angle);
        controller.set_mode(
            Mode::new(ControlMode::Trajectory, YawMode::None, ReferenceFrame::LocalEnu),
            Mode::default(),
        );
        controller.update_state(
            stamped(Vector3::zeros()),
            stamped(Vector3::zeros()),
            UnitQuaternion::identity(),
        );
        controller.update_reference(TrajectoryReference::default());

        assert!(matches!(
            controller.compute_output(0.01),
            Err(Error::UnknownYawMode(YawMode::None))
        ));
    }

    #[test]
    fn clock_failure_leaves_command_untouched() {
        let mut controller = DifferentialFlatnessController::new(StoppedClock);
        controller.set_mode(Mode::trajectory(YawMode::Angle), Mode::default());
        controller.update_parameters(parameters());
        controller.update_state(
            stamped(Vector3::zeros()),
            stamped(Vector3::zeros()),
            UnitQuaternion::identity(),
        );
        controller.update_reference(TrajectoryReference::default());

        assert!(matches!(
            controller.compute_output(0.01),
            Err(Error::Clock(clock::Error::Unspecified))
        ));
        assert_eq!(controller.command(), ControlCommand::default());
    }

    #[test]
    fn velocity_is_converted_to_working_frame() {
        let mut controller = controller();
        let mut targets = Vec::new();
        let mut to_enu = |velocity: Stamped<Vector3<f64>, TestClock>, target| {
            targets.push(target);
            Stamped::new(velocity.value * 2., velocity.header.stamp, target)
        };

        controller.update_state_with_transform(
            stamped(Vector3::new(1., 1., 1.)),
            Stamped::new(Vector3::new(1., 0., 0.), Instant::new(3), ReferenceFrame::BodyFlu),
            UnitQuaternion::identity(),
            &mut to_enu,
        );

        assert_eq!(targets, [ReferenceFrame::LocalEnu]);
        assert_eq!(controller.state().velocity, Vector3::new(2., 0., 0.));
        assert_eq!(controller.state().position, Vector3::new(1., 1., 1.));
        assert!(controller.readiness().state_received());
        assert!(matches!(
            controller.state().velocity_header,
            Some(Header { frame: ReferenceFrame::LocalEnu, .. })
        ));
    }

    #[test]
    fn runs_on_a_standard_clock() {
        let mut controller =
            DifferentialFlatnessController::new(std_embedded_time::StandardClock::default());
        controller.set_mode(Mode::trajectory(YawMode::Angle), Mode::default());
        controller.update_parameters(parameters());
        controller.update_state(
            Stamped::new(Vector3::zeros(), Instant::new(0), ReferenceFrame::LocalEnu),
            Stamped::new(Vector3::zeros(), Instant::new(0), ReferenceFrame::LocalEnu),
            UnitQuaternion::identity(),
        );
        controller.update_reference(TrajectoryReference::default());

        assert!(controller.compute_output(0.01).is_ok());
    }
}
