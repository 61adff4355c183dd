//! # flatness-control
//! A `#![no_std]` trajectory tracking controller for multi-rotors based on
//! differential flatness.
//!
//! [`DifferentialFlatnessController`] turns a position, velocity, acceleration
//! and yaw reference into body rates and a collective thrust.
//! The translational error is closed with a [`Pid3`], the attitude error with a
//! geometric proportional law on SO(3) (see [`control::flatness`]).
//!
//! Inputs arrive asynchronously through
//! [`update_state`](DifferentialFlatnessController::update_state),
//! [`update_reference`](DifferentialFlatnessController::update_reference) and
//! [`update_parameters`](DifferentialFlatnessController::update_parameters);
//! [`compute_output`](DifferentialFlatnessController::compute_output) returns an
//! [`Error`] until all of them are available.
//!
//! ```
//! use embedded_time::{rate::Fraction, Clock, Instant};
//! use flatness_control::{
//!     DifferentialFlatnessController, Mode, ParameterSet, ReferenceFrame, Stamped,
//!     TrajectoryReference, YawMode,
//! };
//! use nalgebra::{UnitQuaternion, Vector3};
//!
//! struct ExampleClock;
//!
//! impl Clock for ExampleClock {
//!     type T = u32;
//!
//!     const SCALING_FACTOR: Fraction = Fraction::new(1, 1);
//!
//!     fn try_now(&self) -> Result<Instant<Self>, embedded_time::clock::Error> {
//!         Ok(Instant::new(0))
//!     }
//! }
//!
//! let mut controller = DifferentialFlatnessController::builder(ExampleClock)
//!     .mass(1.5)
//!     .awaiting(ParameterSet::empty())
//!     .build();
//! controller.set_mode(Mode::trajectory(YawMode::Angle), Mode::default());
//!
//! controller.update_state(
//!     Stamped::new(Vector3::zeros(), Instant::new(0), ReferenceFrame::LocalEnu),
//!     Stamped::new(Vector3::zeros(), Instant::new(0), ReferenceFrame::LocalEnu),
//!     UnitQuaternion::identity(),
//! );
//! controller.update_reference(TrajectoryReference::default());
//!
//! let output = controller.compute_output(0.01).unwrap();
//! assert!((output.thrust.value - 1.5 * 9.81).abs() < 1e-9);
//! ```

#![cfg_attr(not(test), no_std)]

mod builder;
pub use builder::Builder;

pub mod control;
pub use control::Pid3;

mod controller;
pub use controller::DifferentialFlatnessController;

mod error;
pub use error::Error;

pub mod hal;
pub use hal::VelocityTransform;

mod mode;
pub use mode::{ControlMode, Mode, ReferenceFrame, YawMode};

pub mod parameter;
pub use parameter::{Gains, ParamValue, Parameter, ParameterSet, SetParametersResult};

mod readiness;
pub use readiness::{Readiness, Stage};

mod state;
pub use state::{ControlCommand, Header, Output, Stamped, TrajectoryReference, VehicleState};
