use crate::mode::{ControlMode, YawMode};
use crate::parameter::ParameterSet;
use core::fmt;
use embedded_time::clock;

/// Reasons the controller cannot produce a command this tick.
///
/// None of these are fatal, the caller should hold off commanding the
/// vehicle and try again on the next tick.
#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    /// No vehicle state since the last mode change.
    StateNotAvailable,
    /// These parameters have not been set yet.
    ParametersIncomplete(ParameterSet),
    /// No trajectory reference since the last mode change.
    ReferenceNotAvailable,
    UnknownYawMode(YawMode),
    UnknownControlMode(ControlMode),
    /// The output could not be stamped.
    Clock(clock::Error),
}

impl Error {
    /// Returns `true` if this error clears by itself once inputs arrive.
    pub fn is_not_ready(&self) -> bool {
        matches!(
            self,
            Error::StateNotAvailable
                | Error::ParametersIncomplete(_)
                | Error::ReferenceNotAvailable
        )
    }
}

impl From<clock::Error> for Error {
    fn from(clock_error: clock::Error) -> Self {
        Error::Clock(clock_error)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::StateNotAvailable => f.write_str("state not available"),
            Error::ParametersIncomplete(awaiting) => {
                write!(f, "parameters incomplete: {}", awaiting)
            }
            Error::ReferenceNotAvailable => f.write_str("reference not available"),
            Error::UnknownYawMode(mode) => write!(f, "unknown yaw mode {:?}", mode),
            Error::UnknownControlMode(mode) => write!(f, "unknown control mode {:?}", mode),
            Error::Clock(error) => write!(f, "clock error: {:?}", error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Error;
    use crate::parameter::{Parameter, ParameterSet};

    #[test]
    fn parameters_incomplete_names_each_parameter() {
        let awaiting: ParameterSet = [Parameter::Mass, Parameter::KiZ].into_iter().collect();
        let error = Error::ParametersIncomplete(awaiting);

        assert_eq!(
            error.to_string(),
            "parameters incomplete: mass, trajectory_control.ki.z"
        );
        assert!(error.is_not_ready());
    }

    #[test]
    fn not_ready_reasons() {
        assert_eq!(Error::StateNotAvailable.to_string(), "state not available");
        assert_eq!(Error::ReferenceNotAvailable.to_string(), "reference not available");
        assert!(!Error::UnknownControlMode(crate::ControlMode::Hover).is_not_ready());
    }
}
