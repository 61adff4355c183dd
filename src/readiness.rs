use crate::error::Error;
use crate::parameter::{Parameter, ParameterSet};

/// How many of the controller inputs have arrived.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    /// No parameters, state or reference yet.
    NotReady,
    /// Some but not all inputs.
    PartiallyReady,
    /// Output may be computed.
    Ready,
}

/// Tracks whether parameters, vehicle state and reference have arrived.
///
/// Once every awaited parameter has been set the parameters stay read for
/// the lifetime of the tracker. State and reference are cleared on mode changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Readiness {
    awaiting: ParameterSet,
    parameters_read: bool,
    state_received: bool,
    reference_received: bool,
}

impl Default for Readiness {
    fn default() -> Self {
        Self::new(ParameterSet::all())
    }
}

impl Readiness {
    pub fn new(awaiting: ParameterSet) -> Self {
        Self {
            awaiting,
            parameters_read: awaiting.is_empty(),
            state_received: false,
            reference_received: false,
        }
    }

    /// Parameters that still need to be set.
    pub fn awaiting(&self) -> ParameterSet {
        self.awaiting
    }

    pub fn parameters_read(&self) -> bool {
        self.parameters_read
    }

    pub fn state_received(&self) -> bool {
        self.state_received
    }

    pub fn reference_received(&self) -> bool {
        self.reference_received
    }

    /// Mark a parameter as set.
    pub fn parameter_read(&mut self, parameter: Parameter) {
        if self.parameters_read {
            return;
        }

        self.awaiting.remove(parameter);
        if self.awaiting.is_empty() {
            self.parameters_read = true;
        }
    }

    pub fn receive_state(&mut self) {
        self.state_received = true;
    }

    pub fn receive_reference(&mut self) {
        self.reference_received = true;
    }

    /// Forget the received state and reference.
    pub fn clear_inputs(&mut self) {
        self.state_received = false;
        self.reference_received = false;
    }

    pub fn stage(&self) -> Stage {
        match (self.parameters_read, self.state_received, self.reference_received) {
            (true, true, true) => Stage::Ready,
            (false, false, false) => Stage::NotReady,
            _ => Stage::PartiallyReady,
        }
    }

    /// Check the inputs in order: state, parameters, then reference.
    pub fn check(&self) -> Result<(), Error> {
        if !self.state_received {
            return Err(Error::StateNotAvailable);
        }
        if !self.parameters_read {
            return Err(Error::ParametersIncomplete(self.awaiting));
        }
        if !self.reference_received {
            return Err(Error::ReferenceNotAvailable);
        }
        Ok(())
    }
}
