//! Policy interface.
use crate::{trajectory::TimeStep, value::Value};

/// Output of a single policy query.
#[derive(Clone, Debug)]
pub struct PolicyStep {
    /// Action to apply to the environment.
    pub action: Value,

    /// Carried state, if the policy is stateful.
    pub state: Option<Value>,

    /// Auxiliary data to store alongside the transition.
    pub info: Option<Value>,
}

impl PolicyStep {
    /// A stateless step carrying only an action.
    pub fn new(action: Value) -> Self {
        Self {
            action,
            state: None,
            info: None,
        }
    }

    /// Attaches carried state.
    pub fn with_state(mut self, state: Value) -> Self {
        self.state = Some(state);
        self
    }

    /// Attaches auxiliary data.
    pub fn with_info(mut self, info: Value) -> Self {
        self.info = Some(info);
        self
    }
}

/// A mapping from time steps to actions, deterministic or stochastic.
pub trait Policy {
    /// Samples an action given the current time step and the state carried
    /// over from the previous query of the same episode.
    fn action(&mut self, time_step: &TimeStep, state: Option<Value>) -> PolicyStep;
}
