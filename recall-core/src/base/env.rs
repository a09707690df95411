//! Environment interface.
use crate::{spec::DataSpec, trajectory::TimeStep, value::Value};
use anyhow::Result;

/// Represents an environment, typically an MDP.
///
/// The library only consumes this interface: a [`Collector`] drives one
/// instance per buffer lane. Observations and actions are runtime-structured
/// [`Value`]s conforming to the environment's declared specs, which lets
/// heterogeneous environments share the spec-validated buffer machinery.
///
/// [`Collector`]: crate::Collector
pub trait Env {
    /// Configuration used to build instances.
    type Config: Clone;

    /// Builds an environment with a given random seed.
    fn build(config: &Self::Config, seed: u64) -> Result<Self>
    where
        Self: Sized;

    /// Starts a new episode and returns its first time step.
    fn reset(&mut self) -> Result<TimeStep>;

    /// Applies an action and returns the resulting time step.
    fn step(&mut self, action: &Value) -> Result<TimeStep>;

    /// Spec of the observations this environment emits.
    fn observation_spec(&self) -> &DataSpec;

    /// Spec of the actions this environment accepts.
    fn action_spec(&self) -> &DataSpec;
}
