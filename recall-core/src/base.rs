//! Core interfaces.
mod env;
mod learner;
mod policy;
mod replay_buffer;
pub use env::Env;
pub use learner::Learner;
pub use policy::{Policy, PolicyStep};
pub use replay_buffer::{TrajectorySampler, TrajectoryWriter};
