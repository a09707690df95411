#![warn(missing_docs)]
//! A library for batched experience replay in reinforcement learning.
//!
//! Experience collected from `batch_size` parallel environment instances is
//! written into a lane-segmented [`ReplayBuffer`](replay_buffer::ReplayBuffer)
//! and read back as randomly sampled windows of contiguous records, an
//! infinite stream of such batches, or a full snapshot. Environments,
//! policies, and learners are consumed through the interfaces in this crate;
//! their implementations live elsewhere.
pub mod dummy;
pub mod error;
pub mod record;
pub mod replay_buffer;

mod base;
pub use base::{Env, Learner, Policy, PolicyStep, TrajectorySampler, TrajectoryWriter};

mod spec;
pub use spec::{DataSpec, TensorSpec};

mod value;
pub use value::{ElementType, Tensor, TensorData, Value};

mod trajectory;
pub use trajectory::{StepKind, TimeStep, Trajectory, TrajectoryBatch, TrajectorySpec};

mod trainer;
pub use trainer::{Collector, Trainer, TrainerConfig};
