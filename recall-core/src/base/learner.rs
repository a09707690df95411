//! Learner interface.
use crate::trajectory::{TrajectoryBatch, TrajectorySpec};
use anyhow::Result;

/// A consumer of sampled trajectory batches.
pub trait Learner {
    /// The data specification collected experience must conform to. The
    /// replay buffer feeding this learner is constructed with this spec.
    fn collect_spec(&self) -> &TrajectorySpec;

    /// Performs one optimization step on a batch, returning the loss.
    fn train(&mut self, batch: &TrajectoryBatch) -> Result<f32>;
}
