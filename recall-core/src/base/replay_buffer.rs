//! Buffer-facing interfaces.
//!
//! The write side and the sampling side are split so that producers and
//! consumers can each be generic over just the half they use, and so that
//! both the plain [`ReplayBuffer`] and the thread-shared
//! [`SharedReplayBuffer`] satisfy them.
//!
//! [`ReplayBuffer`]: crate::replay_buffer::ReplayBuffer
//! [`SharedReplayBuffer`]: crate::replay_buffer::SharedReplayBuffer
use crate::trajectory::{Trajectory, TrajectoryBatch};
use anyhow::Result;

/// Write side of an experience buffer.
pub trait TrajectoryWriter {
    /// Appends one record per lane; `items.len()` must equal the buffer's
    /// batch size. Evicts the oldest record of any full lane.
    fn add_batch(&mut self, items: Vec<Trajectory>) -> Result<()>;

    /// Number of live records per lane (the minimum across lanes).
    fn len(&self) -> usize;

    /// Whether no records are stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Logically empties all lanes. Capacity and spec are unchanged.
    fn clear(&mut self);
}

/// Sampling side of an experience buffer.
pub trait TrajectorySampler {
    /// Draws `sample_batch_size` windows of `num_steps` contiguous records,
    /// uniformly over all currently valid windows, with replacement.
    fn get_next(&mut self, sample_batch_size: usize, num_steps: usize) -> Result<TrajectoryBatch>;

    /// Returns every live record, shaped `[batch_size, n, ...]`.
    fn gather_all(&self) -> TrajectoryBatch;
}
