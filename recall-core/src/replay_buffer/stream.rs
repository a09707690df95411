//! Lazy, infinite stream of sampled batches.
use super::shared::SharedReplayBuffer;
use crate::trajectory::TrajectoryBatch;

/// An infinite iterator of sampled batches over a shared buffer.
///
/// Created by [`SharedReplayBuffer::stream`]. `next()` never returns `None`;
/// it suspends only while the buffer holds insufficient data for the
/// requested window length, and resumes as soon as a write makes the request
/// satisfiable. Each pulled batch is an independent uniform sample, not a
/// partition of the stored data: there are no epoch semantics, and dropping
/// the stream and starting a new one changes nothing about what is sampled.
///
/// For a non-blocking alternative, call [`SharedReplayBuffer::get_next`] and
/// handle [`InsufficientData`](crate::error::RecallError::InsufficientData).
pub struct BatchStream {
    buffer: SharedReplayBuffer,
    sample_batch_size: usize,
    num_steps: usize,
}

impl BatchStream {
    pub(super) fn new(
        buffer: SharedReplayBuffer,
        sample_batch_size: usize,
        num_steps: usize,
    ) -> Self {
        Self {
            buffer,
            sample_batch_size,
            num_steps,
        }
    }

    /// Number of windows per pulled batch.
    pub fn sample_batch_size(&self) -> usize {
        self.sample_batch_size
    }

    /// Window length of pulled batches.
    pub fn num_steps(&self) -> usize {
        self.num_steps
    }
}

impl Iterator for BatchStream {
    type Item = TrajectoryBatch;

    fn next(&mut self) -> Option<TrajectoryBatch> {
        Some(
            self.buffer
                .wait_and_sample(self.sample_batch_size, self.num_steps),
        )
    }
}
