//! Thread-shared replay buffer handle.
use super::{base::ReplayBuffer, stream::BatchStream};
use crate::{
    base::{TrajectorySampler, TrajectoryWriter},
    error::RecallError,
    trajectory::{Trajectory, TrajectoryBatch},
};
use anyhow::Result;
use std::sync::{Arc, Condvar, Mutex};

/// A clonable, thread-safe handle to a [`ReplayBuffer`].
///
/// Every operation takes one buffer-wide lock, so a producer writing and a
/// consumer sampling on separate threads always observe whole records:
/// partially written state is never visible, [`gather_all`] snapshots a
/// consistent view across lanes, and [`clear`] is mutually exclusive with
/// in-flight writes and reads. Writes notify a condition variable that
/// [`BatchStream`]s park on while data is still insufficient.
///
/// The same handle also works single-threaded: producer and consumer calls
/// may simply be interleaved.
///
/// [`gather_all`]: SharedReplayBuffer::gather_all
/// [`clear`]: SharedReplayBuffer::clear
#[derive(Clone)]
pub struct SharedReplayBuffer {
    inner: Arc<(Mutex<ReplayBuffer>, Condvar)>,
}

impl SharedReplayBuffer {
    /// Wraps a buffer for shared use.
    pub fn new(buffer: ReplayBuffer) -> Self {
        Self {
            inner: Arc::new((Mutex::new(buffer), Condvar::new())),
        }
    }

    /// Appends one record per lane and wakes waiting streams.
    /// See [`ReplayBuffer::add_batch`].
    pub fn add_batch(&self, items: Vec<Trajectory>) -> Result<()> {
        let (lock, cvar) = &*self.inner;
        let result = lock.lock().unwrap().add_batch(items);
        if result.is_ok() {
            cvar.notify_all();
        }
        result
    }

    /// Draws one batch of sampled windows. See [`ReplayBuffer::get_next`].
    pub fn get_next(&self, sample_batch_size: usize, num_steps: usize) -> Result<TrajectoryBatch> {
        let (lock, _) = &*self.inner;
        lock.lock().unwrap().get_next(sample_batch_size, num_steps)
    }

    /// Snapshots every live record under the lock.
    /// See [`ReplayBuffer::gather_all`].
    pub fn gather_all(&self) -> TrajectoryBatch {
        let (lock, _) = &*self.inner;
        lock.lock().unwrap().gather_all()
    }

    /// Logically empties all lanes. See [`ReplayBuffer::clear`].
    pub fn clear(&self) {
        let (lock, _) = &*self.inner;
        lock.lock().unwrap().clear();
    }

    /// Number of live records per lane (the minimum across lanes).
    pub fn len(&self) -> usize {
        let (lock, _) = &*self.inner;
        lock.lock().unwrap().len()
    }

    /// Whether no records are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// An infinite, restartable stream of sampled batches. Each pulled batch
    /// is an independent sample constructed exactly as by [`get_next`].
    ///
    /// [`get_next`]: SharedReplayBuffer::get_next
    pub fn stream(&self, sample_batch_size: usize, num_steps: usize) -> BatchStream {
        BatchStream::new(self.clone(), sample_batch_size, num_steps)
    }

    /// Samples one batch, parking on the condition variable while data is
    /// insufficient. Returns as soon as a write makes the request
    /// satisfiable.
    pub(super) fn wait_and_sample(
        &self,
        sample_batch_size: usize,
        num_steps: usize,
    ) -> TrajectoryBatch {
        let (lock, cvar) = &*self.inner;
        let mut buffer = lock.lock().unwrap();
        loop {
            match buffer.get_next(sample_batch_size, num_steps) {
                Ok(batch) => return batch,
                Err(err) => match err.downcast_ref::<RecallError>() {
                    Some(RecallError::InsufficientData { .. }) => {
                        buffer = cvar.wait(buffer).unwrap();
                    }
                    _ => panic!("sampling failed: {}", err),
                },
            }
        }
    }
}

impl TrajectoryWriter for SharedReplayBuffer {
    fn add_batch(&mut self, items: Vec<Trajectory>) -> Result<()> {
        SharedReplayBuffer::add_batch(self, items)
    }

    fn len(&self) -> usize {
        SharedReplayBuffer::len(self)
    }

    fn clear(&mut self) {
        SharedReplayBuffer::clear(self)
    }
}

impl TrajectorySampler for SharedReplayBuffer {
    fn get_next(&mut self, sample_batch_size: usize, num_steps: usize) -> Result<TrajectoryBatch> {
        SharedReplayBuffer::get_next(self, sample_batch_size, num_steps)
    }

    fn gather_all(&self) -> TrajectoryBatch {
        SharedReplayBuffer::gather_all(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        spec::DataSpec,
        trajectory::{StepKind, TrajectorySpec},
        value::{ElementType, Value},
    };
    use std::thread;

    fn spec() -> TrajectorySpec {
        TrajectorySpec::new(
            DataSpec::scalar(ElementType::I64),
            DataSpec::scalar(ElementType::I64),
        )
    }

    fn record(tag: i64) -> Trajectory {
        Trajectory {
            step_kind: StepKind::Mid,
            observation: Value::scalar_i64(tag),
            action: Value::scalar_i64(0),
            policy_info: None,
            reward: Value::scalar_f32(0.0),
            discount: 1.0,
        }
    }

    #[test]
    fn handles_share_one_buffer() {
        let shared = SharedReplayBuffer::new(ReplayBuffer::new(spec(), 1, 8));
        let writer = shared.clone();
        writer.add_batch(vec![record(1)]).unwrap();
        assert_eq!(shared.len(), 1);
        shared.clear();
        assert!(writer.is_empty());
    }

    #[test]
    fn concurrent_writes_and_samples_see_whole_records() {
        let shared = SharedReplayBuffer::new(ReplayBuffer::new(spec(), 1, 64));
        let writer = shared.clone();
        let producer = thread::spawn(move || {
            for i in 0..500 {
                writer.add_batch(vec![record(i)]).unwrap();
            }
        });

        let mut sampled = 0;
        while sampled < 200 {
            match shared.get_next(4, 2) {
                Ok(batch) => {
                    // windows are contiguous: consecutive tags differ by one
                    let tags = batch
                        .observation()
                        .as_tensor()
                        .unwrap()
                        .as_i64()
                        .unwrap()
                        .to_vec();
                    for window in tags.chunks(2) {
                        assert_eq!(window[1], window[0] + 1);
                    }
                    sampled += 1;
                }
                Err(err) => {
                    assert!(matches!(
                        err.downcast_ref::<RecallError>(),
                        Some(RecallError::InsufficientData { .. })
                    ));
                }
            }
        }
        producer.join().unwrap();
    }

    #[test]
    fn stream_wakes_on_writes() {
        let shared = SharedReplayBuffer::new(ReplayBuffer::new(spec(), 1, 8));
        let writer = shared.clone();
        let producer = thread::spawn(move || {
            for i in 0..4 {
                writer.add_batch(vec![record(i)]).unwrap();
            }
        });
        // blocks until the producer has written at least two records
        let batch = shared.stream(1, 2).next().unwrap();
        assert_eq!(batch.dims(), &[1, 2]);
        producer.join().unwrap();
    }
}
