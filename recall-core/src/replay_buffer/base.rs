//! The replay buffer.
use super::{config::ReplayBufferConfig, lane::Lane, sampler::sample_window};
use crate::{
    base::{TrajectorySampler, TrajectoryWriter},
    error::RecallError,
    trajectory::{Trajectory, TrajectoryBatch, TrajectorySpec},
};
use anyhow::Result;
use rand::{rngs::StdRng, SeedableRng};

/// A fixed-capacity, batched experience replay buffer.
///
/// The buffer owns `batch_size` lanes, one per parallel collection stream;
/// total capacity is `batch_size * max_length` records. Every record must
/// conform to the [`TrajectorySpec`] fixed at construction; conformance is
/// checked on write, before any lane is touched, so a failed write leaves
/// the buffer unchanged.
///
/// Old records are silently overwritten once a lane reaches capacity. That
/// is steady-state behavior, not an error, and there is no eviction
/// notification; samplers simply stop seeing the evicted records.
pub struct ReplayBuffer {
    spec: TrajectorySpec,
    lanes: Vec<Lane>,
    max_length: usize,
    rng: StdRng,
}

impl ReplayBuffer {
    /// Creates a buffer with `batch_size` lanes of `max_length` records
    /// each, using the default sampling seed.
    pub fn new(spec: TrajectorySpec, batch_size: usize, max_length: usize) -> Self {
        Self::build(
            &ReplayBufferConfig::default()
                .batch_size(batch_size)
                .max_length(max_length),
            spec,
        )
    }

    /// Creates a buffer from a configuration.
    pub fn build(config: &ReplayBufferConfig, spec: TrajectorySpec) -> Self {
        assert!(config.batch_size > 0, "buffer needs at least one lane");
        assert!(config.max_length > 0, "lane capacity must be positive");
        Self {
            spec,
            lanes: (0..config.batch_size)
                .map(|_| Lane::new(config.max_length))
                .collect(),
            max_length: config.max_length,
            rng: StdRng::seed_from_u64(config.seed),
        }
    }

    /// The buffer's data specification.
    pub fn spec(&self) -> &TrajectorySpec {
        &self.spec
    }

    /// Number of lanes.
    pub fn batch_size(&self) -> usize {
        self.lanes.len()
    }

    /// Per-lane capacity.
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Total capacity, `batch_size * max_length`.
    pub fn capacity(&self) -> usize {
        self.lanes.len() * self.max_length
    }

    /// The lanes, for direct positional reads.
    pub fn lanes(&self) -> &[Lane] {
        &self.lanes
    }

    /// Records written per lane since construction or the last clear.
    /// [`add_batch`] advances every lane together, so all lanes share this
    /// position.
    ///
    /// [`add_batch`]: ReplayBuffer::add_batch
    pub fn head(&self) -> usize {
        self.lanes[0].head()
    }

    /// Appends one record per lane: record `i` goes to lane `i`.
    ///
    /// Every record is validated against the spec before any lane is
    /// written, so the buffer is unchanged when this fails.
    pub fn add_batch(&mut self, items: Vec<Trajectory>) -> Result<()> {
        if items.len() != self.lanes.len() {
            return Err(RecallError::BatchSizeMismatch {
                expected: self.lanes.len(),
                found: items.len(),
            }
            .into());
        }
        for item in &items {
            self.spec.validate(item)?;
        }
        for (lane, item) in self.lanes.iter_mut().zip(items) {
            lane.push(item);
        }
        Ok(())
    }

    /// Draws `sample_batch_size` windows of `num_steps` contiguous records,
    /// uniformly over all currently valid windows, with replacement.
    ///
    /// The result has leading shape `[sample_batch_size, num_steps]`, except
    /// that `num_steps == 1` drops the time dimension. Fails with
    /// [`RecallError::InsufficientData`] while no lane holds `num_steps`
    /// records; collecting more data resolves that.
    pub fn get_next(
        &mut self,
        sample_batch_size: usize,
        num_steps: usize,
    ) -> Result<TrajectoryBatch> {
        let mut picks = Vec::with_capacity(sample_batch_size);
        for _ in 0..sample_batch_size {
            picks.push(sample_window(&self.lanes, num_steps, &mut self.rng)?);
        }
        if num_steps == 1 {
            let records = picks
                .iter()
                .map(|&(lane, start)| self.lanes[lane].get(start))
                .collect::<Result<Vec<_>, _>>()?;
            TrajectoryBatch::stack_samples(&self.spec, &records)
        } else {
            let windows = picks
                .iter()
                .map(|&(lane, start)| self.lanes[lane].window(start, num_steps))
                .collect::<Result<Vec<_>, _>>()?;
            TrajectoryBatch::stack_windows(&self.spec, &windows, num_steps)
        }
    }

    /// Returns every live record, shaped `[batch_size, n, ...]` with records
    /// in insertion order within each lane.
    ///
    /// `n` is the minimum live count across lanes; lanes holding more are
    /// truncated to their newest `n` records. [`add_batch`] writes one
    /// record to every lane per call, so lanes never actually diverge
    /// through this type's interface and the minimum is the common count.
    ///
    /// [`add_batch`]: ReplayBuffer::add_batch
    pub fn gather_all(&self) -> TrajectoryBatch {
        let n = self.len();
        let windows: Vec<Vec<&Trajectory>> = self
            .lanes
            .iter()
            .map(|lane| {
                lane.window(lane.head() - n, n)
                    .expect("the newest n records of a lane are live")
            })
            .collect();
        TrajectoryBatch::stack_windows(&self.spec, &windows, n)
            .expect("stored records conform to one spec")
    }

    /// Logically empties all lanes. Capacity, spec, and sampling state are
    /// unchanged.
    pub fn clear(&mut self) {
        for lane in &mut self.lanes {
            lane.clear();
        }
    }

    /// Number of live records per lane (the minimum across lanes).
    pub fn len(&self) -> usize {
        self.lanes.iter().map(Lane::len).min().unwrap_or(0)
    }

    /// Whether no records are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TrajectoryWriter for ReplayBuffer {
    fn add_batch(&mut self, items: Vec<Trajectory>) -> Result<()> {
        ReplayBuffer::add_batch(self, items)
    }

    fn len(&self) -> usize {
        ReplayBuffer::len(self)
    }

    fn clear(&mut self) {
        ReplayBuffer::clear(self)
    }
}

impl TrajectorySampler for ReplayBuffer {
    fn get_next(&mut self, sample_batch_size: usize, num_steps: usize) -> Result<TrajectoryBatch> {
        ReplayBuffer::get_next(self, sample_batch_size, num_steps)
    }

    fn gather_all(&self) -> TrajectoryBatch {
        ReplayBuffer::gather_all(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        spec::DataSpec,
        trajectory::StepKind,
        value::{ElementType, Value},
    };

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

    fn obs_tags(batch: &TrajectoryBatch) -> Vec<i64> {
        batch
            .observation()
            .as_tensor()
            .unwrap()
            .as_i64()
            .unwrap()
            .to_vec()
    }

    #[test]
    fn lane_counts_saturate() {
        let mut buffer = ReplayBuffer::new(spec(), 2, 3);
        for i in 0..5 {
            assert_eq!(buffer.len(), (i as usize).min(3));
            buffer.add_batch(vec![record(i), record(i + 100)]).unwrap();
        }
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.head(), 5);
        assert_eq!(buffer.capacity(), 6);
    }

    #[test]
    fn add_batch_rejects_wrong_arity() {
        let mut buffer = ReplayBuffer::new(spec(), 2, 3);
        let err = buffer.add_batch(vec![record(0)]).unwrap_err();
        match err.downcast_ref::<RecallError>() {
            Some(RecallError::BatchSizeMismatch {
                expected: 2,
                found: 1,
            }) => {}
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(buffer.is_empty());
    }

    #[test]
    fn spec_mismatch_leaves_lanes_unchanged() {
        let mut buffer = ReplayBuffer::new(spec(), 2, 3);
        buffer.add_batch(vec![record(0), record(1)]).unwrap();

        let mut bad = record(2);
        bad.action = Value::scalar_f32(0.0);
        // first item valid, second is not: neither lane may advance
        let err = buffer.add_batch(vec![record(2), bad]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RecallError>(),
            Some(RecallError::SpecMismatch { .. })
        ));
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.lanes()[0].head(), 1);
    }

    #[test]
    fn get_next_returns_exactly_k_live_records() {
        let mut buffer = ReplayBuffer::new(spec(), 2, 4);
        for i in 0..4 {
            buffer.add_batch(vec![record(i), record(i + 100)]).unwrap();
        }
        let batch = buffer.get_next(5, 1).unwrap();
        assert_eq!(batch.dims(), &[5]);
        for tag in obs_tags(&batch) {
            assert!((0..4).contains(&tag) || (100..104).contains(&tag));
        }
    }

    #[test]
    fn repeated_sampling_covers_the_live_set() {
        let mut buffer = ReplayBuffer::new(spec(), 1, 10);
        for i in 0..10 {
            buffer.add_batch(vec![record(i)]).unwrap();
        }
        let mut seen = std::collections::HashSet::new();
        for _ in 0..100 {
            for tag in obs_tags(&buffer.get_next(5, 1).unwrap()) {
                seen.insert(tag);
            }
        }
        assert_eq!(seen.len(), 10);
    }

    #[test]
    fn windows_never_cross_the_eviction_boundary() {
        // R1..R4 into a lane of capacity 3: only [R2, R3] and [R3, R4]
        // remain as 2-step windows
        let mut buffer = ReplayBuffer::new(spec(), 1, 3);
        for i in 1..=4 {
            buffer.add_batch(vec![record(i)]).unwrap();
        }
        for _ in 0..50 {
            let tags = obs_tags(&buffer.get_next(1, 2).unwrap());
            assert!(tags == vec![2, 3] || tags == vec![3, 4], "got {:?}", tags);
        }
    }

    #[test]
    fn windows_preserve_insertion_order() {
        let mut buffer = ReplayBuffer::new(spec(), 2, 8);
        for i in 0..8 {
            buffer.add_batch(vec![record(i), record(i + 100)]).unwrap();
        }
        let batch = buffer.get_next(10, 3).unwrap();
        assert_eq!(batch.dims(), &[10, 3]);
        for window in obs_tags(&batch).chunks(3) {
            assert_eq!(window[1], window[0] + 1);
            assert_eq!(window[2], window[1] + 1);
        }
    }

    #[test]
    fn insufficient_data_until_a_window_fits() {
        let mut buffer = ReplayBuffer::new(spec(), 1, 4);
        buffer.add_batch(vec![record(0)]).unwrap();
        let err = buffer.get_next(1, 2).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RecallError>(),
            Some(RecallError::InsufficientData { num_steps: 2 })
        ));
        buffer.add_batch(vec![record(1)]).unwrap();
        assert!(buffer.get_next(1, 2).is_ok());
    }

    #[test]
    fn gather_all_snapshots_every_lane_in_order() {
        let mut buffer = ReplayBuffer::new(spec(), 2, 4);
        for i in 0..3 {
            buffer.add_batch(vec![record(i), record(i + 100)]).unwrap();
        }
        let snapshot = buffer.gather_all();
        assert_eq!(snapshot.dims(), &[2, 3]);
        assert_eq!(obs_tags(&snapshot), vec![0, 1, 2, 100, 101, 102]);
    }

    #[test]
    fn gather_all_is_empty_before_writes_and_after_clear() {
        let mut buffer = ReplayBuffer::new(spec(), 3, 4);
        let snapshot = buffer.gather_all();
        assert_eq!(snapshot.dims(), &[3, 0]);
        assert!(snapshot.is_empty());

        for i in 0..4 {
            buffer
                .add_batch(vec![record(i), record(i), record(i)])
                .unwrap();
        }
        buffer.clear();
        let snapshot = buffer.gather_all();
        assert_eq!(snapshot.dims(), &[3, 0]);
        assert_eq!(buffer.batch_size(), 3);
        assert_eq!(buffer.max_length(), 4);
        // the buffer keeps working after a clear
        buffer
            .add_batch(vec![record(9), record(9), record(9)])
            .unwrap();
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn sampling_is_reproducible_for_a_seed() {
        let config = ReplayBufferConfig::default()
            .batch_size(1)
            .max_length(16)
            .seed(11);
        let mut a = ReplayBuffer::build(&config, spec());
        let mut b = ReplayBuffer::build(&config, spec());
        for i in 0..16 {
            a.add_batch(vec![record(i)]).unwrap();
            b.add_batch(vec![record(i)]).unwrap();
        }
        for _ in 0..10 {
            assert_eq!(
                obs_tags(&a.get_next(4, 2).unwrap()),
                obs_tags(&b.get_next(4, 2).unwrap())
            );
        }
    }
}
