//! Fixed-capacity circular storage backing one collection lane.
use crate::{error::RecallError, trajectory::Trajectory};

/// A fixed-capacity circular sequence of trajectory records.
///
/// Records are addressed by a logical position that increases monotonically
/// over the lane's lifetime; the physical slot is the position modulo the
/// capacity. Once the lane is full, a push silently overwrites the oldest
/// record. Eviction is expected steady-state behavior, not an error;
/// reading an evicted position is.
#[derive(Debug)]
pub struct Lane {
    slots: Vec<Option<Trajectory>>,
    head: usize,
    count: usize,
}

impl Lane {
    /// Creates an empty lane holding up to `max_length` records.
    pub fn new(max_length: usize) -> Self {
        assert!(max_length > 0, "lane capacity must be positive");
        Self {
            slots: (0..max_length).map(|_| None).collect(),
            head: 0,
            count: 0,
        }
    }

    /// Maximum number of records the lane can hold.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Next logical write position; also the number of records pushed since
    /// the lane was created or last cleared.
    pub fn head(&self) -> usize {
        self.head
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether the lane holds no records.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Oldest logical position still stored.
    pub fn oldest(&self) -> usize {
        self.head - self.count
    }

    /// Appends a record, evicting the oldest when full. Amortized O(1).
    pub fn push(&mut self, record: Trajectory) {
        let slot = self.head % self.slots.len();
        self.slots[slot] = Some(record);
        self.head += 1;
        if self.count < self.slots.len() {
            self.count += 1;
        }
    }

    /// Reads the record at a logical position. O(1).
    pub fn get(&self, index: usize) -> Result<&Trajectory, RecallError> {
        if index < self.oldest() || index >= self.head {
            return Err(RecallError::OutOfRange {
                index,
                oldest: self.oldest(),
                head: self.head,
            });
        }
        Ok(self.slots[index % self.slots.len()]
            .as_ref()
            .expect("a position in the live range has a record"))
    }

    /// Reads `len` contiguous records starting at `start`, in insertion
    /// order. Fails if any position in the range is invalid.
    pub fn window(&self, start: usize, len: usize) -> Result<Vec<&Trajectory>, RecallError> {
        (start..start + len).map(|ix| self.get(ix)).collect()
    }

    /// Number of complete `num_steps`-long windows currently readable.
    pub fn num_windows(&self, num_steps: usize) -> usize {
        if num_steps == 0 {
            0
        } else {
            (self.count + 1).saturating_sub(num_steps)
        }
    }

    /// Drops all records and resets the logical position, keeping capacity.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
        self.head = 0;
        self.count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{trajectory::StepKind, value::Value};

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

    fn tag(r: &Trajectory) -> i64 {
        r.observation.as_tensor().unwrap().as_i64().unwrap()[0]
    }

    #[test]
    fn count_saturates_at_capacity() {
        let mut lane = Lane::new(3);
        for i in 0..5 {
            assert_eq!(lane.len(), (i as usize).min(3));
            lane.push(record(i));
        }
        assert_eq!(lane.len(), 3);
        assert_eq!(lane.head(), 5);
        assert_eq!(lane.oldest(), 2);
    }

    #[test]
    fn overwrite_evicts_oldest() {
        let mut lane = Lane::new(3);
        for i in 1..=4 {
            lane.push(record(i));
        }
        // R1 (position 0) is gone; R2..R4 remain readable
        assert!(matches!(
            lane.get(0),
            Err(RecallError::OutOfRange { index: 0, .. })
        ));
        for (pos, expected) in (1..4).enumerate() {
            assert_eq!(tag(lane.get(pos + 1).unwrap()), expected as i64 + 1);
        }
    }

    #[test]
    fn get_rejects_unwritten_positions() {
        let mut lane = Lane::new(4);
        lane.push(record(0));
        assert!(lane.get(0).is_ok());
        assert!(lane.get(1).is_err());
    }

    #[test]
    fn window_is_contiguous_and_ordered() {
        let mut lane = Lane::new(3);
        for i in 1..=4 {
            lane.push(record(i));
        }
        let w = lane.window(2, 2).unwrap();
        assert_eq!(w.iter().map(|r| tag(r)).collect::<Vec<_>>(), vec![3, 4]);
        // any window touching the evicted position 0 fails
        assert!(lane.window(0, 2).is_err());
        // a window running past the head fails
        assert!(lane.window(3, 2).is_err());
    }

    #[test]
    fn window_counts() {
        let mut lane = Lane::new(3);
        assert_eq!(lane.num_windows(1), 0);
        lane.push(record(0));
        lane.push(record(1));
        assert_eq!(lane.num_windows(1), 2);
        assert_eq!(lane.num_windows(2), 1);
        assert_eq!(lane.num_windows(3), 0);
        assert_eq!(lane.num_windows(0), 0);
    }

    #[test]
    fn clear_resets_positions_but_not_capacity() {
        let mut lane = Lane::new(2);
        lane.push(record(0));
        lane.push(record(1));
        lane.clear();
        assert!(lane.is_empty());
        assert_eq!(lane.head(), 0);
        assert_eq!(lane.capacity(), 2);
        assert!(lane.get(0).is_err());
        lane.push(record(2));
        assert_eq!(tag(lane.get(0).unwrap()), 2);
    }
}
