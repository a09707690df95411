//! Uniform window sampling over lanes.
use super::lane::Lane;
use crate::error::RecallError;
use rand::Rng;

/// Draws one `(lane, start)` pair uniformly over all valid windows of
/// `num_steps` contiguous records.
///
/// A window is valid when it lies fully within its lane's live range, so a
/// chosen window never spans an evicted position nor reaches past the head.
/// Lanes holding fewer than `num_steps` records contribute no windows: the
/// distribution is uniform over windows, not over lanes, and unevenly filled
/// lanes are weighted by their window counts.
pub(super) fn sample_window<R: Rng>(
    lanes: &[Lane],
    num_steps: usize,
    rng: &mut R,
) -> Result<(usize, usize), RecallError> {
    let total: usize = lanes.iter().map(|l| l.num_windows(num_steps)).sum();
    if total == 0 {
        return Err(RecallError::InsufficientData { num_steps });
    }
    let mut r = rng.gen_range(0..total);
    for (ix, lane) in lanes.iter().enumerate() {
        let n = lane.num_windows(num_steps);
        if r < n {
            return Ok((ix, lane.oldest() + r));
        }
        r -= n;
    }
    unreachable!("drawn window index is below the total window count")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        trajectory::{StepKind, Trajectory},
        value::Value,
    };
    use rand::{rngs::StdRng, SeedableRng};

    fn record() -> Trajectory {
        Trajectory {
            step_kind: StepKind::Mid,
            observation: Value::scalar_f32(0.0),
            action: Value::scalar_i64(0),
            policy_info: None,
            reward: Value::scalar_f32(0.0),
            discount: 1.0,
        }
    }

    fn lane_with(n: usize, capacity: usize) -> Lane {
        let mut lane = Lane::new(capacity);
        for _ in 0..n {
            lane.push(record());
        }
        lane
    }

    #[test]
    fn empty_lanes_yield_insufficient_data() {
        let lanes = vec![Lane::new(4), Lane::new(4)];
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            sample_window(&lanes, 1, &mut rng),
            Err(RecallError::InsufficientData { num_steps: 1 })
        ));
    }

    #[test]
    fn short_lanes_contribute_no_windows() {
        // lane 0 holds one record, lane 1 holds three: only lane 1 can
        // produce 2-step windows
        let lanes = vec![lane_with(1, 4), lane_with(3, 4)];
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..50 {
            let (lane, start) = sample_window(&lanes, 2, &mut rng).unwrap();
            assert_eq!(lane, 1);
            assert!(start <= 1);
        }
    }

    #[test]
    fn all_valid_windows_are_reachable() {
        let lanes = vec![lane_with(3, 4), lane_with(4, 4)];
        // 2 windows in lane 0, 3 in lane 1
        let mut rng = StdRng::seed_from_u64(2);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            seen.insert(sample_window(&lanes, 2, &mut rng).unwrap());
        }
        let expected: std::collections::HashSet<(usize, usize)> =
            vec![(0, 0), (0, 1), (1, 0), (1, 1), (1, 2)].into_iter().collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn windows_start_at_the_eviction_boundary() {
        // capacity 3, five pushes: live positions are 2..5
        let lanes = vec![lane_with(5, 3)];
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            let (_, start) = sample_window(&lanes, 2, &mut rng).unwrap();
            assert!((2..=3).contains(&start));
        }
    }
}
