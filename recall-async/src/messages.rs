//! Messages sent from the collector thread.

/// Collection progress, reported periodically by
/// [`AsyncCollector`](crate::AsyncCollector).
#[derive(Clone, Copy, Debug)]
pub struct CollectorStat {
    /// Environment steps taken across all lanes so far.
    pub env_steps: usize,

    /// Episodes completed across all lanes so far.
    pub episodes: usize,
}
