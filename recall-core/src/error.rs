//! Errors in the library.
use thiserror::Error;

/// Errors raised by replay buffer operations.
#[derive(Error, Debug)]
pub enum RecallError {
    /// A record disagrees with the data specification fixed at buffer
    /// construction. The buffer is left unchanged.
    #[error("spec mismatch at `{at}`: expected {expected}, found {found}")]
    SpecMismatch {
        /// Path into the structured value at which validation failed.
        at: String,

        /// The declared specification at that path.
        expected: String,

        /// What the record actually carried.
        found: String,
    },

    /// A write supplied the wrong number of records for the buffer's lanes.
    #[error("batch size mismatch: buffer has {expected} lanes, got {found} records")]
    BatchSizeMismatch {
        /// Number of lanes of the buffer.
        expected: usize,

        /// Number of records supplied to the write.
        found: usize,
    },

    /// Not enough records are stored yet to satisfy a sample request.
    /// Recoverable: collecting more data makes the request satisfiable.
    #[error("insufficient data: no lane holds a window of {num_steps} contiguous records")]
    InsufficientData {
        /// Requested window length.
        num_steps: usize,
    },

    /// A direct read addressed a logical position outside the live range,
    /// either already evicted or not yet written.
    #[error("position {index} out of range: live range is {oldest}..{head}")]
    OutOfRange {
        /// The requested logical position.
        index: usize,

        /// Oldest logical position still stored.
        oldest: usize,

        /// Next logical write position.
        head: usize,
    },
}
