use thiserror::Error;

/// A type alias for `Result<T, meanbench::Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the averaging routines and the sample buffer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The allocator refused the sample buffer (or its size overflowed).
    #[error("Memory allocation failed")]
    AllocationFailure { len: usize },

    /// A mean was requested over zero values.
    #[error("cannot compute the mean of an empty sequence")]
    DivideByZeroCount,

    #[error("lane count must be a power of two in 1..=64, but is {0}")]
    InvalidLaneCount(usize),
}
