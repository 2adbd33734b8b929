use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by control-object construction and setters.
///
/// Parameter-length mismatches are never errors; they are resolved by
/// cyclic wrapping in [`crate::broadcast`]. A setter that fails leaves the
/// previous parameter value in effect.
#[derive(Debug, Error)]
pub enum Error {
    /// A parameter was given as an empty list. A list must carry at least
    /// one value so it can broadcast.
    #[error("parameter list is empty")]
    EmptyParams,

    /// Metro polyphony must be at least 1.
    #[error("metro polyphony must be >= 1, got {0}")]
    NonPositivePoly(usize),

    /// A shared signal source could not be accessed (its lock was poisoned
    /// by a panic on another thread).
    #[error("signal source is unavailable")]
    SourceUnavailable,
}
