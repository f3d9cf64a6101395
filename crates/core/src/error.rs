//! Error kinds shared by every backend.

use thiserror::Error;

use robinhood_model::FilterError;

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong talking to a backend.
///
/// Exhaustion of a cursor is not an error: cursors signal it structurally by
/// returning `Ok(None)` from `next`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Malformed URI or bad argument (a zero chunk size, an out-of-range
    /// capacity, ...).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A filter failed validation; the payload pinpoints the offending node.
    #[error("invalid filter: {0}")]
    InvalidFilter(#[from] FilterError),

    /// The queried entry does not exist.
    #[error("no such entry")]
    NoSuchEntry,

    /// An allocation or buffering limit was hit.
    #[error("out of memory")]
    OutOfMemory,

    /// A transient backend condition; resubmitting the same request may
    /// succeed.
    #[error("try again later: {0}")]
    RetryLater(String),

    /// Any other driver-reported failure, with the driver's own message.
    #[error("backend error: {0}")]
    BackendError(String),

    /// The backend plugin is missing or unloadable.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),
}

impl Error {
    /// Shorthand for an `InvalidInput` with a formatted message.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Error::InvalidInput(message.into())
    }
}
