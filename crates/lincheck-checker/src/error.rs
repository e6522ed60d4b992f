//! Error types for the checker.
//!
//! Verdicts are never errors: `Illegal` and `Unknown` are ordinary values of
//! [`CheckStatus`](crate::result::CheckStatus). Errors cover malformed input
//! and failures of the search tasks themselves.

use lincheck_core::HistoryError;
use thiserror::Error;

/// Errors that can occur while running a check.
#[derive(Debug, Error)]
pub enum CheckerError {
    /// The history (or one of the model's partitions of it) is malformed.
    #[error("invalid history: {0}")]
    History(#[from] HistoryError),

    /// A partition's search task panicked or was aborted.
    #[error("search task for partition {partition} failed: {message}")]
    TaskFailed { partition: usize, message: String },
}

/// Result type alias for checker operations.
pub type Result<T> = std::result::Result<T, CheckerError>;
