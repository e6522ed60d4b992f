//! Error types for malformed histories.
//!
//! A history that breaks the call/return pairing contract is rejected before
//! any search runs. These errors describe which operation id broke it.

use thiserror::Error;

/// Errors that can occur while loading or normalizing a history.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// A call event has no matching return event.
    #[error("call for operation {id} has no matching return")]
    UnmatchedCall { id: u64 },

    /// A return event has no matching call event.
    #[error("return for operation {id} has no matching call")]
    UnmatchedReturn { id: u64 },

    /// The same id was used for more than one call.
    #[error("operation id {id} is used by more than one call")]
    DuplicateCall { id: u64 },

    /// The same id was used for more than one return.
    #[error("operation id {id} is used by more than one return")]
    DuplicateReturn { id: u64 },

    /// A return event appears before its call event.
    #[error("return for operation {id} precedes its call")]
    ReturnBeforeCall { id: u64 },

    /// An operation returned before it was called.
    #[error("operation at index {index} returns at {ret} before its call at {call}")]
    InvertedInterval { index: usize, call: i64, ret: i64 },

    /// Failed to deserialize a history.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Failed to read history data.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HistoryError {
    /// Returns true if the error is a violation of the call/return pairing
    /// contract rather than a loading failure.
    pub fn is_contract_violation(&self) -> bool {
        !matches!(self, Self::Serialization(_) | Self::Io(_))
    }
}
