//! Loading recorded histories.
//!
//! Histories are stored as JSON arrays of [`Operation`] or [`Event`] values.
//! Loading only checks the JSON shape; the pairing contract of event
//! histories is enforced later by the checker's normalizer.

use std::io::Read;

use serde::de::DeserializeOwned;

use crate::error::HistoryError;
use crate::operation::{Event, Operation};

/// Parses a JSON array of operations.
///
/// Operations whose return time precedes their call time are rejected here,
/// since nothing downstream can make sense of them.
pub fn operations_from_json<I, O>(json: &str) -> Result<Vec<Operation<I, O>>, HistoryError>
where
    I: DeserializeOwned,
    O: DeserializeOwned,
{
    let operations: Vec<Operation<I, O>> = serde_json::from_str(json)?;
    for (index, op) in operations.iter().enumerate() {
        if op.return_time < op.call {
            return Err(HistoryError::InvertedInterval {
                index,
                call: op.call,
                ret: op.return_time,
            });
        }
    }
    Ok(operations)
}

/// Parses a JSON array of events.
pub fn events_from_json<I, O>(json: &str) -> Result<Vec<Event<I, O>>, HistoryError>
where
    I: DeserializeOwned,
    O: DeserializeOwned,
{
    Ok(serde_json::from_str(json)?)
}

/// Reads a whole history document from `reader` into a string.
pub fn read_document(mut reader: impl Read) -> Result<String, HistoryError> {
    let mut buf = String::new();
    reader.read_to_string(&mut buf)?;
    Ok(buf)
}
