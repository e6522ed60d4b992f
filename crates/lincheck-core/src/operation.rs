//! Operation and event types.
//!
//! This module defines the two shapes in which a concurrent history can be
//! recorded. Both are consumed by the checker's normalizer, which turns them
//! into a single time-ordered sequence of call and return entries.

use crate::client::ClientId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One completed call by one client, with wall-clock call and return times.
///
/// The interval `[call, return_time]` is interpreted as a *closed* interval:
/// an operation that returns at the same instant another one is called is
/// concurrent with it. Timestamps taken from a monotonic clock can repeat, so
/// a half-open interpretation would reject correct histories.
///
/// # Examples
///
/// ```
/// use lincheck_core::{ClientId, Operation};
///
/// let put = Operation::new(ClientId(0), ("x", 1), 0, (), 10);
/// let get = Operation::new(ClientId(1), ("x", 0), 11, (), 20);
/// assert!(put.precedes(&get));
/// assert!(!put.overlaps(&get));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Operation<I, O> {
    /// The client that issued the call.
    #[serde(default)]
    pub client_id: ClientId,
    /// The call's argument.
    pub input: I,
    /// Time at which the call was invoked.
    pub call: i64,
    /// The value the call returned.
    pub output: O,
    /// Time at which the call returned.
    #[serde(rename = "return")]
    pub return_time: i64,
}

impl<I, O> Operation<I, O> {
    /// Creates a new operation.
    pub fn new(client_id: ClientId, input: I, call: i64, output: O, return_time: i64) -> Self {
        Self {
            client_id,
            input,
            call,
            output,
            return_time,
        }
    }

    /// Returns true if this operation returned strictly before `other` was
    /// called, so every linearization must place it first.
    pub fn precedes(&self, other: &Self) -> bool {
        self.return_time < other.call
    }

    /// Returns true if the closed call/return intervals intersect.
    pub fn overlaps(&self, other: &Self) -> bool {
        !self.precedes(other) && !other.precedes(self)
    }
}

/// Tags a history element as a call or a return.
///
/// The derived order puts `Call` before `Return`; the normalizer relies on it
/// to break timestamp ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// A function call.
    Call,
    /// A function return.
    Return,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::Call => write!(f, "call"),
            EntryKind::Return => write!(f, "return"),
        }
    }
}

/// The payload of one half of an operation: the input of a call, or the
/// output of a return.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum EventValue<I, O> {
    /// A call carrying its input.
    Call(I),
    /// A return carrying its output.
    Return(O),
}

impl<I, O> EventValue<I, O> {
    /// Returns whether this is a call or a return.
    pub fn kind(&self) -> EntryKind {
        match self {
            EventValue::Call(_) => EntryKind::Call,
            EventValue::Return(_) => EntryKind::Return,
        }
    }

    /// Returns the call input, if this is a call.
    pub fn input(&self) -> Option<&I> {
        match self {
            EventValue::Call(input) => Some(input),
            EventValue::Return(_) => None,
        }
    }

    /// Returns the return output, if this is a return.
    pub fn output(&self) -> Option<&O> {
        match self {
            EventValue::Call(_) => None,
            EventValue::Return(output) => Some(output),
        }
    }
}

/// One half of an operation in an untimed history.
///
/// A call and its return share `id`; each id must be used by exactly one call
/// and exactly one return, with the call first. Position in the history is the
/// only notion of time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Event<I, O> {
    /// The client that issued the call.
    #[serde(default)]
    pub client_id: ClientId,
    /// Correlates a call with its return.
    pub id: u64,
    /// The call input or return output.
    #[serde(flatten)]
    pub value: EventValue<I, O>,
}

impl<I, O> Event<I, O> {
    /// Creates a call event.
    pub fn call(client_id: ClientId, id: u64, input: I) -> Self {
        Self {
            client_id,
            id,
            value: EventValue::Call(input),
        }
    }

    /// Creates a return event.
    pub fn ret(client_id: ClientId, id: u64, output: O) -> Self {
        Self {
            client_id,
            id,
            value: EventValue::Return(output),
        }
    }

    /// Returns whether this event is a call or a return.
    pub fn kind(&self) -> EntryKind {
        self.value.kind()
    }
}
