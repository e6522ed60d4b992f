//! Timeline normalization.
//!
//! Both history shapes are turned into a [`Timeline`]: a strictly ordered
//! sequence of call and return [`Entry`] values in which every operation has
//! a dense id in `0..n` and contributes exactly one call and one return.
//!
//! Entries are ordered by time; at equal times calls come before returns.
//! That tie-break implements closed call/return intervals, so operations that
//! touch at a boundary stay concurrent.

use std::collections::HashMap;

use lincheck_core::{ClientId, EntryKind, Event, EventValue, HistoryError, Operation};

/// One half of an operation on the normalized timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry<I, O> {
    /// The call input or return output.
    pub value: EventValue<I, O>,
    /// Dense operation id, shared by a call and its return.
    pub id: usize,
    /// Wall-clock time for operation histories, position for event histories.
    pub time: i64,
    /// The client that issued the operation.
    pub client_id: ClientId,
}

impl<I, O> Entry<I, O> {
    /// Returns whether this entry is a call or a return.
    pub fn kind(&self) -> EntryKind {
        self.value.kind()
    }
}

/// A validated, time-ordered sequence of entries.
///
/// A `Timeline` can only be built through [`Timeline::from_operations`] or
/// [`Timeline::from_events`], so every id in `0..operations()` has exactly one
/// call followed (later on the timeline) by exactly one return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeline<I, O> {
    entries: Vec<Entry<I, O>>,
    operations: usize,
}

impl<I, O> Timeline<I, O> {
    /// Normalizes an operation history.
    ///
    /// Operation `i` of `history` gets id `i`.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::InvertedInterval`] if an operation returns
    /// before it is called.
    pub fn from_operations(history: Vec<Operation<I, O>>) -> Result<Self, HistoryError> {
        let operations = history.len();
        let mut entries = Vec::with_capacity(operations * 2);

        for (id, op) in history.into_iter().enumerate() {
            if op.return_time < op.call {
                return Err(HistoryError::InvertedInterval {
                    index: id,
                    call: op.call,
                    ret: op.return_time,
                });
            }
            entries.push(Entry {
                value: EventValue::Call(op.input),
                id,
                time: op.call,
                client_id: op.client_id,
            });
            entries.push(Entry {
                value: EventValue::Return(op.output),
                id,
                time: op.return_time,
                client_id: op.client_id,
            });
        }

        // Stable, so equal (time, kind) pairs keep history order.
        entries.sort_by(|a, b| a.time.cmp(&b.time).then_with(|| a.kind().cmp(&b.kind())));

        Ok(Self {
            entries,
            operations,
        })
    }

    /// Normalizes an event history.
    ///
    /// Ids are renumbered densely in order of first appearance and each
    /// event's position becomes its time.
    ///
    /// # Errors
    ///
    /// Returns an error naming the original id if an id is used by more than
    /// one call or return, a call or return has no partner, or a return
    /// precedes its call.
    pub fn from_events(history: Vec<Event<I, O>>) -> Result<Self, HistoryError> {
        let renumbered = renumber(&history)?;
        let operations = renumbered.len();

        let entries = history
            .into_iter()
            .enumerate()
            .map(|(position, event)| Entry {
                id: renumbered[&event.id],
                time: position as i64,
                client_id: event.client_id,
                value: event.value,
            })
            .collect();

        Ok(Self {
            entries,
            operations,
        })
    }

    /// The ordered entries.
    pub fn entries(&self) -> &[Entry<I, O>] {
        &self.entries
    }

    /// Number of operations (half the number of entries).
    pub fn operations(&self) -> usize {
        self.operations
    }

    /// Returns true if the timeline holds no operations.
    pub fn is_empty(&self) -> bool {
        self.operations == 0
    }

    /// Consumes the timeline, returning its entries.
    pub fn into_entries(self) -> Vec<Entry<I, O>> {
        self.entries
    }
}

#[derive(Default)]
struct Pairing {
    call: Option<usize>,
    ret: Option<usize>,
}

/// Validates call/return pairing and maps every original id to a dense id,
/// assigned in order of first appearance.
fn renumber<I, O>(history: &[Event<I, O>]) -> Result<HashMap<u64, usize>, HistoryError> {
    let mut order: Vec<u64> = Vec::new();
    let mut pairs: HashMap<u64, Pairing> = HashMap::new();

    for (position, event) in history.iter().enumerate() {
        let pairing = pairs.entry(event.id).or_insert_with(|| {
            order.push(event.id);
            Pairing::default()
        });
        match event.kind() {
            EntryKind::Call if pairing.call.is_some() => {
                return Err(HistoryError::DuplicateCall { id: event.id })
            }
            EntryKind::Call => pairing.call = Some(position),
            EntryKind::Return if pairing.ret.is_some() => {
                return Err(HistoryError::DuplicateReturn { id: event.id })
            }
            EntryKind::Return => pairing.ret = Some(position),
        }
    }

    let mut dense = HashMap::with_capacity(order.len());
    for (next, id) in order.into_iter().enumerate() {
        match &pairs[&id] {
            Pairing { call: None, .. } => return Err(HistoryError::UnmatchedReturn { id }),
            Pairing { ret: None, .. } => return Err(HistoryError::UnmatchedCall { id }),
            Pairing {
                call: Some(call),
                ret: Some(ret),
            } if ret < call => return Err(HistoryError::ReturnBeforeCall { id }),
            _ => {}
        }
        dense.insert(id, next);
    }
    Ok(dense)
}
