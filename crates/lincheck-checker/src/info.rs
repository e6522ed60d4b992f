//! Witness reconstruction.
//!
//! A verbose check returns a [`LinearizationInfo`]: the normalized timeline
//! of every partition plus the witnesses found for it, as operation-id
//! sequences. The methods here map those ids back to operations.

use std::collections::HashMap;

use lincheck_core::{EventValue, Operation};

use crate::entry::Entry;
use crate::model::Model;

/// Partial linearizations found during a check, per partition.
///
/// For a linearizable partition the witness set holds one complete
/// linearization. For an illegal one it holds the maximal partial
/// linearizations found, at most one per operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinearizationInfo<I, O> {
    /// For each partition, its normalized entries.
    pub history: Vec<Vec<Entry<I, O>>>,
    /// For each partition, a set of witnesses (sequences of operation ids).
    pub partial_linearizations: Vec<Vec<Vec<usize>>>,
}

impl<I: Clone, O: Clone> LinearizationInfo<I, O> {
    /// Returns the witnesses with ids replaced by the operations they name.
    ///
    /// # Panics
    ///
    /// Panics if a call has no return in its partition or a witness names an
    /// id with no operation. Witnesses only ever contain ids drawn from the
    /// partition, so either case means the checker itself is broken.
    pub fn partial_linearizations_operations(&self) -> Vec<Vec<Vec<Operation<I, O>>>> {
        self.history
            .iter()
            .zip(&self.partial_linearizations)
            .map(|(entries, witnesses)| {
                let operations = rebuild_operations(entries);
                witnesses
                    .iter()
                    .map(|witness| {
                        witness
                            .iter()
                            .map(|id| match operations.get(id) {
                                Some(op) => op.clone(),
                                None => panic!("witness names operation {id} missing from its partition"),
                            })
                            .collect()
                    })
                    .collect()
            })
            .collect()
    }

    /// Returns every witness as a list of operation descriptions produced by
    /// the model's `describe_operation`.
    pub fn describe<M>(&self, model: &M) -> Vec<Vec<Vec<String>>>
    where
        M: Model<Input = I, Output = O>,
    {
        self.partial_linearizations_operations()
            .into_iter()
            .map(|witnesses| {
                witnesses
                    .into_iter()
                    .map(|ops| {
                        ops.iter()
                            .map(|op| model.describe_operation(&op.input, &op.output))
                            .collect()
                    })
                    .collect()
            })
            .collect()
    }

    /// Number of partitions.
    pub fn num_partitions(&self) -> usize {
        self.history.len()
    }
}

fn rebuild_operations<I: Clone, O: Clone>(entries: &[Entry<I, O>]) -> HashMap<usize, Operation<I, O>> {
    let mut calls: HashMap<usize, &Entry<I, O>> = HashMap::new();
    let mut returns: HashMap<usize, &Entry<I, O>> = HashMap::new();
    for entry in entries {
        match entry.value {
            EventValue::Call(_) => calls.insert(entry.id, entry),
            EventValue::Return(_) => returns.insert(entry.id, entry),
        };
    }

    calls
        .into_iter()
        .map(|(id, call)| {
            let Some(ret) = returns.get(&id) else {
                panic!("call for operation {id} has no return in its partition");
            };
            let (EventValue::Call(input), EventValue::Return(output)) = (&call.value, &ret.value)
            else {
                unreachable!("entries are keyed by kind");
            };
            let op = Operation::new(
                call.client_id,
                input.clone(),
                call.time,
                output.clone(),
                ret.time,
            );
            (id, op)
        })
        .collect()
}
