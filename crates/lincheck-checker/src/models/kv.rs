use std::collections::HashMap;

use lincheck_core::{Event, EventValue, Operation};
use serde::{Deserialize, Serialize};

use crate::model::Model;

/// Kind of key/value operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KvOp {
    /// Reads the key.
    Get,
    /// Overwrites the key.
    Put,
    /// Appends to the key's current value.
    Append,
}

/// An operation on one key of a key/value store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KvInput {
    /// What the operation does.
    pub op: KvOp,
    /// The key it touches.
    pub key: String,
    /// Value written by `Put` and `Append`, empty for `Get`.
    #[serde(default)]
    pub value: String,
}

impl KvInput {
    /// A read of `key`.
    pub fn get(key: impl Into<String>) -> Self {
        Self {
            op: KvOp::Get,
            key: key.into(),
            value: String::new(),
        }
    }

    /// A write of `value` to `key`.
    pub fn put(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            op: KvOp::Put,
            key: key.into(),
            value: value.into(),
        }
    }

    /// An append of `value` to `key`.
    pub fn append(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            op: KvOp::Append,
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A string key/value store where missing keys read as `""`.
///
/// Keys are independent, so histories are partitioned by key and each
/// partition's state is just the value of that key.
#[derive(Debug, Clone, Copy, Default)]
pub struct KvModel;

impl Model for KvModel {
    type State = String;
    type Input = KvInput;
    type Output = String;

    fn init(&self) -> String {
        String::new()
    }

    fn step(&self, state: &String, input: &KvInput, output: &String) -> Option<String> {
        match input.op {
            KvOp::Get => (output == state).then(|| state.clone()),
            KvOp::Put => Some(input.value.clone()),
            KvOp::Append => Some(format!("{state}{}", input.value)),
        }
    }

    fn partition(&self, history: Vec<Operation<KvInput, String>>) -> Vec<Vec<Operation<KvInput, String>>> {
        let mut order: Vec<String> = Vec::new();
        let mut by_key: HashMap<String, Vec<Operation<KvInput, String>>> = HashMap::new();
        for op in history {
            if !by_key.contains_key(&op.input.key) {
                order.push(op.input.key.clone());
            }
            by_key.entry(op.input.key.clone()).or_default().push(op);
        }
        order
            .into_iter()
            .filter_map(|key| by_key.remove(&key))
            .collect()
    }

    /// Returns carry no key, so they follow their call's partition. Returns
    /// whose call never appeared are gathered in a trailing partition, where
    /// normalization reports them.
    fn partition_events(&self, history: Vec<Event<KvInput, String>>) -> Vec<Vec<Event<KvInput, String>>> {
        let mut order: Vec<String> = Vec::new();
        let mut by_key: HashMap<String, Vec<Event<KvInput, String>>> = HashMap::new();
        let mut key_of: HashMap<u64, String> = HashMap::new();
        let mut orphans = Vec::new();
        for event in history {
            let key = match &event.value {
                EventValue::Call(input) => {
                    key_of.insert(event.id, input.key.clone());
                    Some(input.key.clone())
                }
                EventValue::Return(_) => key_of.get(&event.id).cloned(),
            };
            match key {
                Some(key) => {
                    if !by_key.contains_key(&key) {
                        order.push(key.clone());
                    }
                    by_key.entry(key).or_default().push(event);
                }
                None => orphans.push(event),
            }
        }

        let mut partitions: Vec<_> = order
            .into_iter()
            .filter_map(|key| by_key.remove(&key))
            .collect();
        if !orphans.is_empty() {
            partitions.push(orphans);
        }
        partitions
    }

    fn describe_operation(&self, input: &KvInput, output: &String) -> String {
        match input.op {
            KvOp::Get => format!("get('{}') -> '{}'", input.key, output),
            KvOp::Put => format!("put('{}', '{}')", input.key, input.value),
            KvOp::Append => format!("append('{}', '{}')", input.key, input.value),
        }
    }

    fn describe_state(&self, state: &String) -> String {
        format!("'{state}'")
    }

    fn name(&self) -> &str {
        "kv"
    }
}
