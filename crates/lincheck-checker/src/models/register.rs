use serde::{Deserialize, Serialize};

use crate::model::Model;

/// An operation on a single integer register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegisterInput {
    /// Overwrites the register. Its output is ignored.
    Put(i64),
    /// Reads the register. Its output is the value read.
    Get,
}

/// A single integer register, initially `0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegisterModel;

impl Model for RegisterModel {
    type State = i64;
    type Input = RegisterInput;
    type Output = i64;

    fn init(&self) -> i64 {
        0
    }

    fn step(&self, state: &i64, input: &RegisterInput, output: &i64) -> Option<i64> {
        match input {
            RegisterInput::Put(value) => Some(*value),
            RegisterInput::Get => (output == state).then_some(*state),
        }
    }

    fn describe_operation(&self, input: &RegisterInput, output: &i64) -> String {
        match input {
            RegisterInput::Put(value) => format!("put({value})"),
            RegisterInput::Get => format!("get() -> {output}"),
        }
    }

    fn name(&self) -> &str {
        "register"
    }
}
