use crate::model::NondeterministicModel;
use crate::models::RegisterInput;

/// A register whose writes may be silently dropped.
///
/// After a `Put` the register holds either the new value or the value it
/// held before. Wrap it in [`PowerSetModel`](crate::PowerSetModel) to check
/// histories against it.
#[derive(Debug, Clone, Copy, Default)]
pub struct NondeterministicRegister;

impl NondeterministicModel for NondeterministicRegister {
    type State = i64;
    type Input = RegisterInput;
    type Output = i64;

    fn init(&self) -> Vec<i64> {
        vec![0]
    }

    fn step(&self, state: &i64, input: &RegisterInput, output: &i64) -> Vec<i64> {
        match input {
            RegisterInput::Put(value) if value == state => vec![*value],
            RegisterInput::Put(value) => vec![*value, *state],
            RegisterInput::Get if output == state => vec![*state],
            RegisterInput::Get => Vec::new(),
        }
    }

    fn describe_operation(&self, input: &RegisterInput, output: &i64) -> String {
        match input {
            RegisterInput::Put(value) => format!("put({value})"),
            RegisterInput::Get => format!("get() -> {output}"),
        }
    }

    fn name(&self) -> &str {
        "lossy-register"
    }
}
