//! Reference models.
//!
//! Ready-made sequential specifications for common objects. They double as
//! examples of implementing [`Model`](crate::Model) and
//! [`NondeterministicModel`](crate::NondeterministicModel).

mod kv;
mod nondeterministic;
mod register;

pub use kv::{KvInput, KvModel, KvOp};
pub use nondeterministic::NondeterministicRegister;
pub use register::{RegisterInput, RegisterModel};
