//! Lincheck Checker - Linearizability checking for concurrent histories
//!
//! This crate decides whether a recorded history of concurrent operations is
//! linearizable with respect to a sequential [`Model`], using the Wing-Gong
//! search with Lowe's visited-state cache.
//!
//! - [`model`]: The model contract, plus the power-set adapter for
//!   nondeterministic models
//! - [`entry`]: Normalizing histories into timelines
//! - [`search`]: The single-partition search
//! - [`checker`]: Partitioning, parallel search, timeouts and cancellation
//! - [`info`]: Witnesses (full and partial linearizations)
//! - [`models`]: Reference models
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//!
//! use lincheck_checker::models::{RegisterInput, RegisterModel};
//! use lincheck_checker::{CheckStatus, LinearizabilityChecker};
//! use lincheck_core::{ClientId, Operation};
//!
//! # #[tokio::main] async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // A stale read: the put finished before the get started.
//! let history = vec![
//!     Operation::new(ClientId(0), RegisterInput::Put(1), 0, 0, 10),
//!     Operation::new(ClientId(1), RegisterInput::Get, 20, 0, 30),
//! ];
//! let checker = LinearizabilityChecker::new(RegisterModel)
//!     .with_timeout(Duration::from_secs(30));
//! let result = checker.check_operations(history).await?;
//! assert_eq!(result.status, CheckStatus::Illegal);
//! # Ok(()) }
//! ```

mod bitset;
mod cache;
pub mod checker;
pub mod config;
pub mod entry;
pub mod error;
pub mod info;
mod linked;
pub mod model;
pub mod models;
pub mod result;
pub mod search;

pub use checker::{
    check_events, check_events_timeout, check_operations, check_operations_timeout,
    CancelHandle, LinearizabilityChecker,
};
pub use config::CheckerConfig;
pub use entry::{Entry, Timeline};
pub use error::{CheckerError, Result};
pub use info::LinearizationInfo;
pub use model::{Model, NondeterministicModel, PowerSetModel};
pub use result::{CheckResult, CheckStats, CheckStatus, PartitionReport};
pub use search::{check_single, SearchOptions, SearchOutcome, SearchReport, SearchStats};

// Re-export core types for convenience
pub use lincheck_core::{ClientId, Event, EventValue, HistoryError, Operation};
