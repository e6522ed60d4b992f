//! Lincheck Core - History types for linearizability checking.
//!
//! This crate provides the data model that flows into the checker:
//!
//! - [`client`]: Client identification (`ClientId`)
//! - [`operation`]: Timestamped operations and untimed call/return events
//! - [`history`]: Loading histories from JSON
//! - [`error`]: Error types for malformed histories
//!
//! # Overview
//!
//! A history can be recorded in one of two shapes. An [`Operation`] carries
//! both halves of a call together with wall-clock call and return times. An
//! [`Event`] carries only one half (the call or the return), and the order of
//! events in the history is the only notion of time.
//!
//! # Example
//!
//! ```
//! use lincheck_core::{ClientId, Event, Operation};
//!
//! let op: Operation<&str, u32> = Operation::new(ClientId(0), "get", 10, 7, 20);
//! assert!(op.overlaps(&Operation::new(ClientId(1), "get", 20, 7, 30)));
//!
//! let events: Vec<Event<&str, u32>> = vec![
//!     Event::call(ClientId(0), 0, "get"),
//!     Event::ret(ClientId(0), 0, 7),
//! ];
//! assert_eq!(events.len(), 2);
//! ```

pub mod client;
pub mod error;
pub mod history;
pub mod operation;

pub use client::ClientId;
pub use error::HistoryError;
pub use history::{events_from_json, operations_from_json};
pub use operation::{EntryKind, Event, EventValue, Operation};
