//! Checker configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::search::SearchOptions;

/// Configuration for the linearizability checker.
///
/// Deserializable from any serde format; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckerConfig {
    /// Wall-clock budget for one check in milliseconds (None for no timeout).
    /// When it elapses every partition search is cancelled and the result is
    /// `Unknown` unless some partition already proved the history illegal.
    pub timeout_ms: Option<u64>,

    /// Record partial linearizations for diagnostics. Verbose checks turn
    /// this on regardless.
    pub compute_partial: bool,

    /// Prune the search with the visited-state cache.
    pub enable_caching: bool,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            timeout_ms: None,
            compute_partial: false,
            enable_caching: true,
        }
    }
}

impl CheckerConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(timeout.as_millis().try_into().unwrap_or(u64::MAX));
        self
    }

    /// Disable timeout.
    pub fn without_timeout(mut self) -> Self {
        self.timeout_ms = None;
        self
    }

    /// Record partial linearizations.
    pub fn with_partial_linearizations(mut self) -> Self {
        self.compute_partial = true;
        self
    }

    /// Disable the visited-state cache.
    pub fn without_caching(mut self) -> Self {
        self.enable_caching = false;
        self
    }

    /// Returns the timeout as a Duration.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    pub(crate) fn search_options(&self, verbose: bool) -> SearchOptions {
        SearchOptions {
            compute_partial: verbose || self.compute_partial,
            enable_caching: self.enable_caching,
        }
    }
}
