//! Result types for linearizability checks.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::search::{SearchOutcome, SearchStats};

/// The verdict of a linearizability check.
///
/// Checking is NP-hard, so a check with a timeout may give up. An `Unknown`
/// verdict means no violation was found before the deadline; depending on the
/// use case it can be treated as `Ok`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CheckStatus {
    /// The history is linearizable.
    Ok,
    /// The history is not linearizable.
    Illegal,
    /// The check was cancelled or timed out before reaching a verdict.
    Unknown,
}

impl CheckStatus {
    /// Combines per-partition verdicts: one illegal partition makes the whole
    /// history illegal, otherwise any inconclusive partition makes it unknown.
    pub fn combine(statuses: impl IntoIterator<Item = CheckStatus>) -> CheckStatus {
        let mut combined = CheckStatus::Ok;
        for status in statuses {
            match status {
                CheckStatus::Illegal => return CheckStatus::Illegal,
                CheckStatus::Unknown => combined = CheckStatus::Unknown,
                CheckStatus::Ok => {}
            }
        }
        combined
    }
}

impl From<SearchOutcome> for CheckStatus {
    fn from(outcome: SearchOutcome) -> Self {
        match outcome {
            SearchOutcome::Linearizable => CheckStatus::Ok,
            SearchOutcome::Illegal => CheckStatus::Illegal,
            SearchOutcome::Cancelled => CheckStatus::Unknown,
        }
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckStatus::Ok => write!(f, "OK"),
            CheckStatus::Illegal => write!(f, "ILLEGAL"),
            CheckStatus::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Verdict and counters for one partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionReport {
    /// Position of the partition in the model's partitioning.
    pub index: usize,
    /// Number of operations in the partition.
    pub operations: usize,
    /// The partition's own verdict.
    pub status: CheckStatus,
    /// Search counters for the partition.
    pub stats: SearchStats,
}

/// The result of a linearizability check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    /// The overall verdict.
    pub status: CheckStatus,
    /// Time taken to perform the check.
    pub duration: Duration,
    /// Statistics summed over all partitions.
    pub stats: CheckStats,
    /// Per-partition verdicts, in partition order.
    pub partitions: Vec<PartitionReport>,
}

impl CheckResult {
    /// Builds a result from per-partition reports.
    pub fn from_partitions(partitions: Vec<PartitionReport>, duration: Duration) -> Self {
        let status = CheckStatus::combine(partitions.iter().map(|p| p.status));
        let mut stats = CheckStats {
            num_partitions: partitions.len(),
            ..CheckStats::default()
        };
        for partition in &partitions {
            stats.num_operations += partition.operations;
            stats.search.merge(&partition.stats);
        }
        Self {
            status,
            duration,
            stats,
            partitions,
        }
    }

    /// Check if this result indicates the history is linearizable.
    pub fn is_ok(&self) -> bool {
        matches!(self.status, CheckStatus::Ok)
    }

    /// Check if this result indicates the history is not linearizable.
    pub fn is_illegal(&self) -> bool {
        matches!(self.status, CheckStatus::Illegal)
    }

    /// Check if the result is inconclusive.
    pub fn is_unknown(&self) -> bool {
        matches!(self.status, CheckStatus::Unknown)
    }
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CheckResult {{ status: {}, duration: {:?}, partitions: {} }}",
            self.status,
            self.duration,
            self.partitions.len()
        )
    }
}

/// Statistics about the checking process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckStats {
    /// Number of operations in the history.
    pub num_operations: usize,
    /// Number of partitions searched.
    pub num_partitions: usize,
    /// Search counters summed over partitions.
    pub search: SearchStats,
}

impl fmt::Display for CheckStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Stats {{ ops: {}, partitions: {}, states: {}, backtracks: {}, cache hits: {} }}",
            self.num_operations,
            self.num_partitions,
            self.search.states_explored,
            self.search.backtracks,
            self.search.cache_hits
        )
    }
}
