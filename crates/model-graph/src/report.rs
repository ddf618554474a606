//! Run reporting: per-node lifecycle states and the end-of-run summary.

use crate::graph::DroppedOutput;
use serde::Serialize;

/// Lifecycle state of one graph node during a run.
///
/// Evaluated nodes move `Pending -> Scheduled -> Computed | Failed`; input
/// and sideloaded nodes are terminal from the start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    Pending,
    Scheduled,
    Computed,
    Failed,
    /// Read from the input dataset, never evaluated.
    Input,
    /// Substituted from a sideloaded dataset, never evaluated.
    Sideloaded,
}

/// Whether the run ran to completion or was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    Cancelled,
}

/// A node whose evaluation failed, with the first error observed.
#[derive(Debug, Clone, Serialize)]
pub struct FailedNode {
    pub name: String,
    pub reason: String,
}

/// End-of-run summary: what was produced, what was substituted, what was
/// dropped before the run and what failed during it.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub status: RunStatus,
    /// Requested outputs that were produced by evaluation.
    pub computed: Vec<String>,
    /// Requested outputs satisfied by sideloaded or input data.
    pub substituted: Vec<String>,
    /// Requested outputs dropped at graph build for missing inputs.
    pub dropped: Vec<DroppedOutput>,
    /// Nodes that failed during evaluation, including poisoned dependents.
    pub failed: Vec<FailedNode>,
}

impl RunReport {
    /// True when every requested output was produced.
    pub fn is_clean(&self) -> bool {
        self.status == RunStatus::Completed && self.dropped.is_empty() && self.failed.is_empty()
    }
}
