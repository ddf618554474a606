//! Error types for graph construction and evaluation.

use raster_common::ReconciliationError;
use thiserror::Error;

/// Structural errors: these abort the whole run, unlike per-node failures
/// which are contained and reported.
#[derive(Debug, Error)]
pub enum GraphError {
    /// The transfer-function library declares a dependency cycle. Should
    /// never happen for a correct library; checked defensively.
    #[error("dependency cycle detected involving `{0}`")]
    CyclicGraph(String),

    /// Conflicting or invalid enhancer/sideload registration.
    #[error("registration error: {0}")]
    Registration(String),

    /// None of the requested outputs can be computed from the available
    /// inputs.
    #[error("request is unsatisfiable: {0}")]
    Unsatisfiable(String),

    /// Invalid executor configuration.
    #[error("invalid executor configuration: {0}")]
    InvalidConfig(String),

    /// A sideloaded dataset could not be placed on the run grid.
    #[error("sideload reconciliation failed: {0}")]
    Sideload(#[from] ReconciliationError),
}

/// Errors raised inside a transfer function or enhancer while computing
/// one chunk. Caught per node: the node is marked failed, its dependents
/// are poisoned, and unrelated branches keep running.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Wrong number of dependency chunks.
    #[error("expected {expected} dependency chunks, got {actual}")]
    Arity { expected: usize, actual: usize },

    /// A dependency chunk does not match the evaluation window.
    #[error("chunk length {actual} does not match window length {expected}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// A user-supplied enhancer reported a failure.
    #[error("enhancer failed: {0}")]
    Enhancer(String),

    /// A dependency buffer was not available at evaluation time. Indicates
    /// a scheduling bug, surfaced as a node failure rather than a panic.
    #[error("dependency `{0}` unavailable")]
    DependencyUnavailable(String),

    /// Evaluation was cancelled between chunks.
    #[error("run cancelled")]
    Cancelled,
}
