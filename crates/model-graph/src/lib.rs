//! Transfer-function graph construction and chunked parallel evaluation.
//!
//! The compute half of the pipeline. A composited input dataset goes in,
//! requested output variables come out:
//!
//! ```text
//!   ds_in ──> Graph::build ──> Executor::execute ──> ds_out
//!               │    │              │
//!        library + registry    rayon chunk pool
//! ```
//!
//! [`Graph::build`] resolves the requested outputs against the built-in
//! transfer-function library, the input dataset and any registered
//! sideloads, prunes to the reachable subgraph, and drops outputs whose
//! inputs are missing. [`Executor`] then evaluates the graph bin by bin
//! and chunk by chunk in parallel, with per-node failure containment,
//! cooperative cancellation and bounded buffer lifetimes.

pub mod diagnostics;
pub mod error;
pub mod executor;
pub mod graph;
pub mod library;
pub mod registry;
pub mod report;
pub mod viz;

pub use diagnostics::{DiagnosticPixel, DiagnosticTrace, TraceRecord};
pub use error::{GraphError, TransferError};
pub use executor::{CancelToken, Executor, ExecutorConfig, RunOutcome};
pub use graph::{DroppedOutput, Graph, Node, NodeKind};
pub use library::{ChunkContext, ChunkFn, TransferSpec, DEFAULT_OUTPUTS};
pub use registry::{Enhancer, EnhancerFn, EnhancerMode, Registry};
pub use report::{FailedNode, NodeStatus, RunReport, RunStatus};
