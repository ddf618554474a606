//! Error types shared by the ingest half of the pipeline.

use thiserror::Error;

/// Spatial reconciliation failures.
///
/// Fatal to one variable's compositing, never to the whole run.
#[derive(Debug, Error)]
pub enum ReconciliationError {
    /// Source and target extents do not intersect at all.
    #[error("source extent {src} does not intersect target extent {target}")]
    NoOverlap { src: String, target: String },

    /// Source CRS differs from the run CRS; reprojection is an external
    /// concern, so the layer must be reprojected before it enters the core.
    #[error("source CRS {src} does not match run CRS {target}; reproject before ingest")]
    CrsMismatch { src: String, target: String },

    /// A categorical variable was configured with an averaging resampler.
    /// This is a correctness bug, not a quality trade-off, so it is
    /// rejected instead of applied.
    #[error("categorical variable `{variable}` requires nearest resampling, got {method}")]
    MethodMismatch { variable: String, method: String },

    /// Degenerate source or target grid.
    #[error("invalid grid: {0}")]
    InvalidGrid(String),
}

/// Temporal compositing failures.
#[derive(Debug, Error)]
pub enum CompositingError {
    /// The bin policy cannot produce a single full bin inside the window.
    #[error("time window {window} is shorter than one {policy} bin")]
    WindowTooShort { window: String, policy: String },

    /// Window end precedes window start.
    #[error("invalid time window: start {start} is not before end {end}")]
    InvalidWindow { start: String, end: String },

    /// A layer's grid does not match the run grid it should already be
    /// reconciled to.
    #[error("layer for `{variable}` is not on the run grid")]
    GridMismatch { variable: String },

    /// The bin policy itself is malformed (e.g. zero-day bins).
    #[error("invalid bin policy: {0}")]
    InvalidPolicy(String),

    /// No variable in the input had a usable configuration.
    #[error("no variables could be composited: {0}")]
    NothingToComposite(String),
}

/// Raw observation normalization failures.
///
/// The adapter treats these as "observation absent" at the run level; they
/// surface here so callers can log the cause.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Declared shape does not match the data length.
    #[error("data length {actual} does not match declared {width}x{height} grid")]
    LengthMismatch {
        width: usize,
        height: usize,
        actual: usize,
    },

    /// Zero-sized grid.
    #[error("observation for `{variable}` has an empty grid")]
    EmptyGrid { variable: String },

    /// The observation document could not be read or parsed.
    #[error("unreadable observation: {0}")]
    Unreadable(String),
}

impl From<std::io::Error> for AdapterError {
    fn from(err: std::io::Error) -> Self {
        Self::Unreadable(err.to_string())
    }
}

impl From<serde_json::Error> for AdapterError {
    fn from(err: serde_json::Error) -> Self {
        Self::Unreadable(err.to_string())
    }
}
