//! Observation ingest and temporal compositing.
//!
//! This crate turns heterogeneous, irregularly timed raster observations
//! into `ds_in`: a dataset of contiguous, regularly binned composites on a
//! single run grid.
//!
//! ```text
//! raw observations (any grid, any timestamp)
//!      │
//!      ▼
//! adapter::normalize ──► RasterLayer (nodata canonicalized to NaN)
//!      │
//!      ▼
//! reconcile::reconcile ──► RasterLayer on the run grid
//!      │
//!      ▼
//! compositor::composite_dataset ──► Dataset (ds_in)
//! ```
//!
//! Per-variable behaviour (resampling method, reducer, gap-fill) comes from
//! an explicit [`config::CompositingConfig`]; there are no module-level
//! defaults that vary by call site.

pub mod adapter;
pub mod compositor;
pub mod config;
pub mod reconcile;
pub mod resample;

pub use adapter::RawObservation;
pub use compositor::{composite_dataset, composite_variable, Reducer};
pub use config::{CompositingConfig, GapFillPolicy, VariableConfig, VariableKind};
pub use reconcile::reconcile;
pub use resample::{resample_to_grid, ResampleMethod};
