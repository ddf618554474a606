//! Common types shared across the et-pipeline workspace.
//!
//! Everything that crosses a crate boundary lives here: bounding boxes,
//! grid definitions, raster layers, composites, datasets and the time-bin
//! policies that shape a run's temporal axis.

pub mod bbox;
pub mod crs;
pub mod dataset;
pub mod error;
pub mod grid;
pub mod layer;
pub mod time;

pub use bbox::BoundingBox;
pub use crs::Crs;
pub use dataset::{Composite, Dataset, GapFillMethod, Provenance};
pub use error::{AdapterError, CompositingError, ReconciliationError};
pub use grid::{GridDefinition, PixelWindow};
pub use layer::RasterLayer;
pub use time::{BinPeriod, BinPolicy, TimeWindow};
