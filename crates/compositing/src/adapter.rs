//! Raster source adapter: raw collected observations in, canonical layers
//! out.
//!
//! The core never downloads anything; it consumes whatever a collector
//! already placed on local storage. A missing or corrupt file means "that
//! observation is absent", never a run failure.

use raster_common::{AdapterError, BoundingBox, Crs, GridDefinition, RasterLayer};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// One raw observation as handed over by a collector: arbitrary grid,
/// arbitrary timestamp, arbitrary nodata sentinel.
///
/// This is also the on-disk observation document format (one JSON document
/// per observation), fully self-describing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawObservation {
    pub variable: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub crs: Crs,
    pub bbox: BoundingBox,
    pub width: usize,
    pub height: usize,
    /// Value marking missing cells; non-finite values are treated as
    /// missing regardless.
    #[serde(default)]
    pub nodata: Option<f32>,
    pub data: Vec<f32>,
}

/// Normalize a raw observation into a canonical layer.
///
/// Validates shape agreement and canonicalizes the nodata sentinel (and
/// any non-finite junk) to NaN, so that downstream code can rely on "every
/// cell is a valid measurement or NaN".
pub fn normalize(obs: RawObservation) -> Result<RasterLayer, AdapterError> {
    if obs.width == 0 || obs.height == 0 {
        return Err(AdapterError::EmptyGrid {
            variable: obs.variable,
        });
    }
    if obs.data.len() != obs.width * obs.height {
        return Err(AdapterError::LengthMismatch {
            width: obs.width,
            height: obs.height,
            actual: obs.data.len(),
        });
    }

    let grid = GridDefinition::new(obs.crs, obs.bbox, obs.width, obs.height);
    let data = obs
        .data
        .into_iter()
        .map(|v| {
            if !v.is_finite() || Some(v) == obs.nodata {
                f32::NAN
            } else {
                v
            }
        })
        .collect();

    Ok(RasterLayer::new(obs.variable, obs.timestamp, grid, data))
}

/// Load and normalize one observation document.
pub fn load_file(path: impl AsRef<Path>) -> Result<RasterLayer, AdapterError> {
    let text = std::fs::read_to_string(path.as_ref())?;
    let obs: RawObservation = serde_json::from_str(&text)?;
    normalize(obs)
}

/// Load every observation document under a directory tree.
///
/// Unreadable or malformed files are logged and skipped; the pipeline
/// treats them as absent observations.
pub fn load_directory(dir: impl AsRef<Path>) -> Vec<RasterLayer> {
    let mut layers = Vec::new();
    let mut skipped = 0usize;

    for entry in walkdir::WalkDir::new(dir.as_ref())
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .map(|ext| ext.eq_ignore_ascii_case("json"))
                .unwrap_or(false)
        })
    {
        match load_file(entry.path()) {
            Ok(layer) => layers.push(layer),
            Err(e) => {
                warn!(
                    path = %entry.path().display(),
                    error = %e,
                    "skipping unusable observation file"
                );
                skipped += 1;
            }
        }
    }

    info!(
        loaded = layers.len(),
        skipped,
        dir = %dir.as_ref().display(),
        "scanned observation directory"
    );
    layers
}
