//! Raster layers: one observation of one variable on one grid.

use crate::grid::GridDefinition;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single raster observation.
///
/// Values are stored row-major, top-to-bottom. Missing cells are `f32::NAN`;
/// the source adapter canonicalizes nodata sentinels so that downstream code
/// never sees a silent zero standing in for a gap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RasterLayer {
    /// Variable name (e.g. "ndvi", "t_air_24").
    pub variable: String,
    /// Acquisition timestamp.
    pub timestamp: DateTime<Utc>,
    /// Spatial addressing of `data`.
    pub grid: GridDefinition,
    /// Cell values, `grid.len()` long.
    pub data: Vec<f32>,
}

impl RasterLayer {
    /// Create a new layer. The caller guarantees `data.len() == grid.len()`;
    /// the adapter is the validating entry point for untrusted input.
    pub fn new(
        variable: impl Into<String>,
        timestamp: DateTime<Utc>,
        grid: GridDefinition,
        data: Vec<f32>,
    ) -> Self {
        debug_assert_eq!(data.len(), grid.len());
        Self {
            variable: variable.into(),
            timestamp,
            grid,
            data,
        }
    }

    /// Get the value at a specific cell.
    pub fn get(&self, col: usize, row: usize) -> Option<f32> {
        if col >= self.grid.width || row >= self.grid.height {
            return None;
        }
        self.data.get(row * self.grid.width + col).copied()
    }

    /// Get the value at a geographic coordinate (nearest cell).
    pub fn get_at_coords(&self, lon: f64, lat: f64) -> Option<f32> {
        let (col, row) = self.grid.coords_to_cell(lon, lat)?;
        self.get(col, row)
    }

    /// Fraction of cells holding a valid (non-NaN) value.
    pub fn valid_fraction(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        let valid = self.data.iter().filter(|v| !v.is_nan()).count();
        valid as f64 / self.data.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bbox::BoundingBox;
    use chrono::TimeZone;

    fn layer() -> RasterLayer {
        let grid = GridDefinition::geographic(BoundingBox::new(0.0, 0.0, 3.0, 3.0), 3, 3);
        let data: Vec<f32> = (0..9).map(|i| i as f32).collect();
        RasterLayer::new(
            "ndvi",
            Utc.with_ymd_and_hms(2023, 3, 1, 10, 30, 0).unwrap(),
            grid,
            data,
        )
    }

    #[test]
    fn test_get() {
        let l = layer();
        assert_eq!(l.get(0, 0), Some(0.0));
        assert_eq!(l.get(2, 2), Some(8.0));
        assert_eq!(l.get(3, 0), None);
    }

    #[test]
    fn test_get_at_coords() {
        let l = layer();
        // Top-left cell center.
        assert_eq!(l.get_at_coords(0.5, 2.5), Some(0.0));
        // Bottom-right cell.
        assert_eq!(l.get_at_coords(2.5, 0.5), Some(8.0));
        assert_eq!(l.get_at_coords(5.0, 0.5), None);
    }

    #[test]
    fn test_valid_fraction() {
        let mut l = layer();
        assert!((l.valid_fraction() - 1.0).abs() < f64::EPSILON);
        l.data[0] = f32::NAN;
        l.data[1] = f32::NAN;
        l.data[2] = f32::NAN;
        assert!((l.valid_fraction() - 6.0 / 9.0).abs() < 1e-12);
    }
}
