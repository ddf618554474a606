//! Resampling kernels for grid-to-grid transfers.
//!
//! All kernels are NaN-aware: a nodata cell never skews a valid result,
//! and a result is nodata only when the kernel's support holds no valid
//! source value (bilinear is stricter, see below).

use raster_common::GridDefinition;
use serde::{Deserialize, Serialize};

/// Resampling method for grid reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResampleMethod {
    /// Nearest neighbor (preserves exact values; required for categorical
    /// variables).
    Nearest,
    /// Bilinear interpolation (smooth; default for continuous variables).
    #[default]
    Bilinear,
    /// Mean of all source cells covered by the target cell; appropriate
    /// when the target grid is much coarser than the source.
    AreaWeighted,
}

impl ResampleMethod {
    /// Parse from string (case-insensitive).
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "nearest" => Self::Nearest,
            "area_weighted" | "average" | "mean" => Self::AreaWeighted,
            _ => Self::Bilinear,
        }
    }
}

impl std::fmt::Display for ResampleMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Nearest => write!(f, "nearest"),
            Self::Bilinear => write!(f, "bilinear"),
            Self::AreaWeighted => write!(f, "area_weighted"),
        }
    }
}

/// Nearest neighbor sample at fractional cell coordinates.
pub fn nearest_sample(data: &[f32], width: usize, height: usize, x: f64, y: f64) -> f32 {
    if x < -0.5 || y < -0.5 {
        return f32::NAN;
    }
    let col = x.round() as usize;
    let row = y.round() as usize;

    if col >= width || row >= height {
        return f32::NAN;
    }

    data[row * width + col]
}

/// Bilinear sample at fractional cell coordinates.
///
/// If any of the four corners is NaN the result is NaN; blending a valid
/// value with nodata would fabricate data.
pub fn bilinear_sample(data: &[f32], width: usize, height: usize, x: f64, y: f64) -> f32 {
    if x < 0.0 || y < 0.0 {
        return f32::NAN;
    }
    let x0 = x.floor() as usize;
    let y0 = y.floor() as usize;

    if x0 >= width || y0 >= height {
        return f32::NAN;
    }

    let x1 = (x0 + 1).min(width - 1);
    let y1 = (y0 + 1).min(height - 1);

    let xf = (x - x0 as f64) as f32;
    let yf = (y - y0 as f64) as f32;

    let v00 = data[y0 * width + x0];
    let v10 = data[y0 * width + x1];
    let v01 = data[y1 * width + x0];
    let v11 = data[y1 * width + x1];

    if v00.is_nan() || v10.is_nan() || v01.is_nan() || v11.is_nan() {
        return f32::NAN;
    }

    let top = v00 * (1.0 - xf) + v10 * xf;
    let bottom = v01 * (1.0 - xf) + v11 * xf;
    top * (1.0 - yf) + bottom * yf
}

/// Mean of the source cells in the inclusive block `[x0..=x1, y0..=y1]`,
/// ignoring NaN. NaN if the block holds no valid value.
pub fn block_mean(
    data: &[f32],
    width: usize,
    height: usize,
    x0: usize,
    x1: usize,
    y0: usize,
    y1: usize,
) -> f32 {
    let mut sum = 0.0f64;
    let mut count = 0usize;

    for row in y0..=y1.min(height.saturating_sub(1)) {
        for col in x0..=x1.min(width.saturating_sub(1)) {
            let v = data[row * width + col];
            if !v.is_nan() {
                sum += v as f64;
                count += 1;
            }
        }
    }

    if count == 0 {
        f32::NAN
    } else {
        (sum / count as f64) as f32
    }
}

/// Resample source data onto a target grid.
///
/// Both grids must share a CRS (checked by the reconciler, not here).
/// Target cells outside the source extent become NaN.
pub fn resample_to_grid(
    data: &[f32],
    source: &GridDefinition,
    target: &GridDefinition,
    method: ResampleMethod,
) -> Vec<f32> {
    let mut output = vec![f32::NAN; target.len()];
    let (src_res_x, src_res_y) = source.resolution();
    let (dst_res_x, dst_res_y) = target.resolution();

    for row in 0..target.height {
        for col in 0..target.width {
            let (lon, lat) = target.cell_to_coords(col, row);
            if !source.bbox.contains(lon, lat) {
                continue;
            }

            let value = match method {
                ResampleMethod::Nearest => {
                    let (x, y) = source.coords_to_fractional(lon, lat);
                    nearest_sample(data, source.width, source.height, x, y)
                }
                ResampleMethod::Bilinear => {
                    let (x, y) = source.coords_to_fractional(lon, lat);
                    bilinear_sample(data, source.width, source.height, x, y)
                }
                ResampleMethod::AreaWeighted => {
                    // Source cell range covered by the target cell extent.
                    let x0 = ((lon - dst_res_x / 2.0 - source.bbox.min_lon) / src_res_x)
                        .floor()
                        .max(0.0) as usize;
                    let x1 = ((lon + dst_res_x / 2.0 - source.bbox.min_lon) / src_res_x).ceil()
                        as usize;
                    let y0 = ((source.bbox.max_lat - lat - dst_res_y / 2.0) / src_res_y)
                        .floor()
                        .max(0.0) as usize;
                    let y1 =
                        ((source.bbox.max_lat - lat + dst_res_y / 2.0) / src_res_y).ceil() as usize;
                    block_mean(
                        data,
                        source.width,
                        source.height,
                        x0,
                        x1.saturating_sub(1),
                        y0,
                        y1.saturating_sub(1),
                    )
                }
            };

            output[row * target.width + col] = value;
        }
    }

    output
}
