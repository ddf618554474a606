//! Generators for predictable, verifiable test data.

use chrono::{DateTime, TimeZone, Utc};
use raster_common::{BoundingBox, GridDefinition, RasterLayer, TimeWindow};

/// A small geographic run grid over an East-African test extent.
pub fn test_grid(width: usize, height: usize) -> GridDefinition {
    GridDefinition::geographic(BoundingBox::new(30.0, -5.0, 40.0, 5.0), width, height)
}

/// Creates a test grid buffer with predictable values.
///
/// Each cell value is `col * 1000 + row`, so reads and windowed copies are
/// easy to verify by inspection.
pub fn indexed_data(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f32);
        }
    }
    data
}

/// A buffer filled with one value.
pub fn constant_data(width: usize, height: usize, value: f32) -> Vec<f32> {
    vec![value; width * height]
}

/// An NDVI-like gradient in [0.05, 0.85], dry in the north-west and green
/// in the south-east.
pub fn ndvi_data(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let x = col as f32 / width.max(1) as f32;
            let y = row as f32 / height.max(1) as f32;
            data.push(0.05 + (x + y) / 2.0 * 0.8);
        }
    }
    data
}

/// Convenience timestamp constructor.
pub fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

/// A one-month test window (March 2023).
pub fn march_window() -> TimeWindow {
    TimeWindow::new(day(2023, 3, 1), day(2023, 3, 31))
}

/// A layer on `grid` with the given data.
pub fn layer_on(
    grid: &GridDefinition,
    variable: &str,
    timestamp: DateTime<Utc>,
    data: Vec<f32>,
) -> RasterLayer {
    RasterLayer::new(variable, timestamp, grid.clone(), data)
}

/// A constant-valued layer on `grid`.
pub fn constant_layer(
    grid: &GridDefinition,
    variable: &str,
    timestamp: DateTime<Utc>,
    value: f32,
) -> RasterLayer {
    layer_on(grid, variable, timestamp, vec![value; grid.len()])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indexed_data_pattern() {
        let data = indexed_data(10, 5);
        assert_eq!(data.len(), 50);
        assert_eq!(data[0], 0.0);
        assert_eq!(data[1], 1000.0);
        assert_eq!(data[10], 1.0);
    }

    #[test]
    fn test_ndvi_data_in_range() {
        let data = ndvi_data(8, 8);
        assert!(data.iter().all(|v| (0.0..=1.0).contains(v)));
    }
}
