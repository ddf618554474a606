//! Grid definitions and chunk arithmetic.

use crate::bbox::BoundingBox;
use crate::crs::Crs;
use serde::{Deserialize, Serialize};

/// Defines the spatial addressing of a raster: CRS, extent and shape.
///
/// Two layers are spatially comparable only if their grid definitions are
/// equal; the reconciler exists to establish that equality across sources.
/// Rows run top-to-bottom (row 0 is the northern edge), values are stored
/// row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridDefinition {
    pub crs: Crs,
    pub bbox: BoundingBox,
    /// Number of columns.
    pub width: usize,
    /// Number of rows.
    pub height: usize,
}

impl GridDefinition {
    /// Create a new grid definition.
    pub fn new(crs: Crs, bbox: BoundingBox, width: usize, height: usize) -> Self {
        Self {
            crs,
            bbox,
            width,
            height,
        }
    }

    /// Geographic grid over a bounding box.
    pub fn geographic(bbox: BoundingBox, width: usize, height: usize) -> Self {
        Self::new(Crs::Epsg4326, bbox, width, height)
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    /// Whether the grid has zero cells.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Resolution in degrees per cell (lon, lat).
    pub fn resolution(&self) -> (f64, f64) {
        (
            self.bbox.width() / self.width as f64,
            self.bbox.height() / self.height as f64,
        )
    }

    /// Convert a cell index to geographic coordinates (center of cell).
    pub fn cell_to_coords(&self, col: usize, row: usize) -> (f64, f64) {
        let (res_x, res_y) = self.resolution();
        let lon = self.bbox.min_lon + (col as f64 + 0.5) * res_x;
        let lat = self.bbox.max_lat - (row as f64 + 0.5) * res_y;
        (lon, lat)
    }

    /// Convert geographic coordinates to cell indices.
    pub fn coords_to_cell(&self, lon: f64, lat: f64) -> Option<(usize, usize)> {
        if !self.bbox.contains(lon, lat) {
            return None;
        }

        let (res_x, res_y) = self.resolution();
        let col = ((lon - self.bbox.min_lon) / res_x).floor() as usize;
        let row = ((self.bbox.max_lat - lat) / res_y).floor() as usize;

        if col < self.width && row < self.height {
            Some((col, row))
        } else {
            None
        }
    }

    /// Fractional cell coordinates for a geographic point, measured from
    /// cell centers. Used by the resampling kernels; may fall outside the
    /// grid, callers check bounds.
    pub fn coords_to_fractional(&self, lon: f64, lat: f64) -> (f64, f64) {
        let (res_x, res_y) = self.resolution();
        let x = (lon - self.bbox.min_lon) / res_x - 0.5;
        let y = (self.bbox.max_lat - lat) / res_y - 0.5;
        (x, y)
    }

    /// Number of chunks along each dimension for a given chunk shape.
    pub fn num_chunks(&self, chunk_width: usize, chunk_height: usize) -> (usize, usize) {
        let chunks_x = self.width.div_ceil(chunk_width);
        let chunks_y = self.height.div_ceil(chunk_height);
        (chunks_x, chunks_y)
    }

    /// The pixel window covered by chunk (cx, cy); edge chunks are clipped
    /// to the grid shape.
    pub fn chunk_window(
        &self,
        cx: usize,
        cy: usize,
        chunk_width: usize,
        chunk_height: usize,
    ) -> PixelWindow {
        let col = cx * chunk_width;
        let row = cy * chunk_height;
        PixelWindow {
            col,
            row,
            width: chunk_width.min(self.width.saturating_sub(col)),
            height: chunk_height.min(self.height.saturating_sub(row)),
        }
    }

    /// Iterate all chunk windows for a chunk shape, row-major.
    pub fn chunk_windows(&self, chunk_width: usize, chunk_height: usize) -> Vec<PixelWindow> {
        let (chunks_x, chunks_y) = self.num_chunks(chunk_width, chunk_height);
        let mut windows = Vec::with_capacity(chunks_x * chunks_y);
        for cy in 0..chunks_y {
            for cx in 0..chunks_x {
                windows.push(self.chunk_window(cx, cy, chunk_width, chunk_height));
            }
        }
        windows
    }
}

/// A rectangular window of cells within a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelWindow {
    pub col: usize,
    pub row: usize,
    pub width: usize,
    pub height: usize,
}

impl PixelWindow {
    /// Number of cells in this window.
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    /// Whether the window has zero cells.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether a grid cell falls within this window.
    pub fn contains(&self, col: usize, row: usize) -> bool {
        col >= self.col
            && col < self.col + self.width
            && row >= self.row
            && row < self.row + self.height
    }

    /// Offset of a contained cell within the window's row-major buffer.
    pub fn local_index(&self, col: usize, row: usize) -> Option<usize> {
        if !self.contains(col, row) {
            return None;
        }
        Some((row - self.row) * self.width + (col - self.col))
    }
}
