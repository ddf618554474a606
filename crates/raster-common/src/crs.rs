//! Coordinate reference system tags.
//!
//! Actual reprojection between reference systems is delegated to external
//! tooling; the pipeline only needs to recognize its compute CRS and carry
//! any other code through unchanged so a mismatch can be reported.

use serde::{Deserialize, Serialize};

/// Identifies the coordinate reference system of a grid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Crs {
    /// WGS84 geographic coordinates (EPSG:4326), the compute CRS.
    Epsg4326,
    /// Any other CRS, carried by its authority code (e.g. "EPSG:32636").
    Other(String),
}

impl Crs {
    /// Parse a CRS code string (case-insensitive).
    pub fn parse(code: &str) -> Self {
        match code.to_uppercase().replace(' ', "").as_str() {
            "EPSG:4326" | "WGS84" | "CRS:84" => Self::Epsg4326,
            _ => Self::Other(code.to_string()),
        }
    }

    /// The authority code for this CRS.
    pub fn code(&self) -> &str {
        match self {
            Self::Epsg4326 => "EPSG:4326",
            Self::Other(code) => code,
        }
    }

    /// Whether this is the geographic compute CRS.
    pub fn is_geographic(&self) -> bool {
        matches!(self, Self::Epsg4326)
    }
}

impl Default for Crs {
    fn default() -> Self {
        Self::Epsg4326
    }
}

impl From<String> for Crs {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<Crs> for String {
    fn from(crs: Crs) -> Self {
        crs.code().to_string()
    }
}

impl std::fmt::Display for Crs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}
