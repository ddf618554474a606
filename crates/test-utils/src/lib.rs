//! Shared test fixtures: deterministic grids, layers and windows.

pub mod generators;

pub use generators::*;
