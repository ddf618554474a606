//! Composites and datasets: the artifacts crossing stage boundaries.

use crate::grid::GridDefinition;
use crate::time::BinPeriod;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How a composite's values came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Provenance {
    /// Reduced from `count` source observations.
    Observed { count: usize },
    /// The bin was empty; values were produced by a gap-fill method.
    GapFilled { method: GapFillMethod },
    /// The bin was empty and the policy left it as nodata.
    Empty,
    /// Produced by a transfer function in the computation graph.
    Computed,
    /// Substituted from an externally supplied dataset.
    Sideloaded,
}

/// Gap-fill method applied to an empty bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapFillMethod {
    CarryForward,
    LinearInterpolate,
}

/// One time-binned, spatially reconciled layer for one variable.
///
/// A composite does not carry its own grid; all composites in a dataset
/// share the dataset's grid definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Composite {
    pub variable: String,
    pub period: BinPeriod,
    pub data: Vec<f32>,
    pub provenance: Provenance,
}

impl Composite {
    pub fn new(
        variable: impl Into<String>,
        period: BinPeriod,
        data: Vec<f32>,
        provenance: Provenance,
    ) -> Self {
        Self {
            variable: variable.into(),
            period,
            data,
            provenance,
        }
    }

    /// An all-nodata composite for an empty bin.
    pub fn empty(variable: impl Into<String>, period: BinPeriod, len: usize) -> Self {
        Self::new(variable, period, vec![f32::NAN; len], Provenance::Empty)
    }

    /// Whether every cell is nodata.
    pub fn is_all_nodata(&self) -> bool {
        self.data.iter().all(|v| v.is_nan())
    }
}

/// A self-describing mapping from variable name to an ordered, contiguous
/// composite sequence, all on one grid.
///
/// A dataset is the sole artifact crossing the core's boundary in each
/// direction (`ds_in` / `ds_out`). Stages produce fresh datasets; nothing
/// mutates a dataset it did not build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub grid: GridDefinition,
    /// The bin sequence every variable is aligned to.
    pub bins: Vec<BinPeriod>,
    variables: BTreeMap<String, Vec<Composite>>,
}

impl Dataset {
    pub fn new(grid: GridDefinition, bins: Vec<BinPeriod>) -> Self {
        Self {
            grid,
            bins,
            variables: BTreeMap::new(),
        }
    }

    /// Insert a variable's composite sequence.
    ///
    /// The sequence must be aligned to the dataset's bins and each
    /// composite must match the dataset grid; violations indicate a bug in
    /// the producing stage and panic in debug builds.
    pub fn insert(&mut self, name: impl Into<String>, composites: Vec<Composite>) {
        debug_assert_eq!(composites.len(), self.bins.len());
        debug_assert!(composites.iter().all(|c| c.data.len() == self.grid.len()));
        self.variables.insert(name.into(), composites);
    }

    /// Names of all variables present, sorted.
    pub fn variable_names(&self) -> Vec<String> {
        self.variables.keys().cloned().collect()
    }

    /// Whether a variable is present.
    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    /// A variable's composite sequence.
    pub fn get(&self, name: &str) -> Option<&[Composite]> {
        self.variables.get(name).map(|v| v.as_slice())
    }

    /// Number of variables.
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    /// Whether the dataset holds no variables.
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Iterate variables in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<Composite>)> {
        self.variables.iter()
    }
}
