//! Per-run compositing configuration.
//!
//! Every recognized option and its effect is enumerated here and passed
//! explicitly into the compositor; nothing falls back to hidden defaults.

use crate::compositor::Reducer;
use crate::resample::ResampleMethod;
use anyhow::{Context, Result};
use raster_common::BinPolicy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Whether a variable's values are continuous measurements or category
/// codes. Category codes must never be averaged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableKind {
    #[default]
    Continuous,
    Categorical,
}

/// What to do with a bin that received zero observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapFillPolicy {
    /// Repeat the previous non-empty bin.
    CarryForward,
    /// Interpolate per cell between the neighboring non-empty bins,
    /// falling back to carry-forward/backward at the window edges.
    LinearInterpolate,
    /// Leave the bin as nodata.
    #[default]
    LeaveNodata,
}

/// Compositing behaviour for one variable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableConfig {
    #[serde(default)]
    pub kind: VariableKind,
    /// Resampling method used to reconcile source layers onto the run grid.
    #[serde(default)]
    pub resampling: ResampleMethod,
    /// Cell-wise reducer applied within each bin.
    #[serde(default)]
    pub reducer: Reducer,
    /// Policy for bins with zero observations.
    #[serde(default)]
    pub gap_fill: GapFillPolicy,
}

impl VariableConfig {
    /// Configuration for a continuous variable with the common defaults
    /// (bilinear resampling, mean reduction, nodata gaps).
    pub fn continuous() -> Self {
        Self {
            kind: VariableKind::Continuous,
            resampling: ResampleMethod::Bilinear,
            reducer: Reducer::Mean,
            gap_fill: GapFillPolicy::LeaveNodata,
        }
    }

    /// Configuration for a categorical variable (nearest resampling,
    /// first-valid reduction, carry-forward gaps).
    pub fn categorical() -> Self {
        Self {
            kind: VariableKind::Categorical,
            resampling: ResampleMethod::Nearest,
            reducer: Reducer::FirstValid,
            gap_fill: GapFillPolicy::CarryForward,
        }
    }

    pub fn with_reducer(mut self, reducer: Reducer) -> Self {
        self.reducer = reducer;
        self
    }

    pub fn with_gap_fill(mut self, gap_fill: GapFillPolicy) -> Self {
        self.gap_fill = gap_fill;
        self
    }

    pub fn with_resampling(mut self, resampling: ResampleMethod) -> Self {
        self.resampling = resampling;
        self
    }
}

/// Full compositing configuration for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositingConfig {
    /// How the window is partitioned into bins.
    pub bin_policy: BinPolicy,
    /// Per-variable behaviour; variables without an entry are skipped with
    /// a warning rather than silently given defaults.
    pub variables: HashMap<String, VariableConfig>,
}

impl CompositingConfig {
    pub fn new(bin_policy: BinPolicy) -> Self {
        Self {
            bin_policy,
            variables: HashMap::new(),
        }
    }

    /// Add a variable's configuration.
    pub fn with_variable(mut self, name: impl Into<String>, config: VariableConfig) -> Self {
        self.variables.insert(name.into(), config);
        self
    }

    /// Look up a variable's configuration.
    pub fn variable(&self, name: &str) -> Option<&VariableConfig> {
        self.variables.get(name)
    }

    /// Load from a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml).context("invalid compositing config")?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("reading {}", path.as_ref().display()))?;
        Self::from_yaml(&text)
    }

    /// Reject configurations that are internally inconsistent.
    pub fn validate(&self) -> Result<()> {
        if let BinPolicy::FixedDays(0) = self.bin_policy {
            anyhow::bail!("bin_policy fixed_days must be at least 1");
        }
        for (name, var) in &self.variables {
            if var.kind == VariableKind::Categorical
                && var.resampling != ResampleMethod::Nearest
            {
                anyhow::bail!(
                    "variable `{name}` is categorical but configured with {} resampling",
                    var.resampling
                );
            }
            if var.kind == VariableKind::Categorical && var.reducer == Reducer::Mean {
                anyhow::bail!("variable `{name}` is categorical but configured with mean reduction");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = CompositingConfig::new(BinPolicy::Dekadal)
            .with_variable("ndvi", VariableConfig::continuous())
            .with_variable("land_mask", VariableConfig::categorical());

        assert!(config.validate().is_ok());
        assert_eq!(config.variable("ndvi").unwrap().reducer, Reducer::Mean);
        assert!(config.variable("lst").is_none());
    }

    #[test]
    fn test_categorical_with_bilinear_rejected() {
        let config = CompositingConfig::new(BinPolicy::Dekadal).with_variable(
            "land_mask",
            VariableConfig::categorical().with_resampling(ResampleMethod::Bilinear),
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_yaml() {
        let yaml = r#"
bin_policy:
  fixed_days: 10
variables:
  ndvi:
    kind: continuous
    resampling: bilinear
    reducer: mean
    gap_fill: linear_interpolate
  land_mask:
    kind: categorical
    resampling: nearest
    reducer: first_valid
    gap_fill: carry_forward
"#;
        let config = CompositingConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.bin_policy, BinPolicy::FixedDays(10));
        assert_eq!(
            config.variable("ndvi").unwrap().gap_fill,
            GapFillPolicy::LinearInterpolate
        );
        assert_eq!(
            config.variable("land_mask").unwrap().kind,
            VariableKind::Categorical
        );
    }

    #[test]
    fn test_yaml_rejects_categorical_mean() {
        let yaml = r#"
bin_policy: dekadal
variables:
  land_mask:
    kind: categorical
    resampling: nearest
    reducer: mean
"#;
        assert!(CompositingConfig::from_yaml(yaml).is_err());
    }
}
