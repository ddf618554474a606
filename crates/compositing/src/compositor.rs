//! Temporal compositing: collapsing irregular observations into regular bins.

use crate::config::{CompositingConfig, GapFillPolicy};
use crate::reconcile::reconcile;
use raster_common::{
    BinPeriod, Composite, CompositingError, Dataset, GapFillMethod, GridDefinition, Provenance,
    RasterLayer, TimeWindow,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Cell-wise reducer applied to a bin's member layers.
///
/// All reducers ignore nodata cells; a cell is nodata in the output only
/// if every contributing layer is nodata there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reducer {
    #[default]
    Mean,
    Max,
    Min,
    /// The earliest valid value in the bin (temporal order).
    FirstValid,
}

impl Reducer {
    /// Reduce one cell across the bin's member layers, given in temporal
    /// order.
    fn reduce_cell(&self, mut values: impl Iterator<Item = f32>) -> f32 {
        match self {
            Reducer::Mean => {
                let mut sum = 0.0f64;
                let mut count = 0usize;
                for v in values {
                    if !v.is_nan() {
                        sum += v as f64;
                        count += 1;
                    }
                }
                if count == 0 {
                    f32::NAN
                } else {
                    (sum / count as f64) as f32
                }
            }
            Reducer::Max => values.filter(|v| !v.is_nan()).fold(f32::NAN, |acc, v| {
                if acc.is_nan() || v > acc {
                    v
                } else {
                    acc
                }
            }),
            Reducer::Min => values.filter(|v| !v.is_nan()).fold(f32::NAN, |acc, v| {
                if acc.is_nan() || v < acc {
                    v
                } else {
                    acc
                }
            }),
            Reducer::FirstValid => values.find(|v| !v.is_nan()).unwrap_or(f32::NAN),
        }
    }
}

impl std::fmt::Display for Reducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reducer::Mean => write!(f, "mean"),
            Reducer::Max => write!(f, "max"),
            Reducer::Min => write!(f, "min"),
            Reducer::FirstValid => write!(f, "first_valid"),
        }
    }
}

/// Composite one variable's reconciled layers onto a bin sequence.
///
/// Every layer must already be on `grid`. The output sequence is aligned
/// to `bins`: contiguous and gapless, with the configured gap-fill policy
/// applied to empty bins.
pub fn composite_variable(
    layers: &[RasterLayer],
    grid: &GridDefinition,
    bins: &[BinPeriod],
    reducer: Reducer,
    gap_fill: GapFillPolicy,
) -> Result<Vec<Composite>, CompositingError> {
    for layer in layers {
        if layer.grid != *grid {
            return Err(CompositingError::GridMismatch {
                variable: layer.variable.clone(),
            });
        }
    }

    let variable = layers
        .first()
        .map(|l| l.variable.clone())
        .unwrap_or_default();

    // Temporal order within bins matters for FirstValid.
    let mut ordered: Vec<&RasterLayer> = layers.iter().collect();
    ordered.sort_by_key(|l| l.timestamp);

    let mut composites = Vec::with_capacity(bins.len());
    for bin in bins {
        let members: Vec<&RasterLayer> = ordered
            .iter()
            .copied()
            .filter(|l| bin.contains(&l.timestamp))
            .collect();

        if members.is_empty() {
            composites.push(Composite::empty(variable.clone(), *bin, grid.len()));
            continue;
        }

        let mut data = vec![f32::NAN; grid.len()];
        for (i, cell) in data.iter_mut().enumerate() {
            *cell = reducer.reduce_cell(members.iter().map(|l| l.data[i]));
        }

        composites.push(Composite::new(
            variable.clone(),
            *bin,
            data,
            Provenance::Observed {
                count: members.len(),
            },
        ));
    }

    apply_gap_fill(&mut composites, gap_fill);
    Ok(composites)
}

/// Fill empty bins according to the policy. Bins that cannot be filled
/// (e.g. a leading empty bin under carry-forward) stay nodata.
fn apply_gap_fill(composites: &mut [Composite], policy: GapFillPolicy) {
    if policy == GapFillPolicy::LeaveNodata {
        return;
    }

    let observed: Vec<usize> = composites
        .iter()
        .enumerate()
        .filter(|(_, c)| matches!(c.provenance, Provenance::Observed { .. }))
        .map(|(i, _)| i)
        .collect();

    if observed.is_empty() {
        return;
    }

    for i in 0..composites.len() {
        if !matches!(composites[i].provenance, Provenance::Empty) {
            continue;
        }

        let prev = observed.iter().copied().filter(|&j| j < i).max();
        let next = observed.iter().copied().filter(|&j| j > i).min();

        let (data, method) = match policy {
            GapFillPolicy::CarryForward => match prev {
                Some(p) => (composites[p].data.clone(), GapFillMethod::CarryForward),
                None => continue,
            },
            GapFillPolicy::LinearInterpolate => match (prev, next) {
                (Some(p), Some(n)) => {
                    let t = (i - p) as f32 / (n - p) as f32;
                    let filled = composites[p]
                        .data
                        .iter()
                        .zip(composites[n].data.iter())
                        .map(|(&a, &b)| match (a.is_nan(), b.is_nan()) {
                            (false, false) => a + (b - a) * t,
                            (false, true) => a,
                            (true, false) => b,
                            (true, true) => f32::NAN,
                        })
                        .collect();
                    (filled, GapFillMethod::LinearInterpolate)
                }
                // Window edges: fall back to the nearest observed bin.
                (Some(p), None) => (composites[p].data.clone(), GapFillMethod::LinearInterpolate),
                (None, Some(n)) => (composites[n].data.clone(), GapFillMethod::LinearInterpolate),
                (None, None) => continue,
            },
            GapFillPolicy::LeaveNodata => unreachable!(),
        };

        composites[i].data = data;
        composites[i].provenance = Provenance::GapFilled { method };
    }
}

/// Build `ds_in`: reconcile and composite every configured variable.
///
/// Failures local to one variable (reconciliation, no usable layers) drop
/// that variable with a warning; only structural problems (bad window or
/// policy, nothing composited at all) fail the call.
pub fn composite_dataset(
    layers: Vec<RasterLayer>,
    target: &GridDefinition,
    window: &TimeWindow,
    config: &CompositingConfig,
) -> Result<Dataset, CompositingError> {
    let bins = config.bin_policy.bin_periods(window)?;

    let mut by_variable: BTreeMap<String, Vec<RasterLayer>> = BTreeMap::new();
    for layer in layers {
        by_variable
            .entry(layer.variable.clone())
            .or_default()
            .push(layer);
    }

    let mut dataset = Dataset::new(target.clone(), bins.clone());

    for (variable, var_layers) in by_variable {
        let Some(var_config) = config.variable(&variable) else {
            warn!(variable = %variable, "no compositing configuration, skipping variable");
            continue;
        };

        let mut reconciled = Vec::with_capacity(var_layers.len());
        for layer in &var_layers {
            match reconcile(layer, target, var_config.resampling, var_config.kind) {
                Ok(l) => reconciled.push(l),
                Err(e) => {
                    warn!(
                        variable = %variable,
                        timestamp = %layer.timestamp,
                        error = %e,
                        "layer failed reconciliation, treating observation as absent"
                    );
                }
            }
        }

        if reconciled.is_empty() {
            warn!(variable = %variable, "no layer survived reconciliation, dropping variable");
            continue;
        }

        let composites = composite_variable(
            &reconciled,
            target,
            &bins,
            var_config.reducer,
            var_config.gap_fill,
        )?;

        debug!(
            variable = %variable,
            bins = composites.len(),
            observed = composites
                .iter()
                .filter(|c| matches!(c.provenance, Provenance::Observed { .. }))
                .count(),
            "composited variable"
        );
        dataset.insert(variable, composites);
    }

    if dataset.is_empty() {
        return Err(CompositingError::NothingToComposite(
            "no configured variable had usable observations".to_string(),
        ));
    }

    Ok(dataset)
}
