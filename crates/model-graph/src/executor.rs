//! Chunked parallel graph evaluation.
//!
//! Nodes are grouped into dependency waves; within a wave, every
//! (node, bin, chunk) task is independent and runs on the rayon pool.
//! Buffers live only as long as something still needs them: once all of a
//! node's dependents have finished, its buffers are released unless the
//! node is a requested output. Peak memory is therefore bounded by the
//! widest cut through the graph, not by the node count.
//!
//! A failing kernel fails its node; dependents are poisoned without being
//! evaluated and unrelated branches keep running. Cancellation is checked
//! between chunks and between waves; a cancelled run returns an empty
//! dataset and a report marked cancelled.

use crate::diagnostics::{DiagnosticPixel, DiagnosticTrace, TraceRecord};
use crate::error::{GraphError, TransferError};
use crate::graph::{Graph, NodeKind};
use crate::library::ChunkContext;
use crate::registry::EnhancerMode;
use crate::report::{FailedNode, NodeStatus, RunReport, RunStatus};
use raster_common::{Composite, Dataset, GridDefinition, PixelWindow, Provenance};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Evaluation settings for one run.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Chunk shape in cells. Smaller chunks parallelize better, larger
    /// chunks amortize dispatch; the default suits continental grids.
    pub chunk_width: usize,
    pub chunk_height: usize,
    /// Cells to trace through every node and bin.
    pub diagnostic_pixels: Vec<DiagnosticPixel>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            chunk_width: 256,
            chunk_height: 256,
            diagnostic_pixels: Vec::new(),
        }
    }
}

impl ExecutorConfig {
    fn validate(&self) -> Result<(), GraphError> {
        if self.chunk_width == 0 || self.chunk_height == 0 {
            return Err(GraphError::InvalidConfig(
                "chunk shape must be nonzero in both dimensions".to_string(),
            ));
        }
        Ok(())
    }
}

/// Cooperative cancellation handle; clone it and keep one end.
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Everything a run produces.
pub struct RunOutcome {
    /// Output dataset holding the surviving requested variables. Empty
    /// when the run was cancelled.
    pub dataset: Dataset,
    pub report: RunReport,
    pub trace: DiagnosticTrace,
    /// Final lifecycle state of every graph node.
    pub statuses: BTreeMap<String, NodeStatus>,
}

/// Where a node's per-bin buffers currently live.
enum NodeData<'run> {
    Unset,
    /// Input or sideloaded composites, not owned by the run.
    Borrowed(&'run [Composite]),
    /// Evaluated buffers, one full grid per bin.
    Owned(Vec<Vec<f32>>),
    /// Dropped after the last dependent finished.
    Released,
}

impl NodeData<'_> {
    fn bin(&self, bin: usize) -> Option<&[f32]> {
        match self {
            NodeData::Borrowed(comps) => comps.get(bin).map(|c| c.data.as_slice()),
            NodeData::Owned(bufs) => bufs.get(bin).map(|b| b.as_slice()),
            NodeData::Unset | NodeData::Released => None,
        }
    }
}

/// Evaluates a graph over an input dataset.
pub struct Executor {
    config: ExecutorConfig,
}

impl Executor {
    pub fn new(config: ExecutorConfig) -> Result<Self, GraphError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Run to completion without external cancellation.
    pub fn execute(&self, graph: &Graph, ds_in: &Dataset) -> RunOutcome {
        self.execute_with_cancel(graph, ds_in, &CancelToken::new())
    }

    /// Run until done or until `token` is cancelled.
    pub fn execute_with_cancel<'run>(
        &self,
        graph: &'run Graph,
        ds_in: &'run Dataset,
        token: &CancelToken,
    ) -> RunOutcome {
        let n = graph.nodes().len();
        let requested: HashSet<usize> =
            graph.requested().iter().filter_map(|name| graph.index_of(name)).collect();

        // Dependency waves: a node's wave is one past its deepest dep.
        let mut level = vec![0usize; n];
        for idx in 0..n {
            level[idx] = graph.node(idx).deps.iter().map(|&d| level[d] + 1).max().unwrap_or(0);
        }
        let wave_count = level.iter().max().map_or(0, |&m| m + 1);
        let mut waves: Vec<Vec<usize>> = vec![Vec::new(); wave_count];
        for (idx, &lvl) in level.iter().enumerate() {
            waves[lvl].push(idx);
        }

        // How many dependents still need each node's buffers.
        let mut remaining_uses = vec![0usize; n];
        for node in graph.nodes() {
            for &dep in &node.deps {
                remaining_uses[dep] += 1;
            }
        }

        let mut data: Vec<NodeData<'run>> = (0..n).map(|_| NodeData::Unset).collect();
        let mut statuses = vec![NodeStatus::Pending; n];
        let mut failed: Vec<FailedNode> = Vec::new();
        let mut trace = DiagnosticTrace::default();
        let mut cancelled = false;

        'waves: for wave in &waves {
            if token.is_cancelled() {
                cancelled = true;
                break 'waves;
            }

            let mut tasks: Vec<usize> = Vec::new();
            for &idx in wave {
                let node = graph.node(idx);
                match &node.kind {
                    NodeKind::Input => match ds_in.get(&node.name) {
                        Some(comps) => {
                            trace.extend(self.trace_composites(&node.name, &ds_in.grid, comps));
                            data[idx] = NodeData::Borrowed(comps);
                            statuses[idx] = NodeStatus::Input;
                        }
                        None => {
                            statuses[idx] = NodeStatus::Failed;
                            failed.push(FailedNode {
                                name: node.name.clone(),
                                reason: "input variable missing from dataset".to_string(),
                            });
                        }
                    },
                    NodeKind::Sideloaded { composites } => {
                        trace.extend(self.trace_composites(&node.name, &ds_in.grid, composites));
                        data[idx] = NodeData::Borrowed(composites);
                        statuses[idx] = NodeStatus::Sideloaded;
                    }
                    NodeKind::Transfer { .. } => {
                        let poisoned = node
                            .deps
                            .iter()
                            .find(|&&d| statuses[d] == NodeStatus::Failed);
                        if let Some(&bad) = poisoned {
                            statuses[idx] = NodeStatus::Failed;
                            let reason =
                                format!("upstream failure in `{}`", graph.node(bad).name);
                            warn!(node = node.name.as_str(), reason = reason.as_str(), "node poisoned");
                            failed.push(FailedNode {
                                name: node.name.clone(),
                                reason,
                            });
                        } else {
                            statuses[idx] = NodeStatus::Scheduled;
                            tasks.push(idx);
                        }
                    }
                }
            }

            let results: Vec<(usize, Result<(Vec<Vec<f32>>, Vec<TraceRecord>), TransferError>)> =
                tasks
                    .par_iter()
                    .map(|&idx| (idx, self.evaluate_node(graph, idx, &data, ds_in, token)))
                    .collect();

            for (idx, result) in results {
                let name = &graph.node(idx).name;
                match result {
                    Ok((buffers, records)) => {
                        debug!(node = name.as_str(), "node computed");
                        data[idx] = NodeData::Owned(buffers);
                        statuses[idx] = NodeStatus::Computed;
                        trace.extend(records);
                    }
                    Err(TransferError::Cancelled) => {
                        cancelled = true;
                        statuses[idx] = NodeStatus::Pending;
                    }
                    Err(err) => {
                        let reason = err.to_string();
                        warn!(node = name.as_str(), reason = reason.as_str(), "node failed");
                        statuses[idx] = NodeStatus::Failed;
                        failed.push(FailedNode {
                            name: name.clone(),
                            reason,
                        });
                    }
                }
            }

            if cancelled {
                break 'waves;
            }

            // Release buffers nothing will read again.
            for &idx in wave {
                if matches!(
                    statuses[idx],
                    NodeStatus::Computed | NodeStatus::Failed
                ) {
                    for &dep in &graph.node(idx).deps {
                        remaining_uses[dep] -= 1;
                        if remaining_uses[dep] == 0 && !requested.contains(&dep) {
                            data[dep] = NodeData::Released;
                        }
                    }
                }
            }
        }

        let status_map: BTreeMap<String, NodeStatus> = graph
            .nodes()
            .iter()
            .zip(&statuses)
            .map(|(node, &status)| (node.name.clone(), status))
            .collect();

        if cancelled {
            info!("run cancelled, partial results discarded");
            return RunOutcome {
                dataset: Dataset::new(ds_in.grid.clone(), ds_in.bins.clone()),
                report: RunReport {
                    status: RunStatus::Cancelled,
                    computed: Vec::new(),
                    substituted: Vec::new(),
                    dropped: graph.dropped().to_vec(),
                    failed,
                },
                trace: DiagnosticTrace::default(),
                statuses: status_map,
            };
        }

        let mut ds_out = Dataset::new(ds_in.grid.clone(), ds_in.bins.clone());
        let mut computed = Vec::new();
        let mut substituted = Vec::new();
        for name in graph.requested() {
            let Some(idx) = graph.index_of(name) else {
                continue;
            };
            match statuses[idx] {
                NodeStatus::Computed => {
                    if let NodeData::Owned(buffers) =
                        std::mem::replace(&mut data[idx], NodeData::Released)
                    {
                        let comps = buffers
                            .into_iter()
                            .zip(&ds_in.bins)
                            .map(|(buf, bin)| {
                                Composite::new(name.clone(), *bin, buf, Provenance::Computed)
                            })
                            .collect();
                        ds_out.insert(name.clone(), comps);
                        computed.push(name.clone());
                    }
                }
                NodeStatus::Input | NodeStatus::Sideloaded => {
                    if let NodeData::Borrowed(comps) = &data[idx] {
                        ds_out.insert(name.clone(), comps.to_vec());
                        substituted.push(name.clone());
                    }
                }
                _ => {}
            }
        }

        info!(
            computed = computed.len(),
            substituted = substituted.len(),
            failed = failed.len(),
            dropped = graph.dropped().len(),
            "run complete"
        );

        RunOutcome {
            dataset: ds_out,
            report: RunReport {
                status: RunStatus::Completed,
                computed,
                substituted,
                dropped: graph.dropped().to_vec(),
                failed,
            },
            trace,
            statuses: status_map,
        }
    }

    /// Evaluate one transfer node over every bin and chunk.
    fn evaluate_node(
        &self,
        graph: &Graph,
        idx: usize,
        data: &[NodeData<'_>],
        ds_in: &Dataset,
        token: &CancelToken,
    ) -> Result<(Vec<Vec<f32>>, Vec<TraceRecord>), TransferError> {
        let node = graph.node(idx);
        let NodeKind::Transfer { spec, enhancer } = &node.kind else {
            return Err(TransferError::DependencyUnavailable(node.name.clone()));
        };

        let grid = &ds_in.grid;
        let windows = grid.chunk_windows(self.config.chunk_width, self.config.chunk_height);
        let mut pairs = Vec::with_capacity(ds_in.bins.len() * windows.len());
        for (bin, period) in ds_in.bins.iter().enumerate() {
            for &window in &windows {
                pairs.push((bin, period, window));
            }
        }

        let pieces: Vec<(usize, PixelWindow, Vec<f32>, Vec<TraceRecord>)> = pairs
            .into_par_iter()
            .map(|(bin, period, window)| {
                if token.is_cancelled() {
                    return Err(TransferError::Cancelled);
                }
                let ctx = ChunkContext {
                    grid,
                    window,
                    period,
                };

                let mut dep_chunks = Vec::with_capacity(node.deps.len());
                for &dep in &node.deps {
                    let full = data[dep].bin(bin).ok_or_else(|| {
                        TransferError::DependencyUnavailable(graph.node(dep).name.clone())
                    })?;
                    dep_chunks.push(extract(full, grid.width, &window));
                }
                let refs: Vec<&[f32]> = dep_chunks.iter().map(|c| c.as_slice()).collect();

                let out = match enhancer {
                    None => (spec.func)(&ctx, &refs)?,
                    Some(e) => match e.mode {
                        EnhancerMode::Replace => (e.func)(&ctx, &refs)?,
                        EnhancerMode::Compose => {
                            let base = (spec.func)(&ctx, &refs)?;
                            let mut with_base = refs.clone();
                            with_base.push(&base);
                            (e.func)(&ctx, &with_base)?
                        }
                    },
                };
                if out.len() != ctx.len() {
                    return Err(TransferError::ShapeMismatch {
                        expected: ctx.len(),
                        actual: out.len(),
                    });
                }

                let mut records = Vec::new();
                for &px in &self.config.diagnostic_pixels {
                    if let Some(local) = window.local_index(px.col, px.row) {
                        records.push(TraceRecord {
                            pixel: px,
                            variable: node.name.clone(),
                            bin,
                            value: out[local],
                        });
                    }
                }
                Ok((bin, window, out, records))
            })
            .collect::<Result<Vec<_>, TransferError>>()?;

        let mut buffers = vec![vec![f32::NAN; grid.len()]; ds_in.bins.len()];
        let mut records = Vec::new();
        for (bin, window, chunk, recs) in pieces {
            blit(&mut buffers[bin], grid.width, &window, &chunk);
            records.extend(recs);
        }
        Ok((buffers, records))
    }

    /// Trace records for input and sideloaded composites at the
    /// diagnostic pixels.
    fn trace_composites(
        &self,
        name: &str,
        grid: &GridDefinition,
        comps: &[Composite],
    ) -> Vec<TraceRecord> {
        let mut records = Vec::new();
        for &px in &self.config.diagnostic_pixels {
            if px.col >= grid.width || px.row >= grid.height {
                continue;
            }
            let offset = px.row * grid.width + px.col;
            for (bin, comp) in comps.iter().enumerate() {
                records.push(TraceRecord {
                    pixel: px,
                    variable: name.to_string(),
                    bin,
                    value: comp.data[offset],
                });
            }
        }
        records
    }
}

/// Copy a window out of a full-grid buffer.
fn extract(buffer: &[f32], grid_width: usize, window: &PixelWindow) -> Vec<f32> {
    let mut out = Vec::with_capacity(window.len());
    for row in window.row..window.row + window.height {
        let start = row * grid_width + window.col;
        out.extend_from_slice(&buffer[start..start + window.width]);
    }
    out
}

/// Copy a window back into a full-grid buffer.
fn blit(buffer: &mut [f32], grid_width: usize, window: &PixelWindow, chunk: &[f32]) {
    for local_row in 0..window.height {
        let src = local_row * window.width;
        let dst = (window.row + local_row) * grid_width + window.col;
        buffer[dst..dst + window.width].copy_from_slice(&chunk[src..src + window.width]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_blit_roundtrip() {
        let grid_width = 8;
        let buffer: Vec<f32> = (0..64).map(|v| v as f32).collect();
        let window = PixelWindow {
            col: 2,
            row: 3,
            width: 4,
            height: 2,
        };
        let chunk = extract(&buffer, grid_width, &window);
        assert_eq!(chunk.len(), 8);
        assert_eq!(chunk[0], 26.0);
        assert_eq!(chunk[4], 34.0);

        let mut target = vec![f32::NAN; 64];
        blit(&mut target, grid_width, &window, &chunk);
        assert_eq!(target[26], 26.0);
        assert_eq!(target[37], 37.0);
        assert!(target[0].is_nan());
    }

    #[test]
    fn test_cancel_token() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_config_rejects_zero_chunks() {
        let config = ExecutorConfig {
            chunk_width: 0,
            ..ExecutorConfig::default()
        };
        assert!(Executor::new(config).is_err());
    }
}
