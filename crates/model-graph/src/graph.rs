//! Graph construction: resolve requested outputs against the library, the
//! input dataset and the registry, prune to what is reachable, and drop
//! what cannot be computed.
//!
//! An output with missing inputs is dropped with a warning instead of
//! failing the run: partial input availability degrades the product list,
//! not the run. Structural problems (cycles, nothing satisfiable, bad
//! sideloads) are errors.

use crate::error::GraphError;
use crate::library::{self, TransferSpec};
use crate::registry::{Enhancer, Registry, Sideload};
use compositing::{resample_to_grid, ResampleMethod};
use raster_common::{Composite, Dataset, Provenance, ReconciliationError};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info, warn};

/// How a node gets its values at run time.
#[derive(Debug)]
pub enum NodeKind {
    /// Read from the input dataset.
    Input,
    /// Substituted from an externally supplied dataset, already reconciled
    /// onto the run grid and bins.
    Sideloaded { composites: Vec<Composite> },
    /// Evaluated by a library kernel, optionally hooked by an enhancer.
    Transfer {
        spec: &'static TransferSpec,
        enhancer: Option<Enhancer>,
    },
}

/// One node of the pruned evaluation graph.
#[derive(Debug)]
pub struct Node {
    pub name: String,
    /// Indices of dependency nodes; always lower than this node's index.
    pub deps: Vec<usize>,
    pub kind: NodeKind,
}

/// A requested output that cannot be computed, and why.
#[derive(Debug, Clone, Serialize)]
pub struct DroppedOutput {
    pub name: String,
    /// The leaf variables that would be needed but are absent.
    pub missing: Vec<String>,
}

/// The pruned, topologically ordered evaluation graph for one run.
///
/// Nodes are stored in dependency order: every node's dependencies precede
/// it, so a single forward pass evaluates the graph.
#[derive(Debug)]
pub struct Graph {
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
    requested: Vec<String>,
    dropped: Vec<DroppedOutput>,
}

impl Graph {
    /// Build the evaluation graph for `requested` outputs over `ds_in`.
    ///
    /// Consumes the registry: sideloaded data moves into the graph.
    pub fn build(
        requested: &[&str],
        ds_in: &Dataset,
        mut registry: Registry,
    ) -> Result<Self, GraphError> {
        check_library_cycles()?;

        let mut memo: HashMap<&str, BTreeSet<String>> = HashMap::new();
        let mut kept: Vec<&str> = Vec::new();
        let mut dropped = Vec::new();
        for &name in requested {
            let missing = resolve(name, ds_in, &registry, &mut memo);
            if missing.is_empty() {
                kept.push(name);
            } else {
                let missing: Vec<String> = missing.into_iter().collect();
                warn!(
                    output = name,
                    missing = missing.join(", "),
                    "dropping requested output: inputs unavailable"
                );
                dropped.push(DroppedOutput {
                    name: name.to_string(),
                    missing,
                });
            }
        }

        if kept.is_empty() {
            let all_missing: BTreeSet<&str> = dropped
                .iter()
                .flat_map(|d| d.missing.iter().map(String::as_str))
                .collect();
            return Err(GraphError::Unsatisfiable(format!(
                "every requested output is missing inputs ({})",
                all_missing.into_iter().collect::<Vec<_>>().join(", ")
            )));
        }

        let mut graph = Self {
            nodes: Vec::new(),
            index: HashMap::new(),
            requested: kept.iter().map(|s| s.to_string()).collect(),
            dropped,
        };
        for &name in &kept {
            graph.add_node(name, ds_in, &mut registry)?;
        }

        info!(
            nodes = graph.nodes.len(),
            outputs = graph.requested.len(),
            dropped = graph.dropped.len(),
            "evaluation graph built"
        );
        Ok(graph)
    }

    fn add_node(
        &mut self,
        name: &str,
        ds_in: &Dataset,
        registry: &mut Registry,
    ) -> Result<usize, GraphError> {
        if let Some(&idx) = self.index.get(name) {
            return Ok(idx);
        }

        // Sideload takes precedence: it short-circuits both inputs and
        // kernels for the node it names.
        let node = if registry.is_sideloaded(name) {
            let sideload = registry
                .take_sideload(name)
                .ok_or_else(|| GraphError::Registration(format!("sideload for `{name}` vanished")))?;
            let composites = reconcile_sideload(name, sideload, ds_in)?;
            debug!(node = name, "node sideloaded");
            Node {
                name: name.to_string(),
                deps: Vec::new(),
                kind: NodeKind::Sideloaded { composites },
            }
        } else if ds_in.contains(name) {
            Node {
                name: name.to_string(),
                deps: Vec::new(),
                kind: NodeKind::Input,
            }
        } else {
            // Resolution already proved this name is a satisfiable library
            // node with satisfiable dependencies.
            let spec = library::find(name).ok_or_else(|| {
                GraphError::Unsatisfiable(format!("`{name}` resolved but is not in the library"))
            })?;
            let mut deps = Vec::with_capacity(spec.deps.len());
            for dep in spec.deps {
                deps.push(self.add_node(dep, ds_in, registry)?);
            }
            Node {
                name: name.to_string(),
                deps,
                kind: NodeKind::Transfer {
                    spec,
                    enhancer: registry.enhancer(name).cloned(),
                },
            }
        };

        let idx = self.nodes.len();
        self.nodes.push(node);
        self.index.insert(name.to_string(), idx);
        Ok(idx)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, idx: usize) -> &Node {
        &self.nodes[idx]
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Outputs that survived pruning.
    pub fn requested(&self) -> &[String] {
        &self.requested
    }

    /// Outputs dropped for missing inputs.
    pub fn dropped(&self) -> &[DroppedOutput] {
        &self.dropped
    }

    /// All dependency edges as (from, to) index pairs.
    pub fn edges(&self) -> Vec<(usize, usize)> {
        let mut edges = Vec::new();
        for (to, node) in self.nodes.iter().enumerate() {
            for &from in &node.deps {
                edges.push((from, to));
            }
        }
        edges
    }
}

/// The leaf variables `name` needs but which are not available; empty means
/// the node is computable.
fn resolve(
    name: &str,
    ds_in: &Dataset,
    registry: &Registry,
    memo: &mut HashMap<&str, BTreeSet<String>>,
) -> BTreeSet<String> {
    if registry.is_sideloaded(name) || ds_in.contains(name) {
        return BTreeSet::new();
    }
    let Some(spec) = library::find(name) else {
        return BTreeSet::from([name.to_string()]);
    };
    if let Some(cached) = memo.get(spec.name) {
        return cached.clone();
    }
    let mut missing = BTreeSet::new();
    for dep in spec.deps {
        missing.extend(resolve(dep, ds_in, registry, memo));
    }
    memo.insert(spec.name, missing.clone());
    missing
}

/// Reject dependency cycles in the library before resolution recurses into
/// it.
fn check_library_cycles() -> Result<(), GraphError> {
    let names: Vec<&str> = library::library().iter().map(|spec| spec.name).collect();
    match detect_cycle(&names, &|name| library::find(name).map(|spec| spec.deps)) {
        Some(node) => Err(GraphError::CyclicGraph(node)),
        None => Ok(()),
    }
}

/// Three-color depth-first search over a declared dependency table.
/// Names without an entry are treated as leaves. Returns a node on the
/// cycle, if any.
fn detect_cycle<'a>(
    names: &[&'a str],
    deps_of: &dyn Fn(&str) -> Option<&'a [&'a str]>,
) -> Option<String> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Visiting,
        Done,
    }

    fn visit<'a>(
        name: &'a str,
        deps_of: &dyn Fn(&str) -> Option<&'a [&'a str]>,
        marks: &mut HashMap<&'a str, Mark>,
    ) -> Option<String> {
        let Some(deps) = deps_of(name) else {
            return None;
        };
        match marks.get(name) {
            Some(Mark::Done) => return None,
            Some(Mark::Visiting) => return Some(name.to_string()),
            None => {}
        }
        marks.insert(name, Mark::Visiting);
        for &dep in deps {
            if let Some(node) = visit(dep, deps_of, marks) {
                return Some(node);
            }
        }
        marks.insert(name, Mark::Done);
        None
    }

    let mut marks = HashMap::new();
    for &name in names {
        if let Some(node) = visit(name, deps_of, &mut marks) {
            return Some(node);
        }
    }
    None
}

/// Place a sideloaded sequence onto the run grid and bin axis.
fn reconcile_sideload(
    name: &str,
    sideload: Sideload,
    ds_in: &Dataset,
) -> Result<Vec<Composite>, GraphError> {
    if sideload.composites.len() != ds_in.bins.len() {
        return Err(GraphError::Registration(format!(
            "sideload for `{name}` has {} composites, run has {} bins",
            sideload.composites.len(),
            ds_in.bins.len()
        )));
    }
    if sideload.grid.crs != ds_in.grid.crs {
        return Err(GraphError::Sideload(ReconciliationError::CrsMismatch {
            src: sideload.grid.crs.code().to_string(),
            target: ds_in.grid.crs.code().to_string(),
        }));
    }

    let same_grid = sideload.grid == ds_in.grid;
    if !same_grid && !sideload.grid.bbox.intersects(&ds_in.grid.bbox) {
        return Err(GraphError::Sideload(ReconciliationError::NoOverlap {
            src: format!("{:?}", sideload.grid.bbox),
            target: format!("{:?}", ds_in.grid.bbox),
        }));
    }

    let composites = sideload
        .composites
        .into_iter()
        .zip(&ds_in.bins)
        .map(|(comp, bin)| {
            let data = if same_grid {
                comp.data
            } else {
                resample_to_grid(
                    &comp.data,
                    &sideload.grid,
                    &ds_in.grid,
                    ResampleMethod::Bilinear,
                )
            };
            Composite::new(name, *bin, data, Provenance::Sideloaded)
        })
        .collect();
    Ok(composites)
}
