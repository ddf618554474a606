//! Registration of enhancers and sideloaded datasets.
//!
//! Both are validated when registered, not when the run starts: an unknown
//! node name or a conflicting registration fails immediately at the call
//! site.

use crate::error::{GraphError, TransferError};
use crate::library::{self, ChunkContext};
use raster_common::{Composite, GridDefinition};
use std::collections::HashMap;
use std::sync::Arc;

/// A user-supplied per-chunk function hooked onto a library node.
pub type EnhancerFn =
    Arc<dyn Fn(&ChunkContext, &[&[f32]]) -> Result<Vec<f32>, TransferError> + Send + Sync>;

/// How an enhancer relates to the node's built-in kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnhancerMode {
    /// The enhancer runs instead of the built-in kernel and receives the
    /// node's dependency chunks.
    Replace,
    /// The built-in kernel runs first; the enhancer receives the dependency
    /// chunks followed by the kernel's output as one extra trailing chunk.
    Compose,
}

#[derive(Clone)]
pub struct Enhancer {
    pub mode: EnhancerMode,
    pub func: EnhancerFn,
}

impl std::fmt::Debug for Enhancer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Enhancer")
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

/// An externally supplied composite sequence standing in for a node.
pub struct Sideload {
    pub grid: GridDefinition,
    pub composites: Vec<Composite>,
}

/// Collects enhancers and sideloads for one run.
#[derive(Default)]
pub struct Registry {
    enhancers: HashMap<String, Enhancer>,
    sideloads: HashMap<String, Sideload>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hook an enhancer onto a library node.
    ///
    /// Fails for unknown node names, double registration, and nodes already
    /// claimed by a sideload (a sideloaded node never evaluates, so an
    /// enhancer on it could never run).
    pub fn register_enhancer(
        &mut self,
        node: &str,
        mode: EnhancerMode,
        func: EnhancerFn,
    ) -> Result<(), GraphError> {
        if library::find(node).is_none() {
            return Err(GraphError::Registration(format!(
                "`{node}` is not a known transfer function"
            )));
        }
        if self.enhancers.contains_key(node) {
            return Err(GraphError::Registration(format!(
                "an enhancer is already registered for `{node}`"
            )));
        }
        if self.sideloads.contains_key(node) {
            return Err(GraphError::Registration(format!(
                "`{node}` is sideloaded; an enhancer on it would never run"
            )));
        }
        tracing::debug!(node, mode = ?mode, "registered enhancer");
        self.enhancers.insert(node.to_string(), Enhancer { mode, func });
        Ok(())
    }

    /// Substitute an externally produced composite sequence for a node.
    ///
    /// The data may live on its own grid; it is reconciled onto the run
    /// grid when the graph is built. Fails for unknown node names and
    /// conflicts, and for an empty sequence.
    pub fn register_sideload(
        &mut self,
        node: &str,
        grid: GridDefinition,
        composites: Vec<Composite>,
    ) -> Result<(), GraphError> {
        if library::find(node).is_none() {
            return Err(GraphError::Registration(format!(
                "`{node}` is not a known transfer function"
            )));
        }
        if self.sideloads.contains_key(node) {
            return Err(GraphError::Registration(format!(
                "a sideload is already registered for `{node}`"
            )));
        }
        if self.enhancers.contains_key(node) {
            return Err(GraphError::Registration(format!(
                "`{node}` has an enhancer; an enhancer on a sideloaded node would never run"
            )));
        }
        if composites.is_empty() {
            return Err(GraphError::Registration(format!(
                "sideload for `{node}` holds no composites"
            )));
        }
        if composites.iter().any(|c| c.data.len() != grid.len()) {
            return Err(GraphError::Registration(format!(
                "sideload for `{node}` has composites that do not match its grid"
            )));
        }
        tracing::debug!(node, bins = composites.len(), "registered sideload");
        self.sideloads.insert(node.to_string(), Sideload { grid, composites });
        Ok(())
    }

    pub fn enhancer(&self, node: &str) -> Option<&Enhancer> {
        self.enhancers.get(node)
    }

    pub fn sideload(&self, node: &str) -> Option<&Sideload> {
        self.sideloads.get(node)
    }

    pub fn is_sideloaded(&self, node: &str) -> bool {
        self.sideloads.contains_key(node)
    }

    pub(crate) fn take_sideload(&mut self, node: &str) -> Option<Sideload> {
        self.sideloads.remove(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use raster_common::{BinPeriod, BoundingBox, Provenance};

    fn noop() -> EnhancerFn {
        Arc::new(|_, deps| Ok(deps[0].to_vec()))
    }

    fn sideload_fixture() -> (GridDefinition, Vec<Composite>) {
        let grid = GridDefinition::geographic(BoundingBox::new(30.0, -5.0, 40.0, 5.0), 2, 2);
        let period = BinPeriod::new(
            Utc.with_ymd_and_hms(2023, 3, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2023, 3, 11, 0, 0, 0).unwrap(),
        );
        let comps = vec![Composite::new(
            "lai",
            period,
            vec![1.5; 4],
            Provenance::Sideloaded,
        )];
        (grid, comps)
    }

    #[test]
    fn test_unknown_node_rejected_immediately() {
        let mut reg = Registry::new();
        let err = reg
            .register_enhancer("no_such_node", EnhancerMode::Replace, noop())
            .unwrap_err();
        assert!(matches!(err, GraphError::Registration(_)));
    }

    #[test]
    fn test_duplicate_enhancer_rejected() {
        let mut reg = Registry::new();
        reg.register_enhancer("lai", EnhancerMode::Replace, noop())
            .unwrap();
        assert!(reg
            .register_enhancer("lai", EnhancerMode::Compose, noop())
            .is_err());
    }

    #[test]
    fn test_enhancer_and_sideload_conflict() {
        let (grid, comps) = sideload_fixture();
        let mut reg = Registry::new();
        reg.register_sideload("lai", grid, comps).unwrap();
        let err = reg
            .register_enhancer("lai", EnhancerMode::Compose, noop())
            .unwrap_err();
        assert!(matches!(err, GraphError::Registration(_)));
    }

    #[test]
    fn test_sideload_must_match_its_grid() {
        let (grid, mut comps) = sideload_fixture();
        comps[0].data.truncate(3);
        let mut reg = Registry::new();
        assert!(reg.register_sideload("lai", grid, comps).is_err());
    }

    #[test]
    fn test_valid_registrations_accepted() {
        let (grid, comps) = sideload_fixture();
        let mut reg = Registry::new();
        reg.register_sideload("lai", grid, comps).unwrap();
        reg.register_enhancer("vc", EnhancerMode::Compose, noop())
            .unwrap();
        assert!(reg.is_sideloaded("lai"));
        assert!(reg.enhancer("vc").is_some());
    }
}
