//! Graph export for inspection: Graphviz DOT and a JSON document.
//!
//! Exports work before a run (structure only) and after one (structure
//! plus final node states), which is how "why was this output dropped"
//! questions usually get answered.

use crate::graph::{DroppedOutput, Graph, NodeKind};
use crate::report::NodeStatus;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Serialize)]
pub struct NodeExport {
    pub name: String,
    /// "input", "sideloaded" or "transfer".
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<NodeStatus>,
}

#[derive(Debug, Serialize)]
pub struct EdgeExport {
    pub from: String,
    pub to: String,
}

/// The whole graph as a serializable document.
#[derive(Debug, Serialize)]
pub struct GraphExport {
    pub nodes: Vec<NodeExport>,
    pub edges: Vec<EdgeExport>,
    pub requested: Vec<String>,
    pub dropped: Vec<DroppedOutput>,
}

/// Snapshot a graph, attaching run states when available.
pub fn export(graph: &Graph, statuses: Option<&BTreeMap<String, NodeStatus>>) -> GraphExport {
    let nodes = graph
        .nodes()
        .iter()
        .map(|node| NodeExport {
            name: node.name.clone(),
            kind: match node.kind {
                NodeKind::Input => "input",
                NodeKind::Sideloaded { .. } => "sideloaded",
                NodeKind::Transfer { .. } => "transfer",
            },
            status: statuses.and_then(|map| map.get(&node.name).copied()),
        })
        .collect();
    let edges = graph
        .edges()
        .into_iter()
        .map(|(from, to)| EdgeExport {
            from: graph.node(from).name.clone(),
            to: graph.node(to).name.clone(),
        })
        .collect();
    GraphExport {
        nodes,
        edges,
        requested: graph.requested().to_vec(),
        dropped: graph.dropped().to_vec(),
    }
}

/// Pretty-printed JSON for the export.
pub fn to_json(export: &GraphExport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(export)
}

/// Graphviz DOT. Inputs are boxes, sideloads are hexagons, dropped
/// outputs appear dashed; after a run, computed nodes are green and
/// failed ones red.
pub fn to_dot(export: &GraphExport) -> String {
    let mut dot = String::from("digraph model {\n  rankdir=LR;\n  node [shape=ellipse];\n");
    for node in &export.nodes {
        let mut attrs: Vec<String> = Vec::new();
        match node.kind {
            "input" => attrs.push("shape=box".to_string()),
            "sideloaded" => attrs.push("shape=hexagon".to_string()),
            _ => {}
        }
        match node.status {
            Some(NodeStatus::Computed) => {
                attrs.push("style=filled, fillcolor=palegreen".to_string())
            }
            Some(NodeStatus::Failed) => attrs.push("style=filled, fillcolor=salmon".to_string()),
            Some(NodeStatus::Sideloaded) => {
                attrs.push("style=filled, fillcolor=gold".to_string())
            }
            _ => {}
        }
        if export.requested.contains(&node.name) {
            attrs.push("penwidth=2".to_string());
        }
        dot.push_str(&format!("  \"{}\" [{}];\n", node.name, attrs.join(", ")));
    }
    for dropped in &export.dropped {
        dot.push_str(&format!(
            "  \"{}\" [style=dashed, color=gray, label=\"{}\\n(missing: {})\"];\n",
            dropped.name,
            dropped.name,
            dropped.missing.join(", ")
        ));
    }
    for edge in &export.edges {
        dot.push_str(&format!("  \"{}\" -> \"{}\";\n", edge.from, edge.to));
    }
    dot.push_str("}\n");
    dot
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use raster_common::{BinPolicy, Composite, Dataset, Provenance};
    use test_utils::{march_window, test_grid};

    fn graph_fixture() -> Graph {
        let grid = test_grid(4, 4);
        let bins = BinPolicy::FixedDays(10)
            .bin_periods(&march_window())
            .unwrap();
        let mut ds = Dataset::new(grid.clone(), bins.clone());
        let comps: Vec<Composite> = bins
            .iter()
            .map(|b| {
                Composite::new("ndvi", *b, vec![0.5; grid.len()], Provenance::Observed { count: 1 })
            })
            .collect();
        ds.insert("ndvi", comps);
        Graph::build(&["lai", "aeti_24_mm"], &ds, Registry::new()).unwrap()
    }

    #[test]
    fn test_export_names_every_node_and_edge() {
        let graph = graph_fixture();
        let exported = export(&graph, None);
        assert_eq!(exported.nodes.len(), 3);
        assert_eq!(exported.edges.len(), 2);
        assert_eq!(exported.requested, vec!["lai".to_string()]);
        assert_eq!(exported.dropped.len(), 1);
        assert!(exported.nodes.iter().all(|n| n.status.is_none()));
    }

    #[test]
    fn test_dot_output_is_wellformed() {
        let graph = graph_fixture();
        let dot = to_dot(&export(&graph, None));
        assert!(dot.starts_with("digraph model {"));
        assert!(dot.ends_with("}\n"));
        assert!(dot.contains("\"ndvi\" [shape=box]"));
        assert!(dot.contains("\"vc\" -> \"lai\";"));
        assert!(dot.contains("style=dashed"));
    }

    #[test]
    fn test_json_round_trips_as_document() {
        let graph = graph_fixture();
        let json = to_json(&export(&graph, None)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["nodes"].as_array().unwrap().len(), 3);
        assert_eq!(value["dropped"][0]["name"], "aeti_24_mm");
    }
}
