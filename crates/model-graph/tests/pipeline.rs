//! End-to-end runs: composited inputs through graph build and chunked
//! evaluation.

use compositing::{composite_dataset, CompositingConfig, VariableConfig};
use model_graph::{
    CancelToken, DiagnosticPixel, EnhancerMode, Executor, ExecutorConfig, Graph, NodeStatus,
    Registry, RunStatus, TransferError,
};
use raster_common::{BinPolicy, Composite, Dataset, GridDefinition, Provenance};
use std::sync::Arc;
use test_utils::{constant_layer, day, march_window, test_grid};

const INPUTS: &[(&str, f32)] = &[
    ("ndvi", 0.6),
    ("p_24", 2.0),
    ("t_air_24", 25.0),
    ("u_24", 2.0),
    ("vp_24", 15.0),
    ("ra_24", 240.0),
    ("se_root", 0.6),
    ("r0", 0.2),
    ("p_air_24", 1013.0),
];

/// A dataset with the given constant-valued variables on an 8x8 grid over
/// three ten-day bins.
fn dataset_with(values: &[(&str, f32)]) -> Dataset {
    let grid = test_grid(8, 8);
    let bins = BinPolicy::FixedDays(10)
        .bin_periods(&march_window())
        .unwrap();
    let mut ds = Dataset::new(grid.clone(), bins.clone());
    for &(name, value) in values {
        let comps = bins
            .iter()
            .map(|b| {
                Composite::new(name, *b, vec![value; grid.len()], Provenance::Observed { count: 2 })
            })
            .collect();
        ds.insert(name, comps);
    }
    ds
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn small_executor() -> Executor {
    Executor::new(ExecutorConfig {
        chunk_width: 4,
        chunk_height: 4,
        diagnostic_pixels: Vec::new(),
    })
    .unwrap()
}

#[test]
fn full_model_run_produces_plausible_water_fluxes() {
    init_tracing();
    let ds_in = dataset_with(INPUTS);
    let graph = Graph::build(
        &["aeti_24_mm", "et_ref_24_mm", "npp", "int_mm"],
        &ds_in,
        Registry::new(),
    )
    .unwrap();
    let outcome = small_executor().execute(&graph, &ds_in);

    assert!(outcome.report.is_clean());
    assert_eq!(outcome.report.status, RunStatus::Completed);
    assert_eq!(outcome.dataset.len(), 4);

    for name in ["aeti_24_mm", "et_ref_24_mm", "npp", "int_mm"] {
        let comps = outcome.dataset.get(name).unwrap();
        assert_eq!(comps.len(), 3, "{name} should cover all bins");
        for comp in comps {
            assert_eq!(comp.provenance, Provenance::Computed);
            assert!(comp.data.iter().all(|v| v.is_finite()), "{name} has nodata");
        }
    }

    // Warm, moist, well-lit conditions: daily ET in the low mm range.
    let aeti = outcome.dataset.get("aeti_24_mm").unwrap()[0].data[0];
    assert!(aeti > 0.1 && aeti < 15.0, "aeti = {aeti}");
    let et_ref = outcome.dataset.get("et_ref_24_mm").unwrap()[0].data[0];
    assert!(et_ref > 0.5 && et_ref < 15.0, "et_ref = {et_ref}");
    let npp = outcome.dataset.get("npp").unwrap()[0].data[0];
    assert!(npp > 0.0 && npp < 50.0, "npp = {npp}");
}

#[test]
fn composited_observations_feed_the_model_directly() {
    // The ingest half builds ds_in from raw layers; the compute half never
    // sees anything but the dataset.
    let grid = test_grid(8, 8);
    let window = march_window();
    let mut layers = Vec::new();
    for &(name, value) in INPUTS {
        for d in [2, 14, 25] {
            layers.push(constant_layer(&grid, name, day(2023, 3, d), value));
        }
    }

    let mut config = CompositingConfig::new(BinPolicy::FixedDays(10));
    for &(name, _) in INPUTS {
        config = config.with_variable(name, VariableConfig::continuous());
    }

    let ds_in = composite_dataset(layers, &grid, &window, &config).unwrap();
    assert_eq!(ds_in.len(), INPUTS.len());

    let graph = Graph::build(&["et_ref_24_mm"], &ds_in, Registry::new()).unwrap();
    let outcome = small_executor().execute(&graph, &ds_in);
    assert!(outcome.report.is_clean());
    assert!(outcome.dataset.contains("et_ref_24_mm"));
}

#[test]
fn missing_inputs_degrade_the_product_list_not_the_run() {
    init_tracing();
    let ds_in = dataset_with(&[("ndvi", 0.6), ("p_24", 2.0)]);
    let graph = Graph::build(&["aeti_24_mm", "int_mm"], &ds_in, Registry::new()).unwrap();
    let outcome = small_executor().execute(&graph, &ds_in);

    assert_eq!(outcome.report.status, RunStatus::Completed);
    assert!(outcome.dataset.contains("int_mm"));
    assert!(!outcome.dataset.contains("aeti_24_mm"));
    assert_eq!(outcome.report.dropped.len(), 1);
    assert_eq!(outcome.report.dropped[0].name, "aeti_24_mm");
    assert!(outcome
        .report
        .dropped[0]
        .missing
        .contains(&"t_air_24".to_string()));

    // The surviving output is numerically identical to a full-input run.
    let ds_full = dataset_with(INPUTS);
    let full_graph = Graph::build(&["aeti_24_mm", "int_mm"], &ds_full, Registry::new()).unwrap();
    let full = small_executor().execute(&full_graph, &ds_full);
    assert_eq!(
        outcome.dataset.get("int_mm").unwrap()[0].data,
        full.dataset.get("int_mm").unwrap()[0].data
    );
}

#[test]
fn sideloaded_variable_short_circuits_its_subtree() {
    let ds_in = dataset_with(INPUTS);

    // Substitute a constant leaf-area product for the NDVI-derived one.
    let comps: Vec<Composite> = ds_in
        .bins
        .iter()
        .map(|b| Composite::new("lai", *b, vec![2.0; ds_in.grid.len()], Provenance::Sideloaded))
        .collect();
    let mut registry = Registry::new();
    registry
        .register_sideload("lai", ds_in.grid.clone(), comps)
        .unwrap();

    let graph = Graph::build(&["sf_soil"], &ds_in, registry).unwrap();
    let outcome = small_executor().execute(&graph, &ds_in);

    assert_eq!(outcome.statuses["lai"], NodeStatus::Sideloaded);
    // sf_soil = exp(-0.6 * lai) with lai pinned at 2.
    let sf = outcome.dataset.get("sf_soil").unwrap()[0].data[0];
    assert!((sf - (-1.2f32).exp()).abs() < 1e-6);
    // The NDVI branch was never built.
    assert!(!outcome.statuses.contains_key("vc"));
}

#[test]
fn requested_sideload_passes_through_with_provenance() {
    let ds_in = dataset_with(INPUTS);
    let comps: Vec<Composite> = ds_in
        .bins
        .iter()
        .map(|b| Composite::new("lai", *b, vec![2.0; ds_in.grid.len()], Provenance::Sideloaded))
        .collect();
    let mut registry = Registry::new();
    registry
        .register_sideload("lai", ds_in.grid.clone(), comps)
        .unwrap();

    let graph = Graph::build(&["lai"], &ds_in, registry).unwrap();
    let outcome = small_executor().execute(&graph, &ds_in);

    assert_eq!(outcome.report.substituted, vec!["lai".to_string()]);
    let comps = outcome.dataset.get("lai").unwrap();
    assert_eq!(comps[0].provenance, Provenance::Sideloaded);
    assert_eq!(comps[0].data[0], 2.0);
}

#[test]
fn failing_node_poisons_dependents_and_spares_the_rest() {
    let ds_in = dataset_with(INPUTS);
    let mut registry = Registry::new();
    registry
        .register_enhancer(
            "svp_24",
            EnhancerMode::Replace,
            Arc::new(|_, _| Err(TransferError::Enhancer("humidity sensor drift".to_string()))),
        )
        .unwrap();

    let graph = Graph::build(&["aeti_24_mm", "int_mm"], &ds_in, registry).unwrap();
    let outcome = small_executor().execute(&graph, &ds_in);

    assert_eq!(outcome.report.status, RunStatus::Completed);
    assert_eq!(outcome.statuses["svp_24"], NodeStatus::Failed);
    assert_eq!(outcome.statuses["vpd_24"], NodeStatus::Failed);
    assert_eq!(outcome.statuses["aeti_24_mm"], NodeStatus::Failed);
    // The interception branch does not pass through humidity.
    assert_eq!(outcome.statuses["int_mm"], NodeStatus::Computed);
    assert!(outcome.dataset.contains("int_mm"));
    assert!(!outcome.dataset.contains("aeti_24_mm"));

    let root = outcome
        .report
        .failed
        .iter()
        .find(|f| f.name == "svp_24")
        .unwrap();
    assert!(root.reason.contains("humidity sensor drift"));
    let poisoned = outcome
        .report
        .failed
        .iter()
        .find(|f| f.name == "vpd_24")
        .unwrap();
    assert!(poisoned.reason.contains("svp_24"));
}

#[test]
fn compose_enhancer_sees_the_kernel_output_last() {
    let ds_in = dataset_with(INPUTS);
    let mut registry = Registry::new();
    // Halve the built-in vegetation cover.
    registry
        .register_enhancer(
            "vc",
            EnhancerMode::Compose,
            Arc::new(|_, chunks| {
                let base = chunks[chunks.len() - 1];
                Ok(base.iter().map(|v| v * 0.5).collect())
            }),
        )
        .unwrap();

    let graph = Graph::build(&["vc"], &ds_in, registry).unwrap();
    let outcome = small_executor().execute(&graph, &ds_in);
    let enhanced = outcome.dataset.get("vc").unwrap()[0].data[0];

    let plain_graph = Graph::build(&["vc"], &ds_in, Registry::new()).unwrap();
    let plain = small_executor().execute(&plain_graph, &ds_in);
    let baseline = plain.dataset.get("vc").unwrap()[0].data[0];

    assert!((enhanced - baseline * 0.5).abs() < 1e-6);
}

#[test]
fn cancelled_run_returns_no_data() {
    let ds_in = dataset_with(INPUTS);
    let graph = Graph::build(&["aeti_24_mm"], &ds_in, Registry::new()).unwrap();
    let token = CancelToken::new();
    token.cancel();

    let outcome = small_executor().execute_with_cancel(&graph, &ds_in, &token);
    assert_eq!(outcome.report.status, RunStatus::Cancelled);
    assert!(outcome.dataset.is_empty());
    assert!(outcome.trace.is_empty());
}

#[test]
fn runs_are_deterministic_across_chunk_shapes() {
    let ds_in = dataset_with(INPUTS);
    let graph = Graph::build(&["aeti_24_mm", "npp"], &ds_in, Registry::new()).unwrap();

    let a = small_executor().execute(&graph, &ds_in);
    // An awkward chunk shape that does not divide the grid.
    let b = Executor::new(ExecutorConfig {
        chunk_width: 3,
        chunk_height: 5,
        diagnostic_pixels: Vec::new(),
    })
    .unwrap()
    .execute(&graph, &ds_in);
    let c = small_executor().execute(&graph, &ds_in);

    for name in ["aeti_24_mm", "npp"] {
        let da = &a.dataset.get(name).unwrap()[0].data;
        let db = &b.dataset.get(name).unwrap()[0].data;
        let dc = &c.dataset.get(name).unwrap()[0].data;
        assert_eq!(da, db, "{name} differs across chunk shapes");
        assert_eq!(da, dc, "{name} differs across identical runs");
    }
}

#[test]
fn nodata_propagates_through_the_chain() {
    let mut values = INPUTS.to_vec();
    values.retain(|(name, _)| *name != "ndvi");
    let mut ds_in = dataset_with(&values);

    // NDVI missing in one cell of every bin.
    let comps: Vec<Composite> = ds_in
        .bins
        .iter()
        .map(|b| {
            let mut data = vec![0.6; ds_in.grid.len()];
            data[10] = f32::NAN;
            Composite::new("ndvi", *b, data, Provenance::Observed { count: 1 })
        })
        .collect();
    ds_in.insert("ndvi", comps);

    let graph = Graph::build(&["lai", "aeti_24_mm"], &ds_in, Registry::new()).unwrap();
    let outcome = small_executor().execute(&graph, &ds_in);

    let lai = &outcome.dataset.get("lai").unwrap()[0].data;
    assert!(lai[10].is_nan());
    assert!(lai[11].is_finite());
    let aeti = &outcome.dataset.get("aeti_24_mm").unwrap()[0].data;
    assert!(aeti[10].is_nan());
    assert!(aeti[11].is_finite());
}

#[test]
fn diagnostic_pixels_trace_the_whole_chain() {
    let ds_in = dataset_with(INPUTS);
    let graph = Graph::build(&["lai"], &ds_in, Registry::new()).unwrap();
    let px = DiagnosticPixel { col: 2, row: 3 };
    let executor = Executor::new(ExecutorConfig {
        chunk_width: 4,
        chunk_height: 4,
        diagnostic_pixels: vec![px],
    })
    .unwrap();

    let outcome = executor.execute(&graph, &ds_in);
    assert_eq!(outcome.trace.variables_at(px), vec!["lai", "ndvi", "vc"]);

    let series = outcome.trace.series(px, "lai");
    assert_eq!(series.len(), 3);
    let lai = outcome.dataset.get("lai").unwrap();
    let offset = px.row * ds_in.grid.width + px.col;
    for (bin, value) in series {
        assert_eq!(value, lai[bin].data[offset]);
    }
}

#[test]
fn graph_export_reflects_run_states() {
    let ds_in = dataset_with(INPUTS);
    let graph = Graph::build(&["int_mm"], &ds_in, Registry::new()).unwrap();
    let outcome = small_executor().execute(&graph, &ds_in);

    let exported = model_graph::viz::export(&graph, Some(&outcome.statuses));
    let int_node = exported
        .nodes
        .iter()
        .find(|n| n.name == "int_mm")
        .unwrap();
    assert_eq!(int_node.status, Some(NodeStatus::Computed));
    let ndvi_node = exported.nodes.iter().find(|n| n.name == "ndvi").unwrap();
    assert_eq!(ndvi_node.kind, "input");

    let dot = model_graph::viz::to_dot(&exported);
    assert!(dot.contains("fillcolor=palegreen"));
}

#[test]
fn coarse_sideload_is_resampled_before_the_run() {
    let ds_in = dataset_with(INPUTS);
    let coarse: GridDefinition = test_grid(4, 4);
    let comps: Vec<Composite> = ds_in
        .bins
        .iter()
        .map(|b| Composite::new("lai", *b, vec![3.0; coarse.len()], Provenance::Sideloaded))
        .collect();
    let mut registry = Registry::new();
    registry.register_sideload("lai", coarse, comps).unwrap();

    let graph = Graph::build(&["sf_soil"], &ds_in, registry).unwrap();
    let outcome = small_executor().execute(&graph, &ds_in);
    // Constant field stays constant through bilinear resampling in the
    // interior.
    let sf = outcome.dataset.get("sf_soil").unwrap()[0].data[27];
    assert!((sf - (-1.8f32).exp()).abs() < 1e-5);
}
