//! Spatial reconciliation: placing a layer onto the run grid.

use crate::config::VariableKind;
use crate::resample::{resample_to_grid, ResampleMethod};
use raster_common::{GridDefinition, RasterLayer, ReconciliationError};
use tracing::debug;

/// Reconcile a layer onto a target grid.
///
/// Pure transform, no I/O. Returns a new layer on `target`; the input is
/// untouched. Fails when the source cannot legitimately be placed on the
/// target: disjoint extents, a differing CRS (reprojection is delegated to
/// external tooling and must happen before ingest), or an averaging method
/// applied to a categorical variable.
pub fn reconcile(
    layer: &RasterLayer,
    target: &GridDefinition,
    method: ResampleMethod,
    kind: VariableKind,
) -> Result<RasterLayer, ReconciliationError> {
    if layer.grid.is_empty() || target.is_empty() {
        return Err(ReconciliationError::InvalidGrid(
            "source or target grid has zero cells".to_string(),
        ));
    }

    if kind == VariableKind::Categorical && method != ResampleMethod::Nearest {
        return Err(ReconciliationError::MethodMismatch {
            variable: layer.variable.clone(),
            method: method.to_string(),
        });
    }

    if layer.grid.crs != target.crs {
        return Err(ReconciliationError::CrsMismatch {
            src: layer.grid.crs.to_string(),
            target: target.crs.to_string(),
        });
    }

    if !layer.grid.bbox.intersects(&target.bbox) {
        return Err(ReconciliationError::NoOverlap {
            src: format!("{:?}", layer.grid.bbox),
            target: format!("{:?}", target.bbox),
        });
    }

    // Identity fast path: already on the target grid.
    if layer.grid == *target {
        return Ok(layer.clone());
    }

    debug!(
        variable = %layer.variable,
        method = %method,
        src_shape = ?(layer.grid.width, layer.grid.height),
        dst_shape = ?(target.width, target.height),
        "resampling layer onto run grid"
    );

    let data = resample_to_grid(&layer.data, &layer.grid, target, method);
    Ok(RasterLayer::new(
        layer.variable.clone(),
        layer.timestamp,
        target.clone(),
        data,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use raster_common::{BoundingBox, Crs};

    fn layer(bbox: BoundingBox, width: usize, height: usize) -> RasterLayer {
        let grid = GridDefinition::geographic(bbox, width, height);
        let data: Vec<f32> = (0..grid.len()).map(|i| i as f32).collect();
        RasterLayer::new(
            "ndvi",
            Utc.with_ymd_and_hms(2023, 3, 1, 0, 0, 0).unwrap(),
            grid,
            data,
        )
    }

    #[test]
    fn test_identity_passthrough() {
        let src = layer(BoundingBox::new(0.0, 0.0, 2.0, 2.0), 2, 2);
        let out = reconcile(
            &src,
            &src.grid.clone(),
            ResampleMethod::Bilinear,
            VariableKind::Continuous,
        )
        .unwrap();
        assert_eq!(out.data, src.data);
    }

    #[test]
    fn test_no_overlap_fails() {
        let src = layer(BoundingBox::new(0.0, 0.0, 2.0, 2.0), 2, 2);
        let target = GridDefinition::geographic(BoundingBox::new(10.0, 10.0, 12.0, 12.0), 2, 2);
        let err = reconcile(
            &src,
            &target,
            ResampleMethod::Bilinear,
            VariableKind::Continuous,
        )
        .unwrap_err();
        assert!(matches!(err, ReconciliationError::NoOverlap { .. }));
    }

    #[test]
    fn test_crs_mismatch_fails() {
        let mut src = layer(BoundingBox::new(0.0, 0.0, 2.0, 2.0), 2, 2);
        src.grid.crs = Crs::Other("EPSG:32636".to_string());
        let target = GridDefinition::geographic(BoundingBox::new(0.0, 0.0, 2.0, 2.0), 2, 2);
        let err = reconcile(
            &src,
            &target,
            ResampleMethod::Bilinear,
            VariableKind::Continuous,
        )
        .unwrap_err();
        assert!(matches!(err, ReconciliationError::CrsMismatch { .. }));
    }

    #[test]
    fn test_categorical_requires_nearest() {
        let src = layer(BoundingBox::new(0.0, 0.0, 2.0, 2.0), 2, 2);
        let target = GridDefinition::geographic(BoundingBox::new(0.0, 0.0, 2.0, 2.0), 4, 4);

        let err = reconcile(
            &src,
            &target,
            ResampleMethod::Bilinear,
            VariableKind::Categorical,
        )
        .unwrap_err();
        assert!(matches!(err, ReconciliationError::MethodMismatch { .. }));

        // Nearest is fine.
        assert!(reconcile(
            &src,
            &target,
            ResampleMethod::Nearest,
            VariableKind::Categorical
        )
        .is_ok());
    }

    #[test]
    fn test_resamples_to_target_shape() {
        let src = layer(BoundingBox::new(0.0, 0.0, 4.0, 4.0), 4, 4);
        let target = GridDefinition::geographic(BoundingBox::new(0.0, 0.0, 4.0, 4.0), 8, 8);
        let out = reconcile(
            &src,
            &target,
            ResampleMethod::Bilinear,
            VariableKind::Continuous,
        )
        .unwrap();
        assert_eq!(out.grid, target);
        assert_eq!(out.data.len(), 64);
    }
}
