//! Batch demand estimates for every known cell around a point.

use crate::artifacts::ModelArtifacts;
use crate::error::PredictError;
use crate::model::FeatureRow;
use crate::spatial::ring_neighbors;
use h3o::CellIndex;
use std::cmp::Ordering;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellDemand {
    pub cell: CellIndex,
    pub demand: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Heatmap {
    pub center: CellIndex,
    /// Highest demand first; equal demand ordered by cell token.
    pub hotspots: Vec<CellDemand>,
}

/// Score every known cell within `radius` of `center`.
///
/// All rows share `business_ratio`, so the values are comparable across
/// cells. No known cell in range yields an empty heatmap, not an error.
pub fn aggregate(
    center: CellIndex,
    artifacts: &ModelArtifacts,
    day_of_week: u8,
    hour_of_day: u8,
    business_ratio: f64,
    radius: u32,
) -> Result<Heatmap, PredictError> {
    let known = artifacts.registry.known_among(&ring_neighbors(center, radius));
    if known.is_empty() {
        debug!("No known cells within {} rings of {}", radius, center);
        return Ok(Heatmap { center, hotspots: Vec::new() });
    }

    let rows: Vec<FeatureRow> = known
        .iter()
        .map(|cell| FeatureRow {
            cell: *cell,
            day_of_week,
            hour_of_day,
            business_ratio,
        })
        .collect();
    let scores = artifacts.score(&rows)?;

    let mut hotspots: Vec<CellDemand> = known
        .into_iter()
        .zip(scores)
        .map(|(cell, demand)| CellDemand { cell, demand })
        .collect();
    hotspots.sort_by(|a, b| match b.demand.total_cmp(&a.demand) {
        Ordering::Equal => a.cell.to_string().cmp(&b.cell.to_string()),
        other => other,
    });

    debug!("Scored {} cells around {}", hotspots.len(), center);
    Ok(Heatmap { center, hotspots })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DemandModel, FeatureFrame};
    use crate::registry::KnownCellRegistry;
    use crate::scaler::FeatureScaler;
    use crate::spatial::cell_for;
    use h3o::Resolution;
    use std::sync::{Arc, Mutex};

    /// Echoes the scaled business ratio plus the category code, and keeps
    /// the frames it saw.
    #[derive(Default)]
    struct RecordingModel {
        frames: Mutex<Vec<FeatureFrame>>,
    }

    impl DemandModel for RecordingModel {
        fn predict(&self, frame: &FeatureFrame) -> Result<Vec<f64>, PredictError> {
            self.frames.lock().unwrap().push(frame.clone());
            Ok(frame
                .h3_cell
                .iter()
                .zip(&frame.business_ratio)
                .map(|(code, ratio)| *code as f64 + ratio)
                .collect())
        }
    }

    fn center() -> CellIndex {
        cell_for(-1.2843, 36.8248, Resolution::Twelve).unwrap()
    }

    fn setup(cells: Vec<CellIndex>) -> (Arc<RecordingModel>, ModelArtifacts) {
        let model = Arc::new(RecordingModel::default());
        let artifacts = ModelArtifacts::new(
            model.clone(),
            FeatureScaler::Standard { mean: 0.0, scale: 1.0 },
            KnownCellRegistry::from_cells(cells),
        );
        (model, artifacts)
    }

    #[test]
    fn test_scores_known_cells_in_one_batch() {
        let disk = ring_neighbors(center(), 7);
        let mut known: Vec<CellIndex> = disk.iter().step_by(10).copied().collect();
        let outside = ring_neighbors(center(), 8).into_iter().find(|c| !disk.contains(c)).unwrap();
        known.push(outside);

        let (model, artifacts) = setup(known.clone());
        let heatmap = aggregate(center(), &artifacts, 3, 18, 0.70, 7).unwrap();

        assert_eq!(heatmap.center, center());
        assert_eq!(heatmap.hotspots.len(), known.len() - 1);
        assert!(heatmap.hotspots.iter().all(|h| h.cell != outside));

        let frames = model.frames.lock().unwrap();
        assert_eq!(frames.len(), 1);
        assert!(frames[0].business_ratio.iter().all(|r| *r == 0.70));
        assert!(frames[0].day_of_week.iter().all(|d| *d == 3));
        assert!(frames[0].hour_of_day.iter().all(|h| *h == 18));
    }

    #[test]
    fn test_hotspots_sorted_by_demand() {
        let (_, artifacts) = setup(ring_neighbors(center(), 2));
        let heatmap = aggregate(center(), &artifacts, 0, 0, 0.5, 7).unwrap();
        assert_eq!(heatmap.hotspots.len(), 19);
        assert!(heatmap
            .hotspots
            .windows(2)
            .all(|w| w[0].demand >= w[1].demand));
    }

    #[test]
    fn test_non_finite_score_is_internal() {
        struct NanModel;
        impl DemandModel for NanModel {
            fn predict(&self, frame: &FeatureFrame) -> Result<Vec<f64>, PredictError> {
                Ok((0..frame.len()).map(|i| if i == 0 { f64::NAN } else { 1.0 }).collect())
            }
        }

        let artifacts = ModelArtifacts::new(
            Arc::new(NanModel),
            FeatureScaler::Standard { mean: 0.0, scale: 1.0 },
            KnownCellRegistry::from_cells(ring_neighbors(center(), 1)),
        );
        let err = aggregate(center(), &artifacts, 1, 9, 0.70, 7).unwrap_err();
        assert!(matches!(err, PredictError::Internal(_)));
    }

    #[test]
    fn test_nothing_known_is_empty() {
        let far = cell_for(-30.0, -20.0, Resolution::Twelve).unwrap();
        let (model, artifacts) = setup(vec![far]);
        let heatmap = aggregate(center(), &artifacts, 1, 9, 0.70, 7).unwrap();
        assert!(heatmap.hotspots.is_empty());
        assert!(model.frames.lock().unwrap().is_empty());
    }
}
