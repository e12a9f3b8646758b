//! Feature encoding and the demand model contract.
//!
//! The regression itself is trained elsewhere. The service only needs to
//! turn rows into the encoded frame the model was trained on and ask for one
//! score per row.

use crate::error::{ArtifactError, PredictError};
use crate::registry::KnownCellRegistry;
use crate::scaler::FeatureScaler;
use h3o::CellIndex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One row to score, before encoding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureRow {
    pub cell: CellIndex,
    pub day_of_week: u8,
    pub hour_of_day: u8,
    pub business_ratio: f64,
}

/// Encoded batch in training column order:
/// `h3_cell, day_of_week, hour_of_day, business_ratio`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureFrame {
    pub h3_cell: Vec<u32>,
    pub day_of_week: Vec<u8>,
    pub hour_of_day: Vec<u8>,
    pub business_ratio: Vec<f64>,
}

impl FeatureFrame {
    /// Scale the ratio column and map each cell to its category code.
    ///
    /// A cell outside the vocabulary fails the whole batch.
    pub fn encode(
        rows: &[FeatureRow],
        registry: &KnownCellRegistry,
        scaler: &FeatureScaler,
    ) -> Result<Self, PredictError> {
        let mut frame = FeatureFrame {
            h3_cell: Vec::with_capacity(rows.len()),
            day_of_week: Vec::with_capacity(rows.len()),
            hour_of_day: Vec::with_capacity(rows.len()),
            business_ratio: Vec::with_capacity(rows.len()),
        };

        for row in rows {
            let code = registry.code_of(row.cell).ok_or_else(|| {
                PredictError::Internal(format!("cell {} is not in the model vocabulary", row.cell))
            })?;
            frame.h3_cell.push(code);
            frame.day_of_week.push(row.day_of_week);
            frame.hour_of_day.push(row.hour_of_day);
            frame.business_ratio.push(scaler.transform(row.business_ratio));
        }

        Ok(frame)
    }

    pub fn len(&self) -> usize {
        self.h3_cell.len()
    }

    pub fn is_empty(&self) -> bool {
        self.h3_cell.is_empty()
    }
}

/// A trained regression returning one demand estimate per row.
///
/// Implementations must be pure: each output depends only on its own row.
pub trait DemandModel: Send + Sync {
    fn predict(&self, frame: &FeatureFrame) -> Result<Vec<f64>, PredictError>;
}

/// Additive regression exported to JSON.
///
/// `demand = intercept + cell_effects[code] + day_effects[day]
///           + hour_effects[hour] + business_ratio_coef * scaled_ratio`,
/// floored at `min_prediction`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdditiveDemandModel {
    pub intercept: f64,
    pub cell_effects: Vec<f64>,
    pub day_effects: Vec<f64>,
    pub hour_effects: Vec<f64>,
    pub business_ratio_coef: f64,
    #[serde(default)]
    pub min_prediction: f64,
}

impl AdditiveDemandModel {
    pub fn from_json_path(path: &Path) -> Result<Self, ArtifactError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let model: AdditiveDemandModel =
            serde_json::from_str(&raw).map_err(|source| ArtifactError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.day_effects.len() != 7 {
            return Err(ArtifactError::InvalidModel(format!(
                "expected 7 day effects, found {}",
                self.day_effects.len()
            )));
        }
        if self.hour_effects.len() != 24 {
            return Err(ArtifactError::InvalidModel(format!(
                "expected 24 hour effects, found {}",
                self.hour_effects.len()
            )));
        }
        let all_finite = std::iter::once(self.intercept)
            .chain(std::iter::once(self.business_ratio_coef))
            .chain(self.cell_effects.iter().copied())
            .chain(self.day_effects.iter().copied())
            .chain(self.hour_effects.iter().copied())
            .all(f64::is_finite);
        if !all_finite {
            return Err(ArtifactError::InvalidModel("non-finite coefficient".to_string()));
        }
        Ok(())
    }

    /// Number of cell categories the model carries effects for.
    pub fn category_count(&self) -> usize {
        self.cell_effects.len()
    }
}

impl DemandModel for AdditiveDemandModel {
    fn predict(&self, frame: &FeatureFrame) -> Result<Vec<f64>, PredictError> {
        let mut out = Vec::with_capacity(frame.len());
        for i in 0..frame.len() {
            let code = frame.h3_cell[i] as usize;
            let cell = self.cell_effects.get(code).ok_or_else(|| {
                PredictError::Internal(format!("category code {} has no cell effect", code))
            })?;
            let day = self.day_effects.get(frame.day_of_week[i] as usize).ok_or_else(|| {
                PredictError::Internal(format!("day_of_week {} out of range", frame.day_of_week[i]))
            })?;
            let hour = self.hour_effects.get(frame.hour_of_day[i] as usize).ok_or_else(|| {
                PredictError::Internal(format!("hour_of_day {} out of range", frame.hour_of_day[i]))
            })?;

            let demand = self.intercept
                + cell
                + day
                + hour
                + self.business_ratio_coef * frame.business_ratio[i];
            out.push(demand.max(self.min_prediction));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::{cell_for, ring_neighbors};
    use h3o::Resolution;

    fn flat_model(categories: usize) -> AdditiveDemandModel {
        AdditiveDemandModel {
            intercept: 2.0,
            cell_effects: (0..categories).map(|c| c as f64).collect(),
            day_effects: vec![0.0; 7],
            hour_effects: vec![0.0; 24],
            business_ratio_coef: 1.5,
            min_prediction: 0.0,
        }
    }

    fn cells() -> Vec<CellIndex> {
        let center = cell_for(-1.2843, 36.8248, Resolution::Twelve).unwrap();
        ring_neighbors(center, 1)
    }

    #[test]
    fn test_encode_scales_and_codes() {
        let cells = cells();
        let registry = KnownCellRegistry::from_cells(cells.clone());
        let scaler = FeatureScaler::Standard { mean: 0.5, scale: 0.5 };
        let rows = vec![FeatureRow {
            cell: cells[0],
            day_of_week: 4,
            hour_of_day: 11,
            business_ratio: 1.0,
        }];

        let frame = FeatureFrame::encode(&rows, &registry, &scaler).unwrap();
        assert_eq!(frame.len(), 1);
        assert_eq!(frame.h3_cell, vec![registry.code_of(cells[0]).unwrap()]);
        assert_eq!(frame.day_of_week, vec![4]);
        assert_eq!(frame.hour_of_day, vec![11]);
        assert_eq!(frame.business_ratio, vec![1.0]);
    }

    #[test]
    fn test_encode_rejects_unknown_cell() {
        let cells = cells();
        let registry = KnownCellRegistry::from_cells([cells[0]]);
        let scaler = FeatureScaler::Standard { mean: 0.0, scale: 1.0 };
        let rows = vec![FeatureRow { cell: cells[1], day_of_week: 0, hour_of_day: 0, business_ratio: 0.5 }];

        let err = FeatureFrame::encode(&rows, &registry, &scaler).unwrap_err();
        assert!(matches!(err, PredictError::Internal(_)));
    }

    #[test]
    fn test_additive_prediction() {
        let model = flat_model(3);
        let frame = FeatureFrame {
            h3_cell: vec![0, 2],
            day_of_week: vec![1, 1],
            hour_of_day: vec![8, 8],
            business_ratio: vec![0.0, 2.0],
        };
        let scores = model.predict(&frame).unwrap();
        assert_eq!(scores, vec![2.0, 7.0]);
    }

    #[test]
    fn test_prediction_is_floored() {
        let mut model = flat_model(1);
        model.intercept = -10.0;
        let frame = FeatureFrame {
            h3_cell: vec![0],
            day_of_week: vec![0],
            hour_of_day: vec![0],
            business_ratio: vec![0.0],
        };
        assert_eq!(model.predict(&frame).unwrap(), vec![0.0]);
    }

    #[test]
    fn test_unknown_code_fails_batch() {
        let model = flat_model(1);
        let frame = FeatureFrame {
            h3_cell: vec![0, 5],
            day_of_week: vec![0, 0],
            hour_of_day: vec![0, 0],
            business_ratio: vec![0.0, 0.0],
        };
        assert!(model.predict(&frame).is_err());
    }

    #[test]
    fn test_validate_shapes() {
        let mut model = flat_model(2);
        assert!(model.validate().is_ok());
        model.hour_effects.pop();
        assert!(matches!(model.validate(), Err(ArtifactError::InvalidModel(_))));

        let mut model = flat_model(2);
        model.cell_effects[1] = f64::NAN;
        assert!(model.validate().is_err());
    }
}
