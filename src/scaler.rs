//! Pre-fit rescaling of the business ratio feature.

use crate::error::ArtifactError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A fitted single-column scaler, as exported from training.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeatureScaler {
    Standard {
        mean: f64,
        scale: f64,
    },
    MinMax {
        data_min: f64,
        data_max: f64,
        #[serde(default = "default_feature_range")]
        feature_range: (f64, f64),
    },
}

fn default_feature_range() -> (f64, f64) {
    (0.0, 1.0)
}

impl FeatureScaler {
    pub fn from_json_path(path: &Path) -> Result<Self, ArtifactError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let scaler: FeatureScaler =
            serde_json::from_str(&raw).map_err(|source| ArtifactError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        scaler.validate()?;
        Ok(scaler)
    }

    /// Reject degenerate parameters that would divide by zero.
    pub fn validate(&self) -> Result<(), ArtifactError> {
        match *self {
            FeatureScaler::Standard { mean, scale } => {
                if !mean.is_finite() || !scale.is_finite() || scale == 0.0 {
                    return Err(ArtifactError::InvalidScaler(format!(
                        "standard scaler needs finite mean and non-zero scale (mean={}, scale={})",
                        mean, scale
                    )));
                }
            }
            FeatureScaler::MinMax { data_min, data_max, feature_range } => {
                if !data_min.is_finite() || !data_max.is_finite() || data_max <= data_min {
                    return Err(ArtifactError::InvalidScaler(format!(
                        "min-max scaler needs data_max > data_min (min={}, max={})",
                        data_min, data_max
                    )));
                }
                if feature_range.1 <= feature_range.0 {
                    return Err(ArtifactError::InvalidScaler(format!(
                        "empty feature range {:?}",
                        feature_range
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn transform(&self, value: f64) -> f64 {
        match *self {
            FeatureScaler::Standard { mean, scale } => (value - mean) / scale,
            FeatureScaler::MinMax { data_min, data_max, feature_range: (lo, hi) } => {
                let unit = (value - data_min) / (data_max - data_min);
                lo + unit * (hi - lo)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_transform() {
        let scaler = FeatureScaler::Standard { mean: 0.5, scale: 0.25 };
        assert_eq!(scaler.transform(0.5), 0.0);
        assert_eq!(scaler.transform(1.0), 2.0);
        assert_eq!(scaler.transform(0.0), -2.0);
    }

    #[test]
    fn test_min_max_transform() {
        let scaler: FeatureScaler =
            serde_json::from_str(r#"{"kind": "min_max", "data_min": 0.2, "data_max": 0.6}"#).unwrap();
        assert!((scaler.transform(0.4) - 0.5).abs() < 1e-12);
        assert!((scaler.transform(0.2)).abs() < 1e-12);

        let shifted = FeatureScaler::MinMax { data_min: 0.0, data_max: 1.0, feature_range: (-1.0, 1.0) };
        assert_eq!(shifted.transform(0.5), 0.0);
    }

    #[test]
    fn test_zero_scale_rejected() {
        let scaler = FeatureScaler::Standard { mean: 0.3, scale: 0.0 };
        assert!(matches!(scaler.validate(), Err(ArtifactError::InvalidScaler(_))));

        let flat = FeatureScaler::MinMax { data_min: 1.0, data_max: 1.0, feature_range: (0.0, 1.0) };
        assert!(flat.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scaler.json");
        std::fs::write(&path, r#"{"kind": "standard", "mean": 0.6, "scale": 0.2}"#).unwrap();

        let scaler = FeatureScaler::from_json_path(&path).unwrap();
        assert_eq!(scaler, FeatureScaler::Standard { mean: 0.6, scale: 0.2 });

        std::fs::write(&path, r#"{"kind": "robust"}"#).unwrap();
        assert!(matches!(
            FeatureScaler::from_json_path(&path),
            Err(ArtifactError::Json { .. })
        ));
    }
}
