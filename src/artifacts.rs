//! Startup loading of the model, scaler and cell vocabulary.

use crate::config::ArtifactPaths;
use crate::error::{ArtifactError, PredictError};
use crate::model::{AdditiveDemandModel, DemandModel, FeatureFrame, FeatureRow};
use crate::registry::KnownCellRegistry;
use crate::scaler::FeatureScaler;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Everything needed to score rows, loaded together.
pub struct ModelArtifacts {
    pub model: Arc<dyn DemandModel>,
    pub scaler: FeatureScaler,
    pub registry: KnownCellRegistry,
}

impl ModelArtifacts {
    pub fn new(model: Arc<dyn DemandModel>, scaler: FeatureScaler, registry: KnownCellRegistry) -> Self {
        Self { model, scaler, registry }
    }

    /// Read the three artifact files and check they agree with each other.
    pub fn load(paths: &ArtifactPaths) -> Result<Self, ArtifactError> {
        debug!("Loading cell vocabulary from {}", paths.categories.display());
        let registry = KnownCellRegistry::from_json_path(&paths.categories)?;

        debug!("Loading scaler from {}", paths.scaler.display());
        let scaler = FeatureScaler::from_json_path(&paths.scaler)?;

        debug!("Loading model from {}", paths.model.display());
        let model = AdditiveDemandModel::from_json_path(&paths.model)?;

        if let Some(max_code) = registry.max_code() {
            if max_code as usize >= model.category_count() {
                return Err(ArtifactError::InvalidModel(format!(
                    "vocabulary uses category code {} but the model only has {} cell effects",
                    max_code,
                    model.category_count()
                )));
            }
        }

        Ok(Self::new(Arc::new(model), scaler, registry))
    }

    /// Encode and score a batch, one finite demand value per row in input
    /// order.
    pub fn score(&self, rows: &[FeatureRow]) -> Result<Vec<f64>, PredictError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let frame = FeatureFrame::encode(rows, &self.registry, &self.scaler)?;
        let scores = self.model.predict(&frame)?;
        if scores.len() != rows.len() {
            return Err(PredictError::Internal(format!(
                "model returned {} scores for {} rows",
                scores.len(),
                rows.len()
            )));
        }
        if let Some(bad) = scores.iter().find(|s| !s.is_finite()) {
            return Err(PredictError::Internal(format!("model returned non-finite demand {}", bad)));
        }
        Ok(scores)
    }
}

/// Process-wide model state, fixed at startup.
#[derive(Clone)]
pub enum ModelContext {
    Ready(Arc<ModelArtifacts>),
    Unavailable { reason: String },
}

impl ModelContext {
    /// Load artifacts, recording a failure instead of aborting.
    pub fn load(paths: &ArtifactPaths) -> Self {
        match ModelArtifacts::load(paths) {
            Ok(artifacts) => {
                info!(
                    "Model and artifacts loaded successfully ({} known cells)",
                    artifacts.registry.len()
                );
                ModelContext::Ready(Arc::new(artifacts))
            }
            Err(e) => {
                error!("Could not load model artifacts on startup: {}", e);
                ModelContext::Unavailable { reason: e.to_string() }
            }
        }
    }

    pub fn ready(artifacts: ModelArtifacts) -> Self {
        ModelContext::Ready(Arc::new(artifacts))
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ModelContext::Ready(_))
    }

    /// The loaded artifacts, or `ServiceUnavailable`.
    pub fn artifacts(&self) -> Result<&Arc<ModelArtifacts>, PredictError> {
        match self {
            ModelContext::Ready(artifacts) => Ok(artifacts),
            ModelContext::Unavailable { reason } => Err(PredictError::ServiceUnavailable(reason.clone())),
        }
    }
}
