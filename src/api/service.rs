//! Prediction business logic behind the HTTP handlers.

use crate::artifacts::ModelContext;
use crate::config::PredictionSettings;
use crate::error::PredictError;
use crate::heatmap::{self, Heatmap};
use crate::models::{HeatmapQuery, PredictionRequest};
use crate::resolver::{self, ResolvedPrediction};
use crate::spatial::cell_for;
use std::sync::Arc;
use tracing::error;

// ============================================================================
// Demand Service
// ============================================================================

pub struct DemandService {
    context: ModelContext,
    settings: PredictionSettings,
}

/// Model status reported by the health endpoint.
#[derive(Debug, Clone)]
pub struct ModelStatus {
    pub loaded: bool,
    pub known_cells: usize,
    pub reason: Option<String>,
}

impl DemandService {
    pub fn new(context: ModelContext, settings: PredictionSettings) -> Self {
        Self { context, settings }
    }

    pub fn status(&self) -> ModelStatus {
        match &self.context {
            ModelContext::Ready(artifacts) => ModelStatus {
                loaded: true,
                known_cells: artifacts.registry.len(),
                reason: None,
            },
            ModelContext::Unavailable { reason } => ModelStatus {
                loaded: false,
                known_cells: 0,
                reason: Some(reason.clone()),
            },
        }
    }

    /// Predict demand at a point, falling back to a nearby known cell.
    pub fn predict(&self, request: &PredictionRequest) -> Result<ResolvedPrediction, PredictError> {
        let covariates = request.validate()?;
        let artifacts = self.context.artifacts()?;
        let requested = cell_for(request.latitude, request.longitude, self.settings.resolution)?;
        resolver::resolve(requested, artifacts, covariates, self.settings.max_fallback_rings)
    }

    /// Demand for every known cell around a point.
    pub fn heatmap(&self, query: &HeatmapQuery) -> Result<Heatmap, PredictError> {
        let (day, hour) = query.validate()?;
        let artifacts = self.context.artifacts()?;
        let center = cell_for(query.lat, query.lon, self.settings.resolution)?;

        heatmap::aggregate(
            center,
            artifacts,
            day,
            hour,
            self.settings.heatmap_business_ratio,
            self.settings.heatmap_radius,
        )
        .map_err(|e| {
            error!("Heatmap generation failed around {}: {}", center, e);
            e
        })
    }

    /// [`Self::heatmap`] on the blocking pool, bounded by the scoring timeout.
    pub async fn heatmap_bounded(self: Arc<Self>, query: HeatmapQuery) -> Result<Heatmap, PredictError> {
        let timeout = self.settings.scoring_timeout;
        let task = tokio::task::spawn_blocking(move || self.heatmap(&query));

        let joined = match timeout {
            Some(limit) => tokio::time::timeout(limit, task).await.map_err(|_| {
                error!("Heatmap scoring exceeded {:?}", limit);
                PredictError::Internal(format!("heatmap scoring timed out after {:?}", limit))
            })?,
            None => task.await,
        };

        joined.map_err(|e| {
            error!("Heatmap task failed: {}", e);
            PredictError::Internal(e.to_string())
        })?
    }
}
