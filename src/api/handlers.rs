//! REST API handlers for the demand predictor
//!
//! These handlers use the shared DemandService.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::service::DemandService;
use crate::error::PredictError;
use crate::heatmap::Heatmap;
use crate::models::{HeatmapQuery, PredictionRequest};
use crate::resolver::ResolvedPrediction;

// ============================================================================
// Response Types (JSON-serializable versions)
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictionResult {
    pub requested_h3_cell: String,
    pub prediction_h3_cell: String,
    pub predicted_demand: f64,
    pub predicted_demand_rounded: i64,
    /// True if the prediction is for the nearest known cell, not the exact requested cell.
    pub is_fallback: bool,
}

impl From<ResolvedPrediction> for PredictionResult {
    fn from(r: ResolvedPrediction) -> Self {
        Self {
            requested_h3_cell: r.requested.to_string(),
            prediction_h3_cell: r.resolved.to_string(),
            predicted_demand: r.demand,
            predicted_demand_rounded: r.demand.round_ties_even() as i64,
            is_fallback: r.is_fallback,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HotspotResponse {
    pub h3_cell: String,
    pub demand: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HeatmapResponse {
    pub center_h3_cell: String,
    pub hotspots: Vec<HotspotResponse>,
}

impl From<Heatmap> for HeatmapResponse {
    fn from(h: Heatmap) -> Self {
        Self {
            center_h3_cell: h.center.to_string(),
            hotspots: h
                .hotspots
                .into_iter()
                .map(|c| HotspotResponse {
                    h3_cell: c.cell.to_string(),
                    demand: c.demand,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
    pub known_cells: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

// ============================================================================
// Errors
// ============================================================================

/// Handler error carrying the HTTP status for each failure kind.
#[derive(Debug)]
pub struct AppError(pub PredictError);

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            PredictError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            PredictError::NoKnownDataNearby { .. } => StatusCode::NOT_FOUND,
            PredictError::InvalidRequest(_) | PredictError::InvalidCoordinate { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            PredictError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PredictError> for AppError {
    fn from(err: PredictError) -> Self {
        AppError(err)
    }
}

// Malformed bodies and query strings get the same `{"detail"}` shape as
// range errors.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError(PredictError::InvalidRequest(rejection.body_text()))
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError(PredictError::InvalidRequest(rejection.body_text()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let detail = match &self.0 {
            // Scoring internals stay in the logs.
            PredictError::Internal(_) => "Internal error while computing demand.".to_string(),
            other => other.to_string(),
        };
        (self.status(), Json(ErrorResponse { detail })).into_response()
    }
}

// ============================================================================
// Handlers
// ============================================================================

pub type AppState = Arc<DemandService>;

/// GET /
pub async fn root() -> impl IntoResponse {
    Json(serde_json::json!({"message": "Welcome to the ride demand prediction API!"}))
}

/// GET /health
pub async fn health(State(service): State<AppState>) -> Json<HealthResponse> {
    let status = service.status();
    Json(HealthResponse {
        status: if status.loaded { "ok" } else { "degraded" }.to_string(),
        model_loaded: status.loaded,
        known_cells: status.known_cells,
        reason: status.reason,
    })
}

/// POST /predict
pub async fn predict(
    State(service): State<AppState>,
    payload: Result<Json<PredictionRequest>, JsonRejection>,
) -> Result<Json<PredictionResult>, AppError> {
    let Json(request) = payload?;
    let resolved = service.predict(&request)?;
    Ok(Json(PredictionResult::from(resolved)))
}

/// GET /heatmap?lat&lon&day&hour
pub async fn heatmap(
    State(service): State<AppState>,
    query: Result<Query<HeatmapQuery>, QueryRejection>,
) -> Result<Json<HeatmapResponse>, AppError> {
    let Query(query) = query?;
    let heatmap = service.heatmap_bounded(query).await?;
    Ok(Json(HeatmapResponse::from(heatmap)))
}
