//! Error types for prediction and artifact loading.

use std::path::PathBuf;
use thiserror::Error;

/// Failures surfaced to callers of the prediction service.
#[derive(Debug, Error)]
pub enum PredictError {
    /// Model artifacts failed to load at startup.
    #[error("Model is not available. Please check server logs. ({0})")]
    ServiceUnavailable(String),

    /// No known cell within the fallback bound.
    #[error("No known ride data available near the requested location (cell {cell}, searched {max_rings} rings).")]
    NoKnownDataNearby { cell: String, max_rings: u32 },

    /// A request field is outside its accepted range.
    #[error("{0}")]
    InvalidRequest(String),

    #[error("Coordinates out of range: latitude {latitude}, longitude {longitude}")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    /// Unexpected failure while encoding or scoring a batch.
    #[error("Internal computation error: {0}")]
    Internal(String),
}

/// Failures while reading the model, scaler or vocabulary files.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid H3 cell '{cell}' in vocabulary: {reason}")]
    InvalidCell { cell: String, reason: String },

    #[error("invalid scaler: {0}")]
    InvalidScaler(String),

    #[error("invalid model: {0}")]
    InvalidModel(String),
}
