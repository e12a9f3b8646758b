//! Runtime configuration for the demand service.
//!
//! Server flags come from the command line (or `RIDE_DEMAND_*` environment
//! variables); the prediction constants live in [`PredictionSettings`].

use clap::Parser;
use h3o::Resolution;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// H3 resolution used for online prediction.
pub const PREDICTION_RESOLUTION: Resolution = Resolution::Twelve;

/// Largest ring searched when the requested cell is unknown.
pub const MAX_FALLBACK_RINGS: u32 = 5;

/// Radius of the disk scored for a heatmap.
pub const HEATMAP_RADIUS: u32 = 7;

/// Business ratio assumed for every heatmap cell.
pub const HEATMAP_BUSINESS_RATIO: f64 = 0.70;

/// Ride demand prediction API server
#[derive(Parser, Debug, Clone)]
#[command(name = "api_server")]
#[command(about = "Serve ride demand predictions over HTTP")]
pub struct ServerArgs {
    /// Interface to bind
    #[arg(long, env = "RIDE_DEMAND_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "RIDE_DEMAND_PORT", default_value = "8000")]
    pub port: u16,

    #[command(flatten)]
    pub artifacts: ArtifactArgs,

    /// Timeout for heatmap batch scoring in milliseconds (0 disables it)
    #[arg(long, env = "RIDE_DEMAND_SCORING_TIMEOUT_MS", default_value = "5000")]
    pub scoring_timeout_ms: u64,
}

impl ServerArgs {
    pub fn scoring_timeout(&self) -> Option<Duration> {
        match self.scoring_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }
}

/// Location of the model artifacts on disk.
#[derive(clap::Args, Debug, Clone)]
pub struct ArtifactArgs {
    /// Directory holding the model artifacts
    #[arg(long, env = "RIDE_DEMAND_MODEL_DIR", default_value = "ml_models")]
    pub model_dir: PathBuf,

    /// Serialized regression model, relative to the model directory
    #[arg(long, env = "RIDE_DEMAND_MODEL_FILE", default_value = "demand_model.json")]
    pub model_file: PathBuf,

    /// Fitted business-ratio scaler, relative to the model directory
    #[arg(long, env = "RIDE_DEMAND_SCALER_FILE", default_value = "scaler.json")]
    pub scaler_file: PathBuf,

    /// Cell vocabulary, relative to the model directory
    #[arg(long, env = "RIDE_DEMAND_CATEGORIES_FILE", default_value = "h3_categories.json")]
    pub categories_file: PathBuf,
}

impl ArtifactArgs {
    pub fn paths(&self) -> ArtifactPaths {
        ArtifactPaths {
            model: self.model_dir.join(&self.model_file),
            scaler: self.model_dir.join(&self.scaler_file),
            categories: self.model_dir.join(&self.categories_file),
        }
    }
}

/// Resolved paths of the three artifact files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub scaler: PathBuf,
    pub categories: PathBuf,
}

impl ArtifactPaths {
    /// Default file names inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            model: dir.join("demand_model.json"),
            scaler: dir.join("scaler.json"),
            categories: dir.join("h3_categories.json"),
        }
    }
}

/// Constants driving cell resolution, fallback and heatmap scoring.
#[derive(Debug, Clone, Copy)]
pub struct PredictionSettings {
    pub resolution: Resolution,
    pub max_fallback_rings: u32,
    pub heatmap_radius: u32,
    pub heatmap_business_ratio: f64,
    pub scoring_timeout: Option<Duration>,
}

impl Default for PredictionSettings {
    fn default() -> Self {
        Self {
            resolution: PREDICTION_RESOLUTION,
            max_fallback_rings: MAX_FALLBACK_RINGS,
            heatmap_radius: HEATMAP_RADIUS,
            heatmap_business_ratio: HEATMAP_BUSINESS_RATIO,
            scoring_timeout: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = PredictionSettings::default();
        assert_eq!(settings.resolution, Resolution::Twelve);
        assert_eq!(settings.max_fallback_rings, 5);
        assert_eq!(settings.heatmap_radius, 7);
        assert_eq!(settings.heatmap_business_ratio, 0.70);
    }

    #[test]
    fn test_artifact_paths_join_model_dir() {
        let args = ServerArgs::parse_from(["api_server", "--model-dir", "/srv/models"]);
        let paths = args.artifacts.paths();
        assert_eq!(paths, ArtifactPaths::in_dir("/srv/models"));
        assert_eq!(args.port, 8000);
    }

    #[test]
    fn test_zero_timeout_disables() {
        let args = ServerArgs::parse_from(["api_server", "--scoring-timeout-ms", "0"]);
        assert!(args.scoring_timeout().is_none());

        let args = ServerArgs::parse_from(["api_server"]);
        assert_eq!(args.scoring_timeout(), Some(Duration::from_millis(5000)));
    }
}
