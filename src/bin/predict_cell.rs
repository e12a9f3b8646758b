//! Offline demand prediction for a single H3 cell
//!
//! Loads the artifacts from disk and scores one cell, without the server.
//! Useful to check a freshly exported model.
//!
//! Usage:
//!   cargo run --release --bin predict_cell -- --h3-cell 8c7a6e42c4629ff --day 4 --hour 11 --business-ratio 0.9

use anyhow::{Context, Result};
use clap::Parser;
use ride_demand::artifacts::ModelArtifacts;
use ride_demand::config::{ArtifactArgs, MAX_FALLBACK_RINGS};
use ride_demand::models::PredictionRequest;
use ride_demand::resolver::{self, Covariates};
use ride_demand::spatial::parse_cell;
use tracing::info;

/// Score a single H3 cell with the exported model
#[derive(Parser, Debug)]
#[command(name = "predict_cell")]
#[command(about = "Predict ride demand for one H3 cell")]
struct Args {
    /// H3 cell token (resolution 12)
    #[arg(long)]
    h3_cell: String,

    /// Day of week, 0 = Monday
    #[arg(long, default_value = "4")]
    day: i32,

    /// Hour of day, 0-23
    #[arg(long, default_value = "11")]
    hour: i32,

    /// Share of business rides, 0.0-1.0
    #[arg(long, default_value = "0.9")]
    business_ratio: f64,

    /// Fall back to the nearest known cell instead of failing
    #[arg(long)]
    fallback: bool,

    #[command(flatten)]
    artifacts: ArtifactArgs,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();

    let cell = parse_cell(&args.h3_cell)
        .with_context(|| format!("'{}' is not a valid H3 cell", args.h3_cell))?;

    let paths = args.artifacts.paths();
    let artifacts = ModelArtifacts::load(&paths).with_context(|| {
        format!(
            "could not load model artifacts from {}",
            args.artifacts.model_dir.display()
        )
    })?;
    info!("Model and artifacts loaded ({} known cells)", artifacts.registry.len());

    // Reuse the request validation for the covariate ranges.
    let center = h3o::LatLng::from(cell);
    let covariates: Covariates = PredictionRequest {
        latitude: center.lat(),
        longitude: center.lng(),
        day_of_week: args.day,
        hour_of_day: args.hour,
        business_ratio: args.business_ratio,
    }
    .validate()?;

    // Zero rings scores known cells only.
    let max_rings = if args.fallback { MAX_FALLBACK_RINGS } else { 0 };
    let prediction = resolver::resolve(cell, &artifacts, covariates, max_rings).with_context(|| {
        if args.fallback {
            format!("could not score H3 cell '{}'", cell)
        } else {
            format!(
                "H3 cell '{}' was not in the training data (use --fallback to score the nearest known cell)",
                cell
            )
        }
    })?;

    println!();
    println!("{}", "=".repeat(40));
    println!("        RIDE DEMAND PREDICTION");
    println!("{}", "=".repeat(40));
    println!("  Requested cell:   {}", prediction.requested);
    if prediction.is_fallback {
        println!("  Scored cell:      {} (fallback, ring {})", prediction.resolved, prediction.ring);
    }
    println!("  Day / hour:       {} / {:02}:00", covariates.day_of_week, covariates.hour_of_day);
    println!("  Business ratio:   {:.2}", covariates.business_ratio);
    println!("  Predicted demand: {:.2}", prediction.demand);
    println!("  Rounded:          {}", prediction.demand.round_ties_even() as i64);
    println!("{}", "=".repeat(40));

    Ok(())
}
