//! Synthetic model artifact generator
//!
//! Writes a consistent `h3_categories.json`, `scaler.json` and
//! `demand_model.json` around a centre point so the API server can run
//! without a trained model.
//!
//! Usage:
//!   cargo run --release --bin generate_artifacts -- [OPTIONS]
//!
//! Options:
//!   --lat <DEG>          Centre latitude (default: Nairobi CBD)
//!   --lon <DEG>          Centre longitude
//!   --radius <K>         Grid disk radius to draw cells from (default: 12)
//!   --coverage <P>       Share of cells in the disk marked as known (default: 0.4)
//!   --seed <N>           Random seed for reproducibility (optional)
//!   --output-dir <PATH>  Where to write the artifacts (default: ml_models)

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ride_demand::config::{ArtifactPaths, PREDICTION_RESOLUTION};
use ride_demand::model::AdditiveDemandModel;
use ride_demand::registry::KnownCellRegistry;
use ride_demand::scaler::FeatureScaler;
use ride_demand::spatial::{cell_for, ring_neighbors};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Generate synthetic demand model artifacts
#[derive(Parser, Debug)]
#[command(name = "generate_artifacts")]
#[command(about = "Generate synthetic demand model artifacts for local development")]
struct Args {
    /// Centre latitude
    #[arg(long, default_value = "-1.2843", allow_hyphen_values = true)]
    lat: f64,

    /// Centre longitude
    #[arg(long, default_value = "36.8248", allow_hyphen_values = true)]
    lon: f64,

    /// Grid disk radius to draw known cells from
    #[arg(long, default_value = "12")]
    radius: u32,

    /// Share of cells in the disk marked as known (0.0 - 1.0)
    #[arg(long, default_value = "0.4")]
    coverage: f64,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Output directory
    #[arg(long, default_value = "ml_models")]
    output_dir: PathBuf,
}

/// Morning and evening commute peaks on top of a flat base.
fn hour_effects() -> Vec<f64> {
    (0..24)
        .map(|h| {
            let h = h as f64;
            let morning = 3.0 * (-(h - 8.0).powi(2) / 4.0).exp();
            let evening = 2.5 * (-(h - 17.5).powi(2) / 5.0).exp();
            morning + evening - 0.5
        })
        .collect()
}

/// Weekdays busier than weekends (0 = Monday).
fn day_effects() -> Vec<f64> {
    vec![0.6, 0.5, 0.5, 0.6, 0.8, -0.4, -0.9]
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let body = serde_json::to_string_pretty(value)?;
    std::fs::write(path, body).with_context(|| format!("failed to write {}", path.display()))?;
    info!("Wrote {}", path.display());
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();

    let mut rng: StdRng = match args.seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };

    let center = cell_for(args.lat, args.lon, PREDICTION_RESOLUTION)?;
    let coverage = args.coverage.clamp(0.0, 1.0);

    // The centre is always known so a prediction there never falls back.
    let disk = ring_neighbors(center, args.radius);
    let known: Vec<_> = disk
        .into_iter()
        .filter(|cell| *cell == center || rng.gen_bool(coverage))
        .collect();
    let registry = KnownCellRegistry::from_cells(known);

    // Demand decays with grid distance from the centre, plus noise.
    let mut cell_effects = vec![0.0; registry.len()];
    for (cell, code) in registry.entries() {
        let distance = center.grid_distance(cell).unwrap_or(args.radius as i32) as f64;
        let decay = 4.0 * (-distance / (args.radius.max(1) as f64 / 2.0)).exp();
        cell_effects[code as usize] = decay + rng.gen_range(-0.5..0.5);
    }

    let model = AdditiveDemandModel {
        intercept: 1.5,
        cell_effects,
        day_effects: day_effects(),
        hour_effects: hour_effects(),
        business_ratio_coef: 0.8,
        min_prediction: 0.0,
    };
    let scaler = FeatureScaler::Standard { mean: 0.62, scale: 0.21 };

    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("failed to create {}", args.output_dir.display()))?;
    let paths = ArtifactPaths::in_dir(&args.output_dir);
    write_json(&paths.categories, &registry)?;
    write_json(&paths.scaler, &scaler)?;
    write_json(&paths.model, &model)?;

    println!();
    println!("Centre cell:   {}", center);
    println!("Known cells:   {}", registry.len());
    println!("Output dir:    {}", args.output_dir.display());

    Ok(())
}
