//! REST API Server for ride demand predictions
//!
//! Loads the model artifacts once at startup and serves predictions.
//! If the artifacts cannot be loaded the server still starts and every
//! prediction answers 503.
//!
//! Usage:
//!   ./target/release/api_server [options]
//!
//! Options:
//!   --host HOST                 Interface to bind (default: 0.0.0.0)
//!   --port PORT                 Port to listen on (default: 8000)
//!   --model-dir PATH            Artifact directory (default: ml_models)
//!   --scoring-timeout-ms MS     Heatmap scoring timeout (default: 5000, 0 = none)
//!
//! REST endpoints:
//!   GET  /          - Liveness message
//!   GET  /health    - Model status
//!   POST /predict   - Demand at a point, with nearest-known-cell fallback
//!   GET  /heatmap   - Demand for known cells around a point (?lat&lon&day&hour)

use anyhow::{Context, Result};
use clap::Parser;
use ride_demand::api::{create_rest_router, DemandService};
use ride_demand::artifacts::ModelContext;
use ride_demand::config::{PredictionSettings, ServerArgs};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn print_banner(addr: &SocketAddr, args: &ServerArgs, context: &ModelContext) {
    println!("============================================================");
    println!("            RIDE DEMAND PREDICTION API SERVER");
    println!("============================================================");
    println!();
    println!("  Address:  http://{}", addr);
    println!("  Models:   {}", args.artifacts.model_dir.display());
    match context {
        ModelContext::Ready(artifacts) => {
            println!("  Status:   ready ({} known cells)", artifacts.registry.len())
        }
        ModelContext::Unavailable { reason } => println!("  Status:   UNAVAILABLE ({})", reason),
    }
    println!();
    println!("REST Endpoints:");
    println!("  GET  /             Liveness message");
    println!("  GET  /health       Model status");
    println!("  POST /predict      Predict demand at a point");
    println!("  GET  /heatmap      Demand around a point");
    println!();
    println!("============================================================");
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .init();

    let args = ServerArgs::parse();

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", args.host, args.port))?;

    let context = ModelContext::load(&args.artifacts.paths());
    print_banner(&addr, &args, &context);

    let settings = PredictionSettings {
        scoring_timeout: args.scoring_timeout(),
        ..PredictionSettings::default()
    };
    let service = Arc::new(DemandService::new(context, settings));
    let app = create_rest_router(service);

    info!("Starting REST server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
