//! Resolve a requested cell to a scorable one.
//!
//! A known cell is scored directly. An unknown cell is replaced by the
//! best-scoring known cell of the first grid disk (radius 1, 2, ...) that
//! contains any known cell at all, up to a fixed bound. Farther disks are
//! never consulted once a nearer one yields candidates.

use crate::artifacts::ModelArtifacts;
use crate::error::PredictError;
use crate::model::FeatureRow;
use crate::spatial::ring_neighbors;
use h3o::CellIndex;
use std::cmp::Ordering;
use tracing::{debug, info, warn};

/// Per-request model inputs shared by every candidate row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Covariates {
    pub day_of_week: u8,
    pub hour_of_day: u8,
    pub business_ratio: f64,
}

impl Covariates {
    fn row(&self, cell: CellIndex) -> FeatureRow {
        FeatureRow {
            cell,
            day_of_week: self.day_of_week,
            hour_of_day: self.hour_of_day,
            business_ratio: self.business_ratio,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedPrediction {
    pub requested: CellIndex,
    pub resolved: CellIndex,
    pub demand: f64,
    pub is_fallback: bool,
    /// Disk radius the resolved cell came from; 0 for a direct hit.
    pub ring: u32,
}

pub fn resolve(
    requested: CellIndex,
    artifacts: &ModelArtifacts,
    covariates: Covariates,
    max_rings: u32,
) -> Result<ResolvedPrediction, PredictError> {
    if artifacts.registry.contains(requested) {
        let scores = artifacts.score(&[covariates.row(requested)])?;
        let demand = scores[0];
        debug!("Direct prediction for {}: {:.2}", requested, demand);
        return Ok(ResolvedPrediction {
            requested,
            resolved: requested,
            demand,
            is_fallback: false,
            ring: 0,
        });
    }

    warn!("H3 cell {} not in training data. Searching for neighbors...", requested);

    for k in 1..=max_rings {
        let candidates = artifacts.registry.known_among(&ring_neighbors(requested, k));
        if candidates.is_empty() {
            continue;
        }

        info!("Found {} known neighbors at distance k={}", candidates.len(), k);
        let rows: Vec<FeatureRow> = candidates.iter().map(|c| covariates.row(*c)).collect();
        let scores = artifacts.score(&rows)?;

        let (resolved, demand) = pick_best(&candidates, &scores)
            .ok_or_else(|| PredictError::Internal("empty candidate batch".to_string()))?;
        info!("Best neighbor is {} with predicted demand {:.2}", resolved, demand);

        return Ok(ResolvedPrediction {
            requested,
            resolved,
            demand,
            is_fallback: true,
            ring: k,
        });
    }

    Err(PredictError::NoKnownDataNearby {
        cell: requested.to_string(),
        max_rings,
    })
}

/// Highest score wins; equal scores go to the smallest cell token.
pub fn pick_best(candidates: &[CellIndex], scores: &[f64]) -> Option<(CellIndex, f64)> {
    candidates
        .iter()
        .copied()
        .zip(scores.iter().copied())
        .fold(None, |best, (cell, score)| match best {
            None => Some((cell, score)),
            Some((best_cell, best_score)) => match score.total_cmp(&best_score) {
                Ordering::Greater => Some((cell, score)),
                Ordering::Equal if cell.to_string() < best_cell.to_string() => Some((cell, score)),
                _ => best,
            },
        })
}
