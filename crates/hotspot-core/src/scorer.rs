//! Distance-penalized ranking.
//!
//! `score = p − λ · dist_km`, where `p` is the model probability clipped to
//! [0, 1] and `dist_km` the haversine distance from the reference port.
//! Higher is better; only the top [`TOP_K`] cells are returned.

use serde::{Deserialize, Serialize};

use crate::coords::LatLon;
use crate::error::{HotspotError, Result};
use crate::features::{FeatureVector, WeeklyFeatureRow};
use crate::model::HotspotModel;

/// Number of cells a ranking returns.
pub const TOP_K: usize = 10;

/// A candidate cell with its probability, distance and combined score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredCell {
    pub lat: f64,
    pub lon: f64,
    pub p: f64,
    pub dist_km: f64,
    pub score: f64,
}

impl ScoredCell {
    pub fn new(lat: f64, lon: f64, p: f64, dist_km: f64, lambda: f64) -> Self {
        let p = clip_probability(p);
        Self { lat, lon, p, dist_km, score: p - lambda * dist_km }
    }
}

/// Clip to [0, 1]; a NaN probability ranks as 0.
pub fn clip_probability(p: f64) -> f64 {
    if p.is_nan() {
        0.0
    } else {
        p.clamp(0.0, 1.0)
    }
}

/// λ must be finite and non-negative.
pub fn validate_lambda(lambda: f64) -> Result<()> {
    if !lambda.is_finite() || lambda < 0.0 {
        return Err(HotspotError::InvalidInput(format!(
            "distance penalty must be a finite non-negative number, got {lambda}"
        )));
    }
    Ok(())
}

/// Sort descending by score and keep the best `k`. The sort is stable, so
/// equal scores keep their input order.
pub fn rank_scored(mut cells: Vec<ScoredCell>, k: usize) -> Vec<ScoredCell> {
    cells.sort_by(|a, b| b.score.total_cmp(&a.score));
    cells.truncate(k);
    cells
}

/// Score already-predicted cells: `cells[i]` pairs with `probabilities[i]`.
pub fn score_with_probabilities(
    cells: &[LatLon],
    probabilities: &[f64],
    port: LatLon,
    lambda: f64,
) -> Result<Vec<ScoredCell>> {
    validate_lambda(lambda)?;
    if cells.len() != probabilities.len() {
        return Err(HotspotError::InvalidInput(format!(
            "{} cells but {} probabilities",
            cells.len(),
            probabilities.len()
        )));
    }
    let scored = cells
        .iter()
        .zip(probabilities)
        .map(|(c, &p)| ScoredCell::new(c.lat, c.lon, p, c.distance_km(port), lambda))
        .collect();
    Ok(rank_scored(scored, TOP_K))
}

/// Predict, penalize by distance and return the top [`TOP_K`] cells.
///
/// Rows with a missing feature are dropped first; if none remain the result
/// is empty rather than an error.
pub fn score_cells<M: HotspotModel + ?Sized>(
    rows: &[WeeklyFeatureRow],
    model: &M,
    port: LatLon,
    lambda: f64,
) -> Result<Vec<ScoredCell>> {
    validate_lambda(lambda)?;

    let complete: Vec<&WeeklyFeatureRow> = rows.iter().filter(|r| r.is_complete()).collect();
    if complete.len() < rows.len() {
        tracing::warn!(
            dropped = rows.len() - complete.len(),
            "excluded rows with missing features from scoring"
        );
    }
    if complete.is_empty() {
        return Ok(Vec::new());
    }

    let xs: Vec<FeatureVector> = complete.iter().map(|r| r.feature_vector()).collect();
    let probs = model.predict_proba(&xs)?;
    if probs.len() != xs.len() {
        return Err(HotspotError::Model(format!(
            "model '{}' returned {} probabilities for {} rows",
            model.name(),
            probs.len(),
            xs.len()
        )));
    }

    let cells: Vec<LatLon> = complete.iter().map(|r| r.latlon()).collect();
    let ranked = score_with_probabilities(&cells, &probs, port, lambda)?;
    tracing::debug!(candidates = xs.len(), returned = ranked.len(), lambda, "scored cells");
    Ok(ranked)
}
