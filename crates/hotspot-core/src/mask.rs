//! Approximate land mask from an interpolated coastline.
//!
//! The coastline is a short table of (latitude, longitude) anchors. For any
//! latitude the coast longitude is linearly interpolated between anchors and
//! clamped to the end anchors outside their range. Cells strictly west of the
//! coast (`lon < cutoff`) are ocean; a cell exactly on the line is land.

use serde::{Deserialize, Serialize};

use crate::error::{HotspotError, Result};
use crate::features::WeeklyFeatureRow;

/// One point of the coastline table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoastAnchor {
    pub lat: f64,
    pub lon: f64,
}

/// Peruvian coast, south to north.
pub const PERU_COASTLINE: [CoastAnchor; 6] = [
    CoastAnchor { lat: -18.0, lon: -72.5 },
    CoastAnchor { lat: -15.0, lon: -75.0 },
    CoastAnchor { lat: -12.0, lon: -77.2 },
    CoastAnchor { lat: -9.0, lon: -78.5 },
    CoastAnchor { lat: -6.0, lon: -80.0 },
    CoastAnchor { lat: -3.0, lon: -80.9 },
];

/// Validated coastline: non-empty, finite, strictly increasing latitudes.
#[derive(Debug, Clone, PartialEq)]
pub struct Coastline {
    anchors: Vec<CoastAnchor>,
}

impl Coastline {
    pub fn new(anchors: Vec<CoastAnchor>) -> Result<Self> {
        if anchors.is_empty() {
            return Err(HotspotError::InvalidConfig("coastline needs at least one anchor".into()));
        }
        if anchors.iter().any(|a| !a.lat.is_finite() || !a.lon.is_finite()) {
            return Err(HotspotError::InvalidConfig("coastline anchors must be finite".into()));
        }
        if anchors.windows(2).any(|w| w[1].lat <= w[0].lat) {
            return Err(HotspotError::InvalidConfig(
                "coastline anchors must have strictly increasing latitude".into(),
            ));
        }
        Ok(Self { anchors })
    }

    pub fn peru() -> Self {
        Self { anchors: PERU_COASTLINE.to_vec() }
    }

    pub fn anchors(&self) -> &[CoastAnchor] {
        &self.anchors
    }

    /// Coastline longitude at `lat`.
    pub fn cutoff_lon(&self, lat: f64) -> f64 {
        let a = &self.anchors;
        let first = a[0];
        let last = a[a.len() - 1];
        if lat <= first.lat {
            return first.lon;
        }
        if lat >= last.lat {
            return last.lon;
        }
        // First anchor strictly north of `lat`; exists because lat < last.lat.
        let hi = a.partition_point(|p| p.lat <= lat);
        let (p0, p1) = (a[hi - 1], a[hi]);
        let t = (lat - p0.lat) / (p1.lat - p0.lat);
        p0.lon + t * (p1.lon - p0.lon)
    }

    /// True when (lat, lon) lies on the ocean side of the coast.
    pub fn is_ocean(&self, lat: f64, lon: f64) -> bool {
        lon < self.cutoff_lon(lat)
    }
}

impl Default for Coastline {
    fn default() -> Self {
        Self::peru()
    }
}

/// Keep only ocean-side rows, preserving order. An empty result is the
/// caller's "all cells masked" condition.
pub fn apply_land_mask(rows: &[WeeklyFeatureRow], coastline: &Coastline) -> Vec<WeeklyFeatureRow> {
    let kept: Vec<WeeklyFeatureRow> =
        rows.iter().filter(|r| coastline.is_ocean(r.lat, r.lon)).copied().collect();
    tracing::debug!(input = rows.len(), kept = kept.len(), "applied land mask");
    kept
}
