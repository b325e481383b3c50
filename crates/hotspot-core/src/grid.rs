//! Coastal candidate grid.
//!
//! A regular lat/lon lattice over a bounding box, narrowed to a longitude
//! band along the coast where artisanal fleets actually operate.

use serde::{Deserialize, Serialize};

use crate::coords::{round_coord, CellKey, LatLon};
use crate::error::{HotspotError, Result};

/// Tolerance added to the upper bounds so the last lattice line is kept
/// despite accumulated float error.
const LATTICE_EPS: f64 = 1e-9;

/// One ocean-candidate cell. Coordinates are rounded on construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridCell {
    pub lat: f64,
    pub lon: f64,
}

impl GridCell {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat: round_coord(lat), lon: round_coord(lon) }
    }

    pub fn key(&self) -> CellKey {
        CellKey::from_coords(self.lat, self.lon)
    }

    pub fn latlon(&self) -> LatLon {
        LatLon::new(self.lat, self.lon)
    }
}

/// Lattice bounds, step and coastal band, all in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
    pub step: f64,
    /// Inclusive (west, east) longitude band.
    pub coast_band: (f64, f64),
}

impl Default for GridConfig {
    /// Peruvian coast at half-degree resolution.
    fn default() -> Self {
        Self {
            lat_min: -18.0,
            lat_max: -3.0,
            lon_min: -86.0,
            lon_max: -70.0,
            step: 0.5,
            coast_band: (-84.5, -72.0),
        }
    }
}

impl GridConfig {
    pub fn validate(&self) -> Result<()> {
        let all = [self.lat_min, self.lat_max, self.lon_min, self.lon_max, self.coast_band.0, self.coast_band.1];
        if all.iter().any(|v| !v.is_finite()) {
            return Err(HotspotError::InvalidConfig("grid bounds must be finite".into()));
        }
        if !(self.step.is_finite() && self.step > 0.0) {
            return Err(HotspotError::InvalidConfig(format!(
                "grid step must be positive, got {}",
                self.step
            )));
        }
        Ok(())
    }
}

/// Stepped values `min, min+step, ...` up to and including `max`.
fn lattice(min: f64, max: f64, step: f64) -> impl Iterator<Item = f64> {
    let n = if max < min { 0 } else { ((max - min) / step + LATTICE_EPS).floor() as usize + 1 };
    (0..n).map(move |i| round_coord(min + i as f64 * step))
}

/// Enumerate the coastal grid, latitude-major (south to north, then west to east).
///
/// Bounds and band that do not intersect yield an empty grid; only a step
/// that cannot enumerate a lattice is an error.
pub fn coastal_grid(cfg: &GridConfig) -> Result<Vec<GridCell>> {
    cfg.validate()?;
    let (band_w, band_e) = cfg.coast_band;
    let lons: Vec<f64> = lattice(cfg.lon_min, cfg.lon_max, cfg.step)
        .filter(|&lo| band_w <= lo && lo <= band_e)
        .collect();

    let cells: Vec<GridCell> = lattice(cfg.lat_min, cfg.lat_max, cfg.step)
        .flat_map(|la| lons.iter().map(move |&lo| GridCell::new(la, lo)))
        .collect();

    tracing::debug!(cells = cells.len(), step = cfg.step, "generated coastal grid");
    Ok(cells)
}
