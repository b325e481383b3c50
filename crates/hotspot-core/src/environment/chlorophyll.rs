//! Chlorophyll-a trend, an upwelling proxy.
//!
//! Rises with latitude away from 18°S, falls with increasing longitude, and
//! is suppressed when the seasonal SST driver is high.

/// Base concentration at the reference point (18°S, 82°W), mg/m³.
const BASE_MG_M3: f64 = 1.5;
/// Increase per degree of latitude away from 18°S.
const LAT_GRADIENT: f64 = 0.05;
/// Decrease per degree of longitude eastward from 82°W.
const LON_GRADIENT: f64 = 0.15;
/// Amplitude of the (inverted) seasonal term.
const SEASONAL_AMPLITUDE: f64 = 0.3;

/// Standard deviation of the per-sample chlorophyll noise.
pub const NOISE_STD: f64 = 0.1;

/// Concentrations are never reported at or below this value.
pub const CHL_FLOOR: f64 = 0.01;

/// Deterministic chlorophyll trend for a cell and seasonal phase (unfloored).
pub fn chl_trend(lat: f64, lon: f64, season: f64) -> f64 {
    BASE_MG_M3 + LAT_GRADIENT * (18.0 + lat) - LON_GRADIENT * (lon + 82.0) - SEASONAL_AMPLITUDE * season
}

/// Apply the positivity floor to a noisy sample.
#[inline]
pub fn floor_chl(value: f64) -> f64 {
    value.max(CHL_FLOOR)
}
