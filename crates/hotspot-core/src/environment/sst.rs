//! Sea-surface temperature trend.
//!
//! Colder in the south, warmer with increasing longitude, modulated by the
//! seasonal driver. At the reference point (18°S, 82°W) the trend equals the
//! base value plus the seasonal term.

/// Base SST at the reference point, °C.
const BASE_C: f64 = 16.0;
/// Warming per degree of latitude northward, °C.
const LAT_GRADIENT: f64 = 0.25;
/// Warming per degree of longitude eastward, °C.
const LON_GRADIENT: f64 = 0.4;
/// Amplitude of the seasonal term, °C.
const SEASONAL_AMPLITUDE: f64 = 1.5;

/// Standard deviation of the per-sample SST noise, °C.
pub const NOISE_STD: f64 = 0.4;

/// Deterministic SST trend for a cell and seasonal phase.
pub fn sst_trend(lat: f64, lon: f64, season: f64) -> f64 {
    BASE_C + LAT_GRADIENT * (lat + 18.0) + LON_GRADIENT * (lon + 82.0) + SEASONAL_AMPLITUDE * season
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_point_equals_base() {
        assert_eq!(sst_trend(-18.0, -82.0, 0.0), BASE_C);
    }

    #[test]
    fn warmer_to_the_north() {
        assert!(sst_trend(-5.0, -80.0, 0.0) > sst_trend(-15.0, -80.0, 0.0));
    }

    #[test]
    fn warmer_with_increasing_longitude() {
        assert!(sst_trend(-12.0, -76.0, 0.0) > sst_trend(-12.0, -80.0, 0.0));
    }

    #[test]
    fn seasonal_term_adds_amplitude() {
        let d = sst_trend(-12.0, -78.0, 1.0) - sst_trend(-12.0, -78.0, 0.0);
        assert!((d - SEASONAL_AMPLITUDE).abs() < 1e-12);
    }
}
