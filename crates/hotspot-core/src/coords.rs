//! Geographic coordinate types and great-circle distance.
//! All coordinate math uses f64 for precision.

use serde::{Deserialize, Serialize};

/// Mean Earth radius used for haversine distances, in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Decimal places kept on generated grid coordinates.
pub const COORD_DECIMALS: i32 = 6;

/// A point on the sphere in geographic coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    /// Latitude in degrees, -90 to +90.
    pub lat: f64,
    /// Longitude in degrees, -180 to +180.
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Convert to radians.
    pub fn to_radians(self) -> (f64, f64) {
        (self.lat.to_radians(), self.lon.to_radians())
    }

    /// Haversine distance to `other` in kilometres.
    pub fn distance_km(self, other: LatLon) -> f64 {
        haversine_km(self.lat, self.lon, other.lat, other.lon)
    }
}

/// Integer join key for a grid cell: coordinates in micro-degrees.
///
/// Two cells with the same rounded coordinates always produce the same key,
/// so per-cell grouping never depends on float equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellKey {
    pub lat_e6: i64,
    pub lon_e6: i64,
}

impl CellKey {
    pub fn from_coords(lat: f64, lon: f64) -> Self {
        Self {
            lat_e6: (lat * 1e6).round() as i64,
            lon_e6: (lon * 1e6).round() as i64,
        }
    }
}

/// Round a coordinate to [`COORD_DECIMALS`] places.
#[inline]
pub fn round_coord(v: f64) -> f64 {
    let scale = 10f64.powi(COORD_DECIMALS);
    (v * scale).round() / scale
}

/// Great-circle distance in kilometres between two (lat, lon) points in degrees.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let p1 = lat1.to_radians();
    let p2 = lat2.to_radians();
    let dlat = p2 - p1;
    let dlon = (lon2 - lon1).to_radians();
    let a = (dlat / 2.0).sin().powi(2) + p1.cos() * p2.cos() * (dlon / 2.0).sin().powi(2);
    // Clamp guards asin against a rounding overshoot past 1.0 for antipodes.
    2.0 * EARTH_RADIUS_KM * a.sqrt().min(1.0).asin()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn haversine_same_point_is_zero() {
        let callao = LatLon::new(-12.06, -77.15);
        assert_eq!(callao.distance_km(callao), 0.0);
    }

    #[test]
    fn haversine_one_degree_of_latitude() {
        // One degree along a meridian = R * pi / 180.
        let d = haversine_km(-12.0, -77.0, -13.0, -77.0);
        assert_abs_diff_eq!(d, EARTH_RADIUS_KM * std::f64::consts::PI / 180.0, epsilon = 1e-9);
    }

    #[test]
    fn haversine_is_symmetric() {
        let a = LatLon::new(-5.09, -81.11);
        let b = LatLon::new(-17.0, -72.1);
        assert_abs_diff_eq!(a.distance_km(b), b.distance_km(a), epsilon = 1e-9);
    }

    #[test]
    fn haversine_antipodes_half_circumference() {
        let d = haversine_km(0.0, 0.0, 0.0, 180.0);
        assert_abs_diff_eq!(d, EARTH_RADIUS_KM * std::f64::consts::PI, epsilon = 1e-6);
    }

    #[test]
    fn cell_key_matches_after_rounding() {
        let a = CellKey::from_coords(round_coord(-18.0 + 3.0 * 0.1), -77.5);
        let b = CellKey::from_coords(-17.7, -77.5);
        assert_eq!(a, b);
    }

    #[test]
    fn round_coord_drops_float_noise() {
        assert_eq!(round_coord(0.1 + 0.2), 0.3);
        assert_eq!(round_coord(-84.5000000001), -84.5);
    }
}
