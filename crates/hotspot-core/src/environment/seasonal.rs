//! Seasonal driver shared by the SST and chlorophyll trends.
//!
//! A cosine of the ISO week number with its crest at week 30 and a period of
//! 12·2π ≈ 75 weeks, so a single season spans the whole fishing campaign.

/// Week number at which the seasonal term peaks.
pub const PEAK_WEEK: f64 = 30.0;

/// Divisor applied to the week offset before the cosine.
pub const SEASON_SCALE: f64 = 12.0;

/// Seasonal term in [-1, 1] for an ISO week number.
pub fn seasonal_phase(week_of_year: u32) -> f64 {
    ((f64::from(week_of_year) - PEAK_WEEK) / SEASON_SCALE).cos()
}
