//! Weekly feature table.
//!
//! Joins SST and chlorophyll samples on (week, cell), derives the calendar
//! month and a trailing per-cell SST anomaly. The rolling window is computed
//! strictly within each cell's own time series.

use std::collections::{BTreeMap, HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::coords::{CellKey, LatLon};
use crate::environment::WeeklyFieldSample;
use crate::week::IsoWeek;

/// Default number of trailing weeks in the SST anomaly window.
pub const DEFAULT_ROLLING_WINDOW: usize = 8;

/// Number of model features per row.
pub const N_FEATURES: usize = 4;

/// Model input in fixed order: `[sst, chl, sst_anom, month]`.
pub type FeatureVector = [f64; N_FEATURES];

/// One joined feature row. Missing numeric values are stored as NaN and
/// serialized as `null`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeeklyFeatureRow {
    pub week: IsoWeek,
    pub lat: f64,
    pub lon: f64,
    #[serde(deserialize_with = "null_as_nan")]
    pub sst: f64,
    #[serde(deserialize_with = "null_as_nan")]
    pub chl: f64,
    #[serde(deserialize_with = "null_as_nan")]
    pub sst_anom: f64,
    pub month: u32,
}

impl WeeklyFeatureRow {
    pub fn key(&self) -> CellKey {
        CellKey::from_coords(self.lat, self.lon)
    }

    pub fn latlon(&self) -> LatLon {
        LatLon::new(self.lat, self.lon)
    }

    /// True when every model feature is present and finite.
    pub fn is_complete(&self) -> bool {
        self.sst.is_finite() && self.chl.is_finite() && self.sst_anom.is_finite()
    }

    pub fn feature_vector(&self) -> FeatureVector {
        [self.sst, self.chl, self.sst_anom, f64::from(self.month)]
    }
}

/// Deserialize an optional float, mapping JSON `null` to NaN.
pub(crate) fn null_as_nan<'de, D: serde::Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    let v: Option<f64> = Option::deserialize(d)?;
    Ok(v.unwrap_or(f64::NAN))
}

/// Trailing mean over the last `window` entries of a single cell's series,
/// ignoring missing values; `min_periods = 1`.
struct RollingMean {
    window: usize,
    values: VecDeque<f64>,
}

impl RollingMean {
    fn new(window: usize) -> Self {
        Self { window: window.max(1), values: VecDeque::with_capacity(window.max(1)) }
    }

    /// Push the current value and return the mean of the window including it,
    /// or NaN when the window holds no finite value.
    fn push(&mut self, v: f64) -> f64 {
        if self.values.len() == self.window {
            self.values.pop_front();
        }
        self.values.push_back(v);
        let (sum, n) = self
            .values
            .iter()
            .filter(|x| x.is_finite())
            .fold((0.0, 0usize), |(s, n), x| (s + x, n + 1));
        if n == 0 { f64::NAN } else { sum / n as f64 }
    }
}

struct Joined {
    week: IsoWeek,
    lat: f64,
    lon: f64,
    sst: f64,
    chl: f64,
}

/// Build the weekly feature table with the default 8-week anomaly window.
pub fn build_weekly_features(
    sst: &[WeeklyFieldSample],
    chl: &[WeeklyFieldSample],
) -> Vec<WeeklyFeatureRow> {
    build_weekly_features_with_window(sst, chl, DEFAULT_ROLLING_WINDOW)
}

/// Build the weekly feature table.
///
/// Steps: inner join on (week, cell) → group by cell, order by week →
/// `sst_anom = sst − trailing mean(sst)` over up to `window` samples including
/// the current one → drop rows missing SST or chlorophyll. Output is sorted by
/// (week, lat, lon).
///
/// A (week, cell) seen more than once in one input keeps its last sample.
pub fn build_weekly_features_with_window(
    sst: &[WeeklyFieldSample],
    chl: &[WeeklyFieldSample],
    window: usize,
) -> Vec<WeeklyFeatureRow> {
    let mut chl_by_key: HashMap<(IsoWeek, CellKey), f64> = HashMap::with_capacity(chl.len());
    for s in chl {
        chl_by_key.insert((s.week, CellKey::from_coords(s.lat, s.lon)), s.value);
    }

    // Per-cell series, each ordered by week.
    let mut series: BTreeMap<CellKey, BTreeMap<IsoWeek, Joined>> = BTreeMap::new();
    let mut unmatched = 0usize;
    for s in sst {
        let key = CellKey::from_coords(s.lat, s.lon);
        let Some(&chl_value) = chl_by_key.get(&(s.week, key)) else {
            unmatched += 1;
            continue;
        };
        series.entry(key).or_default().insert(
            s.week,
            Joined { week: s.week, lat: s.lat, lon: s.lon, sst: s.value, chl: chl_value },
        );
    }
    if unmatched > 0 {
        tracing::warn!(unmatched, "SST samples without a chlorophyll match dropped by join");
    }

    let mut rows = Vec::new();
    let mut incomplete = 0usize;
    for cell in series.values() {
        let mut rolling = RollingMean::new(window);
        for j in cell.values() {
            let mean = rolling.push(j.sst);
            if !(j.sst.is_finite() && j.chl.is_finite()) {
                incomplete += 1;
                continue;
            }
            rows.push(WeeklyFeatureRow {
                week: j.week,
                lat: j.lat,
                lon: j.lon,
                sst: j.sst,
                chl: j.chl,
                sst_anom: j.sst - mean,
                month: j.week.month(),
            });
        }
    }
    if incomplete > 0 {
        tracing::warn!(incomplete, "joined rows missing SST or chlorophyll dropped");
    }

    rows.sort_by(|a, b| {
        a.week
            .cmp(&b.week)
            .then(a.lat.total_cmp(&b.lat))
            .then(a.lon.total_cmp(&b.lon))
    });
    tracing::debug!(rows = rows.len(), cells = series.len(), window, "built weekly features");
    rows
}

/// Rows belonging to `week`, in table order.
pub fn rows_for_week(rows: &[WeeklyFeatureRow], week: IsoWeek) -> Vec<WeeklyFeatureRow> {
    rows.iter().filter(|r| r.week == week).copied().collect()
}
