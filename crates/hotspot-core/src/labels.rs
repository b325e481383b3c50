//! Synthetic hotspot labels for the offline training path.
//!
//! A smooth suitability value per feature row (SST and chlorophyll
//! preferences, a warm-anomaly boost, tie-breaking noise) is thresholded
//! independently within each week at that week's 70th percentile.

use std::collections::{BTreeMap, HashMap};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::coords::CellKey;
use crate::error::{HotspotError, Result};
use crate::features::{FeatureVector, WeeklyFeatureRow};
use crate::week::IsoWeek;

/// Default per-week quantile above which rows are hotspots.
pub const DEFAULT_HOTSPOT_QUANTILE: f64 = 0.7;

const SST_PREF_C: f64 = 19.5;
const SST_PREF_SCALE: f64 = 2.0;
const CHL_PREF: f64 = 1.4;
const CHL_PREF_SCALE: f64 = 0.6;
const ANOM_BOOST: f64 = 0.5;

const W_SST: f64 = 0.5;
const W_CHL: f64 = 0.4;
const W_ANOM: f64 = 0.1;
const W_NOISE: f64 = 0.05;

const LABEL_SEED_SALT: u64 = 0x1ABE_15ED_77C0_4F11;

/// Binary hotspot label for one (week, cell).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabelRow {
    pub week: IsoWeek,
    pub lat: f64,
    pub lon: f64,
    pub hotspot: u8,
}

/// Deterministic suitability in [0, 1]: preference terms plus the anomaly boost.
pub fn suitability(sst: f64, chl: f64, sst_anom: f64) -> f64 {
    let sst_pref = (-((sst - SST_PREF_C) / SST_PREF_SCALE).powi(2)).exp();
    let chl_pref = (-((chl - CHL_PREF) / CHL_PREF_SCALE).powi(2)).exp();
    let anom_boost = if sst_anom > 0.0 { ANOM_BOOST } else { 0.0 };
    W_SST * sst_pref + W_CHL * chl_pref + W_ANOM * anom_boost
}

/// Suitability for a model feature vector (`month` is ignored).
pub fn suitability_of(features: &FeatureVector) -> f64 {
    suitability(features[0], features[1], features[2])
}

/// Quantile threshold such that at least `1 - q` of `values` lie at or above it.
///
/// The threshold is the `ceil((1 - q) · n)`-th largest value, so thresholding
/// with `>=` labels exactly that many rows when there are no ties and more
/// when ties straddle it. Returns `None` for an empty slice.
pub fn upper_tail_threshold(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| b.total_cmp(a));
    let n = sorted.len();
    // Round before ceil so that e.g. 0.3 * 10 lands on 3 rather than 3.0000000000000004.
    let k = (((1.0 - q) * n as f64 * 1e9).round() / 1e9).ceil() as usize;
    Some(sorted[k.clamp(1, n) - 1])
}

/// Label feature rows with the default quantile and the given noise seed.
pub fn synth_labels(rows: &[WeeklyFeatureRow], seed: Option<u64>) -> Result<Vec<LabelRow>> {
    synth_labels_with_quantile(rows, DEFAULT_HOTSPOT_QUANTILE, seed)
}

/// Label feature rows at a custom per-week quantile.
pub fn synth_labels_with_quantile(
    rows: &[WeeklyFeatureRow],
    quantile: f64,
    seed: Option<u64>,
) -> Result<Vec<LabelRow>> {
    let mut rng = match seed {
        Some(s) => StdRng::seed_from_u64(s ^ LABEL_SEED_SALT),
        None => StdRng::from_entropy(),
    };
    synth_labels_with_rng(rows, quantile, &mut rng)
}

/// Label feature rows, thresholding each week's cross-section independently.
///
/// Output preserves input row order.
pub fn synth_labels_with_rng<R: Rng>(
    rows: &[WeeklyFeatureRow],
    quantile: f64,
    rng: &mut R,
) -> Result<Vec<LabelRow>> {
    if !(quantile > 0.0 && quantile < 1.0) {
        return Err(HotspotError::InvalidConfig(format!(
            "hotspot quantile must be in (0, 1), got {quantile}"
        )));
    }

    let raw: Vec<f64> = rows
        .iter()
        .map(|r| suitability(r.sst, r.chl, r.sst_anom) + W_NOISE * rng.gen::<f64>())
        .collect();

    let mut by_week: BTreeMap<IsoWeek, Vec<usize>> = BTreeMap::new();
    for (i, r) in rows.iter().enumerate() {
        by_week.entry(r.week).or_default().push(i);
    }

    let mut hot = vec![0u8; rows.len()];
    for (week, idx) in &by_week {
        let values: Vec<f64> = idx.iter().map(|&i| raw[i]).collect();
        let Some(threshold) = upper_tail_threshold(&values, quantile) else {
            continue;
        };
        let mut positives = 0usize;
        for &i in idx {
            if raw[i] >= threshold {
                hot[i] = 1;
                positives += 1;
            }
        }
        tracing::trace!(%week, threshold, positives, rows = idx.len(), "labelled week");
    }

    let labels: Vec<LabelRow> = rows
        .iter()
        .zip(hot)
        .map(|(r, hotspot)| LabelRow { week: r.week, lat: r.lat, lon: r.lon, hotspot })
        .collect();
    tracing::debug!(
        rows = labels.len(),
        weeks = by_week.len(),
        positives = labels.iter().filter(|l| l.hotspot == 1).count(),
        "synthesized hotspot labels"
    );
    Ok(labels)
}

/// One supervised example: model features and the hotspot label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingExample {
    pub week: IsoWeek,
    pub features: FeatureVector,
    pub hotspot: u8,
}

/// Inner join of features and labels on (week, cell), dropping incomplete rows.
/// This is the table an external trainer fits on.
pub fn join_training_set(features: &[WeeklyFeatureRow], labels: &[LabelRow]) -> Vec<TrainingExample> {
    let by_key: HashMap<(IsoWeek, CellKey), u8> = labels
        .iter()
        .map(|l| ((l.week, CellKey::from_coords(l.lat, l.lon)), l.hotspot))
        .collect();
    features
        .iter()
        .filter(|r| r.is_complete())
        .filter_map(|r| {
            by_key.get(&(r.week, r.key())).map(|&hotspot| TrainingExample {
                week: r.week,
                features: r.feature_vector(),
                hotspot,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn row(week: &str, lat: f64, sst: f64, chl: f64, sst_anom: f64) -> WeeklyFeatureRow {
        let week: IsoWeek = week.parse().unwrap();
        WeeklyFeatureRow { week, lat, lon: -78.0, sst, chl, sst_anom, month: week.month() }
    }

    fn spread_rows(week: &str, n: usize) -> Vec<WeeklyFeatureRow> {
        (0..n)
            .map(|i| row(week, -18.0 + i as f64 * 0.5, 15.0 + i as f64 * 0.3, 0.5 + i as f64 * 0.05, 0.0))
            .collect()
    }

    fn fraction_hot(labels: &[LabelRow], week: &str) -> f64 {
        let week: IsoWeek = week.parse().unwrap();
        let of_week: Vec<_> = labels.iter().filter(|l| l.week == week).collect();
        of_week.iter().filter(|l| l.hotspot == 1).count() as f64 / of_week.len() as f64
    }

    #[test]
    fn suitability_peaks_at_preferences() {
        assert_abs_diff_eq!(suitability(19.5, 1.4, 1.0), 0.95, epsilon = 1e-12);
        assert_abs_diff_eq!(suitability(19.5, 1.4, 0.0), 0.9, epsilon = 1e-12);
        assert!(suitability(25.0, 3.0, -1.0) < 0.1);
    }

    #[test]
    fn anomaly_boost_requires_strictly_positive() {
        let zero = suitability(19.5, 1.4, 0.0);
        let pos = suitability(19.5, 1.4, 1e-9);
        assert_abs_diff_eq!(pos - zero, W_ANOM * ANOM_BOOST, epsilon = 1e-12);
    }

    #[test]
    fn threshold_labels_top_thirty_percent() {
        let values: Vec<f64> = (0..10).map(f64::from).collect();
        assert_eq!(upper_tail_threshold(&values, 0.7), Some(7.0));
        assert_eq!(upper_tail_threshold(&[], 0.7), None);
        assert_eq!(upper_tail_threshold(&[3.0], 0.7), Some(3.0));
    }

    #[test]
    fn every_week_has_at_least_thirty_percent_hot() {
        let mut rows = Vec::new();
        for (week, n) in [("2024-W28", 7usize), ("2024-W29", 10), ("2024-W30", 13), ("2024-W31", 31), ("2024-W32", 1)] {
            rows.extend(spread_rows(week, n));
        }
        let labels = synth_labels(&rows, Some(3)).unwrap();
        assert_eq!(labels.len(), rows.len());
        for week in ["2024-W28", "2024-W29", "2024-W30", "2024-W31", "2024-W32"] {
            let f = fraction_hot(&labels, week);
            assert!(f >= 0.30, "{week}: hot fraction {f:.3} < 0.30");
        }
        // No ties: exactly ceil(0.3 * n).
        assert_abs_diff_eq!(fraction_hot(&labels, "2024-W29"), 0.3, epsilon = 1e-12);
        assert_abs_diff_eq!(fraction_hot(&labels, "2024-W28"), 3.0 / 7.0, epsilon = 1e-12);
    }

    #[test]
    fn ties_at_threshold_are_all_labelled() {
        // Identical rows with a zero-noise generator tie everywhere.
        struct Zero;
        impl rand::RngCore for Zero {
            fn next_u32(&mut self) -> u32 { 0 }
            fn next_u64(&mut self) -> u64 { 0 }
            fn fill_bytes(&mut self, dest: &mut [u8]) { dest.fill(0) }
            fn try_fill_bytes(&mut self, dest: &mut [u8]) -> std::result::Result<(), rand::Error> {
                dest.fill(0);
                Ok(())
            }
        }
        let rows: Vec<_> = (0..10).map(|_| row("2024-W30", -12.0, 19.0, 1.0, 0.0)).collect();
        let labels = synth_labels_with_rng(&rows, 0.7, &mut Zero).unwrap();
        assert!(labels.iter().all(|l| l.hotspot == 1));
    }

    #[test]
    fn thresholds_are_computed_per_week() {
        // Week A is uniformly far more suitable than week B; a global threshold
        // would label all of A and none of B.
        let mut rows: Vec<_> = (0..10).map(|i| row("2024-W30", -18.0 + i as f64, 19.5, 1.4, 1.0)).collect();
        rows.extend((0..10).map(|i| row("2024-W31", -18.0 + i as f64, 30.0, 5.0, -1.0)));
        let labels = synth_labels(&rows, Some(11)).unwrap();
        assert_abs_diff_eq!(fraction_hot(&labels, "2024-W30"), 0.3, epsilon = 1e-12);
        assert_abs_diff_eq!(fraction_hot(&labels, "2024-W31"), 0.3, epsilon = 1e-12);
    }

    #[test]
    fn labels_preserve_row_order_and_keys() {
        let rows = spread_rows("2024-W30", 5);
        let labels = synth_labels(&rows, Some(5)).unwrap();
        for (r, l) in rows.iter().zip(&labels) {
            assert_eq!((r.week, r.lat, r.lon), (l.week, l.lat, l.lon));
        }
    }

    #[test]
    fn invalid_quantile_is_rejected() {
        let rows = spread_rows("2024-W30", 5);
        let mut rng = StdRng::seed_from_u64(0);
        for q in [0.0, 1.0, -0.2, f64::NAN] {
            assert!(matches!(
                synth_labels_with_rng(&rows, q, &mut rng),
                Err(HotspotError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn training_join_matches_on_week_and_cell() {
        let mut rows = spread_rows("2024-W30", 4);
        rows[1].chl = f64::NAN;
        let mut labels = synth_labels(&rows, Some(1)).unwrap();
        labels.remove(3);
        let set = join_training_set(&rows, &labels);
        // Row 1 is incomplete, row 3 has no label.
        assert_eq!(set.len(), 2);
        assert_eq!(set[0].features, rows[0].feature_vector());
        assert_eq!(set[1].features, rows[2].feature_vector());
    }
}
