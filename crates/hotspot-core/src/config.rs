//! Pipeline configuration.
//!
//! Defaults reproduce the Peru demo run. Every field may be omitted from a
//! JSON config file; omitted fields take their default.

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{HotspotError, Result};
use crate::features::DEFAULT_ROLLING_WINDOW;
use crate::grid::GridConfig;
use crate::labels::DEFAULT_HOTSPOT_QUANTILE;
use crate::mask::{CoastAnchor, Coastline, PERU_COASTLINE};
use crate::week::{iso_weeks, IsoWeek};

/// Calendar date range covered by a run, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeekRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Default for WeekRange {
    /// May through September 2024.
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap_or(NaiveDate::MIN),
            end: NaiveDate::from_ymd_opt(2024, 10, 1).unwrap_or(NaiveDate::MIN),
        }
    }
}

impl WeekRange {
    pub fn weeks(&self) -> Vec<IsoWeek> {
        iso_weeks(self.start, self.end)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub grid: GridConfig,
    pub weeks: WeekRange,
    /// `None` draws noise from OS entropy.
    pub seed: Option<u64>,
    pub coastline: Vec<CoastAnchor>,
    pub rolling_window: usize,
    pub hotspot_quantile: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            weeks: WeekRange::default(),
            seed: None,
            coastline: PERU_COASTLINE.to_vec(),
            rolling_window: DEFAULT_ROLLING_WINDOW,
            hotspot_quantile: DEFAULT_HOTSPOT_QUANTILE,
        }
    }
}

impl PipelineConfig {
    /// Read a JSON config file. The result is validated.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| HotspotError::io(path, e))?;
        let cfg: Self = serde_json::from_str(&text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        self.grid.validate()?;
        if self.grid.lat_min > self.grid.lat_max {
            return Err(HotspotError::InvalidConfig(format!(
                "lat_min {} exceeds lat_max {}",
                self.grid.lat_min, self.grid.lat_max
            )));
        }
        if self.rolling_window == 0 {
            return Err(HotspotError::InvalidConfig("rolling_window must be at least 1".into()));
        }
        if !(self.hotspot_quantile > 0.0 && self.hotspot_quantile < 1.0) {
            return Err(HotspotError::InvalidConfig(format!(
                "hotspot_quantile must lie in (0, 1), got {}",
                self.hotspot_quantile
            )));
        }
        if self.weeks.end < self.weeks.start {
            return Err(HotspotError::InvalidConfig(format!(
                "week range ends ({}) before it starts ({})",
                self.weeks.end, self.weeks.start
            )));
        }
        self.coastline()?;
        Ok(())
    }

    pub fn coastline(&self) -> Result<Coastline> {
        Coastline::new(self.coastline.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid_and_covers_may_to_september() {
        let cfg = PipelineConfig::default();
        cfg.validate().unwrap();
        let weeks = cfg.weeks.weeks();
        assert_eq!(weeks.first().map(|w| w.to_string()), Some("2024-W18".into()));
        assert_eq!(weeks.last().map(|w| w.to_string()), Some("2024-W40".into()));
        assert_eq!(cfg.coastline().unwrap(), Coastline::peru());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: PipelineConfig = serde_json::from_str(r#"{"seed": 7, "grid": {"lat_min": -18.0, "lat_max": -3.0, "lon_min": -86.0, "lon_max": -70.0, "step": 1.0, "coast_band": [-84.5, -72.0]}}"#).unwrap();
        assert_eq!(cfg.seed, Some(7));
        assert_eq!(cfg.grid.step, 1.0);
        assert_eq!(cfg.rolling_window, 8);
        assert_eq!(cfg.hotspot_quantile, 0.7);
        assert_eq!(cfg.weeks, WeekRange::default());
    }

    #[test]
    fn dates_parse_from_iso_strings() {
        let cfg: PipelineConfig =
            serde_json::from_str(r#"{"weeks": {"start": "2024-07-01", "end": "2024-07-31"}}"#).unwrap();
        let names: Vec<String> = cfg.weeks.weeks().iter().map(|w| w.to_string()).collect();
        assert_eq!(names, ["2024-W27", "2024-W28", "2024-W29", "2024-W30", "2024-W31"]);
    }

    #[test]
    fn validate_rejects_bad_values() {
        let bad_step = PipelineConfig { grid: GridConfig { step: 0.0, ..GridConfig::default() }, ..Default::default() };
        assert!(bad_step.validate().is_err());

        let inverted = PipelineConfig {
            grid: GridConfig { lat_min: -3.0, lat_max: -18.0, ..GridConfig::default() },
            ..Default::default()
        };
        assert!(inverted.validate().is_err());

        let no_window = PipelineConfig { rolling_window: 0, ..Default::default() };
        assert!(no_window.validate().is_err());

        for q in [0.0, 1.0, -0.5, f64::NAN] {
            let bad_q = PipelineConfig { hotspot_quantile: q, ..Default::default() };
            assert!(bad_q.validate().is_err(), "quantile {q} accepted");
        }

        let backwards = PipelineConfig {
            weeks: WeekRange {
                start: NaiveDate::from_ymd_opt(2024, 10, 1).unwrap(),
                end: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            },
            ..Default::default()
        };
        assert!(backwards.validate().is_err());

        let no_coast = PipelineConfig { coastline: vec![], ..Default::default() };
        assert!(matches!(no_coast.validate(), Err(HotspotError::InvalidConfig(_))));
    }

    #[test]
    fn load_reads_and_validates_file() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.json");
        fs::write(&good, r#"{"seed": 3, "rolling_window": 4}"#).unwrap();
        let cfg = PipelineConfig::load(&good).unwrap();
        assert_eq!(cfg.seed, Some(3));
        assert_eq!(cfg.rolling_window, 4);

        let bad = dir.path().join("bad.json");
        fs::write(&bad, r#"{"hotspot_quantile": 1.5}"#).unwrap();
        assert!(PipelineConfig::load(&bad).is_err());
    }
}
