//! Pipeline orchestrator: offline dataset build and the per-week serving query.
//!
//! Offline order:
//!   1. Coastal grid
//!   2. Environmental field synthesis
//!   3. Weekly features (join, month, rolling SST anomaly)
//!   4. Hotspot labels
//!
//! Serving order: week selection → land mask → model scoring → top-K.

use std::fmt;

use crate::config::PipelineConfig;
use crate::coords::LatLon;
use crate::environment::synthesize_fields;
use crate::error::{HotspotError, Result};
use crate::features::{build_weekly_features_with_window, rows_for_week, WeeklyFeatureRow};
use crate::grid::{coastal_grid, GridCell};
use crate::labels::{join_training_set, synth_labels_with_quantile, LabelRow};
use crate::mask::{apply_land_mask, Coastline};
use crate::model::HotspotModel;
use crate::scorer::{score_cells, ScoredCell};
use crate::week::IsoWeek;

// ── Offline path ──────────────────────────────────────────────────────────────

/// Everything the offline path produces.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub grid: Vec<GridCell>,
    pub weeks: Vec<IsoWeek>,
    pub features: Vec<WeeklyFeatureRow>,
    pub labels: Vec<LabelRow>,
}

impl Dataset {
    /// Share of complete, labelled rows that are hotspots; 0 when there are none.
    pub fn positive_rate(&self) -> f64 {
        let examples = join_training_set(&self.features, &self.labels);
        if examples.is_empty() {
            return 0.0;
        }
        examples.iter().filter(|e| e.hotspot == 1).count() as f64 / examples.len() as f64
    }
}

/// Runs the offline stages for one configuration.
pub struct HotspotPipeline {
    config: PipelineConfig,
}

impl HotspotPipeline {
    /// Validates `config` up front.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn build_dataset(&self) -> Result<Dataset> {
        let cfg = &self.config;

        // ── 1. Grid ─────────────────────────────────────────────────────────
        let grid = coastal_grid(&cfg.grid)?;
        if grid.is_empty() {
            return Err(HotspotError::InvalidConfig(
                "grid bounds and coastal band do not intersect".into(),
            ));
        }

        // ── 2. Fields ───────────────────────────────────────────────────────
        let weeks = cfg.weeks.weeks();
        let fields = synthesize_fields(&grid, &weeks, cfg.seed);

        // ── 3. Features ─────────────────────────────────────────────────────
        let features = build_weekly_features_with_window(&fields.sst, &fields.chl, cfg.rolling_window);

        // ── 4. Labels ───────────────────────────────────────────────────────
        let labels = synth_labels_with_quantile(&features, cfg.hotspot_quantile, cfg.seed)?;

        tracing::info!(
            cells = grid.len(),
            weeks = weeks.len(),
            rows = features.len(),
            "built hotspot dataset"
        );
        Ok(Dataset { grid, weeks, features, labels })
    }
}

// ── Serving path ──────────────────────────────────────────────────────────────

/// Why a week produced nothing to rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoDataReason {
    NoFeaturesForWeek(IsoWeek),
    AllCellsMasked(IsoWeek),
}

impl fmt::Display for NoDataReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoDataReason::NoFeaturesForWeek(w) => write!(f, "no features for {w}"),
            NoDataReason::AllCellsMasked(w) => write!(f, "all cells of {w} are masked as land"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RankOutcome {
    Ranked(Vec<ScoredCell>),
    NoData(NoDataReason),
}

/// The ocean-side rows of `week`, or the reason there are none.
pub fn ocean_rows_for_week(
    rows: &[WeeklyFeatureRow],
    week: IsoWeek,
    coastline: &Coastline,
) -> std::result::Result<Vec<WeeklyFeatureRow>, NoDataReason> {
    let week_rows = rows_for_week(rows, week);
    if week_rows.is_empty() {
        return Err(NoDataReason::NoFeaturesForWeek(week));
    }
    let ocean = apply_land_mask(&week_rows, coastline);
    if ocean.is_empty() {
        tracing::warn!(%week, rows = week_rows.len(), "land mask removed every cell");
        return Err(NoDataReason::AllCellsMasked(week));
    }
    Ok(ocean)
}

/// Top cells of `week` for a trip from `port` with distance penalty `lambda`.
pub fn rank_week<M: HotspotModel + ?Sized>(
    rows: &[WeeklyFeatureRow],
    week: IsoWeek,
    port: LatLon,
    lambda: f64,
    coastline: &Coastline,
    model: &M,
) -> Result<RankOutcome> {
    let ocean = match ocean_rows_for_week(rows, week, coastline) {
        Ok(r) => r,
        Err(reason) => return Ok(RankOutcome::NoData(reason)),
    };
    let ranked = score_cells(&ocean, model, port, lambda)?;
    tracing::debug!(%week, model = model.name(), returned = ranked.len(), "ranked week");
    Ok(RankOutcome::Ranked(ranked))
}

// ── Unit tests ────────────────────────────────────────────────────────────────
