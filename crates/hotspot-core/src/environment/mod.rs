//! Synthetic environmental fields.
//!
//! Produces weekly sea-surface temperature and chlorophyll samples for every
//! (week, cell) pair: a deterministic spatial/seasonal trend plus independent
//! Gaussian noise per sample. Stands in for satellite feeds.
//!
//! Pipeline per sample:
//!   seasonal phase → SST trend + N(0, 0.4) → chlorophyll trend + N(0, 0.1) → floor.

pub mod chlorophyll;
pub mod seasonal;
pub mod sst;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use crate::grid::GridCell;
use crate::week::IsoWeek;

use chlorophyll::{chl_trend, floor_chl};
use seasonal::seasonal_phase;
use sst::sst_trend;

/// Salt mixed into user seeds so field noise is decorrelated from label noise.
const FIELD_SEED_SALT: u64 = 0x5EA5_0F7E_3C1A_9B27;

/// One value of one environmental variable for one cell in one week.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeeklyFieldSample {
    pub week: IsoWeek,
    pub lat: f64,
    pub lon: f64,
    pub value: f64,
}

/// Both synthesized variables, each in week-major, grid order.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentFields {
    pub sst: Vec<WeeklyFieldSample>,
    pub chl: Vec<WeeklyFieldSample>,
}

/// Synthesize SST and chlorophyll for every (week, cell).
///
/// `seed = None` draws from OS entropy; `Some(seed)` makes the run reproducible.
pub fn synthesize_fields(grid: &[GridCell], weeks: &[IsoWeek], seed: Option<u64>) -> EnvironmentFields {
    let mut rng = match seed {
        Some(s) => StdRng::seed_from_u64(s ^ FIELD_SEED_SALT),
        None => StdRng::from_entropy(),
    };
    synthesize_fields_with_rng(grid, weeks, &mut rng)
}

/// As [`synthesize_fields`], drawing noise from a caller-supplied generator.
pub fn synthesize_fields_with_rng<R: Rng>(
    grid: &[GridCell],
    weeks: &[IsoWeek],
    rng: &mut R,
) -> EnvironmentFields {
    let n = grid.len() * weeks.len();
    let mut fields = EnvironmentFields {
        sst: Vec::with_capacity(n),
        chl: Vec::with_capacity(n),
    };

    for &week in weeks {
        let season = seasonal_phase(week.week());
        for cell in grid {
            let sst_noise: f64 = rng.sample(StandardNormal);
            let chl_noise: f64 = rng.sample(StandardNormal);

            let sst = sst_trend(cell.lat, cell.lon, season) + sst::NOISE_STD * sst_noise;
            let chl = floor_chl(chl_trend(cell.lat, cell.lon, season) + chlorophyll::NOISE_STD * chl_noise);

            fields.sst.push(WeeklyFieldSample { week, lat: cell.lat, lon: cell.lon, value: sst });
            fields.chl.push(WeeklyFieldSample { week, lat: cell.lat, lon: cell.lon, value: chl });
        }
    }

    tracing::debug!(
        weeks = weeks.len(),
        cells = grid.len(),
        samples = fields.sst.len(),
        "synthesized environmental fields"
    );
    fields
}
