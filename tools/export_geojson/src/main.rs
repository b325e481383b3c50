//! Weekly GeoJSON export of model predictions over ocean cells.
//! One `<week>.geojson` per requested week, written in parallel.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use hotspot_core::config::PipelineConfig;
use hotspot_core::export::{predictions_to_geojson, write_week_geojson, PortPenalty};
use hotspot_core::features::WeeklyFeatureRow;
use hotspot_core::mask::Coastline;
use hotspot_core::model::{load_model, HotspotModel};
use hotspot_core::pipeline::ocean_rows_for_week;
use hotspot_core::ports::Port;
use hotspot_core::store::FeatureStore;
use hotspot_core::week::IsoWeek;
use rayon::prelude::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "export_geojson", about = "Export weekly hotspot predictions to GeoJSON")]
struct Args {
    /// A single ISO week, e.g. 2024-W30.
    #[arg(short, long)]
    week: Option<IsoWeek>,

    /// Comma-separated ISO weeks, e.g. 2024-W30,2024-W31.
    #[arg(long, value_delimiter = ',')]
    weeks: Vec<IsoWeek>,

    /// Output directory for `<week>.geojson` files.
    #[arg(short, long)]
    out: PathBuf,

    /// Feature store directory written by datagen.
    #[arg(short, long, default_value = "data/processed")]
    store: PathBuf,

    /// Logistic model coefficients (JSON). Defaults to the suitability model.
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Annotate features with distance and score relative to this port.
    #[arg(short, long)]
    port: Option<Port>,

    /// Distance penalty per kilometre, used with --port.
    #[arg(short, long, default_value_t = 0.02)]
    lambda: f64,

    /// Pipeline configuration; only its coastline table is used here.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

/// `--week` first, then `--weeks`, without repeats.
fn requested_weeks(args: &Args) -> Vec<IsoWeek> {
    let mut weeks: Vec<IsoWeek> = Vec::new();
    for w in args.week.iter().chain(&args.weeks) {
        if !weeks.contains(w) {
            weeks.push(*w);
        }
    }
    weeks
}

fn export_one(
    rows: &[WeeklyFeatureRow],
    week: IsoWeek,
    coastline: &Coastline,
    model: &dyn HotspotModel,
    penalty: Option<PortPenalty>,
    out: &Path,
) -> Result<(PathBuf, usize)> {
    let ocean = match ocean_rows_for_week(rows, week, coastline) {
        Ok(r) => r,
        Err(reason) => bail!("{reason}"),
    };
    let fc = predictions_to_geojson(&ocean, model, penalty)?;
    let path = write_week_geojson(out, week, &fc)?;
    Ok((path, fc.features.len()))
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "export_geojson=info,hotspot_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let weeks = requested_weeks(&args);
    if weeks.is_empty() {
        bail!("Provide --week or --weeks");
    }

    let cfg = match &args.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    let coastline = cfg.coastline()?;
    let model = load_model(args.model.as_deref()).context("loading model")?;
    let penalty = args.port.map(|p| PortPenalty { port: p.location(), lambda: args.lambda });

    let store = FeatureStore::new(&args.store);
    let rows = store
        .load_features()
        .with_context(|| format!("reading {}", store.features_path().display()))?;

    eprintln!("Exporting {} week(s) to {} ...", weeks.len(), args.out.display());

    let results: Vec<(IsoWeek, Result<(PathBuf, usize)>)> = weeks
        .par_iter()
        .map(|&w| (w, export_one(&rows, w, &coastline, model.as_ref(), penalty, &args.out)))
        .collect();

    let mut failed = 0usize;
    for (week, res) in results {
        match res {
            Ok((path, n)) => eprintln!("Wrote {}  (features: {n})", path.display()),
            Err(e) => {
                eprintln!("Warning: {week}: {e:#}");
                failed += 1;
            }
        }
    }
    if failed > 0 {
        bail!("{failed} of {} week(s) could not be exported", weeks.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hotspot_core::model::SuitabilityModel;

    fn row(week: &str, lat: f64, lon: f64) -> WeeklyFeatureRow {
        WeeklyFeatureRow {
            week: week.parse().unwrap(),
            lat,
            lon,
            sst: 18.5,
            chl: 1.2,
            sst_anom: 0.0,
            month: 7,
        }
    }

    #[test]
    fn weeks_merge_in_order_without_repeats() {
        let args = Args::parse_from([
            "export_geojson",
            "--week",
            "2024-W30",
            "--weeks",
            "2024-W31,2024-W30,2024-W32",
            "--out",
            "out",
        ]);
        let names: Vec<String> = requested_weeks(&args).iter().map(|w| w.to_string()).collect();
        assert_eq!(names, ["2024-W30", "2024-W31", "2024-W32"]);
    }

    #[test]
    fn export_one_writes_only_ocean_cells() {
        let dir = tempfile::tempdir().unwrap();
        let rows = vec![row("2024-W30", -12.0, -80.0), row("2024-W30", -12.0, -75.0)];
        let week: IsoWeek = "2024-W30".parse().unwrap();
        let (path, n) =
            export_one(&rows, week, &Coastline::peru(), &SuitabilityModel, None, dir.path()).unwrap();
        assert_eq!(n, 1);
        assert!(path.ends_with("2024-W30.geojson"));
    }

    #[test]
    fn export_one_reports_missing_week() {
        let dir = tempfile::tempdir().unwrap();
        let rows = vec![row("2024-W30", -12.0, -80.0)];
        let err = export_one(&rows, "2024-W40".parse().unwrap(), &Coastline::peru(), &SuitabilityModel, None, dir.path())
            .unwrap_err();
        assert!(err.to_string().contains("no features for 2024-W40"));
    }
}
