//! Offline dataset build.
//! Grid → synthetic SST/chlorophyll → weekly features → hotspot labels,
//! written to `<out>/features.json` and `<out>/labels.json`.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use hotspot_core::config::PipelineConfig;
use hotspot_core::labels::LabelRow;
use hotspot_core::pipeline::HotspotPipeline;
use hotspot_core::store::FeatureStore;
use hotspot_core::week::IsoWeek;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "datagen", about = "Generate the synthetic feature and label store")]
struct Args {
    /// JSON pipeline configuration; flags below override its fields.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed for field and label noise. Omit for a non-reproducible run.
    #[arg(short, long)]
    seed: Option<u64>,

    /// Grid spacing in degrees.
    #[arg(long)]
    step: Option<f64>,

    /// Output directory for the feature/label store.
    #[arg(short, long, default_value = "data/processed")]
    out: PathBuf,
}

fn resolve_config(args: &Args) -> Result<PipelineConfig> {
    let mut cfg = match &args.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(seed) = args.seed {
        cfg.seed = Some(seed);
    }
    if let Some(step) = args.step {
        cfg.grid.step = step;
    }
    cfg.validate().context("invalid pipeline configuration")?;
    Ok(cfg)
}

/// (rows, hotspots) per week.
fn weekly_counts(labels: &[LabelRow]) -> BTreeMap<IsoWeek, (usize, usize)> {
    let mut counts: BTreeMap<IsoWeek, (usize, usize)> = BTreeMap::new();
    for l in labels {
        let e = counts.entry(l.week).or_default();
        e.0 += 1;
        e.1 += usize::from(l.hotspot);
    }
    counts
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "datagen=info,hotspot_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let cfg = resolve_config(&args)?;

    eprintln!(
        "Building dataset: step {}°, weeks {} .. {}, seed {}",
        cfg.grid.step,
        cfg.weeks.start,
        cfg.weeks.end,
        cfg.seed.map_or_else(|| "entropy".to_string(), |s| s.to_string()),
    );

    let pipeline = HotspotPipeline::new(cfg)?;
    let ds = pipeline.build_dataset()?;

    let store = FeatureStore::new(&args.out);
    store
        .save_features(&ds.features)
        .with_context(|| format!("writing {}", store.features_path().display()))?;
    store
        .save_labels(&ds.labels)
        .with_context(|| format!("writing {}", store.labels_path().display()))?;

    eprintln!("\n{:<10}  {:>6}  {:>8}  {:>6}", "week", "rows", "hotspots", "share");
    for (week, (rows, hot)) in weekly_counts(&ds.labels) {
        let share = if rows == 0 { 0.0 } else { hot as f64 / rows as f64 };
        eprintln!("{:<10}  {:>6}  {:>8}  {:>6.3}", week.to_string(), rows, hot, share);
    }
    eprintln!(
        "\n{} cells × {} weeks → {} rows, positive rate {:.3}",
        ds.grid.len(),
        ds.weeks.len(),
        ds.features.len(),
        ds.positive_rate(),
    );
    eprintln!("Store written to {}", store.dir().display());
    Ok(())
}
