//! Serving query: top cells for one week, port and distance penalty.
//! Reads the feature store written by `datagen`, masks land, scores with the
//! chosen model and prints the ranking; optionally writes it as JSON.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use hotspot_core::config::PipelineConfig;
use hotspot_core::model::load_model;
use hotspot_core::pipeline::{rank_week, RankOutcome};
use hotspot_core::ports::Port;
use hotspot_core::scorer::ScoredCell;
use hotspot_core::store::{write_json_atomic, FeatureStore};
use hotspot_core::week::IsoWeek;
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "rank", about = "Rank hotspot cells for a week by probability and distance from port")]
struct Args {
    /// ISO week, e.g. 2024-W30.
    #[arg(short, long)]
    week: IsoWeek,

    /// Reference port (Paita, Chimbote, Callao, Pisco, Matarani).
    #[arg(short, long, default_value_t = Port::Callao)]
    port: Port,

    /// Distance penalty per kilometre.
    #[arg(short, long, default_value_t = 0.02)]
    lambda: f64,

    /// Feature store directory written by datagen.
    #[arg(short, long, default_value = "data/processed")]
    store: PathBuf,

    /// Logistic model coefficients (JSON). Defaults to the suitability model.
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Pipeline configuration; only its coastline table is used here.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Also write the ranking to this JSON file.
    #[arg(short, long)]
    out: Option<PathBuf>,
}

// ── Output types ──────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct Ranking<'a> {
    week: IsoWeek,
    port: Port,
    lambda: f64,
    cells: &'a [ScoredCell],
}

fn format_row(rank: usize, c: &ScoredCell) -> String {
    format!(
        "{:>3}  {:>8.3}  {:>8.3}  {:>6.3}  {:>8.1}  {:>7.3}",
        rank, c.lat, c.lon, c.p, c.dist_km, c.score
    )
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rank=info,hotspot_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let cfg = match &args.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    let coastline = cfg.coastline()?;
    let model = load_model(args.model.as_deref()).context("loading model")?;

    let store = FeatureStore::new(&args.store);
    let rows = store
        .load_features()
        .with_context(|| format!("reading {}", store.features_path().display()))?;

    let outcome = rank_week(&rows, args.week, args.port.location(), args.lambda, &coastline, &model)?;
    let cells = match outcome {
        RankOutcome::Ranked(cells) => cells,
        RankOutcome::NoData(reason) => bail!("{reason}"),
    };

    eprintln!(
        "Top {} cells for {} from {} (λ = {}, model = {})",
        cells.len(),
        args.week,
        args.port,
        args.lambda,
        model.name()
    );
    eprintln!("{:>3}  {:>8}  {:>8}  {:>6}  {:>8}  {:>7}", "#", "lat", "lon", "p", "dist_km", "score");
    for (i, c) in cells.iter().enumerate() {
        eprintln!("{}", format_row(i + 1, c));
    }

    if let Some(out) = &args.out {
        let ranking = Ranking { week: args.week, port: args.port, lambda: args.lambda, cells: &cells };
        write_json_atomic(out, &ranking).with_context(|| format!("writing {}", out.display()))?;
        eprintln!("Wrote {}", out.display());
    }
    Ok(())
}
