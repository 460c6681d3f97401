//! lotcap - command-line maximum-allowable-units evaluation
//!
//! Reads a parcel description (a TOML file with `[parameters]` and
//! `[geometry]` tables), runs the calculator (through the SQLite-backed
//! cache when `--db` is given) and prints the analysis as JSON.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lotcap_core::{
    CacheStore, Calculator, FileConfig, ParcelGeometry, ResultCache, ZoningParameterSet,
};

/// Command-line arguments for lotcap
#[derive(Parser, Debug)]
#[command(name = "lotcap")]
#[command(about = "Maximum allowable dwelling units for a zoned parcel")]
#[command(version)]
struct Args {
    /// TOML file with [parameters] and [geometry] tables
    #[arg(short, long, env = "LOTCAP_INPUT")]
    input: PathBuf,

    /// SQLite parameter cache (created on first use)
    #[arg(short, long, env = "LOTCAP_DB")]
    db: Option<PathBuf>,

    /// Config file overriding calculator/cache tunables
    #[arg(short, long, env = "LOTCAP_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct EvaluationInput {
    parameters: ZoningParameterSet,
    geometry: ParcelGeometry,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lotcap=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };

    let raw = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let input: EvaluationInput = toml::from_str(&raw)
        .with_context(|| format!("Failed to parse {}", args.input.display()))?;

    let calculator = Calculator::new(config.calculator)?;

    let analysis = match &args.db {
        Some(db_path) => {
            let store = CacheStore::open(db_path)
                .await
                .context("Failed to open parameter cache")?;
            let cache = ResultCache::with_store(calculator, config.cache, store)?;
            let key = input.parameters.key();
            let parameters = input.parameters.clone();
            cache
                .evaluate_cached(&key, &input.geometry, || async move { Ok(parameters) })
                .await?
        }
        None => calculator.evaluate(&input.parameters, &input.geometry)?,
    };

    info!(
        "Max units: {} (governing: {}, confidence: {})",
        analysis.max_units,
        analysis.governing_label(),
        analysis.confidence
    );

    println!("{}", serde_json::to_string_pretty(&analysis)?);
    Ok(())
}
