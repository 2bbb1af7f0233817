//! Command-line harness for the Elo-MMR rating engine
//!
//! Rates one or more match result files against an in-memory rating history,
//! optionally seeded from a JSON file of earlier records, and prints the
//! produced rating records as JSON lines.

use anyhow::{Context, Result};
use clap::Parser;
use elommr_rater::config::AppConfig;
use elommr_rater::metrics::MetricsCollector;
use elommr_rater::processor::MatchProcessor;
use elommr_rater::rating::{EloMmrCalculator, InMemoryRatingStore};
use elommr_rater::types::{Kernel, MatchResults, RatingRecord};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

/// Elo-MMR match rater - multi-competitor skill ratings from match placements
#[derive(Parser)]
#[command(
    name = "rate-match",
    version,
    about = "Rate shooting-sports matches with the Elo-MMR rating engine",
    long_about = "Reads match results as JSON, looks up each competitor's prior rating, \
                 solves per-division performance ratings and prints the updated rating \
                 records as JSON lines. Matches are rated in date order so later matches \
                 see the ratings produced by earlier ones."
)]
struct Args {
    /// Match result files (JSON)
    #[arg(value_name = "MATCH", required = true)]
    matches: Vec<PathBuf>,

    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Existing rating history
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "JSON array of earlier rating records used as priors"
    )]
    priors: Option<PathBuf>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// Kernel override
    #[arg(long, value_name = "KERNEL", help = "Probability kernel (normal, logistic)")]
    kernel: Option<Kernel>,

    /// Print metrics after processing
    #[arg(long, help = "Print Prometheus metrics to stderr after processing")]
    metrics: bool,

    /// Enable debug mode
    #[arg(short, long, help = "Enable debug mode with verbose logging")]
    debug: bool,

    /// Dry run mode (validate config and inputs, then exit)
    #[arg(long, help = "Validate configuration and match files without rating")]
    dry_run: bool,
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Load and merge configuration from environment and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if args.debug {
        config.service.log_level = "debug".to_string();
    }

    if let Some(kernel) = args.kernel {
        config.rating.mmr_method = kernel;
    }

    elommr_rater::config::validate_config(&config)?;
    Ok(config)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}

fn load_matches(paths: &[PathBuf]) -> Result<Vec<MatchResults>> {
    let mut matches = paths
        .iter()
        .map(|path| read_json::<MatchResults>(path))
        .collect::<Result<Vec<_>>>()?;
    // Undated matches keep their command-line order ahead of dated ones
    matches.sort_by_key(|m| m.match_date);
    Ok(matches)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {:#}", e);
        std::process::exit(1);
    });

    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    let matches = load_matches(&args.matches)?;
    let history: Vec<RatingRecord> = match &args.priors {
        Some(path) => read_json(path)?,
        None => Vec::new(),
    };

    info!("{} v{}", config.service.name, elommr_rater::VERSION);
    info!(
        "   Kernel: {}, grid: [{}, {}], matches: {}, prior records: {}",
        config.rating.mmr_method,
        config.rating.rating_min,
        config.rating.rating_max,
        matches.len(),
        history.len()
    );

    if args.dry_run {
        info!("Dry run completed - configuration and inputs are valid");
        return Ok(());
    }

    let calculator = Arc::new(EloMmrCalculator::new(config.rating.clone())?);
    let store = Arc::new(InMemoryRatingStore::with_records(history));
    let metrics = Arc::new(MetricsCollector::new()?);
    let processor = MatchProcessor::new(calculator, store, config.service.clone())
        .with_metrics(metrics.clone());

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut failures = 0;

    for results in &matches {
        match processor.process_match(results).await {
            Ok(report) => {
                for record in &report.records {
                    writeln!(out, "{}", serde_json::to_string(record)?)?;
                }
            }
            Err(e) => {
                error!("Skipping match {}: {:#}", results.match_id, e);
                failures += 1;
            }
        }
    }
    out.flush()?;

    if args.metrics {
        eprint!("{}", metrics.gather_text()?);
    }

    if failures > 0 {
        error!("{} of {} match(es) failed", failures, matches.len());
        std::process::exit(1);
    }

    Ok(())
}
