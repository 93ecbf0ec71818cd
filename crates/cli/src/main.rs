use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reelstitch_core::{
    load_config_or_default, load_manifest, validate_config, BatchOrchestrator, BatchPipeline,
    Dispatcher, FfmpegEngine, HttpDownloader, StorageLayout,
};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser, Debug)]
#[command(author, version, about = "Downloads batches of clips and stitches each into one video", long_about = None)]
struct Cli {
    /// Path to the JSON manifest listing clips and their batches
    manifest: PathBuf,

    /// Path to a TOML config file (REELSTITCH_* env vars override it)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Restrict the run to the named batches (repeat for several)
    #[arg(long = "batch")]
    batches: Vec<String>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    // Exit codes: 0 all batches succeeded, 1 some batch failed,
    // 2 the run could not start at all.
    let code = match run(cli).await {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(e) => {
            error!("Fatal error: {:#}", e);
            2
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<bool> {
    info!("reelstitch {} starting", VERSION);

    match &cli.config {
        Some(path) => info!("Loading configuration from {:?}", path),
        None => info!("No config file given, using defaults and REELSTITCH_* environment"),
    }
    let config = load_config_or_default(cli.config.as_deref()).with_context(|| {
        match &cli.config {
            Some(path) => format!("Failed to load config from {:?}", path),
            None => "Failed to load config from environment".to_string(),
        }
    })?;

    validate_config(&config).context("Configuration validation failed")?;
    info!("Configuration loaded successfully");

    if config.mediated.is_some() {
        info!("Asset lookup API configured");
    }

    let mut batches = load_manifest(&cli.manifest)
        .await
        .with_context(|| format!("Failed to load manifest from {:?}", cli.manifest))?;

    if !cli.batches.is_empty() {
        for name in &cli.batches {
            if !batches.iter().any(|b| &b.name == name) {
                bail!("Batch {:?} not found in manifest", name);
            }
        }
        batches.retain(|b| cli.batches.contains(&b.name));
        info!("Restricting run to {} named batch(es)", batches.len());
    }

    let fetcher = HttpDownloader::new(config.downloader.clone(), config.mediated.clone())
        .context("Failed to create downloader")?;
    let dispatcher = Dispatcher::new(Arc::new(fetcher), config.downloader.max_parallel_downloads);
    let engine = Arc::new(FfmpegEngine::new(config.engine.clone()));
    let layout = StorageLayout::new(&config.paths);

    let pipeline = Arc::new(BatchPipeline::new(
        dispatcher,
        engine,
        layout,
        config.engine.max_parallel_transcodes,
    ));
    let orchestrator = BatchOrchestrator::new(config.orchestrator.clone(), pipeline);

    info!(
        "Processing {} batch(es) from {:?}",
        batches.len(),
        cli.manifest
    );

    let summary = orchestrator
        .run(&batches, None)
        .await
        .context("Run aborted before any batch started")?;

    let elapsed_ms = (summary.finished_at - summary.started_at).num_milliseconds();
    let failed = summary.failed_batches();
    if failed.is_empty() {
        info!(
            "All {} batch(es) succeeded in {} ms",
            summary.reports.len(),
            elapsed_ms
        );
    } else {
        warn!(
            "{} of {} batch(es) failed: {}",
            failed.len(),
            summary.reports.len(),
            failed.join(", ")
        );
    }

    Ok(summary.all_succeeded())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_manifest_and_config() {
        let cli =
            Cli::try_parse_from(["reelstitch", "batches.json", "-c", "custom.toml"]).unwrap();
        assert_eq!(cli.manifest, PathBuf::from("batches.json"));
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        assert!(cli.batches.is_empty());
    }

    #[test]
    fn batch_flag_repeats() {
        let cli = Cli::try_parse_from([
            "reelstitch",
            "batches.json",
            "--batch",
            "intro",
            "--batch",
            "outro",
        ])
        .unwrap();
        assert_eq!(cli.batches, vec!["intro", "outro"]);
    }

    #[test]
    fn manifest_argument_is_required() {
        assert!(Cli::try_parse_from(["reelstitch"]).is_err());
    }
}
