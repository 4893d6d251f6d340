use anyhow::{Context, Result};
use config::TrackerConfig;
use fetcher::{IdProber, ProductFetcher};
use std::env;
use std::path::Path;
use storage::HistoryStore;
use tracing::{info, warn};

mod config;
mod fetcher;
mod models;
mod processor;
mod storage;

const DEFAULT_CONFIG_PATH: &str = "configs/tracker.toml";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();
    let probe_mode = args.iter().any(|arg| arg == "--probe" || arg == "-p");
    let config_path = args
        .iter()
        .position(|arg| arg == "--config")
        .and_then(|position| args.get(position + 1))
        .map(String::as_str)
        .unwrap_or(DEFAULT_CONFIG_PATH);

    let config = if Path::new(config_path).exists() {
        TrackerConfig::from_file(config_path)
            .with_context(|| format!("failed to load config {}", config_path))?
    } else {
        warn!("Config file {} not found, using defaults", config_path);
        TrackerConfig::default()
    };

    if probe_mode {
        run_probe(&config).await
    } else {
        run_fetch(&config).await
    }
}

/// Scan the ID space and rewrite the target list with the IDs that resolve.
async fn run_probe(config: &TrackerConfig) -> Result<()> {
    info!("🚀 Starting ID probe for {}", config.site.name);

    let prober = IdProber::new(config)?;
    let resolved = prober.probe_range().await;

    info!("Found {} live product IDs", resolved.len());
    storage::save_targets(&config.paths.targets, &resolved)?;
    info!("✅ Target list written to {}", config.paths.targets);

    Ok(())
}

/// Fetch every known target and fold the observations into the dataset.
async fn run_fetch(config: &TrackerConfig) -> Result<()> {
    info!("🚀 Starting product fetch for {}", config.site.name);

    let targets = storage::load_targets(&config.paths.targets)?;
    info!("Loaded {} targets from {}", targets.len(), config.paths.targets);

    let fetcher = ProductFetcher::new(config)?;
    let results = fetcher.fetch_all(&targets).await;
    let failed = results.iter().filter(|r| r.outcome.is_err()).count();
    info!("Fetched {} targets ({} failed)", results.len(), failed);

    let store = HistoryStore::new(&config.paths.dataset);
    let mut entities = store.load()?;
    let stats = HistoryStore::merge(&mut entities, &results);
    store
        .save(&entities)
        .context("failed to persist merged dataset")?;

    info!(
        "✅ Dataset saved to {}: {} entities ({} created, {} price changes, {} unchanged, {} skipped)",
        config.paths.dataset,
        entities.len(),
        stats.created,
        stats.appended,
        stats.unchanged,
        stats.skipped
    );

    Ok(())
}
