#![doc = include_str!("../README.md")]

mod clock;
mod config;
mod monitor;
mod telemetry;

use clap::Parser;
use clock::PreviewClock;
use config::{CliArgs, PreviewConfig};
use docket::{CaseId, CaseIdAllocator, MemoryCaseStore, TimeSource};
use monitor::TracingMonitor;
use std::sync::Arc;
use telemetry::init_telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = PreviewConfig::try_from(args)?;

    init_telemetry()?;
    log_startup_info(&config);

    let clock = PreviewClock::new(config.year);
    let year = clock.current_year();
    let used = config
        .used
        .iter()
        .map(|&sequence| CaseId::new(year, sequence))
        .collect::<Result<Vec<_>, _>>()?;
    let store = Arc::new(MemoryCaseStore::with_ids(used));

    let allocator = CaseIdAllocator::with_clock(Arc::clone(&store), config.allocator, clock)
        .with_monitor(TracingMonitor);
    allocator.initialize().await?;

    let preview = allocator.preview_next_identifier().await?;
    tracing::info!(id = %preview, source = ?preview.source, "next case number");
    println!("{preview}");

    for n in 1..=config.claims {
        let id = allocator.claim(None).await?;
        tracing::info!(%id, n, "claimed case number");
        println!("{id}");
    }

    let estimate = allocator.estimate_next()?.into_unverified();
    tracing::info!(
        %estimate,
        stored = store.len(),
        watermark = ?allocator.watermark(),
        "done; the estimate is unverified"
    );

    allocator.cleanup();
    Ok(())
}

fn log_startup_info(config: &PreviewConfig) {
    if cfg!(debug_assertions) {
        tracing::info!("Starting docket-preview with full config: {:#?}", config);
    } else {
        tracing::info!(
            "Starting docket-preview with {} used numbers and {} claims",
            config.used.len(),
            config.claims
        );
    }
}
