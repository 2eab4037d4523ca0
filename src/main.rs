//! Chunkwise - code-splitting planner for single-page apps
//!
//! Walks the module graph of a component-framework project and decides,
//! for every module, which named output bundle it is packaged into.
//!
//! # Features
//! - One cacheable bundle per third-party package, framework packages merged
//! - Per-component and per-view bundles for fine-grained cache invalidation
//! - All styles merged into a single stylesheet bundle
//! - Minimum chunk sizes per cache group
//! - Deterministic chunk manifest

use anyhow::Result;
use chunkwise::Cli;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the logging/tracing system
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("chunkwise=debug"))
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("chunkwise=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    cli.execute().await
}
