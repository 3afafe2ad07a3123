mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

use newsflow_core::config::AppConfig;

use crate::cli::{Cli, Commands};

fn main() -> Result<()> {
    // A single multi-thread runtime is enough here: the pipeline's
    // concurrency comes from bounded per-chunk fan-out (ten tickers at a
    // time), not from a large pool of long-lived workers the way the
    // multi-network crawler needs.
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async_main())
}

async fn async_main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;

    match cli.command {
        Commands::Run => {
            commands::run::run(config).await?;
        }
        Commands::Status => {
            commands::status::run(config).await?;
        }
        Commands::Once { tickers } => {
            let tickers: Vec<String> = tickers
                .split(',')
                .map(|s| s.trim().to_uppercase())
                .filter(|s| !s.is_empty())
                .collect();
            commands::once::run(config, tickers).await?;
        }
    }

    Ok(())
}
