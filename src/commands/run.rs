use std::sync::Arc;

use anyhow::Result;
use tokio::signal;
use tracing::info;

use newsflow_core::config::AppConfig;
use newsflow_fetch::ProxyClient;
use newsflow_scheduler::Scheduler;
use newsflow_sink::DataSink;
use newsflow_storage::Storage;
use newsflow_telemetry::Telemetry;

/// Wires up every collaborator and runs the scheduler until Ctrl-C,
/// mirroring the shutdown-broadcast pattern the crawl loop uses: a single
/// `tokio::sync::broadcast` channel, subscribed once by the scheduler,
/// fired once when the signal arrives.
pub async fn run(config: AppConfig) -> Result<()> {
    let storage = Storage::with_pool_size(
        &config.database.postgres_url,
        config.database.total_connections,
    )
    .await?;
    storage.run_migrations().await?;

    let proxy = Arc::new(ProxyClient::new(config.proxy.clone())?);
    let data_sink = Arc::new(DataSink::new(storage));
    let telemetry = Arc::new(Telemetry::new());

    let mut scheduler = Scheduler::new(config, proxy, data_sink, telemetry)?;
    scheduler.bootstrap().await;

    let (shutdown_tx, shutdown_rx) = tokio::sync::broadcast::channel::<()>(1);

    let scheduler_handle = tokio::spawn(scheduler.run(shutdown_rx));

    info!("press Ctrl+C to stop the scheduler");
    signal::ctrl_c().await?;
    info!("shutdown signal received");
    let _ = shutdown_tx.send(());

    let _ = scheduler_handle.await;
    info!("shutdown complete");
    Ok(())
}
