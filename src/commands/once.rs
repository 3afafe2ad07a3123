use anyhow::Result;
use tracing::info;

use newsflow_core::config::AppConfig;
use newsflow_fetch::ProxyClient;
use newsflow_ingest::ArticleScraper;
use newsflow_sink::DataSink;
use newsflow_storage::Storage;

/// Runs exactly one scrape-ingest-flush cycle over `tickers` and returns.
/// Bypasses the scheduler entirely so a deployer can smoke-test the
/// proxy/parser/storage chain against live endpoints without waiting for
/// a slot to come due.
pub async fn run(config: AppConfig, tickers: Vec<String>) -> Result<()> {
    let storage = Storage::new(&config.database.postgres_url).await?;
    storage.run_migrations().await?;

    let proxy = ProxyClient::new(config.proxy.clone())?;
    let sink = DataSink::new(storage);

    let scraper = ArticleScraper::new(&proxy, &sink);
    let articles = scraper.scrape_yahoo(&tickers).await;
    info!(count = articles.len(), "scrape produced articles");

    sink.ingest(articles).await;
    let buffered = sink.buffered_len().await;
    sink.flush().await;

    println!("Ran one cycle over {} ticker(s): {} article(s) buffered and flushed.", tickers.len(), buffered);
    Ok(())
}
