use anyhow::Result;

use newsflow_core::config::AppConfig;
use newsflow_storage::Storage;

pub async fn run(config: AppConfig) -> Result<()> {
    let storage = Storage::new(&config.database.postgres_url).await?;

    match storage.check_connectivity().await {
        Ok(()) => println!("Database: connected"),
        Err(e) => {
            println!("Database: ERROR - {}", e);
            return Ok(());
        }
    }

    storage.run_migrations().await?;

    let news = storage.get_news_count().await?;
    let thumbnails = storage.get_thumbnail_count().await?;
    let related_tickers = storage.get_related_ticker_count().await?;
    let sentiment = storage.get_sentiment_count().await?;

    println!("\n╔══════════════════════════════════════════════╗");
    println!("║             NewsFlow Status                  ║");
    println!("╠══════════════════════════════════════════════╣");
    println!("║ News articles:      {:>20}    ║", news);
    println!("║ Thumbnails:         {:>20}    ║", thumbnails);
    println!("║ Related tickers:    {:>20}    ║", related_tickers);
    println!("║ Sentiment rows:     {:>20}    ║", sentiment);
    println!("╚══════════════════════════════════════════════╝\n");

    Ok(())
}
