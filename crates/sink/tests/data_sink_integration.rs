use newsflow_core::{Article, ArticleSource};
use newsflow_sink::DataSink;
use newsflow_storage::Storage;

fn article(uuid: &str) -> Article {
    Article {
        uuid: uuid.to_string(),
        title: Some("Headline".to_string()),
        publisher: Some("Yahoo Finance".to_string()),
        link: "https://finance.yahoo.com/news/x".to_string(),
        provider_publish_time: 0,
        kind: "STORY".to_string(),
        related_tickers: vec!["AAPL".to_string()],
        thumbnails: vec![],
        summary: Some("summary".to_string()),
        body: Some("body".to_string()),
        source: ArticleSource::Yahoo,
    }
}

// Requires a running Postgres reachable at DATABASE_URL; not run by default.
#[tokio::test]
#[ignore]
async fn ingesting_the_same_uuid_twice_persists_once() {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let storage = Storage::new(&database_url).await.unwrap();
    storage.run_migrations().await.unwrap();
    let sink = DataSink::new(storage.clone());

    sink.ingest(vec![article("dedup-test-uuid")]).await;
    sink.ingest(vec![article("dedup-test-uuid")]).await;
    assert_eq!(sink.buffered_len().await, 1);

    sink.flush().await;
    let count: i64 = storage.get_news_count().await.unwrap();
    assert!(count >= 1);
}
