use newsflow_core::{Article, ArticleSource, Thumbnail};
use newsflow_storage::Storage;

fn sample_article(uuid: &str) -> Article {
    Article {
        uuid: uuid.to_string(),
        title: Some("Sample Headline".to_string()),
        publisher: Some("Yahoo Finance".to_string()),
        link: "https://finance.yahoo.com/news/sample".to_string(),
        provider_publish_time: 1_700_000_000,
        kind: "STORY".to_string(),
        related_tickers: vec!["AAPL".to_string(), "MSFT".to_string()],
        thumbnails: vec![Thumbnail {
            url: "https://s.yimg.com/thumb.jpg".to_string(),
            width: Some(140),
            height: Some(140),
            tag: Some("original".to_string()),
        }],
        summary: Some("A short summary.".to_string()),
        body: Some("The full article body.".to_string()),
        source: ArticleSource::Yahoo,
    }
}

// Requires a running Postgres reachable at DATABASE_URL; not run by default.
#[tokio::test]
#[ignore]
async fn persist_batch_writes_all_four_tables() {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let storage = Storage::new(&database_url).await.unwrap();
    storage.run_migrations().await.unwrap();

    let article = sample_article("integration-test-uuid-1");
    let outcome = storage.persist_batch(&[article]).await;

    assert_eq!(outcome.news_written, 1);
    assert_eq!(outcome.thumbnails_written, 1);
    assert_eq!(outcome.related_tickers_written, 2);
    assert_eq!(outcome.sentiment_written, 1);
    assert_eq!(outcome.rows_failed, 0);
}

// A duplicate uuid in the same batch must not abort the rest of the batch:
// the first article's rows land, the second's primary-key-constrained rows
// (news, news_sentiment) are isolated as per-row failures, and its
// unconstrained rows (thumbnail, related_tickers) still write.
#[tokio::test]
#[ignore]
async fn persist_batch_isolates_duplicate_uuid_as_a_failed_row() {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let storage = Storage::new(&database_url).await.unwrap();
    storage.run_migrations().await.unwrap();

    let mut first = sample_article("integration-test-dup");
    let second = sample_article("integration-test-dup");
    first.title = Some("First Write Wins".to_string());

    let outcome = storage.persist_batch(&[first, second]).await;
    assert_eq!(outcome.news_written, 1);
    assert_eq!(outcome.sentiment_written, 1);
    assert_eq!(outcome.thumbnails_written, 2);
    assert_eq!(outcome.related_tickers_written, 4);
    assert_eq!(outcome.rows_failed, 2);
}
