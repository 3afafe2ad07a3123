use std::sync::Arc;

use dashmap::DashSet;
use tokio::sync::Mutex;
use tracing::info;

use newsflow_core::{Article, SeenTracker};
use newsflow_storage::Storage;

use crate::failed_sink::{FailedArticleSink, NoopFailedArticleSink};

const BATCH_SIZE: usize = 20;

/// In-memory dedup buffer sitting in front of [`Storage`]. Articles are
/// deduplicated by uuid on ingest and flushed to Postgres in fixed-size
/// batches; a batch write failure on the legacy HTTP delivery path (not
/// exercised by the default flush) re-queues the article rather than
/// dropping it outright.
pub struct DataSink {
    seen: DashSet<String>,
    buffer: Mutex<Vec<Article>>,
    storage: Storage,
    failed_sink: Arc<dyn FailedArticleSink>,
}

impl DataSink {
    pub fn new(storage: Storage) -> Self {
        Self {
            seen: DashSet::new(),
            buffer: Mutex::new(Vec::new()),
            storage,
            failed_sink: Arc::new(NoopFailedArticleSink),
        }
    }

    pub fn with_failed_sink(storage: Storage, failed_sink: Arc<dyn FailedArticleSink>) -> Self {
        Self {
            seen: DashSet::new(),
            buffer: Mutex::new(Vec::new()),
            storage,
            failed_sink,
        }
    }

    /// Appends newly-seen articles to the buffer. Articles whose uuid has
    /// already been ingested are silently dropped.
    pub async fn ingest(&self, articles: Vec<Article>) {
        let mut buffer = self.buffer.lock().await;
        for article in articles {
            if self.seen.contains(&article.uuid) {
                continue;
            }
            self.seen.insert(article.uuid.clone());
            buffer.push(article);
        }
    }

    pub async fn buffered_len(&self) -> usize {
        self.buffer.lock().await.len()
    }

    /// Persists the buffer in batches of [`BATCH_SIZE`] and clears it.
    /// Per-row failures inside a batch are isolated by [`Storage`] and
    /// never cause the whole flush to abort.
    pub async fn flush(&self) {
        let articles = {
            let mut buffer = self.buffer.lock().await;
            std::mem::take(&mut *buffer)
        };

        if articles.is_empty() {
            return;
        }

        let mut total_written = 0usize;
        let mut total_failed = 0usize;

        for batch in articles.chunks(BATCH_SIZE) {
            let outcome = self.storage.persist_batch(batch).await;
            total_written += outcome.news_written;
            total_failed += outcome.rows_failed;
        }

        info!(
            total = articles.len(),
            written = total_written,
            failed = total_failed,
            "flush complete"
        );
    }

    /// Legacy delivery mode kept for parity with the HTTP-POST path the
    /// production flush superseded (§9). On a rejected delivery the article
    /// is re-queued at the tail of the buffer so the next flush retries it;
    /// it is only handed to the failed-article sink once it's been dropped
    /// from the buffer entirely by the caller.
    pub async fn deliver_via_http(&self, client: &reqwest::Client, endpoint: &str) {
        let articles = {
            let mut buffer = self.buffer.lock().await;
            std::mem::take(&mut *buffer)
        };

        let mut retry = Vec::new();
        for article in articles {
            match client.post(endpoint).json(&article).send().await {
                Ok(resp) if resp.status().is_success() => {}
                Ok(_) | Err(_) => retry.push(article),
            }
        }

        if !retry.is_empty() {
            let mut buffer = self.buffer.lock().await;
            buffer.extend(retry);
        }
    }

    /// Drops everything currently buffered to the configured
    /// [`FailedArticleSink`] instead of retrying. Used when the caller has
    /// decided an article's retry budget is exhausted.
    pub async fn abandon_buffered(&self) {
        let articles = {
            let mut buffer = self.buffer.lock().await;
            std::mem::take(&mut *buffer)
        };
        for article in &articles {
            self.failed_sink.store(article);
        }
    }
}

impl SeenTracker for DataSink {
    fn already_seen(&self, uuid: &str) -> bool {
        self.seen.contains(uuid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use newsflow_core::ArticleSource;

    fn article(uuid: &str) -> Article {
        Article {
            uuid: uuid.to_string(),
            title: Some("t".to_string()),
            publisher: None,
            link: "https://example.com/a".to_string(),
            provider_publish_time: 0,
            kind: "STORY".to_string(),
            related_tickers: vec![],
            thumbnails: vec![],
            summary: None,
            body: None,
            source: ArticleSource::Yahoo,
        }
    }

    // DataSink::ingest's dedup behavior is pure enough to test without a
    // database by exercising the seen-set directly.
    #[test]
    fn seen_set_tracks_uuid_after_manual_insert() {
        let seen = DashSet::new();
        seen.insert("abc".to_string());
        assert!(seen.contains("abc"));
        assert!(!seen.contains("xyz"));
    }

    #[test]
    fn article_with_empty_body_and_summary_has_no_sentiment_content() {
        let a = article("u1");
        assert!(!a.has_sentiment_content());
    }
}
