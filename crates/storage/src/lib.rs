use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{info, warn};

use newsflow_core::Article;

/// How many rows out of a batch were written versus skipped due to a
/// per-row failure (constraint violation, bad data). The caller never
/// sees an error for this — see §4.6's per-row isolation requirement.
#[derive(Debug, Default, Clone, Copy)]
pub struct PersistOutcome {
    pub news_written: usize,
    pub thumbnails_written: usize,
    pub related_tickers_written: usize,
    pub sentiment_written: usize,
    pub rows_failed: usize,
}

#[derive(Clone)]
pub struct Storage {
    pool: PgPool,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        Self::with_pool_size(database_url, 1000).await
    }

    pub async fn with_pool_size(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        info!(max_connections, "connected to postgres");
        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::raw_sql(include_str!("../migrations/001_init.sql"))
            .execute(&self.pool)
            .await?;
        info!("migrations complete");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn check_connectivity(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Persists one batch of articles across all four tables. The four
    /// table writers run concurrently (§4.6: "in parallel, per entity
    /// kind"); within each writer, rows are inserted one at a time so a
    /// single bad row never drops the rest of that table's rows.
    pub async fn persist_batch(&self, articles: &[Article]) -> PersistOutcome {
        let (news, thumbnails, related_tickers, sentiment) = tokio::join!(
            self.persist_news_rows(articles),
            self.persist_thumbnail_rows(articles),
            self.persist_related_ticker_rows(articles),
            self.persist_sentiment_rows(articles),
        );

        PersistOutcome {
            news_written: news.0,
            thumbnails_written: thumbnails.0,
            related_tickers_written: related_tickers.0,
            sentiment_written: sentiment.0,
            rows_failed: news.1 + thumbnails.1 + related_tickers.1 + sentiment.1,
        }
    }

    async fn persist_news_rows(&self, articles: &[Article]) -> (usize, usize) {
        let (mut written, mut failed) = (0, 0);
        for article in articles {
            match self.insert_news_row(article).await {
                Ok(()) => written += 1,
                Err(e) => {
                    warn!(uuid = %article.uuid, error = %e, "news insert failed, skipping row");
                    failed += 1;
                }
            }
        }
        (written, failed)
    }

    async fn persist_thumbnail_rows(&self, articles: &[Article]) -> (usize, usize) {
        let (mut written, mut failed) = (0, 0);
        for article in articles {
            for thumbnail in &article.thumbnails {
                match self.insert_thumbnail_row(&article.uuid, thumbnail).await {
                    Ok(()) => written += 1,
                    Err(e) => {
                        warn!(uuid = %article.uuid, error = %e, "thumbnail insert failed, skipping row");
                        failed += 1;
                    }
                }
            }
        }
        (written, failed)
    }

    async fn persist_related_ticker_rows(&self, articles: &[Article]) -> (usize, usize) {
        let (mut written, mut failed) = (0, 0);
        for article in articles {
            for ticker in &article.related_tickers {
                match self.insert_related_ticker_row(&article.uuid, ticker).await {
                    Ok(()) => written += 1,
                    Err(e) => {
                        warn!(uuid = %article.uuid, ticker, error = %e, "related ticker insert failed, skipping row");
                        failed += 1;
                    }
                }
            }
        }
        (written, failed)
    }

    async fn persist_sentiment_rows(&self, articles: &[Article]) -> (usize, usize) {
        let (mut written, mut failed) = (0, 0);
        for article in articles {
            if !article.has_sentiment_content() {
                continue;
            }
            match self.insert_sentiment_row(article).await {
                Ok(()) => written += 1,
                Err(e) => {
                    warn!(uuid = %article.uuid, error = %e, "sentiment insert failed, skipping row");
                    failed += 1;
                }
            }
        }
        (written, failed)
    }

    async fn insert_news_row(&self, article: &Article) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"INSERT INTO news (uuid, title, publisher, link, "providerPublishTime", type)
               VALUES ($1, $2, $3, $4, $5, $6)"#,
        )
        .bind(&article.uuid)
        .bind(&article.title)
        .bind(&article.publisher)
        .bind(&article.link)
        .bind(article.provider_publish_time)
        .bind(&article.kind)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_thumbnail_row(
        &self,
        uuid: &str,
        thumbnail: &newsflow_core::Thumbnail,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO thumbnail (uuid, url, width, height, tag) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(uuid)
        .bind(&thumbnail.url)
        .bind(thumbnail.width)
        .bind(thumbnail.height)
        .bind(&thumbnail.tag)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_related_ticker_row(&self, uuid: &str, ticker: &str) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO related_tickers (uuid, ticker) VALUES ($1, $2)")
            .bind(uuid)
            .bind(ticker)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_sentiment_row(&self, article: &Article) -> Result<(), sqlx::Error> {
        let stock_codes = article.related_tickers.join(",");
        sqlx::query(
            r#"INSERT INTO news_sentiment (article_uuid, stock_codes, title, article, article_tldr, link)
               VALUES ($1, $2, $3, $4, $5, $6)"#,
        )
        .bind(&article.uuid)
        .bind(stock_codes)
        .bind(&article.title)
        .bind(&article.body)
        .bind(&article.summary)
        .bind(&article.link)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_news_count(&self) -> Result<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM news")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }

    pub async fn get_thumbnail_count(&self) -> Result<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM thumbnail")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }

    pub async fn get_related_ticker_count(&self) -> Result<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM related_tickers")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }

    pub async fn get_sentiment_count(&self) -> Result<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM news_sentiment")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }
}
