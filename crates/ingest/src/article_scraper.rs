use futures::future::join_all;
use serde::Deserialize;
use tracing::{debug, warn};

use newsflow_core::{Article, ArticleSource, SeenTracker, Thumbnail};
use newsflow_fetch::ProxyClient;
use newsflow_parser::HtmlExtractor;

const CHUNK_SIZE: usize = 10;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    news: Vec<NewsRecord>,
}

#[derive(Debug, Deserialize)]
struct NewsRecord {
    uuid: String,
    title: Option<String>,
    publisher: Option<String>,
    link: String,
    #[serde(rename = "providerPublishTime")]
    provider_publish_time: i64,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default, rename = "relatedTickers")]
    related_tickers: serde_json::Value,
    #[serde(default)]
    thumbnail: serde_json::Value,
}

fn normalize_related_tickers(value: &serde_json::Value) -> Vec<String> {
    match value {
        serde_json::Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str())
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect(),
        serde_json::Value::String(s) => s
            .split(',')
            .map(|part| part.trim().to_uppercase())
            .filter(|part| !part.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

fn normalize_thumbnails(value: &serde_json::Value) -> Vec<Thumbnail> {
    let resolutions = match value.get("resolutions") {
        Some(serde_json::Value::Array(items)) => items,
        _ => return Vec::new(),
    };

    resolutions
        .iter()
        .filter_map(|r| {
            let url = r.get("url")?.as_str()?.to_string();
            Some(Thumbnail {
                url,
                width: r.get("width").and_then(|v| v.as_i64()).map(|v| v as i32),
                height: r.get("height").and_then(|v| v.as_i64()).map(|v| v as i32),
                tag: r.get("tag").and_then(|v| v.as_str()).map(str::to_string),
            })
        })
        .collect()
}

fn validate(record: NewsRecord) -> Option<Article> {
    if record.uuid.is_empty() {
        return None;
    }
    if !record.link.starts_with("https://") {
        warn!(uuid = %record.uuid, link = %record.link, "dropping article with non-https link");
        return None;
    }

    Some(Article {
        uuid: record.uuid,
        title: record.title.filter(|t| !t.is_empty()),
        publisher: record.publisher.filter(|p| !p.is_empty()),
        link: record.link,
        provider_publish_time: record.provider_publish_time,
        kind: record.kind.unwrap_or_else(|| "STORY".to_string()),
        related_tickers: normalize_related_tickers(&record.related_tickers),
        thumbnails: normalize_thumbnails(&record.thumbnail),
        summary: None,
        body: None,
        source: ArticleSource::Yahoo,
    })
}

/// Fans out a Yahoo Finance news search per ticker, chunked to bound
/// concurrency, and enriches each article's summary/body via
/// [`HtmlExtractor`]. Errors at any stage are logged and the affected
/// record or chunk is skipped; a single bad ticker never aborts the run.
pub struct ArticleScraper<'a> {
    proxy: &'a ProxyClient,
    seen: &'a dyn SeenTracker,
}

impl<'a> ArticleScraper<'a> {
    pub fn new(proxy: &'a ProxyClient, seen: &'a dyn SeenTracker) -> Self {
        Self { proxy, seen }
    }

    pub async fn scrape_yahoo(&self, tickers: &[String]) -> Vec<Article> {
        let mut all_articles = Vec::new();

        for chunk in tickers.chunks(CHUNK_SIZE) {
            let futures = chunk.iter().map(|symbol| self.fetch_for_ticker(symbol));
            let results = join_all(futures).await;
            for articles in results {
                all_articles.extend(articles);
            }
        }

        all_articles
    }

    async fn fetch_for_ticker(&self, symbol: &str) -> Vec<Article> {
        let url = format!(
            "https://query2.finance.yahoo.com/v1/finance/search?q={}",
            symbol
        );

        let Some(body) = self.proxy.fetch(&url).await else {
            warn!(symbol, "ticker search fetch failed");
            return Vec::new();
        };
        self.proxy.reset_error_count();

        let parsed: SearchResponse = match serde_json::from_str(&body) {
            Ok(v) => v,
            Err(e) => {
                warn!(symbol, error = %e, "ticker search response did not match expected shape");
                return Vec::new();
            }
        };

        let mut articles = Vec::new();
        for record in parsed.news {
            let Some(mut article) = validate(record) else {
                continue;
            };
            if self.seen.already_seen(&article.uuid) {
                continue;
            }

            let extractor = HtmlExtractor::new(self.proxy);
            if let Some(html) = self.proxy.fetch(&article.link).await {
                let content = extractor.extract(&html).await;
                article.summary = content.summary;
                article.body = content.body;
            } else {
                debug!(uuid = %article.uuid, "article body fetch failed, keeping bare record");
            }

            articles.push(article);
        }

        articles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_comma_separated_related_tickers() {
        let value = serde_json::Value::String("AAPL, msft ,".to_string());
        assert_eq!(
            normalize_related_tickers(&value),
            vec!["AAPL".to_string(), "MSFT".to_string()]
        );
    }

    #[test]
    fn non_array_thumbnail_yields_no_rows() {
        let value = serde_json::json!("not-a-thumbnail-object");
        assert!(normalize_thumbnails(&value).is_empty());
    }

    #[test]
    fn rejects_non_https_links() {
        let record = NewsRecord {
            uuid: "abc".to_string(),
            title: Some("t".to_string()),
            publisher: None,
            link: "http://insecure.example/a".to_string(),
            provider_publish_time: 0,
            kind: None,
            related_tickers: serde_json::Value::Null,
            thumbnail: serde_json::Value::Null,
        };
        assert!(validate(record).is_none());
    }
}
