use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use url::Url;

use newsflow_fetch::ProxyClient;

use crate::motley_fool::parse_motley_fool_body;

const INTERSTITIAL_MARKER: &str = "not supported on your current browser version";

static H1_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").unwrap());
static H2_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("h2").unwrap());
static P_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());
static READMORE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.caas-readmore a").unwrap());

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedContent {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub body: Option<String>,
}

fn text_of(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .map(|el| el.text().collect::<String>())
        .filter(|s| !s.is_empty())
}

fn concat_paragraphs(document: &Html) -> Option<String> {
    let body: String = document
        .select(&P_SELECTOR)
        .map(|p| p.text().collect::<String>())
        .collect();
    if body.is_empty() {
        None
    } else {
        Some(body)
    }
}

fn is_interstitial(text: &str) -> bool {
    text.to_lowercase().contains(INTERSTITIAL_MARKER)
}

/// Strings matching a bot-block interstitial marker must never be kept
/// (§4.3). Applied to both `summary` and `body` before an `Article` is
/// persisted.
fn filter_interstitial(text: Option<String>) -> Option<String> {
    text.filter(|t| !is_interstitial(t))
}

fn read_more_target(document: &Html) -> Option<String> {
    document
        .select(&READMORE_SELECTOR)
        .next()
        .and_then(|el| el.value().attr("href"))
        .map(|s| s.to_string())
}

/// Parses title/summary/body out of an article page, following the
/// "read more" link to a known publisher's full-text page when present.
pub struct HtmlExtractor<'a> {
    proxy: &'a ProxyClient,
}

impl<'a> HtmlExtractor<'a> {
    pub fn new(proxy: &'a ProxyClient) -> Self {
        Self { proxy }
    }

    pub async fn extract(&self, html: &str) -> ExtractedContent {
        let document = Html::parse_document(html);

        let title = text_of(&document, &H1_SELECTOR).or_else(|| text_of(&document, &H2_SELECTOR));
        let summary = text_of(&document, &P_SELECTOR);

        let body = match read_more_target(&document) {
            Some(href) => self.follow_read_more(&href).await.or_else(|| concat_paragraphs(&document)),
            None => concat_paragraphs(&document),
        };

        ExtractedContent {
            title,
            summary: filter_interstitial(summary),
            body: filter_interstitial(body),
        }
    }

    async fn follow_read_more(&self, href: &str) -> Option<String> {
        let full_html = self.proxy.fetch(href).await?;

        let is_fool = Url::parse(href)
            .ok()
            .and_then(|u| u.host_str().map(|h| h == "www.fool.com"))
            .unwrap_or(false);

        if is_fool {
            parse_motley_fool_body(&full_html)
        } else {
            let document = Html::parse_document(&full_html);
            concat_paragraphs(&document)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use newsflow_core::config::ProxyConfig;
    use std::time::Duration;

    fn proxy() -> ProxyClient {
        ProxyClient::new(ProxyConfig {
            worker_url: "http://127.0.0.1:1".to_string(),
            security_token: "t".to_string(),
            error_threshold: 0,
            request_timeout: Duration::from_millis(100),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn extracts_title_and_summary_without_readmore() {
        let html = "<html><body><h1>Hello</h1><p>Lede.</p><p>More text.</p></body></html>";
        let proxy = proxy();
        let extractor = HtmlExtractor::new(&proxy);
        let result = extractor.extract(html).await;
        assert_eq!(result.title.as_deref(), Some("Hello"));
        assert_eq!(result.summary.as_deref(), Some("Lede."));
        assert_eq!(result.body.as_deref(), Some("Lede.More text."));
    }

    #[tokio::test]
    async fn falls_back_to_h2_when_no_h1() {
        let html = "<html><body><h2>Fallback Title</h2><p>Body text.</p></body></html>";
        let proxy = proxy();
        let extractor = HtmlExtractor::new(&proxy);
        let result = extractor.extract(html).await;
        assert_eq!(result.title.as_deref(), Some("Fallback Title"));
    }

    #[tokio::test]
    async fn interstitial_summary_is_discarded() {
        let html = "<html><body><h1>T</h1><p>Video is not supported on your current browser version</p></body></html>";
        let proxy = proxy();
        let extractor = HtmlExtractor::new(&proxy);
        let result = extractor.extract(html).await;
        assert_eq!(result.summary, None);
    }
}
