use std::time::Duration;

use newsflow_core::IngestError;
use rand::seq::SliceRandom;

/// Rotated uniformly at random per request so a single fixed signature
/// doesn't trip naive bot filters.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Mobile/15E148 Safari/604.1",
];

/// Thin GET client with a rotating User-Agent and a fixed accessory header
/// set meant to resemble an ordinary browser request. No retry logic lives
/// here; callers that need fallback behavior compose it (see `ProxyClient`).
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, IngestError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| IngestError::Transport(e.to_string()))?;
        Ok(Self { client })
    }

    pub async fn fetch_text(&self, url: &str) -> Result<String, IngestError> {
        self.get(url, None).await
    }

    pub async fn fetch_text_with_header(
        &self,
        url: &str,
        header_name: &str,
        header_value: &str,
    ) -> Result<String, IngestError> {
        self.get(url, Some((header_name, header_value))).await
    }

    async fn get(
        &self,
        url: &str,
        extra_header: Option<(&str, &str)>,
    ) -> Result<String, IngestError> {
        let user_agent = USER_AGENTS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(USER_AGENTS[0]);

        let mut request = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, user_agent)
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .header(reqwest::header::ACCEPT_ENCODING, "gzip, deflate, br")
            .header(reqwest::header::REFERER, "https://www.google.com")
            .header(reqwest::header::CONNECTION, "keep-alive")
            .header(reqwest::header::ACCEPT, "*/*");

        if let Some((name, value)) = extra_header {
            request = request.header(name, value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| IngestError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(IngestError::Transport(format!(
                "status {} from {}",
                response.status(),
                url
            )));
        }

        response
            .text()
            .await
            .map_err(|e| IngestError::Transport(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fetch_text_returns_body_on_success() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string("hello"))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();
        let body = fetcher.fetch_text(&server.uri()).await.unwrap();
        assert_eq!(body, "hello");
    }

    #[tokio::test]
    async fn fetch_text_errors_on_non_2xx() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();
        assert!(fetcher.fetch_text(&server.uri()).await.is_err());
    }
}
