use std::sync::atomic::{AtomicU32, Ordering};

use newsflow_core::config::ProxyConfig;
use newsflow_core::IngestError;
use tracing::warn;

use crate::http_fetcher::HttpFetcher;

/// Routes fetches through an edge-worker proxy until its rolling error
/// count crosses a threshold, then falls back to a direct fetch. The
/// counter is reset explicitly by the caller between work cycles
/// (`reset_error_count`) so one bad run doesn't permanently disable the
/// proxy path.
pub struct ProxyClient {
    fetcher: HttpFetcher,
    config: ProxyConfig,
    error_count: AtomicU32,
}

impl ProxyClient {
    pub fn new(config: ProxyConfig) -> Result<Self, IngestError> {
        let fetcher = HttpFetcher::new(config.request_timeout)?;
        Ok(Self {
            fetcher,
            config,
            error_count: AtomicU32::new(0),
        })
    }

    pub fn error_count(&self) -> u32 {
        self.error_count.load(Ordering::Relaxed)
    }

    pub fn reset_error_count(&self) {
        self.error_count.store(0, Ordering::Relaxed);
    }

    fn proxy_url(&self, target: &str) -> String {
        format!(
            "{}?url={}&method=GET",
            self.config.worker_url,
            urlencoding::encode(target)
        )
    }

    /// Fetches `target` through the proxy while the error count is below
    /// threshold, otherwise fetches it directly. Transport failures never
    /// propagate as an error: they return `None` so the caller can decide
    /// whether to retry.
    pub async fn fetch(&self, target: &str) -> Option<String> {
        if self.error_count() < self.config.error_threshold {
            match self.fetch_via_proxy(target).await {
                Ok(body) => return Some(body),
                Err(e) => {
                    self.error_count.fetch_add(1, Ordering::Relaxed);
                    warn!(target, error = %e, "proxy fetch failed, will fall back");
                }
            }
        }

        match self.fetcher.fetch_text(target).await {
            Ok(body) => Some(body),
            Err(e) => {
                warn!(target, error = %e, "direct fetch failed");
                None
            }
        }
    }

    async fn fetch_via_proxy(&self, target: &str) -> Result<String, IngestError> {
        self.fetcher
            .fetch_text_with_header(
                &self.proxy_url(target),
                "X-SECURITY-TOKEN",
                &self.config.security_token,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn test_config(threshold: u32) -> ProxyConfig {
        ProxyConfig {
            worker_url: "http://127.0.0.1:1".to_string(), // unroutable: always fails fast-ish
            security_token: "token".to_string(),
            error_threshold: threshold,
            request_timeout: Duration::from_millis(200),
        }
    }

    #[tokio::test]
    async fn falls_back_to_direct_after_threshold() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string("direct-body"))
            .mount(&server)
            .await;

        let client = ProxyClient::new(test_config(1)).unwrap();
        client.error_count.store(1, Ordering::Relaxed);

        let body = client.fetch(&server.uri()).await;
        assert_eq!(body.as_deref(), Some("direct-body"));
    }

    #[test]
    fn reset_error_count_clears_counter() {
        let client = ProxyClient::new(test_config(60)).unwrap();
        client.error_count.store(12, Ordering::Relaxed);
        client.reset_error_count();
        assert_eq!(client.error_count(), 0);
    }
}
