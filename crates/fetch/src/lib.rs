pub mod http_fetcher;
pub mod proxy_client;

pub use http_fetcher::HttpFetcher;
pub use proxy_client::ProxyClient;
