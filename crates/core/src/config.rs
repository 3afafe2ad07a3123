use std::env;
use std::time::Duration;

use crate::error::IngestError;

/// Which slot-admission strategy the scheduler runs under.
///
/// `FixedInterval` is the default: slots fire in insertion order on a
/// cadence. `TimeWindowAdmission` reproduces the older wall-clock-match
/// behavior and is kept for parity, selected with `SCHEDULE_POLICY=window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulePolicy {
    FixedInterval,
    TimeWindowAdmission,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub postgres_url: String,
    pub total_connections: u32,
}

#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub worker_url: String,
    pub security_token: String,
    pub error_threshold: u32,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    pub cron_endpoint: Option<String>,
    pub api_key: Option<String>,
    pub secret_token: Option<String>,
    pub rapid_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SourcesConfig {
    pub meme_tickers_uri: String,
    pub exchanges_endpoint: Option<String>,
    pub exchange_stock_endpoint: Option<String>,
    pub rss_feed_uri: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub policy: SchedulePolicy,
    pub tick_interval: Duration,
    pub inter_slot_delay: Duration,
    pub ticker_refresh_every_n_ticks: u32,
    pub admission_window: Duration,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub proxy: ProxyConfig,
    pub delivery: DeliveryConfig,
    pub sources: SourcesConfig,
    pub scheduler: SchedulerConfig,
}

fn required(name: &str) -> Result<String, IngestError> {
    env::var(name).map_err(|_| IngestError::Config(name.to_string()))
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

fn parse_u32(name: &str, default: u32) -> u32 {
    optional(name)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_u64_secs(name: &str, default: u64) -> Duration {
    Duration::from_secs(
        optional(name)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default),
    )
}

impl AppConfig {
    /// Loads configuration from the process environment. Fails fast on the
    /// first missing required variable, naming it in the returned error.
    pub fn from_env() -> Result<Self, IngestError> {
        let database = DatabaseConfig {
            postgres_url: required("SQL_DB_URL")?,
            total_connections: parse_u32("TOTAL_CONNECTIONS", 1000),
        };

        let proxy = ProxyConfig {
            worker_url: format!(
                "https://{}.workers.dev",
                optional("CLOUDFLARE_WORKER_NAME").unwrap_or_else(|| "proxytask".to_string())
            ),
            security_token: required("SECURITY_TOKEN")?,
            error_threshold: parse_u32("PROXY_ERROR_THRESHOLD", 60),
            request_timeout: parse_u64_secs("PROXY_TIMEOUT_SECONDS", 96),
        };

        let delivery = DeliveryConfig {
            cron_endpoint: optional("CRON_ENDPOINT"),
            api_key: optional("X_API_KEY"),
            secret_token: optional("X_SECRET_TOKEN"),
            rapid_key: optional("X_RAPID_KEY"),
        };

        let sources = SourcesConfig {
            meme_tickers_uri: required("MEME_TICKERS_URI")?,
            exchanges_endpoint: optional("EXCHANGES_ENDPOINT"),
            exchange_stock_endpoint: optional("EXCHANGE_STOCK_ENDPOINT"),
            rss_feed_uri: optional("RSS_FEED_URI"),
        };

        let policy = match optional("SCHEDULE_POLICY").as_deref() {
            Some("window") => SchedulePolicy::TimeWindowAdmission,
            _ => SchedulePolicy::FixedInterval,
        };

        let scheduler = SchedulerConfig {
            policy,
            tick_interval: parse_u64_secs("SCHEDULE_TICK_SECONDS", 600),
            inter_slot_delay: parse_u64_secs("SCHEDULE_SLOT_DELAY_SECONDS", 7200),
            ticker_refresh_every_n_ticks: parse_u32("TICKER_REFRESH_EVERY_N_TICKS", 18),
            admission_window: parse_u64_secs("SCHEDULE_ADMISSION_WINDOW_SECONDS", 900),
        };

        Ok(Self {
            database,
            proxy,
            delivery,
            sources,
            scheduler,
        })
    }
}
