use std::collections::{BTreeMap, HashSet};
use std::future::Future;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use dashmap::DashMap;
use serde::Serialize;
use tracing::warn;

/// One minute's worth of observations for every named operation. Built
/// lazily on first event in its minute and never mutated retroactively
/// once the minute has rolled over (§4.8).
#[derive(Debug, Default, Clone, Serialize)]
pub struct TelemetryBucket {
    /// `(method_name, latency_seconds)` in call order.
    pub timing_data: Vec<(String, f64)>,
    /// `(method_name, error_kind)` in call order.
    pub errors: Vec<(String, String)>,
}

impl TelemetryBucket {
    fn record_latency(&mut self, method: &str, seconds: f64) {
        self.timing_data.push((method.to_string(), seconds));
    }

    fn record_error(&mut self, method: &str, kind: &str) {
        self.errors.push((method.to_string(), kind.to_string()));
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TelemetryAggregate {
    pub highest_errors_per_minute: u64,
    pub lowest_errors_per_minute: u64,
    pub highest_latency_per_method: BTreeMap<String, f64>,
    pub lowest_latency_per_method: BTreeMap<String, f64>,
}

fn current_minute_index() -> i64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    (now.as_secs() / 60) as i64
}

/// Decorator-style latency and error recorder, keyed by minute. Every
/// named operation run through [`Telemetry::timed`] contributes one
/// latency entry to the current minute's bucket, and an error entry if
/// the operation failed. Buckets accumulate for the lifetime of the
/// process; nothing is ever evicted here (the admin surface owns any
/// retention policy).
pub struct Telemetry {
    buckets: DashMap<i64, TelemetryBucket>,
    methods: DashMap<String, ()>,
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::new()
    }
}

impl Telemetry {
    pub fn new() -> Self {
        Self {
            buckets: DashMap::new(),
            methods: DashMap::new(),
        }
    }

    /// Runs `op`, recording its latency in the current minute's bucket
    /// regardless of outcome. On failure, also records an error entry and
    /// swallows the error, returning `None` — matching the source's
    /// current "swallow and return null" choice from §4.8 step 3.
    pub async fn timed<F, Fut, T, E>(&self, method: &str, op: F) -> Option<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        self.methods.insert(method.to_string(), ());
        let minute = current_minute_index();
        let start = Instant::now();
        let outcome = op().await;
        let elapsed = start.elapsed().as_secs_f64();

        let mut bucket = self.buckets.entry(minute).or_default();
        bucket.record_latency(method, elapsed);

        match outcome {
            Ok(value) => Some(value),
            Err(e) => {
                let kind = e.to_string();
                warn!(method, error = %kind, "telemetry-wrapped operation failed");
                bucket.record_error(method, &kind);
                None
            }
        }
    }

    /// Yields `(minute_index, bucket)` pairs in ascending minute order,
    /// matching the "insertion order" contract the admin stream relies on
    /// (minutes only ever increase, so sorting by key is equivalent here).
    pub fn stream(&self) -> Vec<(i64, TelemetryBucket)> {
        let mut entries: Vec<(i64, TelemetryBucket)> = self
            .buckets
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        entries.sort_by_key(|(minute, _)| *minute);
        entries
    }

    pub fn observed_methods(&self) -> HashSet<String> {
        self.methods.iter().map(|e| e.key().clone()).collect()
    }

    /// Computes the aggregate the admin `/stats` route serves: per-minute
    /// error-count extremes, and per-method latency extremes across every
    /// bucket ever recorded.
    pub fn aggregate(&self) -> TelemetryAggregate {
        let mut errors_per_minute: Vec<u64> = Vec::new();
        let mut latency_by_method: BTreeMap<String, Vec<f64>> = BTreeMap::new();

        for entry in self.buckets.iter() {
            let bucket = entry.value();
            errors_per_minute.push(bucket.errors.len() as u64);
            for (method, latency) in &bucket.timing_data {
                latency_by_method
                    .entry(method.clone())
                    .or_default()
                    .push(*latency);
            }
        }

        let highest_errors_per_minute = errors_per_minute.iter().copied().max().unwrap_or(0);
        let lowest_errors_per_minute = errors_per_minute.iter().copied().min().unwrap_or(0);

        let mut highest_latency_per_method = BTreeMap::new();
        let mut lowest_latency_per_method = BTreeMap::new();
        for (method, samples) in &latency_by_method {
            let highest = samples.iter().cloned().fold(f64::MIN, f64::max);
            let lowest = samples.iter().cloned().fold(f64::MAX, f64::min);
            highest_latency_per_method.insert(method.clone(), highest);
            lowest_latency_per_method.insert(method.clone(), lowest);
        }

        TelemetryAggregate {
            highest_errors_per_minute,
            lowest_errors_per_minute,
            highest_latency_per_method,
            lowest_latency_per_method,
        }
    }
}

/// Helper matching §9's "explicit `timed(name, fn)` helper" redesign note
/// for call sites that don't hold a `Telemetry` instance handy but still
/// want a one-off duration measurement (used by the scheduler's coarse
/// per-slot timing where no error can occur).
pub fn measure<F, T>(op: F) -> (T, Duration)
where
    F: FnOnce() -> T,
{
    let start = Instant::now();
    let value = op();
    (value, start.elapsed())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn timed_records_latency_and_method_on_success() {
        let telemetry = Telemetry::new();
        let result: Option<u32> = telemetry
            .timed("scrape_yahoo", || async { Ok::<u32, anyhow::Error>(42) })
            .await;
        assert_eq!(result, Some(42));
        assert!(telemetry.observed_methods().contains("scrape_yahoo"));

        let stream = telemetry.stream();
        assert_eq!(stream.len(), 1);
        assert_eq!(stream[0].1.timing_data.len(), 1);
        assert!(stream[0].1.errors.is_empty());
    }

    #[tokio::test]
    async fn timed_records_error_and_swallows_it() {
        let telemetry = Telemetry::new();
        let result: Option<u32> = telemetry
            .timed("flush", || async { Err::<u32, anyhow::Error>(anyhow::anyhow!("db down")) })
            .await;
        assert_eq!(result, None);

        let stream = telemetry.stream();
        assert_eq!(stream[0].1.errors.len(), 1);
        assert_eq!(stream[0].1.errors[0].0, "flush");
        // Latency is still recorded even though the operation failed.
        assert_eq!(stream[0].1.timing_data.len(), 1);
    }

    #[tokio::test]
    async fn recording_k_invocations_yields_bucket_of_length_k() {
        let telemetry = Telemetry::new();
        for _ in 0..5 {
            let _: Option<()> = telemetry
                .timed("scrape_yahoo", || async { Ok::<(), anyhow::Error>(()) })
                .await;
        }
        let stream = telemetry.stream();
        assert_eq!(stream.len(), 1);
        assert_eq!(stream[0].1.timing_data.len(), 5);
        assert!(telemetry.observed_methods().contains("scrape_yahoo"));
    }

    #[test]
    fn aggregate_on_empty_telemetry_reports_zero() {
        let telemetry = Telemetry::new();
        let aggregate = telemetry.aggregate();
        assert_eq!(aggregate.highest_errors_per_minute, 0);
        assert_eq!(aggregate.lowest_errors_per_minute, 0);
        assert!(aggregate.highest_latency_per_method.is_empty());
    }
}
