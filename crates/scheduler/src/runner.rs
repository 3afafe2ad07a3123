use std::sync::Arc;

use chrono::Timelike;
use tokio::sync::broadcast;
use tracing::{debug, info};

use newsflow_core::{
    can_run_task, default_schedule, AppConfig, ScheduledTask, SchedulePolicy, ScheduleSlot,
};
use newsflow_fetch::{HttpFetcher, ProxyClient};
use newsflow_ingest::{ArticleScraper, TickerDirectory};
use newsflow_sink::DataSink;
use newsflow_telemetry::Telemetry;

/// How many tickers are handed to `ArticleScraper` per executed slot.
/// Mirrors the fan-out chunk size so one slot's workload never exceeds
/// what a single `scrape_yahoo` call already bounds concurrency to.
const TICKER_WINDOW_SIZE: usize = 10;

/// Long-running cooperative task table driving the ingestion pipeline.
/// Owns the schedule (§3's `ScheduleSlot` rows), the last-known ticker
/// snapshot, and the collaborators each slot invocation needs. See
/// `SchedulePolicy` for the two admission strategies this runs under.
pub struct Scheduler {
    config: AppConfig,
    proxy: Arc<ProxyClient>,
    data_sink: Arc<DataSink>,
    telemetry: Arc<Telemetry>,
    ticker_fetcher: HttpFetcher,
    ticker_directory: TickerDirectory,
    schedule: Vec<ScheduleSlot>,
    ticker_window_cursor: usize,
    ticks_since_refresh: u32,
}

impl Scheduler {
    pub fn new(
        config: AppConfig,
        proxy: Arc<ProxyClient>,
        data_sink: Arc<DataSink>,
        telemetry: Arc<Telemetry>,
    ) -> Result<Self, newsflow_core::IngestError> {
        let ticker_fetcher = HttpFetcher::new(config.proxy.request_timeout)?;
        Ok(Self {
            config,
            proxy,
            data_sink,
            telemetry,
            ticker_fetcher,
            ticker_directory: TickerDirectory::new(),
            schedule: default_schedule(),
            ticker_window_cursor: 0,
            ticks_since_refresh: 0,
        })
    }

    /// Loads the initial ticker snapshot (§4.7 step 1). Call once before
    /// `run`; a failed initial fetch just leaves the directory empty, and
    /// the first cycle's scrape has nothing to do, matching the "transient
    /// failures yield an empty mapping" contract of §4.4.
    pub async fn bootstrap(&mut self) {
        self.refresh_ticker_directory().await;
    }

    async fn refresh_ticker_directory(&mut self) {
        self.ticker_directory
            .refresh(&self.ticker_fetcher, &self.config.sources.meme_tickers_uri)
            .await;
        self.ticks_since_refresh = 0;
    }

    fn next_ticker_window(&mut self) -> Vec<String> {
        let tickers = self.ticker_directory.symbols();
        if tickers.is_empty() {
            return Vec::new();
        }
        let start = self.ticker_window_cursor % tickers.len();
        let window: Vec<String> = tickers
            .iter()
            .cycle()
            .skip(start)
            .take(TICKER_WINDOW_SIZE.min(tickers.len()))
            .cloned()
            .collect();
        self.ticker_window_cursor = (start + window.len()) % tickers.len();
        window
    }

    /// Runs one slot's task: scrape, ingest, flush for `ScrapeYahoo`;
    /// a logged no-op for `AlternateNewsSources`, whose fetch entry point
    /// is out of scope for this ingestion pipeline (§1).
    async fn execute_slot(&mut self, index: usize) {
        let task = self.schedule[index].task;
        match task {
            ScheduledTask::ScrapeYahoo => {
                let tickers = self.next_ticker_window();
                if tickers.is_empty() {
                    debug!("no tickers available, skipping scrape for this slot");
                } else {
                    let proxy = Arc::clone(&self.proxy);
                    let sink = Arc::clone(&self.data_sink);
                    let articles = self
                        .telemetry
                        .timed("scrape_yahoo", move || async move {
                            let scraper = ArticleScraper::new(proxy.as_ref(), sink.as_ref());
                            Ok::<_, anyhow::Error>(scraper.scrape_yahoo(&tickers).await)
                        })
                        .await
                        .unwrap_or_default();

                    info!(count = articles.len(), "scrape cycle produced articles");
                    self.data_sink.ingest(articles).await;

                    let sink = Arc::clone(&self.data_sink);
                    self.telemetry
                        .timed("flush", move || async move {
                            sink.flush().await;
                            Ok::<_, anyhow::Error>(())
                        })
                        .await;
                }
            }
            ScheduledTask::AlternateNewsSources => {
                debug!("alternate-source slot reached; RSS fetch path is out of scope, marking done");
            }
        }
        self.schedule[index].ran = true;
    }

    /// Default runtime mode: slots fire in insertion order every cycle,
    /// sleeping `inter_slot_delay` between each. A full day's pass
    /// finishes with a ticker refresh and a fresh schedule for the next
    /// day (§4.7 steps 2c-2d).
    async fn run_fixed_interval(&mut self, mut shutdown: broadcast::Receiver<()>) {
        loop {
            for index in 0..self.schedule.len() {
                self.execute_slot(index).await;

                tokio::select! {
                    _ = tokio::time::sleep(self.config.scheduler.inter_slot_delay) => {}
                    _ = shutdown.recv() => {
                        info!("shutdown signal received, stopping scheduler");
                        return;
                    }
                }
            }

            self.refresh_ticker_directory().await;
            self.schedule = default_schedule();
            info!("day rollover: schedule regenerated, all slots reset to pending");
        }
    }

    /// Legacy mode: polls on a fixed tick and fires any slot whose
    /// wall-clock time is within the admission window and hasn't run yet
    /// (§4.7's `can_run_task`). Day rollover is detected by the calendar
    /// date changing between ticks.
    async fn run_time_window_admission(&mut self, mut shutdown: broadcast::Receiver<()>) {
        let mut current_date = chrono::Local::now().date_naive();

        loop {
            let now = chrono::Local::now();
            if now.date_naive() != current_date {
                self.schedule = default_schedule();
                current_date = now.date_naive();
                info!("day rollover: schedule regenerated, all slots reset to pending");
            }

            let now_minute_of_day = (now.hour() * 60 + now.minute()) as u32;
            let admission_window = self.config.scheduler.admission_window;

            let due: Vec<usize> = self
                .schedule
                .iter()
                .enumerate()
                .filter(|(_, slot)| can_run_task(slot, now_minute_of_day, admission_window))
                .map(|(i, _)| i)
                .collect();

            for index in due {
                self.execute_slot(index).await;
            }

            self.ticks_since_refresh += 1;
            if self.ticks_since_refresh >= self.config.scheduler.ticker_refresh_every_n_ticks {
                self.refresh_ticker_directory().await;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.config.scheduler.tick_interval) => {}
                _ = shutdown.recv() => {
                    info!("shutdown signal received, stopping scheduler");
                    return;
                }
            }
        }
    }

    /// Runs forever under the configured [`SchedulePolicy`] until the
    /// shutdown channel fires. Any unexpected error from a scrape cycle is
    /// already swallowed by `Telemetry::timed`; this loop itself never
    /// returns `Err` — it only stops on shutdown.
    pub async fn run(mut self, shutdown: broadcast::Receiver<()>) {
        match self.config.scheduler.policy {
            SchedulePolicy::FixedInterval => self.run_fixed_interval(shutdown).await,
            SchedulePolicy::TimeWindowAdmission => {
                self.run_time_window_admission(shutdown).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticker_window_wraps_around_short_lists() {
        // Exercises the pure windowing arithmetic without constructing a
        // full Scheduler (which needs a live proxy config).
        let tickers = vec!["AAPL".to_string(), "MSFT".to_string(), "TSLA".to_string()];
        let start = 2 % tickers.len();
        let window: Vec<String> = tickers
            .iter()
            .cycle()
            .skip(start)
            .take(TICKER_WINDOW_SIZE.min(tickers.len()))
            .cloned()
            .collect();
        assert_eq!(window, vec!["TSLA", "AAPL", "MSFT"]);
    }
}
