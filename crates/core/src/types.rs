use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Implemented by whatever buffer owns the dedup set, so the scraper layer
/// can skip re-fetching and re-enriching an article it has already queued
/// without depending on the concrete sink.
pub trait SeenTracker: Send + Sync {
    fn already_seen(&self, uuid: &str) -> bool;
}

/// Which upstream produced an [`Article`]. The ingestion pipeline only
/// implements the `Yahoo` path; `Alternate` exists so storage and dedup
/// logic stay source-agnostic if a second fetch path is added later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleSource {
    Yahoo,
    Alternate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thumbnail {
    pub url: String,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub tag: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub uuid: String,
    pub title: Option<String>,
    pub publisher: Option<String>,
    pub link: String,
    pub provider_publish_time: i64,
    pub kind: String,
    pub related_tickers: Vec<String>,
    pub thumbnails: Vec<Thumbnail>,
    pub summary: Option<String>,
    pub body: Option<String>,
    pub source: ArticleSource,
}

impl Article {
    /// True when this article carries enough body text to justify a
    /// sentiment row (§3: sentiment rows are only created when there is
    /// something to summarize).
    pub fn has_sentiment_content(&self) -> bool {
        self.body.as_deref().is_some_and(|b| !b.is_empty())
            || self.summary.as_deref().is_some_and(|s| !s.is_empty())
    }
}

/// One entry in the daily schedule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduledTask {
    ScrapeYahoo,
    AlternateNewsSources,
}

#[derive(Debug, Clone)]
pub struct ScheduleSlot {
    /// Minutes since midnight, local wall clock.
    pub minute_of_day: u32,
    pub task: ScheduledTask,
    pub ran: bool,
}

impl ScheduleSlot {
    pub fn new(hour: u32, minute: u32, task: ScheduledTask) -> Self {
        Self {
            minute_of_day: hour * 60 + minute,
            task,
            ran: false,
        }
    }
}

/// The sixteen fixed slots from the original cron table: Yahoo search runs
/// every three hours on the hour, the alternate-source sweep runs offset by
/// ninety minutes.
pub fn default_schedule() -> Vec<ScheduleSlot> {
    let mut slots = Vec::with_capacity(16);
    for hour in (0..24).step_by(3) {
        slots.push(ScheduleSlot::new(hour, 0, ScheduledTask::ScrapeYahoo));
    }
    for hour in (1..24).step_by(3) {
        slots.push(ScheduleSlot::new(
            hour,
            30,
            ScheduledTask::AlternateNewsSources,
        ));
    }
    slots
}

/// Returns true when `now` (minutes since midnight) is within
/// `window` of `slot`'s scheduled time and the slot has not already run.
pub fn can_run_task(slot: &ScheduleSlot, now_minute_of_day: u32, window: Duration) -> bool {
    if slot.ran {
        return false;
    }
    let window_minutes = (window.as_secs() / 60) as i64;
    let delta = (now_minute_of_day as i64 - slot.minute_of_day as i64).abs();
    delta <= window_minutes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_schedule_has_sixteen_slots() {
        assert_eq!(default_schedule().len(), 16);
    }

    #[test]
    fn admission_window_accepts_within_fifteen_minutes() {
        let slot = ScheduleSlot::new(9, 0, ScheduledTask::ScrapeYahoo);
        assert!(can_run_task(&slot, 9 * 60 + 7, Duration::from_secs(900)));
    }

    #[test]
    fn admission_window_rejects_outside_fifteen_minutes() {
        let slot = ScheduleSlot::new(9, 0, ScheduledTask::ScrapeYahoo);
        assert!(!can_run_task(&slot, 9 * 60 + 16, Duration::from_secs(900)));
    }

    #[test]
    fn admission_rejects_already_ran_slot() {
        let mut slot = ScheduleSlot::new(9, 0, ScheduledTask::ScrapeYahoo);
        slot.ran = true;
        assert!(!can_run_task(&slot, 9 * 60, Duration::from_secs(900)));
    }
}
