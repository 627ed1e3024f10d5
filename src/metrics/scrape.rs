use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use utoipa::ToSchema;

/// Counters for scrape cycles, shared between the job and the status endpoint
#[derive(Debug, Default)]
pub struct ScrapeStats {
    cycles_fetched: AtomicU64,
    cycles_empty: AtomicU64,
    fetch_failures: AtomicU64,
    transform_failures: AtomicU64,
    storage_failures: AtomicU64,
    ticks_inserted: AtomicU64,
    last_cycle_at: RwLock<Option<DateTime<Utc>>>,
    last_error: RwLock<Option<String>>,
}

/// Point-in-time copy of the scrape counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ScrapeStatsSnapshot {
    pub cycles_fetched: u64,
    pub cycles_empty: u64,
    pub fetch_failures: u64,
    pub transform_failures: u64,
    pub storage_failures: u64,
    pub ticks_inserted: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_cycle_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl ScrapeStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fetch returned samples and they were stored
    pub fn record_stored(&self, ticks: usize) {
        self.cycles_fetched.fetch_add(1, Ordering::Relaxed);
        self.ticks_inserted.fetch_add(ticks as u64, Ordering::Relaxed);
        self.touch();
    }

    /// A fetch succeeded without samples
    pub fn record_empty(&self) {
        self.cycles_empty.fetch_add(1, Ordering::Relaxed);
        self.touch();
    }

    /// The upstream fetch failed
    pub fn record_fetch_failure(&self, error: &str) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
        *self.last_error.write() = Some(error.to_string());
        self.touch();
    }

    /// Samples were fetched but could not be converted to ticks
    pub fn record_transform_failure(&self, error: &str) {
        self.cycles_fetched.fetch_add(1, Ordering::Relaxed);
        self.transform_failures.fetch_add(1, Ordering::Relaxed);
        *self.last_error.write() = Some(error.to_string());
        self.touch();
    }

    /// Ticks were built but the insert failed
    pub fn record_storage_failure(&self, error: &str) {
        self.cycles_fetched.fetch_add(1, Ordering::Relaxed);
        self.storage_failures.fetch_add(1, Ordering::Relaxed);
        *self.last_error.write() = Some(error.to_string());
        self.touch();
    }

    fn touch(&self) {
        *self.last_cycle_at.write() = Some(Utc::now());
    }

    pub fn snapshot(&self) -> ScrapeStatsSnapshot {
        ScrapeStatsSnapshot {
            cycles_fetched: self.cycles_fetched.load(Ordering::Relaxed),
            cycles_empty: self.cycles_empty.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            transform_failures: self.transform_failures.load(Ordering::Relaxed),
            storage_failures: self.storage_failures.load(Ordering::Relaxed),
            ticks_inserted: self.ticks_inserted.load(Ordering::Relaxed),
            last_cycle_at: *self.last_cycle_at.read(),
            last_error: self.last_error.read().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let stats = ScrapeStats::new();
        assert_eq!(stats.snapshot().last_cycle_at, None);

        stats.record_stored(10);
        stats.record_stored(5);
        stats.record_empty();
        stats.record_fetch_failure("timeout");
        stats.record_storage_failure("disk full");

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.cycles_fetched, 3);
        assert_eq!(snapshot.cycles_empty, 1);
        assert_eq!(snapshot.fetch_failures, 1);
        assert_eq!(snapshot.transform_failures, 0);
        assert_eq!(snapshot.storage_failures, 1);
        assert_eq!(snapshot.ticks_inserted, 15);
        assert_eq!(snapshot.last_error.as_deref(), Some("disk full"));
        assert!(snapshot.last_cycle_at.is_some());
    }

    #[test]
    fn test_transform_failure_counted_apart_from_storage() {
        let stats = ScrapeStats::new();

        stats.record_transform_failure("invalid decimal 'oops'");

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.cycles_fetched, 1);
        assert_eq!(snapshot.transform_failures, 1);
        assert_eq!(snapshot.storage_failures, 0);
        assert_eq!(snapshot.last_error.as_deref(), Some("invalid decimal 'oops'"));
    }
}
