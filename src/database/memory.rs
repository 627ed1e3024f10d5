//! In-process repositories used when no database is configured, and as
//! test doubles for the service and job layers.

use crate::database::connection::DatabaseError;
use crate::database::models::{JobStatus, MarketTick, NewMarketTick, NewScrapeSettings, ScrapeSettings};
use crate::database::repositories::{SettingsRepository, TickRepository};
use crate::market_data::analytics::{trailing_moving_average, MovingAveragePoint};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

/// Tick store keyed by symbol, each series kept sorted by tick_time
#[derive(Default)]
pub struct InMemoryTickRepository {
    series: RwLock<HashMap<String, Vec<MarketTick>>>,
    next_id: AtomicI64,
}

impl InMemoryTickRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored ticks across all symbols
    pub fn len(&self) -> usize {
        self.series.read().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TickRepository for InMemoryTickRepository {
    fn delete_range(
        &self,
        symbol: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<usize, DatabaseError> {
        let mut series = self.series.write();
        let Some(ticks) = series.get_mut(symbol) else {
            return Ok(0);
        };

        let before = ticks.len();
        ticks.retain(|t| t.tick_time < from || t.tick_time > to);
        Ok(before - ticks.len())
    }

    fn insert_batch(&self, new_ticks: &[NewMarketTick]) -> Result<usize, DatabaseError> {
        let now = Utc::now();
        let mut series = self.series.write();

        for tick in new_ticks {
            let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
            let stored = tick.clone().into_stored(id, now);
            let entry = series.entry(stored.symbol.clone()).or_default();
            let pos = entry.partition_point(|t| t.tick_time <= stored.tick_time);
            entry.insert(pos, stored);
        }

        Ok(new_ticks.len())
    }

    fn latest_for_symbols(&self, symbols: &[String]) -> Result<Vec<MarketTick>, DatabaseError> {
        let series = self.series.read();
        let mut latest: Vec<MarketTick> = Vec::new();

        for symbol in symbols {
            if latest.iter().any(|t| &t.symbol == symbol) {
                continue;
            }
            if let Some(tick) = series.get(symbol).and_then(|ticks| ticks.last()) {
                latest.push(tick.clone());
            }
        }

        Ok(latest)
    }

    fn get_range(
        &self,
        symbol: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<MarketTick>, DatabaseError> {
        let series = self.series.read();

        Ok(series
            .get(symbol)
            .map(|ticks| {
                ticks
                    .iter()
                    .filter(|t| t.tick_time >= from && t.tick_time <= to)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn moving_average(
        &self,
        symbol: &str,
        period: usize,
    ) -> Result<Vec<MovingAveragePoint>, DatabaseError> {
        let series = self.series.read();

        Ok(series
            .get(symbol)
            .map(|ticks| trailing_moving_average(ticks, period))
            .unwrap_or_default())
    }
}

/// Settings store keyed by settings key
#[derive(Default)]
pub struct InMemorySettingsRepository {
    records: RwLock<HashMap<String, ScrapeSettings>>,
    next_id: AtomicI64,
}

impl InMemorySettingsRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored settings records
    pub fn count(&self) -> usize {
        self.records.read().len()
    }
}

impl SettingsRepository for InMemorySettingsRepository {
    fn find(&self, key: &str) -> Result<Option<ScrapeSettings>, DatabaseError> {
        Ok(self.records.read().get(key).cloned())
    }

    fn insert(&self, new_settings: NewScrapeSettings) -> Result<ScrapeSettings, DatabaseError> {
        let mut records = self.records.write();

        // Mirrors the unique constraint on scrape_settings.key
        if records.contains_key(&new_settings.key) {
            return Err(DatabaseError::QueryError(format!(
                "duplicate settings key: {}",
                new_settings.key
            )));
        }

        let settings = ScrapeSettings {
            id: self.next_id.fetch_add(1, Ordering::Relaxed) + 1,
            key: new_settings.key,
            interval_ms: new_settings.interval_ms,
            status: new_settings.status,
            started_at: new_settings.started_at,
            stopped_at: None,
        };
        records.insert(settings.key.clone(), settings.clone());

        Ok(settings)
    }

    fn delete(&self, key: &str) -> Result<bool, DatabaseError> {
        Ok(self.records.write().remove(key).is_some())
    }

    fn mark_stopped(&self, key: &str, stopped_at: DateTime<Utc>) -> Result<usize, DatabaseError> {
        let mut records = self.records.write();

        match records.get_mut(key) {
            Some(settings) => {
                settings.status = JobStatus::Stopped.as_str().to_string();
                settings.stopped_at = Some(stopped_at);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    fn stop_all_running(&self, stopped_at: DateTime<Utc>) -> Result<usize, DatabaseError> {
        let mut records = self.records.write();
        let mut updated = 0;

        for settings in records.values_mut() {
            if settings.job_status() == Some(JobStatus::Running) {
                settings.status = JobStatus::Stopped.as_str().to_string();
                settings.stopped_at = Some(stopped_at);
                updated += 1;
            }
        }

        Ok(updated)
    }
}
