use crate::database::connection::{run_blocking, DatabaseError};
use crate::database::models::{MarketTick, NewMarketTick};
use crate::database::repositories::TickRepository;
use crate::market_data::analytics::{evaluate_alerts, AlertResult, MovingAveragePoint, PriceAlert};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use utoipa::ToSchema;

/// Outcome of replacing one symbol's time range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SymbolInsertReport {
    pub symbol: String,
    pub deleted: usize,
    pub inserted: usize,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

/// Storage gateway for scraped market data
///
/// Wraps the synchronous tick repository and runs every call on the blocking pool.
#[derive(Clone)]
pub struct MarketDataService {
    repository: Arc<dyn TickRepository>,
}

impl MarketDataService {
    pub fn new(repository: Arc<dyn TickRepository>) -> Self {
        Self { repository }
    }

    async fn run_blocking<T, F>(&self, op: F) -> Result<T, DatabaseError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn TickRepository) -> Result<T, DatabaseError> + Send + 'static,
    {
        let repository = Arc::clone(&self.repository);
        run_blocking(move || op(repository.as_ref())).await
    }

    /// Replace-by-range insert
    ///
    /// Per symbol: delete stored ticks inside the batch's [min, max] window,
    /// then insert the batch. Symbols are processed in order and the first
    /// failure aborts the rest. Delete and insert are separate statements.
    pub async fn insert(&self, ticks: Vec<NewMarketTick>) -> Result<Vec<SymbolInsertReport>, DatabaseError> {
        if ticks.is_empty() {
            return Ok(Vec::new());
        }

        self.run_blocking(move |repository| {
            let mut reports = Vec::new();

            for (symbol, group) in group_by_symbol(ticks) {
                let Some((from, to)) = time_bounds(&group) else {
                    continue;
                };

                let deleted = repository.delete_range(&symbol, from, to)?;
                let inserted = repository.insert_batch(&group)?;

                tracing::debug!(
                    "Replaced {} tick(s) of {} with {} in [{}, {}]",
                    deleted,
                    symbol,
                    inserted,
                    from,
                    to
                );

                reports.push(SymbolInsertReport {
                    symbol,
                    deleted,
                    inserted,
                    from,
                    to,
                });
            }

            Ok(reports)
        })
        .await
    }

    /// Most recent tick per requested symbol, unknown symbols are absent
    pub async fn latest_prices(&self, symbols: Vec<String>) -> Result<Vec<MarketTick>, DatabaseError> {
        self.run_blocking(move |repository| repository.latest_for_symbols(&symbols))
            .await
    }

    /// Ticks of a symbol in `[start, end]`, ascending
    pub async fn price_history(
        &self,
        symbol: String,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<MarketTick>, DatabaseError> {
        self.run_blocking(move |repository| repository.get_range(&symbol, start, end))
            .await
    }

    /// Trailing moving average of close over `period` ticks
    pub async fn moving_average(
        &self,
        symbol: String,
        period: usize,
    ) -> Result<Vec<MovingAveragePoint>, DatabaseError> {
        self.run_blocking(move |repository| repository.moving_average(&symbol, period))
            .await
    }

    /// Evaluate price alerts against the latest prices
    pub async fn check_alerts(&self, alerts: Vec<PriceAlert>) -> Result<Vec<AlertResult>, DatabaseError> {
        let symbols = alerts.iter().map(|a| a.symbol.clone()).collect();
        let latest = self.latest_prices(symbols).await?;
        Ok(evaluate_alerts(&alerts, &latest))
    }
}

/// Group ticks by symbol, preserving input order inside each group
fn group_by_symbol(ticks: Vec<NewMarketTick>) -> BTreeMap<String, Vec<NewMarketTick>> {
    let mut groups: BTreeMap<String, Vec<NewMarketTick>> = BTreeMap::new();
    for tick in ticks {
        groups.entry(tick.symbol.clone()).or_default().push(tick);
    }
    groups
}

fn time_bounds(ticks: &[NewMarketTick]) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let min = ticks.iter().map(|t| t.tick_time).min()?;
    let max = ticks.iter().map(|t| t.tick_time).max()?;
    Some((min, max))
}
