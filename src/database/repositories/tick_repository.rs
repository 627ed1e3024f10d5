use crate::database::connection::{DatabaseError, PgPooledConnection};
use crate::database::models::{MarketTick, NewMarketTick};
use crate::database::schema::market_ticks;
use crate::market_data::analytics::MovingAveragePoint;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Numeric, Text, Timestamptz};
use rust_decimal::Decimal;
use std::sync::Arc;

/// PostgreSQL caps a statement at 65535 bind parameters
const MAX_BIND_PARAMS: usize = 65_535;

/// Bound columns per inserted tick row
const NEW_TICK_COLUMNS: usize = 13;

/// Rows per INSERT statement
const INSERT_CHUNK_SIZE: usize = 1_000;

/// Run `insert` over `chunk_size`-row slices of `new_ticks`, summing the counts
///
/// Stops at the first failing chunk; earlier chunks stay written.
fn insert_in_chunks<F>(
    new_ticks: &[NewMarketTick],
    chunk_size: usize,
    mut insert: F,
) -> Result<usize, DatabaseError>
where
    F: FnMut(&[NewMarketTick]) -> Result<usize, DatabaseError>,
{
    let mut inserted = 0;
    for chunk in new_ticks.chunks(chunk_size.max(1)) {
        inserted += insert(chunk)?;
    }
    Ok(inserted)
}

/// Tick repository trait - storage operations behind the market data service
///
/// Implementations only need per-statement atomicity; replace-by-range is
/// composed from `delete_range` + `insert_batch` by the caller.
pub trait TickRepository: Send + Sync {
    /// Delete ticks of a symbol with `from <= tick_time <= to`
    fn delete_range(
        &self,
        symbol: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<usize, DatabaseError>;

    /// Batch insert ticks
    fn insert_batch(&self, new_ticks: &[NewMarketTick]) -> Result<usize, DatabaseError>;

    /// Most recent tick for each of the given symbols
    fn latest_for_symbols(&self, symbols: &[String]) -> Result<Vec<MarketTick>, DatabaseError>;

    /// Ticks of a symbol within an inclusive range, ascending by time
    fn get_range(
        &self,
        symbol: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<MarketTick>, DatabaseError>;

    /// Trailing average of close over the last `period` ticks, ascending by time
    fn moving_average(
        &self,
        symbol: &str,
        period: usize,
    ) -> Result<Vec<MovingAveragePoint>, DatabaseError>;
}

/// Diesel implementation of TickRepository
pub struct TickRepositoryImpl {
    get_conn: Arc<dyn Fn() -> Result<PgPooledConnection, DatabaseError> + Send + Sync>,
}

impl TickRepositoryImpl {
    /// Create new tick repository with connection provider
    pub fn new<F>(get_conn: F) -> Self
    where
        F: Fn() -> Result<PgPooledConnection, DatabaseError> + Send + Sync + 'static,
    {
        Self {
            get_conn: Arc::new(get_conn),
        }
    }
}

#[derive(QueryableByName, Debug)]
struct MovingAverageRow {
    #[diesel(sql_type = Timestamptz)]
    tick_time: DateTime<Utc>,
    #[diesel(sql_type = Numeric)]
    close: Decimal,
    #[diesel(sql_type = Numeric)]
    moving_average: Decimal,
}

impl From<MovingAverageRow> for MovingAveragePoint {
    fn from(row: MovingAverageRow) -> Self {
        MovingAveragePoint {
            timestamp: row.tick_time,
            close: row.close,
            moving_average: row.moving_average,
        }
    }
}

impl TickRepository for TickRepositoryImpl {
    fn delete_range(
        &self,
        symbol: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<usize, DatabaseError> {
        let mut conn = (self.get_conn)()?;

        let deleted = diesel::delete(market_ticks::table)
            .filter(market_ticks::symbol.eq(symbol))
            .filter(market_ticks::tick_time.ge(from))
            .filter(market_ticks::tick_time.le(to))
            .execute(&mut conn)?;

        Ok(deleted)
    }

    fn insert_batch(&self, new_ticks: &[NewMarketTick]) -> Result<usize, DatabaseError> {
        if new_ticks.is_empty() {
            return Ok(0);
        }

        let mut conn = (self.get_conn)()?;

        let inserted = insert_in_chunks(new_ticks, INSERT_CHUNK_SIZE, |chunk| {
            diesel::insert_into(market_ticks::table)
                .values(chunk)
                .execute(&mut conn)
                .map_err(DatabaseError::from)
        })?;

        tracing::debug!("Batch inserted {} ticks", inserted);

        Ok(inserted)
    }

    fn latest_for_symbols(&self, symbols: &[String]) -> Result<Vec<MarketTick>, DatabaseError> {
        if symbols.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = (self.get_conn)()?;

        // DISTINCT ON keeps the first row per symbol in the given order
        market_ticks::table
            .filter(market_ticks::symbol.eq_any(symbols))
            .distinct_on(market_ticks::symbol)
            .order((market_ticks::symbol.asc(), market_ticks::tick_time.desc()))
            .select(MarketTick::as_select())
            .load::<MarketTick>(&mut conn)
            .map_err(DatabaseError::from)
    }

    fn get_range(
        &self,
        symbol: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<MarketTick>, DatabaseError> {
        let mut conn = (self.get_conn)()?;

        market_ticks::table
            .filter(market_ticks::symbol.eq(symbol))
            .filter(market_ticks::tick_time.ge(from))
            .filter(market_ticks::tick_time.le(to))
            .order(market_ticks::tick_time.asc())
            .select(MarketTick::as_select())
            .load::<MarketTick>(&mut conn)
            .map_err(DatabaseError::from)
    }

    fn moving_average(
        &self,
        symbol: &str,
        period: usize,
    ) -> Result<Vec<MovingAveragePoint>, DatabaseError> {
        let mut conn = (self.get_conn)()?;
        let preceding = period.saturating_sub(1) as i64;

        let rows = diesel::sql_query(
            "SELECT tick_time, close, \
             AVG(close) OVER (ORDER BY tick_time ROWS BETWEEN $2 PRECEDING AND CURRENT ROW) \
             AS moving_average \
             FROM market_ticks WHERE symbol = $1 ORDER BY tick_time ASC",
        )
        .bind::<Text, _>(symbol)
        .bind::<BigInt, _>(preceding)
        .load::<MovingAverageRow>(&mut conn)?;

        Ok(rows.into_iter().map(MovingAveragePoint::from).collect())
    }
}
