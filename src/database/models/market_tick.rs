use chrono::{DateTime, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Per-symbol metadata shared by every tick of a series
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SymbolMetadata {
    pub symbol: String,
    pub exchange: Option<String>,
    /// Instrument type as reported upstream (e.g. "Common Stock")
    #[serde(rename = "type")]
    pub instrument_type: Option<String>,
    pub currency_base: Option<String>,
    pub currency_quote: Option<String>,
    pub mic_code: Option<String>,
    pub exchange_timezone: Option<String>,
}

impl SymbolMetadata {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Self::default()
        }
    }

    pub fn with_exchange_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.exchange_timezone = Some(timezone.into());
        self
    }
}

/// Stored market tick - one OHLCV sample
///
/// Stored in the `market_ticks` hypertable partitioned by tick_time
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize, ToSchema)]
#[diesel(table_name = crate::database::schema::market_ticks)]
pub struct MarketTick {
    pub id: i64,
    pub symbol: String,
    pub exchange: Option<String>,
    pub instrument_type: Option<String>,
    pub currency_base: Option<String>,
    pub currency_quote: Option<String>,
    pub mic_code: Option<String>,
    pub exchange_timezone: Option<String>,

    /// Sample time (UTC, partition key)
    pub tick_time: DateTime<Utc>,

    #[schema(value_type = String, example = "189.42")]
    pub open: Decimal,
    #[schema(value_type = String, example = "189.60")]
    pub high: Decimal,
    #[schema(value_type = String, example = "189.30")]
    pub low: Decimal,
    #[schema(value_type = String, example = "189.55")]
    pub close: Decimal,
    #[schema(value_type = Option<String>, example = "120431")]
    pub volume: Option<Decimal>,

    /// When this record was inserted into database
    pub created_at: DateTime<Utc>,
}

impl MarketTick {
    /// Metadata view of the flattened columns
    pub fn metadata(&self) -> SymbolMetadata {
        SymbolMetadata {
            symbol: self.symbol.clone(),
            exchange: self.exchange.clone(),
            instrument_type: self.instrument_type.clone(),
            currency_base: self.currency_base.clone(),
            currency_quote: self.currency_quote.clone(),
            mic_code: self.mic_code.clone(),
            exchange_timezone: self.exchange_timezone.clone(),
        }
    }
}

/// New tick produced by the transform stage, ready for insertion
#[derive(Debug, Clone, PartialEq, Insertable, Serialize, Deserialize, ToSchema)]
#[diesel(table_name = crate::database::schema::market_ticks)]
pub struct NewMarketTick {
    pub symbol: String,
    pub exchange: Option<String>,
    pub instrument_type: Option<String>,
    pub currency_base: Option<String>,
    pub currency_quote: Option<String>,
    pub mic_code: Option<String>,
    pub exchange_timezone: Option<String>,
    pub tick_time: DateTime<Utc>,
    #[schema(value_type = String)]
    pub open: Decimal,
    #[schema(value_type = String)]
    pub high: Decimal,
    #[schema(value_type = String)]
    pub low: Decimal,
    #[schema(value_type = String)]
    pub close: Decimal,
    #[schema(value_type = Option<String>)]
    pub volume: Option<Decimal>,
}

impl NewMarketTick {
    /// Create a tick carrying the given metadata
    pub fn new(
        metadata: &SymbolMetadata,
        tick_time: DateTime<Utc>,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: Option<Decimal>,
    ) -> Self {
        Self {
            symbol: metadata.symbol.clone(),
            exchange: metadata.exchange.clone(),
            instrument_type: metadata.instrument_type.clone(),
            currency_base: metadata.currency_base.clone(),
            currency_quote: metadata.currency_quote.clone(),
            mic_code: metadata.mic_code.clone(),
            exchange_timezone: metadata.exchange_timezone.clone(),
            tick_time,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Materialize as a stored tick (used by the in-memory store)
    pub fn into_stored(self, id: i64, created_at: DateTime<Utc>) -> MarketTick {
        MarketTick {
            id,
            symbol: self.symbol,
            exchange: self.exchange,
            instrument_type: self.instrument_type,
            currency_base: self.currency_base,
            currency_quote: self.currency_quote,
            mic_code: self.mic_code,
            exchange_timezone: self.exchange_timezone,
            tick_time: self.tick_time,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
            created_at,
        }
    }
}
