use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::database::models::{JobStatus, MarketTick, ScrapeSettings, SymbolMetadata};
use crate::jobs::ScrapeJobStatus;
use crate::market_data::{localize, AlertResult, LocalizedTimestamp, MovingAveragePoint, PriceAlert};
use crate::metrics::ScrapeStatsSnapshot;

/// Latest price of one symbol
#[derive(Debug, Serialize, ToSchema)]
pub struct LatestPriceEntry {
    pub symbol: String,
    #[schema(value_type = String, example = "101.50")]
    pub price: Decimal,
    pub timestamp: LocalizedTimestamp,
    pub metadata: SymbolMetadata,
}

impl From<MarketTick> for LatestPriceEntry {
    fn from(tick: MarketTick) -> Self {
        let timestamp = localize(tick.tick_time, tick.exchange_timezone.as_deref());
        let metadata = tick.metadata();

        Self {
            symbol: tick.symbol,
            price: tick.close,
            timestamp,
            metadata,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LatestPriceResponse {
    pub success: bool,
    pub data: Vec<LatestPriceEntry>,
}

/// One stored candle with its localized timestamp
#[derive(Debug, Serialize, ToSchema)]
pub struct PriceHistoryEntry {
    pub timestamp: LocalizedTimestamp,
    #[schema(value_type = String, example = "100.00")]
    pub open: Decimal,
    #[schema(value_type = String, example = "102.00")]
    pub high: Decimal,
    #[schema(value_type = String, example = "99.50")]
    pub low: Decimal,
    #[schema(value_type = String, example = "101.50")]
    pub close: Decimal,
    #[schema(value_type = Option<String>, example = "12000")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<Decimal>,
}

impl From<MarketTick> for PriceHistoryEntry {
    fn from(tick: MarketTick) -> Self {
        Self {
            timestamp: localize(tick.tick_time, tick.exchange_timezone.as_deref()),
            open: tick.open,
            high: tick.high,
            low: tick.low,
            close: tick.close,
            volume: tick.volume,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PriceHistoryResponse {
    pub success: bool,
    pub symbol: String,
    pub count: usize,
    pub data: Vec<PriceHistoryEntry>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MovingAverageResponse {
    pub success: bool,
    pub symbol: String,
    pub period: usize,
    pub data: Vec<MovingAveragePoint>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckAlertsRequest {
    pub alerts: Vec<PriceAlert>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckAlertsResponse {
    pub success: bool,
    pub data: Vec<AlertResult>,
}

/// Response of the scrape job control endpoint
#[derive(Debug, Serialize, ToSchema)]
pub struct JobOperationResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
    /// Persisted settings; `null` on status when none were ever stored
    #[schema(value_type = Option<ScrapeSettings>)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<Option<ScrapeSettings>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<ScrapeStatsSnapshot>,
}

impl JobOperationResponse {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            status: None,
            settings: None,
            stats: None,
        }
    }

    pub fn started(interval_ms: i64, settings: ScrapeSettings) -> Self {
        Self {
            settings: Some(Some(settings)),
            ..Self::message(format!("Automated scrap started at {}ms interval", interval_ms))
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            ..Self::message(message)
        }
    }
}

impl From<ScrapeJobStatus> for JobOperationResponse {
    fn from(status: ScrapeJobStatus) -> Self {
        Self {
            success: true,
            message: None,
            status: Some(status.status),
            settings: Some(status.settings),
            stats: Some(status.stats),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn stored_tick() -> MarketTick {
        crate::database::models::NewMarketTick::new(
            &SymbolMetadata::new("INFY").with_exchange_timezone("Asia/Kolkata"),
            Utc.with_ymd_and_hms(2025, 1, 6, 4, 0, 0).unwrap(),
            dec!(1900),
            dec!(1910),
            dec!(1895),
            dec!(1905.5),
            None,
        )
        .into_stored(1, Utc::now())
    }

    #[test]
    fn test_latest_price_entry_localizes() {
        let entry = LatestPriceEntry::from(stored_tick());

        assert_eq!(entry.symbol, "INFY");
        assert_eq!(entry.price, dec!(1905.5));
        assert_eq!(entry.timestamp.formatted, "2025-01-06 09:30:00");
        assert_eq!(entry.metadata.exchange_timezone.as_deref(), Some("Asia/Kolkata"));
    }

    #[test]
    fn test_job_response_shapes() {
        let json = serde_json::to_value(JobOperationResponse::failure("Invalid operation")).unwrap();
        assert_eq!(json, serde_json::json!({"success": false, "message": "Invalid operation"}));

        let json = serde_json::to_value(JobOperationResponse::message("Automated scrap stopped")).unwrap();
        assert_eq!(json["success"], true);
        assert!(json.get("settings").is_none());
    }
}
