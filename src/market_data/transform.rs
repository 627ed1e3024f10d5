use crate::database::models::{NewMarketTick, SymbolMetadata};
use crate::market_data::formatter::resolve_timezone;
use crate::market_data::quote_client::{RawMeta, RawSeriesBySymbol, RawValue};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while normalizing raw quote series
#[derive(Debug, Error, PartialEq)]
pub enum TransformError {
    #[error("Invalid {field} '{value}' for {symbol}")]
    InvalidDecimal {
        symbol: String,
        field: &'static str,
        value: String,
    },

    #[error("Invalid datetime '{value}' for {symbol}")]
    InvalidDatetime { symbol: String, value: String },
}

impl From<&RawMeta> for SymbolMetadata {
    fn from(meta: &RawMeta) -> Self {
        SymbolMetadata {
            symbol: meta.symbol.clone(),
            exchange: meta.exchange.clone(),
            instrument_type: meta.instrument_type.clone(),
            currency_base: meta.currency_base.clone(),
            currency_quote: meta.currency_quote.clone(),
            mic_code: meta.mic_code.clone(),
            exchange_timezone: meta.exchange_timezone.clone(),
        }
    }
}

/// Flatten raw series into one tick per sample, metadata copied onto each
pub fn transform(raw: &RawSeriesBySymbol) -> Result<Vec<NewMarketTick>, TransformError> {
    let mut ticks = Vec::with_capacity(raw.values().map(|s| s.values.len()).sum());

    for series in raw.values() {
        let metadata = SymbolMetadata::from(&series.meta);
        for value in &series.values {
            ticks.push(transform_value(&metadata, value)?);
        }
    }

    Ok(ticks)
}

fn transform_value(metadata: &SymbolMetadata, value: &RawValue) -> Result<NewMarketTick, TransformError> {
    let tick_time = parse_datetime(metadata, &value.datetime)?;
    let volume = match value.volume.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(v) => Some(parse_decimal(metadata, "volume", v)?),
    };

    Ok(NewMarketTick::new(
        metadata,
        tick_time,
        parse_decimal(metadata, "open", &value.open)?,
        parse_decimal(metadata, "high", &value.high)?,
        parse_decimal(metadata, "low", &value.low)?,
        parse_decimal(metadata, "close", &value.close)?,
        volume,
    ))
}

fn parse_decimal(
    metadata: &SymbolMetadata,
    field: &'static str,
    value: &str,
) -> Result<Decimal, TransformError> {
    Decimal::from_str(value.trim()).map_err(|_| TransformError::InvalidDecimal {
        symbol: metadata.symbol.clone(),
        field,
        value: value.to_string(),
    })
}

/// Provider datetimes are exchange wall-clock time, intraday or daily
fn parse_datetime(metadata: &SymbolMetadata, value: &str) -> Result<DateTime<Utc>, TransformError> {
    let invalid = || TransformError::InvalidDatetime {
        symbol: metadata.symbol.clone(),
        value: value.to_string(),
    };

    let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .map(|d| d.and_hms_opt(0, 0, 0).unwrap_or_default())
        })
        .map_err(|_| invalid())?;

    let tz = resolve_timezone(metadata.exchange_timezone.as_deref());
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::quote_client::RawSeries;
    use rust_decimal_macros::dec;

    fn raw_value(datetime: &str, close: &str, volume: Option<&str>) -> RawValue {
        RawValue {
            datetime: datetime.to_string(),
            open: "100".to_string(),
            high: "103".to_string(),
            low: "99".to_string(),
            close: close.to_string(),
            volume: volume.map(str::to_string),
        }
    }

    fn series(symbol: &str, timezone: Option<&str>, values: Vec<RawValue>) -> RawSeries {
        RawSeries {
            meta: RawMeta {
                symbol: symbol.to_string(),
                exchange: Some("NASDAQ".to_string()),
                exchange_timezone: timezone.map(str::to_string),
                ..RawMeta::default()
            },
            values,
        }
    }

    #[test]
    fn test_transform_one_tick_per_sample() {
        let mut raw = RawSeriesBySymbol::new();
        raw.insert(
            "AAPL".to_string(),
            series(
                "AAPL",
                Some("America/New_York"),
                vec![
                    raw_value("2025-01-06 09:31:00", "101.25", Some("1200")),
                    raw_value("2025-01-06 09:30:00", "100.75", None),
                ],
            ),
        );
        raw.insert(
            "INFY:BSE".to_string(),
            series("INFY", Some("Asia/Kolkata"), vec![raw_value("2025-01-06 09:30:00", "1900", Some(""))]),
        );

        let ticks = transform(&raw).unwrap();

        assert_eq!(ticks.len(), 3);
        assert!(ticks.iter().take(2).all(|t| t.symbol == "AAPL" && t.exchange.as_deref() == Some("NASDAQ")));
        assert_eq!(ticks[0].close, dec!(101.25));
        assert_eq!(ticks[0].volume, Some(dec!(1200)));
        assert_eq!(ticks[1].volume, None);
        assert_eq!(ticks[2].symbol, "INFY");
        assert_eq!(ticks[2].volume, None);
    }

    #[test]
    fn test_datetime_resolved_in_exchange_timezone() {
        let mut raw = RawSeriesBySymbol::new();
        raw.insert(
            "AAPL".to_string(),
            series("AAPL", Some("America/New_York"), vec![raw_value("2025-01-06 09:30:00", "1", None)]),
        );
        raw.insert(
            "INFY".to_string(),
            series("INFY", Some("Asia/Kolkata"), vec![raw_value("2025-01-06 09:30:00", "1", None)]),
        );

        let ticks = transform(&raw).unwrap();

        // EST is UTC-5 in January, IST is UTC+5:30
        assert_eq!(ticks[0].tick_time.to_rfc3339(), "2025-01-06T14:30:00+00:00");
        assert_eq!(ticks[1].tick_time.to_rfc3339(), "2025-01-06T04:00:00+00:00");
    }

    #[test]
    fn test_missing_timezone_and_daily_bars_use_utc() {
        let mut raw = RawSeriesBySymbol::new();
        raw.insert("BTC/USD".to_string(), series("BTC/USD", None, vec![raw_value("2025-01-06", "1", None)]));

        let ticks = transform(&raw).unwrap();
        assert_eq!(ticks[0].tick_time.to_rfc3339(), "2025-01-06T00:00:00+00:00");
    }

    #[test]
    fn test_malformed_decimal_propagates() {
        let mut raw = RawSeriesBySymbol::new();
        raw.insert("AAPL".to_string(), series("AAPL", None, vec![raw_value("2025-01-06 09:30:00", "n/a", None)]));

        assert_eq!(
            transform(&raw),
            Err(TransformError::InvalidDecimal {
                symbol: "AAPL".to_string(),
                field: "close",
                value: "n/a".to_string(),
            })
        );
    }

    #[test]
    fn test_malformed_datetime_propagates() {
        let mut raw = RawSeriesBySymbol::new();
        raw.insert("AAPL".to_string(), series("AAPL", None, vec![raw_value("yesterday", "1", None)]));

        assert!(matches!(transform(&raw), Err(TransformError::InvalidDatetime { .. })));
    }
}
