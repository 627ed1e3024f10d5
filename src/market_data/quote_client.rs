use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Raw per-symbol metadata as returned by the `time_series` endpoint
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawMeta {
    pub symbol: String,
    #[serde(default)]
    pub interval: Option<String>,
    #[serde(default)]
    pub exchange: Option<String>,
    #[serde(default, rename = "type")]
    pub instrument_type: Option<String>,
    #[serde(default)]
    pub currency_base: Option<String>,
    #[serde(default)]
    pub currency_quote: Option<String>,
    #[serde(default)]
    pub mic_code: Option<String>,
    #[serde(default)]
    pub exchange_timezone: Option<String>,
}

/// Raw OHLCV sample, numbers are transported as strings
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawValue {
    pub datetime: String,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
    #[serde(default)]
    pub volume: Option<String>,
}

/// Raw series for one symbol
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawSeries {
    pub meta: RawMeta,
    #[serde(default)]
    pub values: Vec<RawValue>,
}

/// Raw series keyed by the requested symbol
pub type RawSeriesBySymbol = BTreeMap<String, RawSeries>;

/// Quote source errors
#[derive(Debug, Error)]
pub enum QuoteSourceError {
    #[error("Invalid base URL: {0}")]
    InvalidUrl(String),

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Upstream returned HTTP {0}")]
    Status(u16),

    #[error("Upstream error {code}: {message}")]
    Upstream { code: i64, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

/// Result of a single fetch, failures are reported rather than raised
#[derive(Debug)]
pub enum FetchOutcome {
    /// At least one symbol returned samples
    Fetched(RawSeriesBySymbol),
    /// The request succeeded but carried no samples
    Empty,
    /// Transport, status or decode failure
    Failed(QuoteSourceError),
}

/// What to ask the quote provider for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteRequest {
    pub symbols: Vec<String>,
    /// Sampling interval in provider notation (e.g. "1min")
    pub interval: String,
    /// Number of samples per symbol
    pub output_size: u32,
}

/// Source of raw quote series
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn fetch_quotes(&self, request: &QuoteRequest) -> FetchOutcome;
}

/// Twelve Data `time_series` client
pub struct TwelveDataClient {
    client: Client,
    endpoint: Url,
    api_key: String,
}

impl TwelveDataClient {
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self, QuoteSourceError> {
        let endpoint = Url::parse(base_url)
            .and_then(|base| base.join("time_series"))
            .map_err(|e| QuoteSourceError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        Ok(Self {
            client: Client::new(),
            endpoint,
            api_key: api_key.into(),
        })
    }

    /// Full request URL for a quote request
    pub fn request_url(&self, request: &QuoteRequest) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("symbol", &request.symbols.join(","))
            .append_pair("interval", &request.interval)
            .append_pair("outputsize", &request.output_size.to_string())
            .append_pair("apikey", &self.api_key);
        url
    }

    async fn fetch(&self, request: &QuoteRequest) -> Result<RawSeriesBySymbol, QuoteSourceError> {
        let response = self
            .client
            .get(self.request_url(request))
            .header("accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(QuoteSourceError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        parse_time_series(&body)
    }
}

#[async_trait]
impl QuoteSource for TwelveDataClient {
    async fn fetch_quotes(&self, request: &QuoteRequest) -> FetchOutcome {
        tracing::debug!(
            "Fetching {} sample(s) of {} for {}",
            request.output_size,
            request.interval,
            request.symbols.join(",")
        );

        match self.fetch(request).await {
            Ok(series) if series.values().all(|s| s.values.is_empty()) => FetchOutcome::Empty,
            Ok(series) => FetchOutcome::Fetched(series),
            Err(e) => FetchOutcome::Failed(e),
        }
    }
}

/// Parse a `time_series` response body
///
/// Multi-symbol responses are keyed by symbol; a single-symbol response is the
/// bare series. Per-symbol error entries are dropped with a warning, a
/// top-level error entry fails the whole response.
pub fn parse_time_series(body: &[u8]) -> Result<RawSeriesBySymbol, QuoteSourceError> {
    let root: Value =
        serde_json::from_slice(body).map_err(|e| QuoteSourceError::Decode(e.to_string()))?;

    if let Some(err) = upstream_error(&root) {
        return Err(err);
    }

    let entries = root
        .as_object()
        .ok_or_else(|| QuoteSourceError::Decode("expected a JSON object".to_string()))?;

    if entries.contains_key("meta") {
        let series: RawSeries = serde_json::from_value(root.clone())
            .map_err(|e| QuoteSourceError::Decode(e.to_string()))?;
        let mut by_symbol = RawSeriesBySymbol::new();
        by_symbol.insert(series.meta.symbol.clone(), series);
        return Ok(by_symbol);
    }

    let mut by_symbol = RawSeriesBySymbol::new();
    for (symbol, entry) in entries {
        if let Some(err) = upstream_error(entry) {
            tracing::warn!("Quote provider rejected {}: {}", symbol, err);
            continue;
        }

        let series: RawSeries = serde_json::from_value(entry.clone())
            .map_err(|e| QuoteSourceError::Decode(format!("{}: {}", symbol, e)))?;
        by_symbol.insert(symbol.clone(), series);
    }

    Ok(by_symbol)
}

fn upstream_error(value: &Value) -> Option<QuoteSourceError> {
    if value.get("status").and_then(Value::as_str) != Some("error") {
        return None;
    }

    Some(QuoteSourceError::Upstream {
        code: value.get("code").and_then(Value::as_i64).unwrap_or_default(),
        message: value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MULTI: &str = r#"{
        "AAPL": {
            "meta": {"symbol": "AAPL", "interval": "1min", "currency": "USD",
                     "exchange_timezone": "America/New_York", "exchange": "NASDAQ",
                     "mic_code": "XNGS", "type": "Common Stock"},
            "values": [
                {"datetime": "2025-01-06 09:31:00", "open": "100.5", "high": "101",
                 "low": "100", "close": "101", "volume": "1200"},
                {"datetime": "2025-01-06 09:30:00", "open": "100", "high": "100.5",
                 "low": "99.5", "close": "100", "volume": "900"}
            ],
            "status": "ok"
        },
        "BAD": {"code": 404, "message": "symbol not found", "status": "error"}
    }"#;

    #[test]
    fn test_parse_multi_symbol_response() {
        let series = parse_time_series(MULTI.as_bytes()).unwrap();

        assert_eq!(series.len(), 1);
        let aapl = &series["AAPL"];
        assert_eq!(aapl.meta.exchange.as_deref(), Some("NASDAQ"));
        assert_eq!(aapl.meta.instrument_type.as_deref(), Some("Common Stock"));
        assert_eq!(aapl.values.len(), 2);
        assert_eq!(aapl.values[0].volume.as_deref(), Some("1200"));
    }

    #[test]
    fn test_parse_single_symbol_response() {
        let body = r#"{
            "meta": {"symbol": "EUR/USD", "currency_base": "Euro", "currency_quote": "US Dollar",
                     "exchange_timezone": "UTC", "type": "Physical Currency"},
            "values": [{"datetime": "2025-01-06 09:30:00", "open": "1.03",
                        "high": "1.04", "low": "1.02", "close": "1.035"}],
            "status": "ok"
        }"#;

        let series = parse_time_series(body.as_bytes()).unwrap();
        let eur = &series["EUR/USD"];
        assert_eq!(eur.meta.currency_base.as_deref(), Some("Euro"));
        assert_eq!(eur.values[0].volume, None);
    }

    #[test]
    fn test_parse_top_level_error() {
        let body = r#"{"code": 401, "message": "invalid api key", "status": "error"}"#;

        match parse_time_series(body.as_bytes()) {
            Err(QuoteSourceError::Upstream { code, message }) => {
                assert_eq!(code, 401);
                assert_eq!(message, "invalid api key");
            }
            other => panic!("expected upstream error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_garbage_is_decode_error() {
        assert!(matches!(
            parse_time_series(b"<html>"),
            Err(QuoteSourceError::Decode(_))
        ));
    }

    #[test]
    fn test_request_url() {
        let client = TwelveDataClient::new("https://api.twelvedata.com/", "demo").unwrap();
        let url = client.request_url(&QuoteRequest {
            symbols: vec!["INFY:BSE".to_string(), "AAPL".to_string()],
            interval: "1min".to_string(),
            output_size: 5,
        });

        assert_eq!(url.path(), "/time_series");
        let pairs: BTreeMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs["symbol"], "INFY:BSE,AAPL");
        assert_eq!(pairs["interval"], "1min");
        assert_eq!(pairs["outputsize"], "5");
        assert_eq!(pairs["apikey"], "demo");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            TwelveDataClient::new("not a url", "demo"),
            Err(QuoteSourceError::InvalidUrl(_))
        ));
    }
}
