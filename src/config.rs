use crate::market_data::QuoteRequest;
use std::time::Duration;

/// Runtime configuration, read from the environment
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub bind_addr: String,
    /// No URL means the in-memory store
    pub database_url: Option<String>,
    pub db_pool_max_size: u32,
    pub quote_api_base_url: String,
    pub quote_api_key: String,
    pub quote_symbols: Vec<String>,
    /// Provider candle interval, e.g. "1min"
    pub quote_interval: String,
    pub quote_output_size: u32,
    pub shutdown_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            database_url: None,
            db_pool_max_size: 10,
            quote_api_base_url: "https://api.twelvedata.com".to_string(),
            quote_api_key: "demo".to_string(),
            quote_symbols: vec!["INFY:BSE".to_string(), "AAPL".to_string()],
            quote_interval: "1min".to_string(),
            quote_output_size: 5,
            shutdown_timeout: Duration::from_secs(5),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unparseable numbers fall back to defaults
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let quote_symbols = non_empty("QUOTE_SYMBOLS")
            .map(|v| parse_symbols(&v))
            .filter(|symbols| !symbols.is_empty())
            .unwrap_or(defaults.quote_symbols);

        Self {
            bind_addr: non_empty("BIND_ADDR").unwrap_or(defaults.bind_addr),
            database_url: non_empty("DATABASE_URL"),
            db_pool_max_size: non_empty("DB_POOL_MAX_SIZE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.db_pool_max_size),
            quote_api_base_url: non_empty("QUOTE_API_BASE_URL").unwrap_or(defaults.quote_api_base_url),
            quote_api_key: non_empty("QUOTE_API_KEY").unwrap_or(defaults.quote_api_key),
            quote_symbols,
            quote_interval: non_empty("QUOTE_INTERVAL").unwrap_or(defaults.quote_interval),
            quote_output_size: non_empty("QUOTE_OUTPUT_SIZE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.quote_output_size),
            shutdown_timeout: non_empty("SHUTDOWN_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.shutdown_timeout),
        }
    }

    pub fn quote_request(&self) -> QuoteRequest {
        QuoteRequest {
            symbols: self.quote_symbols.clone(),
            interval: self.quote_interval.clone(),
            output_size: self.quote_output_size,
        }
    }
}

/// Split a comma separated symbol list, dropping blanks
pub fn parse_symbols(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
