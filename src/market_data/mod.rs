/// Market data pipeline
///
/// quote source → transform → storage gateway, plus the read-side analytics
/// and the timestamp formatter used by API responses.

pub mod analytics;
pub mod formatter;
pub mod quote_client;
pub mod service;
pub mod transform;

pub use analytics::{AlertResult, MovingAveragePoint, PriceAlert, DEFAULT_MOVING_AVERAGE_PERIOD};
pub use formatter::{localize, LocalizedTimestamp};
pub use quote_client::{FetchOutcome, QuoteRequest, QuoteSource, QuoteSourceError, TwelveDataClient};
pub use service::{MarketDataService, SymbolInsertReport};
pub use transform::{transform, TransformError};
