use utoipa::OpenApi;

use crate::api::{job_handlers, market_handlers};
use crate::api::responses::*;
use crate::database::models::{JobStatus, ScrapeSettings, SymbolMetadata};
use crate::market_data::{AlertResult, LocalizedTimestamp, MovingAveragePoint, PriceAlert};
use crate::metrics::ScrapeStatsSnapshot;

/// OpenAPI specification
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Market Scraper API",
        version = "0.1.0",
        description = "Scheduled market quote scraping with latest price, history and analytics endpoints",
        license(
            name = "MIT"
        )
    ),
    paths(
        market_handlers::health_check,
        market_handlers::get_latest_price,
        market_handlers::get_price_history,
        market_handlers::get_moving_average,
        market_handlers::check_alerts,
        job_handlers::automate_scrap,
    ),
    components(
        schemas(
            LatestPriceEntry,
            LatestPriceResponse,
            PriceHistoryEntry,
            PriceHistoryResponse,
            MovingAverageResponse,
            CheckAlertsRequest,
            CheckAlertsResponse,
            JobOperationResponse,
            HealthResponse,
            ErrorResponse,
            LocalizedTimestamp,
            SymbolMetadata,
            MovingAveragePoint,
            PriceAlert,
            AlertResult,
            JobStatus,
            ScrapeSettings,
            ScrapeStatsSnapshot,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "market", description = "Latest prices, history and analytics"),
        (name = "scrape", description = "Automated scrape job control"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_market_paths() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();

        assert!(paths.iter().any(|p| p.as_str() == "/market/latest-price"));
        assert!(paths.iter().any(|p| p.as_str() == "/market/automate-scrap/{ops}"));
    }
}
