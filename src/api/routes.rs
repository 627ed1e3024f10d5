use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::jobs::ScrapeJobController;
use crate::market_data::MarketDataService;

use super::job_handlers::*;
use super::market_handlers::*;
use super::openapi::ApiDoc;

/// Shared state for all handlers
#[derive(Clone)]
pub struct AppState {
    pub market_data: MarketDataService,
    pub scrape_jobs: Arc<ScrapeJobController>,
}

/// Create the API router with Swagger UI
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(health_check))
        // Market data
        .route("/market/latest-price", get(get_latest_price))
        .route("/market/history/:symbol", get(get_price_history))
        .route("/market/moving-average/:symbol", get(get_moving_average))
        .route("/market/alerts", post(check_alerts))
        // Scrape job control
        .route("/market/automate-scrap/:ops", get(automate_scrap))
        .with_state(state)
}
