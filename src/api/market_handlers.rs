use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::config::parse_symbols;
use crate::market_data::DEFAULT_MOVING_AVERAGE_PERIOD;

use super::error::ApiError;
use super::responses::*;
use super::routes::AppState;

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct LatestPriceQuery {
    /// Comma separated symbols, e.g. `INFY:BSE,AAPL`
    pub symbol: Option<String>,
}

/// Latest price per symbol with localized timestamps
#[utoipa::path(
    get,
    path = "/market/latest-price",
    tag = "market",
    params(LatestPriceQuery),
    responses(
        (status = 200, description = "Latest price per known symbol", body = LatestPriceResponse),
        (status = 400, description = "Missing symbol parameter", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn get_latest_price(
    State(state): State<AppState>,
    Query(params): Query<LatestPriceQuery>,
) -> Result<Json<LatestPriceResponse>, ApiError> {
    let symbols = params.symbol.as_deref().map(parse_symbols).unwrap_or_default();
    if symbols.is_empty() {
        return Err(ApiError::BadRequest(
            "Missing 'symbol' query parameter".to_string(),
        ));
    }

    let latest = state.market_data.latest_prices(symbols).await?;

    Ok(Json(LatestPriceResponse {
        success: true,
        data: latest.into_iter().map(LatestPriceEntry::from).collect(),
    }))
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct HistoryQuery {
    /// Start time (RFC3339), defaults to 24 hours before `end`
    pub start: Option<String>,
    /// End time (RFC3339), defaults to now
    pub end: Option<String>,
}

fn parse_timestamp(name: &str, value: Option<&str>) -> Result<Option<DateTime<Utc>>, ApiError> {
    value
        .map(DateTime::parse_from_rfc3339)
        .transpose()
        .map(|dt| dt.map(|dt| dt.with_timezone(&Utc)))
        .map_err(|e| ApiError::BadRequest(format!("Invalid '{}' timestamp: {}", name, e)))
}

/// Stored ticks of a symbol in a closed time range, ascending
#[utoipa::path(
    get,
    path = "/market/history/{symbol}",
    tag = "market",
    params(
        ("symbol" = String, Path, description = "Symbol, e.g. AAPL"),
        HistoryQuery
    ),
    responses(
        (status = 200, description = "Ticks in range", body = PriceHistoryResponse),
        (status = 400, description = "Invalid range", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn get_price_history(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(params): Query<HistoryQuery>,
) -> Result<Json<PriceHistoryResponse>, ApiError> {
    let end = parse_timestamp("end", params.end.as_deref())?.unwrap_or_else(Utc::now);
    let start = parse_timestamp("start", params.start.as_deref())?
        .unwrap_or_else(|| end - chrono::Duration::hours(24));

    if start > end {
        return Err(ApiError::BadRequest(
            "'start' must not be after 'end'".to_string(),
        ));
    }

    let ticks = state
        .market_data
        .price_history(symbol.clone(), start, end)
        .await?;

    let data: Vec<PriceHistoryEntry> = ticks.into_iter().map(PriceHistoryEntry::from).collect();

    Ok(Json(PriceHistoryResponse {
        success: true,
        symbol,
        count: data.len(),
        data,
    }))
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct MovingAverageQuery {
    /// Window size in ticks (default 20)
    pub period: Option<usize>,
}

/// Trailing moving average of close prices
#[utoipa::path(
    get,
    path = "/market/moving-average/{symbol}",
    tag = "market",
    params(
        ("symbol" = String, Path, description = "Symbol, e.g. AAPL"),
        MovingAverageQuery
    ),
    responses(
        (status = 200, description = "Moving average series", body = MovingAverageResponse),
        (status = 400, description = "Invalid period", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn get_moving_average(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(params): Query<MovingAverageQuery>,
) -> Result<Json<MovingAverageResponse>, ApiError> {
    let period = params.period.unwrap_or(DEFAULT_MOVING_AVERAGE_PERIOD);
    if period == 0 {
        return Err(ApiError::BadRequest("'period' must be positive".to_string()));
    }

    let data = state.market_data.moving_average(symbol.clone(), period).await?;

    Ok(Json(MovingAverageResponse {
        success: true,
        symbol,
        period,
        data,
    }))
}

/// Evaluate price alerts against latest prices
#[utoipa::path(
    post,
    path = "/market/alerts",
    tag = "market",
    request_body = CheckAlertsRequest,
    responses(
        (status = 200, description = "Evaluated alerts, unknown symbols omitted", body = CheckAlertsResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn check_alerts(
    State(state): State<AppState>,
    Json(request): Json<CheckAlertsRequest>,
) -> Result<Json<CheckAlertsResponse>, ApiError> {
    let data = state.market_data.check_alerts(request.alerts).await?;

    Ok(Json(CheckAlertsResponse {
        success: true,
        data,
    }))
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
    })
}
