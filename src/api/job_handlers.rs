use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::jobs::StopOutcome;

use super::error::ApiError;
use super::responses::*;
use super::routes::AppState;

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct AutomateScrapQuery {
    /// Interval between cycles in milliseconds, required for `start`
    pub interval: Option<String>,
}

/// Control the automated scrape job
///
/// `start` (re)starts the job, `stop` cancels it if this process runs it,
/// `status` reports liveness and the persisted settings.
#[utoipa::path(
    get,
    path = "/market/automate-scrap/{ops}",
    tag = "scrape",
    params(
        ("ops" = String, Path, description = "start | stop | status"),
        AutomateScrapQuery
    ),
    responses(
        (status = 200, description = "Operation applied", body = JobOperationResponse),
        (status = 400, description = "Invalid operation or interval", body = JobOperationResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn automate_scrap(
    State(state): State<AppState>,
    Path(ops): Path<String>,
    Query(params): Query<AutomateScrapQuery>,
) -> Result<Json<JobOperationResponse>, ApiError> {
    match ops.as_str() {
        "start" => {
            let interval_ms = params
                .interval
                .as_deref()
                .and_then(|s| s.trim().parse::<i64>().ok())
                .ok_or_else(|| {
                    ApiError::BadRequest("'interval' must be a number of milliseconds".to_string())
                })?;

            let settings = state.scrape_jobs.start(interval_ms).await?;
            Ok(Json(JobOperationResponse::started(interval_ms, settings)))
        }
        "stop" => {
            let message = match state.scrape_jobs.stop().await? {
                StopOutcome::Stopped => "Automated scrap stopped",
                StopOutcome::NotRunning => "Automated scrap is not running",
            };
            Ok(Json(JobOperationResponse::message(message)))
        }
        "status" => {
            let status = state.scrape_jobs.status().await?;
            Ok(Json(JobOperationResponse::from(status)))
        }
        other => {
            tracing::warn!("Rejected scrape job operation '{}'", other);
            Err(ApiError::InvalidOperation)
        }
    }
}
