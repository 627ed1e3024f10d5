use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::database::DatabaseError;
use crate::jobs::ScrapeJobError;

use super::responses::{ErrorResponse, JobOperationResponse};

/// Errors surfaced by the HTTP handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Invalid operation")]
    InvalidOperation,

    #[error(transparent)]
    Storage(#[from] DatabaseError),

    #[error(transparent)]
    Job(#[from] ScrapeJobError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            ApiError::InvalidOperation => {
                let body = JobOperationResponse::failure(self.to_string());
                return (StatusCode::BAD_REQUEST, Json(body)).into_response();
            }
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::Job(ScrapeJobError::InvalidInterval(_)) => {
                (StatusCode::BAD_REQUEST, "invalid_interval")
            }
            ApiError::Storage(_) | ApiError::Job(ScrapeJobError::Storage(_)) => {
                tracing::error!("Storage failure: {}", self);
                (StatusCode::INTERNAL_SERVER_ERROR, "storage_error")
            }
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message: self.to_string(),
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::BadRequest("x".to_string()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::InvalidOperation.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(ScrapeJobError::InvalidInterval(0)).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(DatabaseError::QueryError("boom".to_string())).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
