use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use service::errors::ServiceError;
use thiserror::Error;
use tracing::{error, warn};

use crate::metrics;

/// Handler error. Responses carry only a status code; details go to the log.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("book not found")]
    NotFound,
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound | ApiError::Service(ServiceError::NotFound(_)) => {
                StatusCode::NOT_FOUND
            }
            ApiError::Service(ServiceError::Conflict(_)) => StatusCode::CONFLICT,
            ApiError::Service(ServiceError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Service(ServiceError::Storage(_) | ServiceError::Serialization(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Failed file writes; encoding errors and unavailability are not counted.
    pub fn is_write_failure(&self) -> bool {
        matches!(self, ApiError::Service(ServiceError::Storage(_)))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if self.is_write_failure() {
            metrics::STORE_WRITE_FAILURES_TOTAL.inc();
        }
        match &self {
            ApiError::Service(ServiceError::Storage(_)) => {
                error!(error = %self, "book store write failed");
            }
            ApiError::Service(ServiceError::Serialization(_)) => {
                error!(error = %self, "book collection serialization failed");
            }
            ApiError::Service(ServiceError::Unavailable(_)) => {
                warn!(error = %self, "book store not ready")
            }
            _ => {}
        }
        status.into_response()
    }
}
