use application::{
    store_call::StoreCallError,
    usecases::{entitlements::EntitlementError, payment_review::ReviewError},
};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub retryable: bool,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Review(#[from] ReviewError),

    #[error(transparent)]
    Entitlement(#[from] EntitlementError),

    #[error(transparent)]
    Store(#[from] StoreCallError),
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, bool) {
        match self {
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request", false),
            AppError::Review(err) => (err.status_code(), err.code(), err.is_retryable()),
            AppError::Entitlement(EntitlementError::InsufficientTier { .. }) => {
                (StatusCode::FORBIDDEN, "insufficient_tier", false)
            }
            AppError::Entitlement(err) => (err.status_code(), "unavailable", true),
            AppError::Store(StoreCallError::Timeout { .. }) => {
                (StatusCode::SERVICE_UNAVAILABLE, "timeout", true)
            }
            AppError::Store(StoreCallError::Failed(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal", true)
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, retryable) = self.parts();

        // Don't leak internal error detail to client
        let message = if status.is_server_error() {
            error!(error = ?self, "http: request failed");
            if retryable {
                "Service temporarily unavailable, please retry".to_string()
            } else {
                "Internal server error".to_string()
            }
        } else {
            self.to_string()
        };

        let body = Json(ErrorResponse {
            code: code.to_string(),
            message,
            retryable,
        });

        (status, body).into_response()
    }
}
