//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use lifecycle::LifecycleError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Coordinator error.
    Lifecycle(LifecycleError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Lifecycle(err) => lifecycle_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn lifecycle_error_to_response(err: LifecycleError) -> (StatusCode, String) {
    match &err {
        LifecycleError::Validation(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        LifecycleError::OrderNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        LifecycleError::InvalidTransition { .. } => (StatusCode::CONFLICT, err.to_string()),
        LifecycleError::Configuration(_)
        | LifecycleError::Store(_)
        | LifecycleError::CorruptOrder { .. }
        | LifecycleError::DuplicateOrder(_) => {
            tracing::error!(error = %err, "internal server error");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

impl From<LifecycleError> for ApiError {
    fn from(err: LifecycleError) -> Self {
        ApiError::Lifecycle(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::OrderId;
    use domain::{OrderState, ValidationError};

    fn status_of(err: LifecycleError) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_of(LifecycleError::Validation(ValidationError::NoItems)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(LifecycleError::OrderNotFound(OrderId::new())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(LifecycleError::InvalidTransition {
                order_id: OrderId::new(),
                current: OrderState::Created,
                attempted: OrderState::Closed,
            }),
            StatusCode::CONFLICT
        );
    }
}
