//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::DomainError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Domain or storage error raised while handling the request.
    Domain(DomainError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Domain(err) => domain_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, String) {
    let status = match &err {
        DomainError::InvalidArgument { .. } => StatusCode::BAD_REQUEST,
        DomainError::Transient(_) => StatusCode::SERVICE_UNAVAILABLE,
        DomainError::Cancelled => StatusCode::REQUEST_TIMEOUT,
        DomainError::InvalidOperation(_) | DomainError::Storage(_) => {
            tracing::error!(error = %err, "internal server error");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, err.to_string())
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                ApiError::from(DomainError::invalid_argument("current_status", "45")),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::from(DomainError::Transient("down".into())),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                ApiError::from(DomainError::Storage("gone".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (ApiError::NotFound("x".into()), StatusCode::NOT_FOUND),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
