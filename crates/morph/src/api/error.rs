//! REST error mapping.
//!
//! Handlers return [`ApiError`]; the `IntoResponse` impl maps the wrapped
//! taxonomy kind to its HTTP status and serializes the shared
//! `{error_kind, message}` body. Handlers never interpret raw converter
//! errors themselves.

use crate::api::types::ErrorResponse;
use crate::error::MorphError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

/// Error wrapper for REST handlers.
#[derive(Debug)]
pub struct ApiError(pub MorphError);

impl ApiError {
    /// A malformed-request error (missing field, bad multipart part).
    pub fn invalid(message: impl Into<String>) -> Self {
        Self(MorphError::validation(message))
    }
}

impl From<MorphError> for ApiError {
    fn from(err: MorphError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let status = StatusCode::from_u16(kind.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(error_kind = kind.as_str(), error = %self.0, "request failed");
        } else {
            tracing::debug!(error_kind = kind.as_str(), error = %self.0, "request rejected");
        }

        let body = Json(ErrorResponse {
            error_kind: kind.as_str().to_string(),
            message: self.0.to_string(),
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_invalid_maps_to_bad_request_kind() {
        let err = ApiError::invalid("file field is required");
        assert_eq!(err.0.kind(), ErrorKind::InvalidEncoding);
    }

    #[test]
    fn test_status_mapping() {
        let response = ApiError(MorphError::UnknownFormat("xyz".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = ApiError(MorphError::PayloadTooLarge { size: 2, limit: 1 }).into_response();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let response = ApiError(MorphError::conversion_failed("boom")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
