//! Response envelope and API errors.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

/// Envelope shared by every `/api` response.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

impl ApiResponse<()> {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Result type for route handlers
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// Errors surfaced over HTTP
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Session ID required")]
    MissingSession,

    #[error("Invalid session ID: {0}")]
    InvalidSession(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{message}")]
    InvalidBody { status: StatusCode, message: String },

    #[error(transparent)]
    Core(#[from] ember_core::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        use ember_core::Error as CoreError;

        match self {
            Self::MissingSession | Self::InvalidSession(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidBody { status, .. } => *status,
            Self::Core(e) => match e {
                CoreError::NotFound { .. } => StatusCode::NOT_FOUND,
                CoreError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
                CoreError::GenerationFailed(_) => StatusCode::BAD_GATEWAY,
                CoreError::Unconfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Internal details stay in the log
        let message = if status.is_server_error() && status != StatusCode::SERVICE_UNAVAILABLE {
            error!(error = %self, status = status.as_u16(), "Request failed");
            match status {
                StatusCode::BAD_GATEWAY => "Suggestion generation failed".to_string(),
                _ => "Internal server error".to_string(),
            }
        } else {
            warn!(error = %self, status = status.as_u16(), "Request rejected");
            self.to_string()
        };

        (status, Json(ApiResponse::failure(message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::MissingSession.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::InvalidBody {
                status: StatusCode::UNSUPPORTED_MEDIA_TYPE,
                message: "Expected JSON".into(),
            }
            .status(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
        assert_eq!(
            ApiError::from(ember_core::Error::not_found("s", "c")).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(ember_core::Error::invalid("bad")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(ember_core::Error::generation("boom")).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::from(ember_core::Error::Unconfigured("no key".into())).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::from(ember_core::Error::LockPoisoned).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_envelope_shape() {
        let ok = serde_json::to_value(&ApiResponse::ok(42).0).unwrap();
        assert_eq!(ok, serde_json::json!({ "success": true, "data": 42 }));

        let err = serde_json::to_value(ApiResponse::failure("nope")).unwrap();
        assert_eq!(err, serde_json::json!({ "success": false, "error": "nope" }));
    }
}
