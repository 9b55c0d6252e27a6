//! API error handling module
//!
//! Provides a unified error type for all API endpoints with structured error variants.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use lens_core::{AnalysisError, VisionApiError};
use thiserror::Error;

/// Client-facing message for any failed image analysis
pub const ANALYSIS_FAILED_MESSAGE: &str = "An error occurred while analyzing the image";

/// API error type with structured variants for different error categories
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad request - client provided invalid input
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Vision service failure on the proxy endpoint
    #[error("Vision error: {0}")]
    Vision(#[from] VisionApiError),

    /// Analysis pipeline failure
    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),
}

impl ApiError {
    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Analysis(AnalysisError::ImageUnreadable(_)) => StatusCode::BAD_REQUEST,
            Self::Vision(_) | Self::Analysis(AnalysisError::Vision(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get the error code for programmatic error handling
    fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "INVALID_INPUT",
            Self::Analysis(AnalysisError::ImageUnreadable(_)) => "IMAGE_UNREADABLE",
            Self::Vision(_) | Self::Analysis(AnalysisError::Vision(_)) => "ANALYSIS_FAILED",
        }
    }

    /// Get sanitized error message for client response
    fn client_message(&self) -> String {
        match self {
            Self::Vision(_) | Self::Analysis(AnalysisError::Vision(_)) => {
                ANALYSIS_FAILED_MESSAGE.to_string()
            }
            Self::Analysis(AnalysisError::ImageUnreadable(_)) => {
                "Uploaded image could not be read".to_string()
            }
            Self::BadRequest(_) => self.to_string(),
        }
    }

    /// Get the error category for logging
    fn error_category(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::Vision(_) => "vision",
            Self::Analysis(_) => "analysis",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let category = self.error_category();
        let code = self.error_code();
        let internal_message = self.to_string();
        let client_message = self.client_message();

        // Log based on severity, always including internal details
        if status.is_client_error() {
            tracing::warn!(
                status = %status,
                category = category,
                code = code,
                error = %internal_message,
                "Client error"
            );
        } else {
            tracing::error!(
                status = %status,
                category = category,
                code = code,
                error = %internal_message,
                client_message = %client_message,
                "Server error (internal details logged)"
            );
        }

        // All error responses include a `code` field for programmatic error handling
        let body = serde_json::json!({
            "error": client_message,
            "code": code,
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lens_core::HashError;

    #[test]
    fn test_vision_errors_are_sanitized() {
        let err = ApiError::from(VisionApiError::Status {
            status: 403,
            body: "API key AIza... not valid".into(),
        });
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.client_message(), ANALYSIS_FAILED_MESSAGE);
        assert!(!err.client_message().contains("AIza"));
    }

    #[test]
    fn test_unreadable_image_is_client_error() {
        let err = ApiError::from(AnalysisError::ImageUnreadable(HashError::NotFound(
            "upload".into(),
        )));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "IMAGE_UNREADABLE");
    }

    #[test]
    fn test_bad_request_keeps_message() {
        let err = ApiError::bad_request("imageUri is required");
        assert_eq!(err.client_message(), "Bad request: imageUri is required");
    }
}
