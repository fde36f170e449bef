// Analysis Error Taxonomy
// Every failure of a request maps onto one variant; HTTP mapping lives here too

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::{error, warn};

use crate::models::ErrorBody;
use crate::services::history_store::StoreError;
use crate::services::providers::ProviderError;
use crate::services::text_processor::UploadError;

/// Which of the two scoring calls an upstream failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringCall {
    Ai,
    Plagiarism,
}

impl ScoringCall {
    fn failure_message(self) -> &'static str {
        match self {
            ScoringCall::Ai => "AI detection analysis failed",
            ScoringCall::Plagiarism => "Plagiarism analysis failed",
        }
    }
}

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("authentication required")]
    Unauthorized,
    #[error("analysis not found")]
    NotFound,
    #[error("configuration missing: {0}")]
    Configuration(String),
    #[error("{call:?} scoring call failed (status {status:?}): {message}")]
    Upstream {
        call: ScoringCall,
        status: Option<u16>,
        message: String,
    },
    #[error("{call:?} scoring payload malformed: {message}")]
    Parse { call: ScoringCall, message: String },
    #[error("internal error: {0}")]
    Internal(String),
}

impl AnalysisError {
    /// Lift a provider failure into the taxonomy, remembering which call failed.
    pub fn from_provider(call: ScoringCall, err: ProviderError) -> Self {
        match err {
            ProviderError::MissingApiKey => {
                AnalysisError::Configuration("scoring API key not configured".to_string())
            }
            ProviderError::ApiError { status, message } => AnalysisError::Upstream {
                call,
                status: Some(status),
                message,
            },
            ProviderError::HttpError(e) => AnalysisError::Upstream {
                call,
                status: e.status().map(|s| s.as_u16()),
                message: e.to_string(),
            },
            ProviderError::MissingContent => AnalysisError::Upstream {
                call,
                status: None,
                message: "missing content in response".to_string(),
            },
            ProviderError::JsonError(message) => AnalysisError::Upstream {
                call,
                status: None,
                message,
            },
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AnalysisError::Validation(_) => StatusCode::BAD_REQUEST,
            AnalysisError::Unauthorized => StatusCode::UNAUTHORIZED,
            AnalysisError::NotFound => StatusCode::NOT_FOUND,
            AnalysisError::Configuration(_)
            | AnalysisError::Upstream { .. }
            | AnalysisError::Parse { .. }
            | AnalysisError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to hand back to a caller. Server-side details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            AnalysisError::Validation(msg) => msg.clone(),
            AnalysisError::Unauthorized => "Authentication required".to_string(),
            AnalysisError::NotFound => "Analysis not found".to_string(),
            AnalysisError::Configuration(_) => "Scoring provider is not configured".to_string(),
            AnalysisError::Upstream { call, .. } => call.failure_message().to_string(),
            AnalysisError::Parse { .. } => {
                "Scoring provider returned an unexpected response".to_string()
            }
            AnalysisError::Internal(_) => "Analysis failed".to_string(),
        }
    }
}

impl From<StoreError> for AnalysisError {
    fn from(err: StoreError) -> Self {
        AnalysisError::Internal(err.to_string())
    }
}

impl From<UploadError> for AnalysisError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Extraction(msg) => AnalysisError::Internal(msg),
            other => AnalysisError::Validation(other.to_string()),
        }
    }
}

impl IntoResponse for AnalysisError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            AnalysisError::Upstream { call, status: upstream_status, message } => {
                error!(
                    call = ?call,
                    upstream_status = ?upstream_status,
                    "[API] upstream scoring failure: {}",
                    message
                );
            }
            e if status.is_server_error() => error!("[API] request failed: {}", e),
            e => warn!("[API] request rejected: {}", e),
        }

        let body = ErrorBody { error: self.public_message() };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AnalysisError::Validation("Text is required".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AnalysisError::Configuration("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(AnalysisError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_public_message_hides_details() {
        let err = AnalysisError::from_provider(
            ScoringCall::Plagiarism,
            ProviderError::ApiError { status: 429, message: "quota for key sk-123".into() },
        );
        assert_eq!(err.public_message(), "Plagiarism analysis failed");
        assert!(!err.public_message().contains("sk-123"));

        let err = AnalysisError::from_provider(ScoringCall::Ai, ProviderError::MissingApiKey);
        assert!(matches!(err, AnalysisError::Configuration(_)));
        assert_eq!(err.public_message(), "Scoring provider is not configured");
    }
}
