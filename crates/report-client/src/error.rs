//! Error types for the report submission client.

use nirogya_core::errors::TransportError;
use nirogya_core::sync::SyncRetryClass;
use thiserror::Error;

/// Result type alias for collector client operations.
pub type Result<T> = std::result::Result<T, ReportClientError>;

/// Errors that can occur while talking to the report collector.
#[derive(Debug, Error)]
pub enum ReportClientError {
    /// HTTP client error (connect, timeout, TLS, body read)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Non-success response from the collector
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Invalid client configuration or request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ReportClientError {
    /// Create an API error from status and message
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create an invalid request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Classify error for retry logging.
    pub fn retry_class(&self) -> SyncRetryClass {
        match self {
            Self::Api { status, .. } => nirogya_core::sync::classify_http_status(*status),
            Self::Http(_) => SyncRetryClass::Retryable,
            Self::Json(_) => SyncRetryClass::Permanent,
            Self::InvalidRequest(_) => SyncRetryClass::Permanent,
        }
    }
}

impl From<ReportClientError> for TransportError {
    fn from(err: ReportClientError) -> Self {
        match err {
            ReportClientError::Api { status, message } => TransportError::rejected(status, message),
            ReportClientError::Http(e) => TransportError::network(e.to_string()),
            ReportClientError::Json(e) => TransportError::InvalidResponse(e.to_string()),
            ReportClientError::InvalidRequest(message) => TransportError::network(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_keeps_status_and_body() {
        let transport: TransportError =
            ReportClientError::api(422, "Request failed: missing patient").into();
        assert_eq!(transport.status_code(), Some(422));
        assert!(transport.to_string().contains("missing patient"));
    }

    #[test]
    fn retry_class_follows_status() {
        assert_eq!(
            ReportClientError::api(503, "down").retry_class(),
            SyncRetryClass::Retryable
        );
        assert_eq!(
            ReportClientError::api(400, "bad").retry_class(),
            SyncRetryClass::Permanent
        );
    }
}
