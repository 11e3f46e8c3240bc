//! Error types shared by the report sync crates.

use thiserror::Error;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error for the report sync engine.
#[derive(Debug, Error)]
pub enum Error {
    /// Local persistence failed. Fatal for the call that hit it and never
    /// retried automatically.
    #[error("Storage error: {0}")]
    Storage(#[from] DatabaseError),

    /// Remote delivery failed. Callers of a batch never see this directly;
    /// it is recorded against the report instead.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Failures of the local report store.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// A failed delivery attempt against the remote collector.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The collector answered with a non-success status.
    #[error("Collector rejected report ({status}): {body}")]
    Rejected { status: u16, body: String },

    /// The request never produced a response (connect, timeout, TLS...).
    #[error("Network error: {0}")]
    Network(String),

    /// The collector answered 2xx but the body could not be understood.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl TransportError {
    pub fn rejected(status: u16, body: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            body: body.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// HTTP status if the collector produced one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_exposes_status_only_when_rejected() {
        assert_eq!(
            TransportError::rejected(503, "busy").status_code(),
            Some(503)
        );
        assert_eq!(TransportError::network("refused").status_code(), None);
    }

    #[test]
    fn storage_error_wraps_database_error() {
        let err: Error = DatabaseError::ConnectionFailed("disk full".to_string()).into();
        assert!(matches!(err, Error::Storage(_)));
        assert_eq!(
            err.to_string(),
            "Storage error: Connection failed: disk full"
        );
    }
}
