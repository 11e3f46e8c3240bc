//! Core helpers for report sync orchestration.

use serde::{Deserialize, Serialize};

use crate::errors::TransportError;

/// Retry classification for delivery failures.
///
/// Reports are retried on every trigger regardless of class; the class only
/// decides how loudly a failure is logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncRetryClass {
    Retryable,
    Permanent,
}

/// Classify HTTP status into retry behavior.
pub fn classify_http_status(status: u16) -> SyncRetryClass {
    match status {
        408 | 409 | 423 | 425 | 429 => SyncRetryClass::Retryable,
        500..=599 => SyncRetryClass::Retryable,
        _ => SyncRetryClass::Permanent,
    }
}

pub fn classify_transport_error(err: &TransportError) -> SyncRetryClass {
    match err {
        TransportError::Rejected { status, .. } => classify_http_status(*status),
        TransportError::Network(_) => SyncRetryClass::Retryable,
        TransportError::InvalidResponse(_) => SyncRetryClass::Permanent,
    }
}

pub fn retry_class_code(class: SyncRetryClass) -> &'static str {
    match class {
        SyncRetryClass::Retryable => "retryable",
        SyncRetryClass::Permanent => "permanent",
    }
}
