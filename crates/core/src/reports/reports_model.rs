//! Offline report domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Locally assigned report identifier. Monotonic, never reused.
pub type ReportId = i64;

/// Delivery state of a locally stored report.
///
/// The only legal transition is `Pending -> Synced`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Pending,
    Synced,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Synced => "synced",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "synced" => Some(Self::Synced),
            _ => None,
        }
    }
}

/// Report body as submitted by the field worker.
///
/// Both blobs are forwarded verbatim to the collector; nothing in the sync
/// engine looks inside them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportPayload {
    pub patient: serde_json::Value,
    pub meta: serde_json::Value,
}

impl ReportPayload {
    pub fn new(patient: serde_json::Value, meta: serde_json::Value) -> Self {
        Self { patient, meta }
    }
}

/// A submission held in the local store until the collector confirms it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfflineReportRecord {
    pub id: ReportId,
    /// Idempotency key sent with every delivery attempt.
    pub client_ref: String,
    pub payload: ReportPayload,
    pub status: ReportStatus,
    pub attempt_count: i32,
    pub last_error: Option<String>,
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub synced_at: Option<DateTime<Utc>>,
}

impl OfflineReportRecord {
    pub fn is_pending(&self) -> bool {
        self.status == ReportStatus::Pending
    }
}

/// Collector acknowledgement for one delivered report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    /// Parsed response body, if the collector returned one.
    pub response: serde_json::Value,
}
