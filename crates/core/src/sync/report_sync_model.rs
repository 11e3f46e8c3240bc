//! Report sync status and result models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::reports::ReportId;

/// Outcome message when a report was stored while offline.
pub const OFFLINE_WILL_RETRY: &str = "offline, will retry";

/// Outcome message when the immediate delivery attempt failed.
pub const SAVED_OFFLINE_WILL_RETRY: &str = "saved offline, will retry";

/// Outcome message when a batch held the sync guard during a submission.
pub const SYNC_IN_PROGRESS_WILL_RETRY: &str = "sync in progress, will retry";

/// Live sync state published to status observers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub syncing: bool,
    pub pending_count: i64,
    pub last_sync_time: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

/// Aggregate counts for one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncBatchResult {
    pub success: usize,
    pub failed: usize,
}

impl SyncBatchResult {
    pub fn is_empty(&self) -> bool {
        self.success == 0 && self.failed == 0
    }
}

/// Result of saving a report and trying to deliver it right away.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveAndSyncResult {
    pub report_id: ReportId,
    pub saved_locally: bool,
    pub synced: bool,
    pub error: Option<String>,
}

impl SaveAndSyncResult {
    pub(crate) fn synced(report_id: ReportId) -> Self {
        Self {
            report_id,
            saved_locally: true,
            synced: true,
            error: None,
        }
    }

    pub(crate) fn deferred(report_id: ReportId, reason: &str) -> Self {
        Self {
            report_id,
            saved_locally: true,
            synced: false,
            error: Some(reason.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_camel_case() {
        let status = SyncStatus {
            syncing: true,
            pending_count: 3,
            last_sync_time: None,
            error: None,
        };
        let value = serde_json::to_value(status).unwrap();
        assert_eq!(value["pendingCount"], 3);
        assert_eq!(value["syncing"], true);
        assert!(value["lastSyncTime"].is_null());
    }

    #[test]
    fn deferred_result_keeps_record_saved() {
        let result = SaveAndSyncResult::deferred(4, OFFLINE_WILL_RETRY);
        assert!(result.saved_locally);
        assert!(!result.synced);
        assert_eq!(result.error.as_deref(), Some("offline, will retry"));
    }
}
