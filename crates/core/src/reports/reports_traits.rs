use async_trait::async_trait;

use super::reports_model::{OfflineReportRecord, ReportId, ReportPayload, SubmissionReceipt};
use crate::errors::{Result, TransportError};

/// Durable local queue of report submissions.
///
/// Reads are synchronous and cheap; writes go through the store's single
/// writer and are therefore async.
#[async_trait]
pub trait ReportStoreTrait: Send + Sync {
    /// Persists a new pending report and returns its id.
    async fn save_report(&self, payload: ReportPayload) -> Result<ReportId>;

    fn get_pending_count(&self) -> Result<i64>;

    /// Pending reports in creation order.
    fn get_pending_reports(&self) -> Result<Vec<OfflineReportRecord>>;

    fn get_report(&self, id: ReportId) -> Result<Option<OfflineReportRecord>>;

    /// No-op when the report is missing or already synced.
    async fn mark_as_synced(&self, id: ReportId) -> Result<()>;

    /// Records one failed delivery attempt.
    async fn update_sync_attempt(&self, id: ReportId, error_message: String) -> Result<()>;

    /// Deletes every synced report, returning how many were removed.
    async fn clear_synced_reports(&self) -> Result<usize>;
}

/// Delivers one report to the remote collector.
#[async_trait]
pub trait ReportSubmitterTrait: Send + Sync {
    async fn submit(
        &self,
        payload: &ReportPayload,
        client_ref: &str,
    ) -> std::result::Result<SubmissionReceipt, TransportError>;
}
