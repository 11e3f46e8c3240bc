//! Report sync controller: batch drain and submit-then-sync.

use std::sync::Arc;

use chrono::Utc;
use log::{debug, error, info, warn};
use tokio::sync::{Mutex, MutexGuard};

use super::connectivity::ConnectivityMonitor;
use super::report_sync_engine::{classify_transport_error, retry_class_code};
use super::report_sync_model::{
    SaveAndSyncResult, SyncBatchResult, SyncStatus, OFFLINE_WILL_RETRY, SAVED_OFFLINE_WILL_RETRY,
    SYNC_IN_PROGRESS_WILL_RETRY,
};
use super::status_broadcaster::{StatusBroadcaster, StatusSubscription};
use crate::errors::{DatabaseError, Error, Result, TransportError};
use crate::reports::{
    OfflineReportRecord, ReportPayload, ReportStoreTrait, ReportSubmitterTrait,
};

/// Keeps `syncing` truthful even if the batch future is dropped mid-flight
/// (scheduler shutdown aborts its tasks).
struct BatchInFlight<'a> {
    _guard: MutexGuard<'a, ()>,
    broadcaster: &'a StatusBroadcaster,
    finished: bool,
}

impl Drop for BatchInFlight<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.broadcaster.update(|status| status.syncing = false);
        }
    }
}

struct BatchOutcome {
    result: SyncBatchResult,
    aborted_offline: bool,
}

/// Orchestrates delivery of locally stored reports.
///
/// Construct one per process and share it through an `Arc`. Every path that
/// delivers reports takes `sync_guard` with `try_lock`, so a batch and an
/// immediate submission never send the same record concurrently.
pub struct ReportSyncService {
    store: Arc<dyn ReportStoreTrait>,
    submitter: Arc<dyn ReportSubmitterTrait>,
    connectivity: ConnectivityMonitor,
    broadcaster: StatusBroadcaster,
    sync_guard: Mutex<()>,
}

impl ReportSyncService {
    pub fn new(
        store: Arc<dyn ReportStoreTrait>,
        submitter: Arc<dyn ReportSubmitterTrait>,
        connectivity: ConnectivityMonitor,
    ) -> Self {
        Self {
            store,
            submitter,
            connectivity,
            broadcaster: StatusBroadcaster::new(),
            sync_guard: Mutex::new(()),
        }
    }

    pub fn connectivity(&self) -> &ConnectivityMonitor {
        &self.connectivity
    }

    pub fn broadcaster(&self) -> &StatusBroadcaster {
        &self.broadcaster
    }

    pub fn status(&self) -> SyncStatus {
        self.broadcaster.snapshot()
    }

    pub fn subscribe<F>(&self, listener: F) -> StatusSubscription
    where
        F: Fn(&SyncStatus) + Send + Sync + 'static,
    {
        self.broadcaster.subscribe(listener)
    }

    /// Loads the persisted pending count. Call once at startup, before any
    /// trigger can fire, so reports queued by a previous run are visible.
    pub fn initialize(&self) -> Result<SyncStatus> {
        let mut loaded = Ok(0);
        self.broadcaster.update(|status| {
            loaded = self.store.get_pending_count();
            if let Ok(count) = &loaded {
                status.pending_count = *count;
            }
        });
        let pending_count = loaded?;
        info!(
            "[ReportSync] Initialized with {} pending report(s)",
            pending_count
        );
        Ok(self.status())
    }

    pub fn pending_count(&self) -> Result<i64> {
        self.store.get_pending_count()
    }

    pub fn pending_reports(&self) -> Result<Vec<OfflineReportRecord>> {
        self.store.get_pending_reports()
    }

    /// Attempts delivery of every pending report, in creation order.
    ///
    /// Returns zero counts without doing work when offline or when another
    /// batch (or an immediate submission) holds the sync guard.
    pub async fn sync_batch(&self) -> Result<SyncBatchResult> {
        if !self.connectivity.is_online() {
            debug!("[ReportSync] Offline, skipping batch");
            return Ok(SyncBatchResult::default());
        }
        let guard = match self.sync_guard.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                debug!("[ReportSync] Batch already in flight, rejecting");
                return Ok(SyncBatchResult::default());
            }
        };
        let mut in_flight = BatchInFlight {
            _guard: guard,
            broadcaster: &self.broadcaster,
            finished: false,
        };

        self.broadcaster.update(|status| status.syncing = true);
        let started_at = std::time::Instant::now();
        let outcome = self.run_batch().await;

        self.broadcaster.update(|status| {
            let pending_count = self.store.get_pending_count();
            status.syncing = false;
            status.error = match (&outcome, &pending_count) {
                (Err(err), _) => Some(err.to_string()),
                (Ok(_), Err(err)) => Some(err.to_string()),
                (Ok(outcome), Ok(_)) if outcome.aborted_offline => {
                    Some(OFFLINE_WILL_RETRY.to_string())
                }
                (Ok(outcome), Ok(_)) if outcome.result.failed > 0 => Some(format!(
                    "{} report(s) failed to sync, will retry",
                    outcome.result.failed
                )),
                _ => None,
            };
            if let Ok(count) = pending_count {
                status.pending_count = count;
            }
            if outcome.is_ok() {
                status.last_sync_time = Some(Utc::now());
            }
        });
        in_flight.finished = true;

        let outcome = outcome?;
        info!(
            "[ReportSync] Batch complete success={} failed={} aborted_offline={} duration_ms={}",
            outcome.result.success,
            outcome.result.failed,
            outcome.aborted_offline,
            started_at.elapsed().as_millis()
        );
        Ok(outcome.result)
    }

    async fn run_batch(&self) -> Result<BatchOutcome> {
        let worklist = self.store.get_pending_reports()?;
        debug!("[ReportSync] Batch worklist has {} report(s)", worklist.len());

        let mut result = SyncBatchResult::default();
        for record in &worklist {
            if !self.connectivity.is_online() {
                warn!(
                    "[ReportSync] Connectivity lost mid-batch; leaving remaining reports pending"
                );
                return Ok(BatchOutcome {
                    result,
                    aborted_offline: true,
                });
            }
            match self.attempt_delivery(record).await? {
                None => result.success += 1,
                Some(_) => result.failed += 1,
            }
        }

        Ok(BatchOutcome {
            result,
            aborted_offline: false,
        })
    }

    /// One delivery attempt. `Ok(Some(err))` means the transport failed and
    /// the failure was recorded on the report.
    async fn attempt_delivery(
        &self,
        record: &OfflineReportRecord,
    ) -> Result<Option<TransportError>> {
        match self
            .submitter
            .submit(&record.payload, &record.client_ref)
            .await
        {
            Ok(_receipt) => {
                self.store.mark_as_synced(record.id).await?;
                debug!("[ReportSync] Report {} synced", record.id);
                Ok(None)
            }
            Err(err) => {
                let retry_class = classify_transport_error(&err);
                warn!(
                    "[ReportSync] Delivery of report {} failed (attempt {}, {}): {}",
                    record.id,
                    record.attempt_count + 1,
                    retry_class_code(retry_class),
                    err
                );
                self.store
                    .update_sync_attempt(record.id, err.to_string())
                    .await?;
                Ok(Some(err))
            }
        }
    }

    /// Persists a report, then tries to deliver it once right away.
    ///
    /// Only a failure to persist is returned as an error. Whatever happens
    /// afterwards, the report stays in the store for later batches.
    pub async fn save_and_sync(&self, payload: ReportPayload) -> Result<SaveAndSyncResult> {
        let report_id = self.store.save_report(payload).await?;
        debug!("[ReportSync] Saved report {} locally", report_id);

        if !self.connectivity.is_online() {
            self.publish_pending(Some(OFFLINE_WILL_RETRY.to_string()));
            return Ok(SaveAndSyncResult::deferred(report_id, OFFLINE_WILL_RETRY));
        }

        let Ok(_guard) = self.sync_guard.try_lock() else {
            debug!(
                "[ReportSync] Batch in flight; report {} left for the next batch",
                report_id
            );
            self.publish_pending(None);
            return Ok(SaveAndSyncResult::deferred(
                report_id,
                SYNC_IN_PROGRESS_WILL_RETRY,
            ));
        };

        let delivery = match self.store.get_report(report_id) {
            Ok(Some(record)) => self.attempt_delivery(&record).await,
            Ok(None) => Err(Error::Storage(DatabaseError::Internal(format!(
                "Report {} vanished after save",
                report_id
            )))),
            Err(err) => Err(err),
        };

        match delivery {
            Ok(None) => {
                self.publish_pending(None);
                Ok(SaveAndSyncResult::synced(report_id))
            }
            Ok(Some(_)) => {
                self.publish_pending(Some(SAVED_OFFLINE_WILL_RETRY.to_string()));
                Ok(SaveAndSyncResult::deferred(
                    report_id,
                    SAVED_OFFLINE_WILL_RETRY,
                ))
            }
            Err(err) => {
                error!(
                    "[ReportSync] Immediate sync of report {} failed after save: {}",
                    report_id, err
                );
                self.publish_pending(Some(err.to_string()));
                Ok(SaveAndSyncResult::deferred(
                    report_id,
                    SAVED_OFFLINE_WILL_RETRY,
                ))
            }
        }
    }

    /// Purges every synced report.
    pub async fn clear_synced_reports(&self) -> Result<usize> {
        let removed = self.store.clear_synced_reports().await?;
        info!("[ReportSync] Cleared {} synced report(s)", removed);
        Ok(removed)
    }

    /// Refreshes the pending count. The count is read inside the update so
    /// concurrent publishers cannot overwrite a newer count with an older one.
    fn publish_pending(&self, error: Option<String>) {
        self.broadcaster.update(|status| {
            match self.store.get_pending_count() {
                Ok(count) => status.pending_count = count,
                Err(err) => warn!("[ReportSync] Failed to read pending count: {}", err),
            }
            status.error = error;
        });
    }
}
