//! Background triggers for report sync batches.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::connectivity::ConnectivityState;
use super::report_sync_service::ReportSyncService;

/// Periodic batch cadence in seconds.
pub const REPORT_SYNC_INTERVAL_SECS: u64 = 30;

/// Owns the periodic and reconnect trigger tasks.
///
/// Tasks are aborted on [`shutdown`](SyncScheduler::shutdown) or drop.
#[derive(Debug)]
pub struct SyncScheduler {
    tasks: Vec<JoinHandle<()>>,
}

impl SyncScheduler {
    /// Spawns the trigger tasks on the current tokio runtime.
    ///
    /// The periodic timer ticks immediately once, so reports left over from
    /// a previous run are picked up at startup when online.
    pub fn start(service: Arc<ReportSyncService>, interval: Duration) -> Self {
        info!(
            "[ReportSync] Starting scheduler (interval={}s)",
            interval.as_secs()
        );
        // Subscribe before spawning so a transition right after start is not missed.
        let connectivity_rx = service.connectivity().subscribe();
        let periodic = tokio::spawn(run_periodic_trigger(Arc::clone(&service), interval));
        let reconnect = tokio::spawn(run_reconnect_trigger(service, connectivity_rx));
        Self {
            tasks: vec![periodic, reconnect],
        }
    }

    pub fn is_running(&self) -> bool {
        !self.tasks.is_empty() && self.tasks.iter().all(|task| !task.is_finished())
    }

    pub fn shutdown(&mut self) {
        if self.tasks.is_empty() {
            return;
        }
        info!("[ReportSync] Stopping scheduler");
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

impl Drop for SyncScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn run_periodic_trigger(service: Arc<ReportSyncService>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        if !service.connectivity().is_online() {
            continue;
        }
        match service.pending_count() {
            Ok(0) => continue,
            Ok(_) => {}
            Err(err) => {
                warn!("[ReportSync] Periodic trigger could not read pending count: {}", err);
                continue;
            }
        }
        match service.sync_batch().await {
            Ok(result) => debug!(
                "[ReportSync] Periodic batch success={} failed={}",
                result.success, result.failed
            ),
            Err(err) => warn!("[ReportSync] Periodic batch failed: {}", err),
        }
    }
}

async fn run_reconnect_trigger(
    service: Arc<ReportSyncService>,
    mut rx: watch::Receiver<ConnectivityState>,
) {
    let mut seen_reconnects = rx.borrow_and_update().reconnects;
    while rx.changed().await.is_ok() {
        let state = *rx.borrow_and_update();
        if state.reconnects == seen_reconnects {
            continue;
        }
        seen_reconnects = state.reconnects;
        if !state.online {
            continue;
        }
        info!("[ReportSync] Connectivity regained, running batch");
        match service.sync_batch().await {
            Ok(result) => debug!(
                "[ReportSync] Reconnect batch success={} failed={}",
                result.success, result.failed
            ),
            Err(err) => warn!("[ReportSync] Reconnect batch failed: {}", err),
        }
    }
}
