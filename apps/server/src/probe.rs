//! Periodic collector reachability probe feeding the connectivity monitor.

use std::sync::Arc;
use std::time::Duration;

use nirogya_core::sync::ConnectivityMonitor;
use nirogya_report_client::ReportSubmissionClient;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub fn spawn_connectivity_probe(
    client: Arc<ReportSubmissionClient>,
    connectivity: ConnectivityMonitor,
    interval: Duration,
) -> JoinHandle<()> {
    tracing::info!(
        "Starting connectivity probe against {} every {}s",
        client.base_url(),
        interval.as_secs()
    );
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let reachable = client.probe().await;
            if connectivity.set_online(reachable) {
                tracing::info!("Collector is now {}", if reachable { "reachable" } else { "unreachable" });
            }
        }
    })
}
