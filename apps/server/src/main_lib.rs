//! Application wiring shared by `main` and the route tests.

use std::sync::Arc;

use anyhow::Context;
use axum::routing::get;
use axum::{Json, Router};
use nirogya_core::sync::{ConnectivityMonitor, ReportSyncService};
use nirogya_report_client::ReportSubmissionClient;
use nirogya_storage_sqlite::{
    create_pool, init, run_migrations, spawn_writer, OfflineReportRepository,
};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::config::ServerConfig;

pub struct AppState {
    pub service: Arc<ReportSyncService>,
}

/// Everything `main` needs to run the server and its background tasks.
pub struct AppContext {
    pub state: Arc<AppState>,
    pub client: Arc<ReportSubmissionClient>,
}

/// Opens the report store, builds the collector client and loads the
/// persisted pending count.
pub fn build_context(config: &ServerConfig) -> anyhow::Result<AppContext> {
    let db_path = init(&config.data_dir.to_string_lossy())
        .with_context(|| format!("preparing data dir {}", config.data_dir.display()))?;
    run_migrations(&db_path).context("running migrations")?;
    let pool = create_pool(&db_path).context("opening connection pool")?;
    let writer = spawn_writer(pool.as_ref().clone());
    let store = Arc::new(OfflineReportRepository::new(pool, writer));

    let client = Arc::new(
        ReportSubmissionClient::new(config.collector.clone())
            .context("building collector client")?,
    );

    let connectivity = ConnectivityMonitor::new(config.start_online);
    let service = Arc::new(ReportSyncService::new(store, client.clone(), connectivity));
    let status = service.initialize().context("loading pending reports")?;
    tracing::info!(
        "Report store at {} ({} pending)",
        db_path,
        status.pending_count
    );

    Ok(AppContext {
        state: Arc::new(AppState { service }),
        client,
    })
}

async fn healthz() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub fn app_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .nest("/api", api::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
