//! Report submission and queue endpoints.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use nirogya_core::reports::{OfflineReportRecord, ReportPayload};
use nirogya_core::sync::SaveAndSyncResult;
use serde::Serialize;
use tracing::info;

use crate::error::ApiResult;
use crate::main_lib::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ClearSyncedResponse {
    removed: usize,
}

async fn submit_report(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ReportPayload>,
) -> ApiResult<(StatusCode, Json<SaveAndSyncResult>)> {
    let result = state.service.save_and_sync(payload).await?;
    info!(
        "[Reports] Report {} saved (synced={})",
        result.report_id, result.synced
    );
    Ok((StatusCode::CREATED, Json(result)))
}

async fn list_pending_reports(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<OfflineReportRecord>>> {
    Ok(Json(state.service.pending_reports()?))
}

async fn clear_synced_reports(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<ClearSyncedResponse>> {
    let removed = state.service.clear_synced_reports().await?;
    Ok(Json(ClearSyncedResponse { removed }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/reports", post(submit_report))
        .route("/reports/pending", get(list_pending_reports))
        .route("/reports/synced", delete(clear_synced_reports))
}
