//! Sync control and status endpoints.

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post, put},
    Json, Router,
};
use nirogya_core::sync::{SyncBatchResult, SyncStatus};
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::events::sync_events;
use crate::main_lib::AppState;

#[derive(Debug, Deserialize)]
struct ConnectivityRequest {
    online: bool,
}

#[derive(Debug, Serialize)]
struct ConnectivityResponse {
    online: bool,
    changed: bool,
}

async fn trigger_sync(State(state): State<Arc<AppState>>) -> ApiResult<Json<SyncBatchResult>> {
    Ok(Json(state.service.sync_batch().await?))
}

async fn get_sync_status(State(state): State<Arc<AppState>>) -> Json<SyncStatus> {
    Json(state.service.status())
}

async fn set_connectivity(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ConnectivityRequest>,
) -> Json<ConnectivityResponse> {
    let changed = state.service.connectivity().set_online(body.online);
    Json(ConnectivityResponse {
        online: body.online,
        changed,
    })
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sync/trigger", post(trigger_sync))
        .route("/sync/status", get(get_sync_status))
        .route("/sync/events", get(sync_events))
        .route("/sync/connectivity", put(set_connectivity))
}
