//! Server-Sent Events bridge for sync status.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{self, Stream};
use nirogya_core::sync::SyncStatus;
use tokio::sync::mpsc;

use crate::main_lib::AppState;

pub const SYNC_STATUS_EVENT: &str = "sync-status";

fn status_event(status: &SyncStatus) -> Event {
    Event::default()
        .event(SYNC_STATUS_EVENT)
        .json_data(status)
        .unwrap_or_else(|e| Event::default().event("error").data(e.to_string()))
}

/// Streams every status change; the first event is the current snapshot.
///
/// The broadcaster subscription lives inside the stream, so a disconnected
/// client unsubscribes when axum drops the response body.
pub async fn sync_events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::unbounded_channel::<SyncStatus>();
    let subscription = state.service.subscribe(move |status| {
        let _ = tx.send(status.clone());
    });

    let stream = stream::unfold((rx, subscription), |(mut rx, subscription)| async move {
        let status = rx.recv().await?;
        Some((Ok(status_event(&status)), (rx, subscription)))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
