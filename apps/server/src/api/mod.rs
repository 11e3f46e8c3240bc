use std::sync::Arc;

use axum::Router;

use crate::main_lib::AppState;

mod reports;
mod sync;

#[cfg(test)]
mod tests;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().merge(reports::router()).merge(sync::router())
}
