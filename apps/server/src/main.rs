//! HTTP host for the offline report sync engine.

mod api;
mod config;
mod error;
mod events;
mod main_lib;
mod probe;

use nirogya_core::sync::SyncScheduler;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ServerConfig;
use crate::main_lib::{app_router, build_context};
use crate::probe::spawn_connectivity_probe;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("shutdown requested");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = ServerConfig::from_env()?;
    let context = build_context(&config)?;
    let service = context.state.service.clone();

    let mut scheduler = SyncScheduler::start(service.clone(), config.sync_interval);
    let probe = config.probe_interval.map(|interval| {
        spawn_connectivity_probe(
            context.client.clone(),
            service.connectivity().clone(),
            interval,
        )
    });

    let listener = TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "listening");

    axum::serve(listener, app_router(context.state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(probe) = probe {
        probe.abort();
    }
    scheduler.shutdown();
    tracing::info!("stopped");
    Ok(())
}
