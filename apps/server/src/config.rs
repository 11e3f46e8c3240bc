//! Server configuration from `NIROGYA_*` environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use nirogya_core::sync::REPORT_SYNC_INTERVAL_SECS;
use nirogya_report_client::types::{DEFAULT_HEALTH_PATH, DEFAULT_SUBMIT_PATH};
use nirogya_report_client::ReportClientConfig;
use thiserror::Error;

const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8088";
const DEFAULT_DATA_DIR: &str = "./data";
const DEFAULT_COLLECTOR_URL: &str = "http://localhost:8001";
const DEFAULT_PROBE_SECS: u64 = 15;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} has invalid value '{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    pub data_dir: PathBuf,
    pub collector: ReportClientConfig,
    pub sync_interval: Duration,
    /// `None` disables the reachability probe.
    pub probe_interval: Option<Duration>,
    pub start_online: bool,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let listen_raw =
            read("NIROGYA_LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr = listen_raw.parse().map_err(|e: std::net::AddrParseError| {
            ConfigError::Invalid {
                name: "NIROGYA_LISTEN_ADDR",
                value: listen_raw.clone(),
                reason: e.to_string(),
            }
        })?;

        let mut collector = ReportClientConfig::new(
            read("NIROGYA_COLLECTOR_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_COLLECTOR_URL.to_string()),
        );
        collector.submit_path =
            read("NIROGYA_SUBMIT_PATH").unwrap_or_else(|| DEFAULT_SUBMIT_PATH.to_string());
        collector.health_path =
            read("NIROGYA_HEALTH_PATH").unwrap_or_else(|| DEFAULT_HEALTH_PATH.to_string());

        let sync_secs = parse_secs(
            "NIROGYA_SYNC_INTERVAL_SECS",
            read("NIROGYA_SYNC_INTERVAL_SECS"),
            REPORT_SYNC_INTERVAL_SECS,
        )?;
        if sync_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "NIROGYA_SYNC_INTERVAL_SECS",
                value: "0".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        let probe_secs = parse_secs(
            "NIROGYA_CONNECTIVITY_PROBE_SECS",
            read("NIROGYA_CONNECTIVITY_PROBE_SECS"),
            DEFAULT_PROBE_SECS,
        )?;

        let start_online = match read("NIROGYA_START_ONLINE") {
            None => true,
            Some(value) => parse_bool(&value).ok_or_else(|| ConfigError::Invalid {
                name: "NIROGYA_START_ONLINE",
                value: value.clone(),
                reason: "expected true/false".to_string(),
            })?,
        };

        Ok(Self {
            listen_addr,
            data_dir: PathBuf::from(
                read("NIROGYA_DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.to_string()),
            ),
            collector,
            sync_interval: Duration::from_secs(sync_secs),
            probe_interval: (probe_secs > 0).then(|| Duration::from_secs(probe_secs)),
            start_online,
        })
    }
}

fn parse_secs(name: &'static str, value: Option<String>, default: u64) -> Result<u64, ConfigError> {
    match value {
        None => Ok(default),
        Some(value) => value.parse::<u64>().map_err(|e| ConfigError::Invalid {
            name,
            reason: e.to_string(),
            value,
        }),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
