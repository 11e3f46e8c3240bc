//! Wire types for the report collector API.

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_SUBMIT_PATH: &str = "/api/reports/submit";
pub const DEFAULT_HEALTH_PATH: &str = "/openapi.json";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Where and how to reach the collector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportClientConfig {
    pub base_url: String,
    pub submit_path: String,
    pub health_path: String,
    pub timeout: Duration,
}

impl ReportClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            submit_path: DEFAULT_SUBMIT_PATH.to_string(),
            health_path: DEFAULT_HEALTH_PATH.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Body of `POST {submit_path}`; the two blobs go out exactly as stored.
#[derive(Debug, Serialize)]
pub struct SubmitReportRequest<'a> {
    pub patient: &'a serde_json::Value,
    pub meta: &'a serde_json::Value,
}

/// FastAPI-style error body (`{"detail": ...}`).
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub detail: serde_json::Value,
}

impl ApiErrorResponse {
    pub fn message(&self) -> String {
        match &self.detail {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_detail_may_be_structured() {
        let plain: ApiErrorResponse = serde_json::from_str(r#"{"detail":"Not allowed"}"#).unwrap();
        assert_eq!(plain.message(), "Not allowed");

        let structured: ApiErrorResponse =
            serde_json::from_str(r#"{"detail":[{"loc":["body","patient"]}]}"#).unwrap();
        assert!(structured.message().contains("patient"));
    }
}
