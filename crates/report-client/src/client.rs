//! HTTP client for the remote report collector.

use async_trait::async_trait;
use log::{debug, error};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};

use nirogya_core::errors::TransportError;
use nirogya_core::reports::{ReportPayload, ReportSubmitterTrait, SubmissionReceipt};
use nirogya_core::sync::retry_class_code;

use crate::error::{ReportClientError, Result};
use crate::types::*;

const MAX_LOG_BODY_CHARS: usize = 512;
const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

/// Client for the collector's report submission API.
#[derive(Debug, Clone)]
pub struct ReportSubmissionClient {
    client: reqwest::Client,
    base_url: String,
    submit_path: String,
    health_path: String,
}

impl ReportSubmissionClient {
    fn log_response(status: reqwest::StatusCode, body: &str) {
        if status.is_success() {
            debug!("[ReportClient] Response status: {}", status);
            return;
        }

        let mut preview = body.chars().take(MAX_LOG_BODY_CHARS).collect::<String>();
        if body.chars().count() > MAX_LOG_BODY_CHARS {
            preview.push_str("...");
        }
        debug!("[ReportClient] Response error ({}): {}", status, preview);
    }

    /// Create a new collector client.
    pub fn new(config: ReportClientConfig) -> Result<Self> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ReportClientError::invalid_request(
                "Collector base URL is empty",
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            base_url,
            submit_path: normalize_path(&config.submit_path),
            health_path: normalize_path(&config.health_path),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn headers(&self, client_ref: &str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let key = HeaderValue::from_str(client_ref)
            .map_err(|_| ReportClientError::invalid_request("Invalid idempotency key format"))?;
        headers.insert(IDEMPOTENCY_KEY_HEADER, key);

        Ok(headers)
    }

    /// Parse a JSON response body. An empty 2xx body is treated as `null`.
    async fn parse_response(response: reqwest::Response) -> Result<serde_json::Value> {
        let status = response.status();
        let body = response.text().await?;
        Self::log_response(status, &body);

        if !status.is_success() {
            if let Ok(error) = serde_json::from_str::<ApiErrorResponse>(&body) {
                return Err(ReportClientError::api(status.as_u16(), error.message()));
            }
            return Err(ReportClientError::api(
                status.as_u16(),
                format!("Request failed: {}", body),
            ));
        }

        if body.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }

        serde_json::from_str(&body).map_err(|e| {
            error!(
                "[ReportClient] Failed to deserialize response. Body: {}, Error: {}",
                body, e
            );
            ReportClientError::from(e)
        })
    }

    /// Submit one report.
    ///
    /// POST {submit_path}
    pub async fn submit_report(
        &self,
        payload: &ReportPayload,
        client_ref: &str,
    ) -> Result<serde_json::Value> {
        let url = self.url(&self.submit_path);
        debug!("[ReportClient] POST {} ({})", url, client_ref);

        let body = SubmitReportRequest {
            patient: &payload.patient,
            meta: &payload.meta,
        };

        let response = self
            .client
            .post(&url)
            .headers(self.headers(client_ref)?)
            .json(&body)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Whether the collector answers at all.
    ///
    /// GET {health_path}. Any HTTP response counts as reachable; only a
    /// transport failure means offline.
    pub async fn probe(&self) -> bool {
        let url = self.url(&self.health_path);
        match self.client.get(&url).send().await {
            Ok(response) => {
                debug!("[ReportClient] Probe {} -> {}", url, response.status());
                true
            }
            Err(err) => {
                debug!("[ReportClient] Probe {} failed: {}", url, err);
                false
            }
        }
    }
}

fn normalize_path(path: &str) -> String {
    let trimmed = path.trim();
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

#[async_trait]
impl ReportSubmitterTrait for ReportSubmissionClient {
    async fn submit(
        &self,
        payload: &ReportPayload,
        client_ref: &str,
    ) -> std::result::Result<SubmissionReceipt, TransportError> {
        match self.submit_report(payload, client_ref).await {
            Ok(response) => Ok(SubmissionReceipt { response }),
            Err(err) => {
                debug!(
                    "[ReportClient] Submission {} failed ({}): {}",
                    client_ref,
                    retry_class_code(err.retry_class()),
                    err
                );
                Err(err.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use axum::extract::State;
    use axum::http::{HeaderMap as AxumHeaders, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};

    type Captured = Arc<Mutex<Vec<(Option<String>, Value)>>>;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn client_for(base_url: &str) -> ReportSubmissionClient {
        let mut config = ReportClientConfig::new(base_url);
        config.timeout = Duration::from_secs(5);
        ReportSubmissionClient::new(config).unwrap()
    }

    fn payload() -> ReportPayload {
        ReportPayload::new(
            json!({ "name": "Rina", "age": 34, "symptoms": ["fever"] }),
            json!({ "village": "Majuli", "reported_by": "asha-17" }),
        )
    }

    async fn accept(
        State(captured): State<Captured>,
        headers: AxumHeaders,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        let key = headers
            .get("idempotency-key")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        captured.lock().unwrap().push((key, body));
        (StatusCode::CREATED, Json(json!({ "status": "accepted", "id": 7 })))
    }

    #[tokio::test]
    async fn submit_sends_payload_verbatim_with_idempotency_key() {
        let captured: Captured = Arc::default();
        let router = Router::new()
            .route("/api/reports/submit", post(accept))
            .with_state(captured.clone());
        let base = serve(router).await;

        let client = client_for(&base);
        let receipt = client.submit(&payload(), "ref-123").await.unwrap();

        assert_eq!(receipt.response["status"], "accepted");
        let seen = captured.lock().unwrap().clone();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0.as_deref(), Some("ref-123"));
        assert_eq!(
            seen[0].1,
            json!({ "patient": payload().patient, "meta": payload().meta })
        );
    }

    #[tokio::test]
    async fn error_status_is_reported_with_body() {
        let router = Router::new().route(
            "/api/reports/submit",
            post(|| async {
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({ "detail": "patient.age must be positive" })),
                )
            }),
        );
        let base = serve(router).await;

        let err = client_for(&base)
            .submit(&payload(), "ref-1")
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), Some(422));
        assert!(err.to_string().contains("patient.age must be positive"));
    }

    #[tokio::test]
    async fn server_error_with_plain_body() {
        let router = Router::new().route(
            "/api/reports/submit",
            post(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
        );
        let base = serve(router).await;

        let err = client_for(&base)
            .submit(&payload(), "ref-1")
            .await
            .unwrap_err();

        assert_eq!(err, TransportError::rejected(502, "Request failed: upstream down"));
    }

    #[tokio::test]
    async fn empty_success_body_is_accepted() {
        let router = Router::new().route(
            "/api/reports/submit",
            post(|| async { StatusCode::NO_CONTENT }),
        );
        let base = serve(router).await;

        let receipt = client_for(&base).submit(&payload(), "ref-1").await.unwrap();
        assert!(receipt.response.is_null());
    }

    #[tokio::test]
    async fn unreachable_collector_is_a_network_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = client_for(&format!("http://{}", addr));
        let err = client.submit(&payload(), "ref-1").await.unwrap_err();

        assert!(matches!(err, TransportError::Network(_)));
        assert!(!client.probe().await);
    }

    #[tokio::test]
    async fn probe_counts_any_response_as_reachable() {
        let router = Router::new().route(
            "/openapi.json",
            get(|| async { StatusCode::SERVICE_UNAVAILABLE }),
        );
        let base = serve(router).await;

        assert!(client_for(&base).probe().await);
    }

    #[test]
    fn new_rejects_empty_base_url_and_normalizes_paths() {
        assert!(ReportSubmissionClient::new(ReportClientConfig::new("  ")).is_err());

        let mut config = ReportClientConfig::new("http://collector.local/");
        config.submit_path = "reports".to_string();
        let client = ReportSubmissionClient::new(config).unwrap();
        assert_eq!(client.base_url(), "http://collector.local");
        assert_eq!(client.url(&client.submit_path), "http://collector.local/reports");
    }
}
