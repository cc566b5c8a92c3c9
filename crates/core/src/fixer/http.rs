//! HTTP implementation of the ordering engine client.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::metrics::record_engine_call;

use super::types::{CampaignStatusResponse, CreateCampaignResponse};
use super::{
    CreateCampaignParams, EngineHealth, EngineStatus, FixerClient, FixerError, StopAck,
    MAX_BODY_CHARS,
};

/// Ordering engine client over HTTP.
pub struct HttpFixerClient {
    client: Client,
    base_url: String,
    timeout: Duration,
    health_timeout: Duration,
}

impl HttpFixerClient {
    /// Build a client that sends the configured API key on every request.
    pub fn new(config: &EngineConfig) -> Result<Self, FixerError> {
        let header_name = HeaderName::from_bytes(config.api_key_header.as_bytes())
            .map_err(|e| FixerError::Configuration(format!("invalid api key header: {}", e)))?;
        let mut header_value = HeaderValue::from_str(&config.api_key)
            .map_err(|e| FixerError::Configuration(format!("invalid api key: {}", e)))?;
        header_value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(header_name, header_value);

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| FixerError::Configuration(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(config.timeout_secs),
            health_timeout: Duration::from_secs(config.health_timeout_secs),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn campaign_url(&self, operation_path: &str, external_id: &str) -> String {
        self.url(&format!(
            "{}/{}",
            operation_path,
            urlencoding::encode(external_id)
        ))
    }

    /// Decode a 2xx response body, or describe the failure.
    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, FixerError> {
        let status = response.status();
        let body = response.text().await.map_err(|e| FixerError::Unavailable {
            status: Some(status.as_u16()),
            body: None,
            message: format!("failed to read response body: {}", e),
        })?;

        if !status.is_success() {
            return Err(FixerError::Unavailable {
                status: Some(status.as_u16()),
                body: Some(truncate(&body)),
                message: format!("engine returned HTTP {}", status),
            });
        }

        serde_json::from_str(&body).map_err(|e| FixerError::Unavailable {
            status: Some(status.as_u16()),
            body: Some(truncate(&body)),
            message: format!("failed to parse response: {}", e),
        })
    }
}

fn truncate(body: &str) -> String {
    body.chars().take(MAX_BODY_CHARS).collect()
}

fn transport_error(e: reqwest::Error) -> FixerError {
    let message = if e.is_timeout() {
        "request timed out".to_string()
    } else if e.is_connect() {
        format!("connection failed: {}", e)
    } else {
        e.to_string()
    };
    FixerError::unavailable(message)
}

fn finish<T>(operation: &str, started: Instant, result: Result<T, FixerError>) -> Result<T, FixerError> {
    let label = match &result {
        Ok(_) => "success",
        Err(e) => e.kind(),
    };
    record_engine_call(operation, label, started.elapsed());
    if let Err(e) = &result {
        warn!(operation = operation, error = %e, "Engine call failed");
    }
    result
}

#[async_trait]
impl FixerClient for HttpFixerClient {
    async fn create_campaign(&self, params: &CreateCampaignParams) -> Result<String, FixerError> {
        let started = Instant::now();
        debug!(target_id = %params.target_id, category = %params.category, "Creating engine campaign");

        let result = async {
            let response = self
                .client
                .post(self.url("/api/create_campaign"))
                .timeout(self.timeout)
                .json(params)
                .send()
                .await
                .map_err(transport_error)?;
            let created: CreateCampaignResponse = Self::read_json(response).await?;

            // Engines report ids as strings or numbers.
            match created.campaign_id {
                serde_json::Value::String(id) if !id.is_empty() => Ok(id),
                serde_json::Value::Number(n) => Ok(n.to_string()),
                other => Err(FixerError::unavailable(format!(
                    "unexpected campaign id in create response: {}",
                    other
                ))),
            }
        }
        .await;

        finish("create", started, result)
    }

    async fn fetch_status(&self, external_id: &str) -> Result<EngineStatus, FixerError> {
        let started = Instant::now();
        debug!(external_id = external_id, "Fetching engine campaign status");

        let result = async {
            let response = self
                .client
                .get(self.campaign_url("/api/campaign_status", external_id))
                .timeout(self.timeout)
                .send()
                .await
                .map_err(transport_error)?;

            if response.status() == StatusCode::NOT_FOUND {
                let body = response.text().await.unwrap_or_default();
                return Err(FixerError::NotFound {
                    external_id: external_id.to_string(),
                    body: truncate(&body),
                });
            }

            let status: CampaignStatusResponse = Self::read_json(response).await?;
            Ok(EngineStatus::from(status))
        }
        .await;

        finish("status", started, result)
    }

    async fn stop_campaign(&self, external_id: &str) -> Result<StopAck, FixerError> {
        let started = Instant::now();
        debug!(external_id = external_id, "Stopping engine campaign");

        let result = async {
            let response = self
                .client
                .post(self.campaign_url("/api/stop_campaign", external_id))
                .timeout(self.timeout)
                .send()
                .await
                .map_err(transport_error)?;

            let status = response.status();
            let body = response.text().await.map_err(transport_error)?;
            if !status.is_success() {
                return Err(FixerError::Unavailable {
                    status: Some(status.as_u16()),
                    body: Some(truncate(&body)),
                    message: format!("engine returned HTTP {}", status),
                });
            }

            // The acknowledgement is opaque; keep non-JSON bodies as a string.
            let payload = if body.trim().is_empty() {
                serde_json::Value::Null
            } else {
                serde_json::from_str(&body)
                    .unwrap_or_else(|_| serde_json::Value::String(truncate(&body)))
            };
            Ok(StopAck { payload })
        }
        .await;

        finish("stop", started, result)
    }

    async fn health_check(&self) -> EngineHealth {
        let started = Instant::now();
        let response = self
            .client
            .get(self.url("/healthz"))
            .timeout(self.health_timeout)
            .send()
            .await;

        let health = match response {
            Ok(response) if response.status().is_success() => EngineHealth::Healthy,
            Ok(response) => {
                let status = response.status().as_u16();
                let body = response.text().await.unwrap_or_default();
                EngineHealth::Unhealthy {
                    status,
                    body: truncate(&body),
                }
            }
            Err(e) => EngineHealth::Unreachable(transport_error(e).to_string()),
        };

        let label = match &health {
            EngineHealth::Healthy => "success",
            EngineHealth::Unhealthy { .. } => "unhealthy",
            EngineHealth::Unreachable(_) => "unreachable",
        };
        record_engine_call("health", label, started.elapsed());
        debug!(healthy = health.is_available(), "Engine health probe complete");
        health
    }
}
