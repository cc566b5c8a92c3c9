//! Client abstraction over the external ordering engine.
//!
//! The engine exposes three campaign operations (create, status, stop) and a
//! liveness probe. Implementations are stateless; every call is bounded by a
//! deadline so a stalled engine cannot hold a request forever.

mod http;
mod types;

pub use http::HttpFixerClient;
pub use types::{CreateCampaignParams, EngineHealth, EngineStatus, StopAck};

use async_trait::async_trait;
use thiserror::Error;

/// Maximum number of upstream body characters kept for diagnostics.
pub(crate) const MAX_BODY_CHARS: usize = 512;

/// Errors returned by the ordering engine client.
#[derive(Debug, Clone, Error)]
pub enum FixerError {
    /// The engine does not know this campaign (HTTP 404 on status).
    #[error("Engine campaign not found: {external_id}")]
    NotFound { external_id: String, body: String },

    /// Transport failure, deadline exceeded, non-2xx response or undecodable body.
    #[error("Ordering engine unavailable: {message}")]
    Unavailable {
        status: Option<u16>,
        body: Option<String>,
        message: String,
    },

    /// The client could not be built from configuration.
    #[error("Invalid engine client configuration: {0}")]
    Configuration(String),
}

impl FixerError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        FixerError::Unavailable {
            status: None,
            body: None,
            message: message.into(),
        }
    }

    /// HTTP status reported by the engine, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            FixerError::NotFound { .. } => Some(404),
            FixerError::Unavailable { status, .. } => *status,
            FixerError::Configuration(_) => None,
        }
    }

    /// Response body reported by the engine, if any.
    pub fn body(&self) -> Option<&str> {
        match self {
            FixerError::NotFound { body, .. } => Some(body),
            FixerError::Unavailable { body, .. } => body.as_deref(),
            FixerError::Configuration(_) => None,
        }
    }

    /// Label used in metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            FixerError::NotFound { .. } => "not_found",
            FixerError::Unavailable { .. } => "unavailable",
            FixerError::Configuration(_) => "configuration",
        }
    }
}

/// Contract of the external ordering engine.
#[async_trait]
pub trait FixerClient: Send + Sync {
    /// Create a campaign upstream and return the engine-assigned id.
    async fn create_campaign(&self, params: &CreateCampaignParams) -> Result<String, FixerError>;

    /// Fetch the current progress of an engine campaign.
    async fn fetch_status(&self, external_id: &str) -> Result<EngineStatus, FixerError>;

    /// Ask the engine to stop a campaign.
    async fn stop_campaign(&self, external_id: &str) -> Result<StopAck, FixerError>;

    /// Liveness probe. Uses its own short deadline and never fails.
    async fn health_check(&self) -> EngineHealth;
}
