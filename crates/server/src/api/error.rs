//! HTTP error mapping for bridge and store failures.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use fixer_core::{BridgeError, StoreError};
use serde::Serialize;

/// Error body shared by every route: `{success: false, error, upstreamStatus?, upstreamBody?}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream_body: Option<String>,
}

/// An error ready to be rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub upstream_status: Option<u16>,
    pub upstream_body: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            upstream_status: None,
            upstream_body: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }
}

impl From<BridgeError> for ApiError {
    fn from(e: BridgeError) -> Self {
        match e {
            BridgeError::Validation(msg) => ApiError::bad_request(msg),
            BridgeError::NotFound(msg) => ApiError::not_found(msg),
            e @ BridgeError::AlreadyRunning { .. } => {
                ApiError::new(StatusCode::CONFLICT, e.to_string())
            }
            BridgeError::UpstreamUnavailable {
                status,
                body,
                message,
            } => ApiError {
                status: StatusCode::BAD_GATEWAY,
                message,
                upstream_status: status,
                upstream_body: body,
            },
            BridgeError::Store(e) => e.into(),
            e @ BridgeError::Interrupted(_) => {
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(_) => ApiError::not_found(e.to_string()),
            StoreError::Conflict(_) => ApiError::new(StatusCode::CONFLICT, e.to_string()),
            StoreError::Database(_) => {
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::warn!(
                status = self.status.as_u16(),
                upstream_status = ?self.upstream_status,
                error = %self.message,
                "Request failed"
            );
        }

        let body = ErrorBody {
            success: false,
            error: self.message,
            upstream_status: self.upstream_status,
            upstream_body: self.upstream_body,
        };
        (self.status, Json(body)).into_response()
    }
}
