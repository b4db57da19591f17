//! Error types shared by the proxy endpoints.
//!
//! Internal failures are [`ProxyError`]; what callers see is always an
//! [`ErrorResponse`] envelope.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::Value;

/// Failures while talking to an upstream API.
#[derive(thiserror::Error, Debug)]
pub enum ProxyError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned {status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    #[error("upstream returned invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("invalid upstream URL '{0}'")]
    BaseUrl(String),

    #[error("invalid upstream URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("failed to sign token request: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

impl ProxyError {
    /// Build the error for a non-2xx upstream response.
    pub async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        ProxyError::UpstreamStatus { status, body }
    }
}

/// Category of a failed proxy request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The caller sent missing or malformed parameters
    BadRequest,
    /// The server is missing credentials or settings
    Configuration,
    /// The upstream API failed or could not be reached
    Upstream,
}

impl ErrorKind {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::Configuration | ErrorKind::Upstream => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON error body returned by both proxies.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// Steps that fix a configuration problem
    #[serde(skip_serializing_if = "Option::is_none")]
    pub setup: Option<Value>,
}

impl ErrorResponse {
    pub fn new(error: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            error,
            message: message.into(),
            details: None,
            setup: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Upstream, message)
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_setup(mut self, setup: Value) -> Self {
        self.setup = Some(setup);
        self
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.error.status(), Json(self)).into_response()
    }
}
