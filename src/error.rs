//! Error types shared across the crate.
//!
//! Upstream failures are typed as [`ClientError`]; everything the HTTP
//! surface returns to the dashboard goes through [`ApiError`], which maps
//! each variant onto a status code and a small JSON body.

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

/// Failure talking to the upstream soil API.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection, timeout or other transport failure.
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// The API answered with a non-success status.
    #[error("{endpoint} answered with HTTP {status}")]
    Status { endpoint: String, status: u16 },

    /// The body did not have the expected shape.
    #[error("unexpected response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
}

impl ClientError {
    /// Endpoint path the failed request targeted.
    pub fn endpoint(&self) -> &str {
        match self {
            ClientError::Transport { endpoint, .. }
            | ClientError::Status { endpoint, .. }
            | ClientError::Decode { endpoint, .. } => endpoint,
        }
    }
}

/// Failure in the session shell.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("username and password must not be empty")]
    InvalidLogin,

    #[error("session storage failed: {0}")]
    Storage(#[from] anyhow::Error),
}

/// Errors returned by HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("login required")]
    LoginRequired,

    #[error("invalid login: {0}")]
    InvalidLogin(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Upstream(#[from] ClientError),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::InvalidLogin => {
                ApiError::InvalidLogin(SessionError::InvalidLogin.to_string())
            }
            SessionError::Storage(e) => ApiError::Internal(e),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// JSON body of an error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error kind.
    pub error: &'static str,
    /// Human-readable message.
    pub message: String,
}

impl ApiError {
    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::LoginRequired => (StatusCode::UNAUTHORIZED, "login_required"),
            ApiError::InvalidLogin(_) => (StatusCode::BAD_REQUEST, "invalid_login"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::Upstream(_) => (StatusCode::BAD_GATEWAY, "upstream_failed"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();
        if status.is_server_error() {
            warn!(error = %self, kind, "Request failed");
        }
        let body = ErrorBody {
            error: kind,
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
