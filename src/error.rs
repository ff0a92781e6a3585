use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Errors produced while resolving, downloading, and assembling streams
#[derive(Debug, Error)]
pub enum ClipError {
    /// The channel is not live (upstream answered 404)
    #[error("stream not found: {0}")]
    StreamNotFound(String),

    /// The manifest carried no secondary playlist URL
    #[error("no stream playlist available for {0}")]
    NoStreamPlaylist(String),

    #[error("failed fetching stream segments for {channel} after {attempts} tries")]
    ResolutionExhausted { channel: String, attempts: u32 },

    #[error("upstream request failed: {0}")]
    UpstreamTransport(#[from] reqwest::Error),

    /// Non-success, non-404 answer from the manifest endpoint
    #[error("upstream returned {status}:\n{body}")]
    UpstreamStatus { status: u16, body: String },

    #[error("segment {ordinal} download failed ({url}): {reason}")]
    Download {
        ordinal: usize,
        url: String,
        reason: String,
    },

    /// The external media process could not be started or exited non-zero
    #[error("media assembly failed: {0}")]
    Assembly(String),

    #[error("invalid channel name: {0}")]
    InvalidChannel(String),

    #[error("rate limit exceeded for {0}")]
    RateLimited(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ClipError>;

impl ClipError {
    /// HTTP status the request boundary reports for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ClipError::InvalidChannel(_) => StatusCode::BAD_REQUEST,
            ClipError::StreamNotFound(_) => StatusCode::NOT_FOUND,
            ClipError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            ClipError::NoStreamPlaylist(_)
            | ClipError::ResolutionExhausted { .. }
            | ClipError::UpstreamTransport(_)
            | ClipError::UpstreamStatus { .. }
            | ClipError::Download { .. } => StatusCode::BAD_GATEWAY,
            ClipError::Assembly(_) | ClipError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ClipError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        let body = json!({
            "message": self.to_string(),
            "error": status.as_u16(),
        });

        (status, Json(body)).into_response()
    }
}
