pub mod clip;
pub mod health;
pub mod metrics;
pub mod preview;

use crate::{
    channel::normalize_channel,
    error::{ClipError, Result},
    metrics as stats,
    server::state::AppState,
};
use axum::Json;
use serde::Serialize;
use std::time::Instant;

/// Success body of the clip and preview endpoints
#[derive(Debug, Serialize)]
pub struct PathResponse {
    /// Output path relative to the clip or preview root
    pub path: String,
}

/// `/clip/` and `/preview/` without a channel
pub async fn missing_channel() -> ClipError {
    ClipError::InvalidChannel("invalid channel name".to_string())
}

/// Normalize the channel from the path and apply the rate limit.
fn admit(state: &AppState, raw: &str) -> Result<String> {
    let channel = normalize_channel(raw)?;
    if let Some(limiter) = &state.rate_limiter {
        limiter.admit(&channel)?;
    }
    Ok(channel)
}

/// Record the outcome of an operation and shape the response.
fn finish(
    operation: &'static str,
    start: Instant,
    result: Result<String>,
) -> Result<Json<PathResponse>> {
    let status = match &result {
        Ok(_) => 200,
        Err(e) => e.status_code().as_u16(),
    };
    stats::record_request(operation, status);
    stats::record_duration(operation, start);

    result.map(|path| Json(PathResponse { path }))
}
