use super::{PathResponse, admit, finish};
use crate::{error::Result, server::state::AppState};
use axum::{
    Json,
    extract::{Path, State},
};
use std::time::Instant;
use tracing::info;

/// Grab a still frame from the channel's most recent segment
pub async fn serve_preview(
    Path(channel): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<PathResponse>> {
    let start = Instant::now();
    let channel = admit(&state, &channel)?;
    info!("Preview requested for channel: {}", channel);

    let result = state.clipper.make_preview(&channel).await;
    finish("preview", start, result)
}
