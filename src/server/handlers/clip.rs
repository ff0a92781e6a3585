use super::{PathResponse, admit, finish};
use crate::{error::Result, server::state::AppState};
use axum::{
    Json,
    extract::{Path, State},
};
use std::time::Instant;
use tracing::info;

/// Build an mp4 from the channel's current live window
pub async fn serve_clip(
    Path(channel): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<PathResponse>> {
    let start = Instant::now();
    let channel = admit(&state, &channel)?;
    info!("Clip requested for channel: {}", channel);

    let result = state.clipper.make_clip(&channel).await;
    finish("clip", start, result)
}
