//! The two operations the service exposes: clip and preview.

use crate::{
    cache::PlaylistCache,
    channel::normalize_channel,
    download::SegmentDownloader,
    error::{ClipError, Result},
    media::{ClipAssembler, MediaTool, OutputIds, PreviewExtractor},
    playlist::PlaylistResolver,
};
use reqwest::Client;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Wires resolver, downloader and the media steps together.
#[derive(Clone)]
pub struct Clipper {
    resolver: PlaylistResolver,
    downloader: SegmentDownloader,
    clips: ClipAssembler,
    previews: PreviewExtractor,
}

/// Everything needed to build a [`Clipper`].
pub struct ClipperParts {
    pub client: Client,
    pub cache: PlaylistCache,
    pub upstream_base_url: String,
    pub resolve_max_attempts: u32,
    pub clips_dir: PathBuf,
    pub previews_dir: PathBuf,
    pub tool: Arc<dyn MediaTool>,
}

impl Clipper {
    pub fn new(parts: ClipperParts) -> Self {
        let ids = Arc::new(OutputIds::new());
        let downloader = SegmentDownloader::new(parts.client.clone());

        Self {
            resolver: PlaylistResolver::new(parts.client, parts.cache, parts.upstream_base_url)
                .with_max_attempts(parts.resolve_max_attempts),
            clips: ClipAssembler::new(parts.clips_dir, Arc::clone(&parts.tool), Arc::clone(&ids)),
            previews: PreviewExtractor::new(parts.previews_dir, downloader.clone(), parts.tool, ids),
            downloader,
        }
    }

    pub fn resolver(&self) -> &PlaylistResolver {
        &self.resolver
    }

    /// Produce an mp4 of the current live window. Returns `<channel>/<id>.mp4`.
    pub async fn make_clip(&self, channel: &str) -> Result<String> {
        let channel = normalize_channel(channel)?;
        let segments = self.resolver.resolve_segments(&channel).await?;
        info!("Clipping {} segments for {}", segments.len(), channel);

        let bodies = self.downloader.download_all(&segments).await?;
        self.clips.assemble(&channel, bodies).await
    }

    /// Produce a jpg of the most recent segment. Returns `<channel>/<id>.jpg`.
    pub async fn make_preview(&self, channel: &str) -> Result<String> {
        let channel = normalize_channel(channel)?;
        let segments = self.resolver.resolve_segments(&channel).await?;

        // The resolver never returns an empty list
        let last = segments
            .last()
            .ok_or_else(|| ClipError::NoStreamPlaylist(channel.clone()))?;
        info!("Previewing segment {} for {}", last.ordinal, channel);

        self.previews.extract(&channel, last).await
    }
}
