use super::{
    output::{OutputIds, OutputJob},
    tool::MediaTool,
};
use crate::{download::SegmentDownloader, error::Result, playlist::Segment};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

pub const PREVIEW_EXTENSION: &str = "jpg";

/// Prefix of the per-request scratch directory under `<root>/<channel>/`.
const SCRATCH_PREFIX: &str = ".scratch-";

/// Downloads one segment to scratch space and pulls a still frame out of it.
#[derive(Clone)]
pub struct PreviewExtractor {
    root: PathBuf,
    downloader: SegmentDownloader,
    tool: Arc<dyn MediaTool>,
    ids: Arc<OutputIds>,
}

impl PreviewExtractor {
    pub fn new(
        root: impl Into<PathBuf>,
        downloader: SegmentDownloader,
        tool: Arc<dyn MediaTool>,
        ids: Arc<OutputIds>,
    ) -> Self {
        Self {
            root: root.into(),
            downloader,
            tool,
            ids,
        }
    }

    /// Write a still frame of `segment` to `<root>/<channel>/<id>.jpg`.
    ///
    /// The scratch directory holding the downloaded segment is a `TempDir`,
    /// so it is gone once this returns, whichever way it returns. A failed
    /// extraction leaves no image behind.
    pub async fn extract(&self, channel: &str, segment: &Segment) -> Result<String> {
        let channel_dir = self.root.join(channel);
        tokio::fs::create_dir_all(&channel_dir).await?;

        let scratch = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir_in(&channel_dir)?;
        let segment_path = scratch.path().join("segment.ts");

        self.downloader.fetch_to_file(segment, &segment_path).await?;

        let job = OutputJob::new(&self.root, channel, &self.ids, PREVIEW_EXTENSION);
        if let Err(e) = self.tool.extract_frame(&segment_path, &job.output_path).await {
            if tokio::fs::remove_file(&job.output_path).await.is_ok() {
                warn!("Removed partial preview {:?}", job.output_path);
            }
            return Err(e);
        }

        info!("Preview ready: {}", job.relative);
        Ok(job.relative)
    }
}
