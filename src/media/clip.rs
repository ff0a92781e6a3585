use super::{
    output::{OutputIds, OutputJob},
    tool::MediaTool,
};
use crate::error::Result;
use bytes::Bytes;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

pub const CLIP_EXTENSION: &str = "mp4";

/// Feeds ordered segment bodies to the transcoder and names the result.
#[derive(Clone)]
pub struct ClipAssembler {
    root: PathBuf,
    tool: Arc<dyn MediaTool>,
    ids: Arc<OutputIds>,
}

impl ClipAssembler {
    pub fn new(root: impl Into<PathBuf>, tool: Arc<dyn MediaTool>, ids: Arc<OutputIds>) -> Self {
        Self {
            root: root.into(),
            tool,
            ids,
        }
    }

    /// Assemble `bodies` (already in ordinal order) into `<root>/<channel>/<id>.mp4`.
    ///
    /// Returns the path relative to the clip root. A failed transcode leaves
    /// no output file behind.
    pub async fn assemble(&self, channel: &str, bodies: Vec<Bytes>) -> Result<String> {
        let job = OutputJob::new(&self.root, channel, &self.ids, CLIP_EXTENSION);

        if let Some(dir) = job.output_path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }

        if let Err(e) = self.tool.transcode(bodies, &job.output_path).await {
            if tokio::fs::remove_file(&job.output_path).await.is_ok() {
                warn!("Removed partial clip {:?}", job.output_path);
            }
            return Err(e);
        }

        info!("Clip ready: {}", job.relative);
        Ok(job.relative)
    }
}
