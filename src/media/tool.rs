use crate::error::{ClipError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Bytes of ffmpeg stderr kept for error messages.
const STDERR_TAIL: usize = 2048;

/// External media process used to build clips and previews.
///
/// Implementations are spawned fresh per call; nothing is shared between
/// requests.
#[async_trait]
pub trait MediaTool: Send + Sync {
    /// Remux a concatenated MPEG-TS stream (the bodies, in order) into `output`.
    async fn transcode(&self, bodies: Vec<Bytes>, output: &Path) -> Result<()>;

    /// Write exactly one still frame of `input` to `output`.
    async fn extract_frame(&self, input: &Path, output: &Path) -> Result<()>;
}

/// [`MediaTool`] backed by the `ffmpeg` binary.
#[derive(Debug, Clone)]
pub struct FfmpegTool {
    binary: PathBuf,
}

impl FfmpegTool {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("-hide_banner")
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    fn spawn_error(&self, e: std::io::Error) -> ClipError {
        ClipError::Assembly(format!("failed to start {:?}: {}", self.binary, e))
    }
}

impl Default for FfmpegTool {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

#[async_trait]
impl MediaTool for FfmpegTool {
    async fn transcode(&self, bodies: Vec<Bytes>, output: &Path) -> Result<()> {
        let mut cmd = self.command();
        cmd.args(["-f", "mpegts", "-i", "-"])
            .args(["-c:v", "copy", "-c:a", "copy", "-c:s", "copy"])
            .args(["-f", "mp4"])
            .arg(output)
            .stdin(Stdio::piped());

        info!("Transcoding {} segments into {:?}", bodies.len(), output);
        let mut child = cmd.spawn().map_err(|e| self.spawn_error(e))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| ClipError::Assembly("failed to capture ffmpeg stdin".to_string()))?;

        // Feed stdin from its own task so a full pipe never blocks the exit wait.
        let writer = tokio::spawn(async move {
            for body in &bodies {
                stdin.write_all(body).await?;
            }
            stdin.shutdown().await
        });

        finish_transcode(child.wait_with_output(), writer, output).await
    }

    async fn extract_frame(&self, input: &Path, output: &Path) -> Result<()> {
        let mut cmd = self.command();
        cmd.arg("-i")
            .arg(input)
            .args(["-vframes", "1", "-f", "image2", "-update", "1"])
            .arg(output)
            .stdin(Stdio::null());

        debug!("Extracting frame from {:?} into {:?}", input, output);
        let mut child = cmd.spawn().map_err(|e| self.spawn_error(e))?;

        let mut stderr = Vec::new();
        if let Some(mut pipe) = child.stderr.take() {
            pipe.read_to_end(&mut stderr).await?;
        }
        let status = child.wait().await?;

        if !status.success() {
            return Err(ClipError::Assembly(format!(
                "ffmpeg exited with {}: {}",
                status,
                stderr_tail(&stderr)
            )));
        }

        Ok(())
    }
}

/// Wait for the transcoder to exit, then settle the stdin writer.
///
/// The writer never outlives this call: if waiting on the process fails,
/// the writer is aborted before the error is returned.
async fn finish_transcode<W>(
    wait: W,
    writer: JoinHandle<std::io::Result<()>>,
    output: &Path,
) -> Result<()>
where
    W: Future<Output = std::io::Result<Output>>,
{
    let output_result = match wait.await {
        Ok(output) => output,
        Err(e) => {
            writer.abort();
            return Err(e.into());
        }
    };
    let write_result = writer
        .await
        .map_err(|e| ClipError::Assembly(format!("stdin writer aborted: {e}")))?;

    if !output_result.status.success() {
        return Err(ClipError::Assembly(format!(
            "ffmpeg exited with {}: {}",
            output_result.status,
            stderr_tail(&output_result.stderr)
        )));
    }

    match write_result {
        Ok(()) => Ok(()),
        // ffmpeg exited cleanly before draining its input
        Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
            warn!("ffmpeg closed stdin early while writing {:?}", output);
            Ok(())
        }
        Err(e) => Err(ClipError::Assembly(format!(
            "failed writing segments to ffmpeg: {e}"
        ))),
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let start = stderr.len().saturating_sub(STDERR_TAIL);
    String::from_utf8_lossy(&stderr[start..]).trim().to_string()
}
