//! Concurrent, order-preserving segment downloads.
//!
//! Every segment gets its own task. Bodies are slotted by ordinal, never by
//! completion order. The first failure trips a shared [`CancellationToken`]
//! so tasks still in flight drop their result, but the collector keeps
//! draining the [`JoinSet`] until every task has finished before it reports.

use crate::{
    error::{ClipError, Result},
    playlist::Segment,
};
use bytes::Bytes;
use futures_util::{FutureExt, StreamExt};
use reqwest::Client;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use tokio::{fs::File, io::AsyncWriteExt, task::JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Clone, Debug)]
pub struct SegmentDownloader {
    client: Client,
}

impl SegmentDownloader {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Fetch every segment concurrently and return the bodies in ordinal order.
    ///
    /// # Errors
    /// Returns the first [`ClipError::Download`] observed; no partial batch
    /// is ever returned.
    pub async fn download_all(&self, segments: &[Segment]) -> Result<Vec<Bytes>> {
        let cancel = CancellationToken::new();
        let mut tasks = JoinSet::new();

        for segment in segments {
            let client = self.client.clone();
            let segment = segment.clone();
            let cancel = cancel.clone();

            tasks.spawn(async move {
                guarded_fetch(&segment, &cancel, fetch_bytes(&client, &segment)).await
            });
        }

        let mut slots: Vec<Option<Bytes>> = vec![None; segments.len()];
        let mut first_error: Option<ClipError> = None;

        while let Some(joined) = tasks.join_next().await {
            // An aborted task leaves its slot empty; the gap is reported below
            // against the segment it belonged to.
            let outcome = joined.unwrap_or_else(|e| {
                warn!("Download task ended early: {}", e);
                None
            });

            match outcome {
                Some(Ok((ordinal, body))) => {
                    if let Some(slot) = slots.get_mut(ordinal) {
                        *slot = Some(body);
                    }
                }
                Some(Err(e)) => {
                    if first_error.is_none() {
                        warn!("Segment download failed, cancelling batch: {}", e);
                        cancel.cancel();
                        first_error = Some(e);
                    }
                }
                None => {}
            }
        }

        if let Some(e) = first_error {
            return Err(e);
        }

        let bodies = slots
            .into_iter()
            .enumerate()
            .map(|(ordinal, slot)| {
                slot.ok_or_else(|| ClipError::Download {
                    ordinal,
                    url: segments
                        .get(ordinal)
                        .map(|s| s.source_url.clone())
                        .unwrap_or_default(),
                    reason: "segment missing from completed batch".to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        info!(
            "Downloaded {} segments ({} bytes)",
            bodies.len(),
            bodies.iter().map(Bytes::len).sum::<usize>()
        );
        Ok(bodies)
    }

    /// Stream a single segment body to `path`.
    pub async fn fetch_to_file(&self, segment: &Segment, path: &Path) -> Result<u64> {
        let response = self
            .client
            .get(&segment.source_url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| download_error(segment, e))?;

        let mut file = File::create(path).await?;
        let mut stream = response.bytes_stream();
        let mut written = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| download_error(segment, e))?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        debug!(
            "Wrote segment {} to {:?} ({} bytes)",
            segment.ordinal, path, written
        );
        Ok(written)
    }
}

/// What one download task reports: `None` once the batch is cancelled.
type SegmentOutcome = Option<Result<(usize, Bytes)>>;

/// Race `fetch` against batch cancellation, attributing a panic to `segment`.
async fn guarded_fetch<F>(segment: &Segment, cancel: &CancellationToken, fetch: F) -> SegmentOutcome
where
    F: Future<Output = Result<Bytes>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        caught = AssertUnwindSafe(fetch).catch_unwind() => {
            // Another task already failed; drop whatever we got.
            if cancel.is_cancelled() {
                return None;
            }
            let result = caught.unwrap_or_else(|_| {
                Err(ClipError::Download {
                    ordinal: segment.ordinal,
                    url: segment.source_url.clone(),
                    reason: "download task panicked".to_string(),
                })
            });
            Some(result.map(|body| (segment.ordinal, body)))
        }
    }
}

async fn fetch_bytes(client: &Client, segment: &Segment) -> Result<Bytes> {
    let response = client
        .get(&segment.source_url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| download_error(segment, e))?;

    response
        .bytes()
        .await
        .map_err(|e| download_error(segment, e))
}

fn download_error(segment: &Segment, e: reqwest::Error) -> ClipError {
    ClipError::Download {
        ordinal: segment.ordinal,
        url: segment.source_url.clone(),
        reason: e.to_string(),
    }
}
