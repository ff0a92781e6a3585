use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};

/// Issues output identifiers shaped like unix timestamps.
///
/// Each id is `max(now_secs, previous + 1)`, so two requests landing in the
/// same second still get distinct file names.
#[derive(Debug, Default)]
pub struct OutputIds {
    last: AtomicI64,
}

impl OutputIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> i64 {
        let now = Utc::now().timestamp();
        let previous = self
            .last
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or(now);
        now.max(previous + 1)
    }
}

/// Relative output path handed back to callers: `<channel>/<id>.<ext>`.
pub fn relative_path(channel: &str, id: i64, extension: &str) -> String {
    format!("{channel}/{id}.{extension}")
}

/// One clip or preview being produced; lives for a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputJob {
    pub channel: String,
    pub created_at_epoch: i64,
    /// Path under the output root, returned to the caller
    pub relative: String,
    /// Where the media tool writes
    pub output_path: PathBuf,
}

impl OutputJob {
    pub fn new(root: &Path, channel: &str, ids: &OutputIds, extension: &str) -> Self {
        let created_at_epoch = ids.next_id();
        let relative = relative_path(channel, created_at_epoch, extension);
        Self {
            channel: channel.to_string(),
            created_at_epoch,
            output_path: root.join(&relative),
            relative,
        }
    }
}
