//! Per-channel rate limiting.
//!
//! Fixed-window counter using DashMap. Every clip or preview request fans
//! out to the upstream platform, so requests are counted per channel
//! rather than per client.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

use crate::error::ClipError;

/// Per-channel fixed-window rate limiter.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    /// Counters per channel: (request_count, window_start)
    counters: Arc<DashMap<String, (u32, Instant)>>,
    limit: u32,
    window: Duration,
}

impl RateLimiter {
    /// Create a limiter allowing `requests_per_minute` per channel.
    pub fn new(requests_per_minute: u32) -> Self {
        Self {
            counters: Arc::new(DashMap::new()),
            limit: requests_per_minute,
            window: Duration::from_secs(60),
        }
    }

    /// Count a request for `channel`; `false` once the window is used up.
    pub fn check(&self, channel: &str) -> bool {
        let now = Instant::now();
        let mut entry = self.counters.entry(channel.to_string()).or_insert((0, now));

        if entry.1.elapsed() >= self.window {
            entry.0 = 0;
            entry.1 = now;
        }

        entry.0 += 1;
        entry.0 <= self.limit
    }

    /// [`check`](Self::check) as a `Result` for handlers.
    pub fn admit(&self, channel: &str) -> Result<(), ClipError> {
        if self.check(channel) {
            Ok(())
        } else {
            warn!("Rate limit exceeded for channel: {}", channel);
            Err(ClipError::RateLimited(channel.to_string()))
        }
    }

    /// Remove channels whose window has expired.
    pub fn cleanup(&self) {
        self.counters
            .retain(|_, (_, window_start)| window_start.elapsed() < self.window);
    }
}
