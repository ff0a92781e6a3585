//! Per-channel manifest cache.
//!
//! Holds the last primary manifest fetched for each channel so repeated
//! clip and preview requests skip the upstream manifest endpoint for the
//! freshness window. Entries are keyed by normalized channel name and
//! guarded per shard by `DashMap`; unrelated channels never contend on a
//! single global lock.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Default freshness window for a cached manifest.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// Last known manifest for one channel.
#[derive(Clone, Debug)]
pub struct PlaylistCacheEntry {
    pub channel: String,
    pub body: String,
    pub expires_at: Instant,
}

impl PlaylistCacheEntry {
    /// Usable only while the current time is before `expires_at`.
    pub fn is_fresh(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Thread-safe manifest cache with per-channel expiry.
#[derive(Clone, Debug)]
pub struct PlaylistCache {
    entries: Arc<DashMap<String, PlaylistCacheEntry>>,
    ttl: Duration,
}

impl PlaylistCache {
    /// Create a cache whose entries stay fresh for `ttl` after a successful store.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            ttl,
        }
    }

    /// Return the cached manifest body for `channel` if it is still fresh.
    pub fn get_fresh(&self, channel: &str) -> Option<String> {
        match self.entries.get(channel) {
            Some(entry) if entry.is_fresh() => {
                debug!("Playlist cache HIT for {}", channel);
                Some(entry.body.clone())
            }
            _ => {
                debug!("Playlist cache MISS for {}", channel);
                None
            }
        }
    }

    /// Store a manifest and open a new freshness window.
    pub fn store(&self, channel: &str, body: String) {
        self.put(channel, body, Instant::now() + self.ttl);
    }

    /// Store a manifest that must be re-fetched on the next lookup.
    pub fn mark_stale(&self, channel: &str, body: String) {
        debug!("Marking cached manifest stale for {}", channel);
        self.put(channel, body, Instant::now());
    }

    fn put(&self, channel: &str, body: String, expires_at: Instant) {
        self.entries.insert(
            channel.to_string(),
            PlaylistCacheEntry {
                channel: channel.to_string(),
                body,
                expires_at,
            },
        );
    }

    /// Remove every expired entry. Returns how many were dropped.
    pub fn evict_stale(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_fresh());
        before.saturating_sub(self.entries.len())
    }

    /// Number of channels currently tracked (fresh or stale).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for PlaylistCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}
