use super::{Segment, parser};
use crate::{
    cache::PlaylistCache,
    channel::normalize_channel,
    error::{ClipError, Result},
    metrics,
};
use reqwest::{Client, StatusCode};
use tracing::{debug, info, warn};

/// Default ceiling on passes through the resolution loop.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Fixed query string of the upstream manifest endpoint.
const MANIFEST_QUERY: &str = "platform=web&allow_source=true&allow_audio_only=true";

/// Turns a channel name into its current list of live segments.
///
/// The primary manifest is cached per channel; the secondary playlist is
/// always fetched fresh because it moves with the live edge.
#[derive(Clone, Debug)]
pub struct PlaylistResolver {
    client: Client,
    cache: PlaylistCache,
    manifest_base: String,
    max_attempts: u32,
}

impl PlaylistResolver {
    pub fn new(client: Client, cache: PlaylistCache, manifest_base: impl Into<String>) -> Self {
        Self {
            client,
            cache,
            manifest_base: manifest_base.into().trim_end_matches('/').to_string(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Override the retry ceiling (minimum 1).
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn cache(&self) -> &PlaylistCache {
        &self.cache
    }

    /// Upstream manifest URL for an already-normalized channel.
    pub fn manifest_url(&self, channel: &str) -> String {
        format!(
            "{}/{}?{}",
            self.manifest_base,
            url_escape(channel),
            MANIFEST_QUERY
        )
    }

    /// Resolve the ordered live segments of `channel`.
    ///
    /// Only two conditions loop: a non-success secondary playlist (the
    /// cached manifest is marked stale first) and a playlist without live
    /// segments. Everything else returns immediately.
    ///
    /// # Errors
    /// - [`ClipError::StreamNotFound`] when the channel is offline
    /// - [`ClipError::NoStreamPlaylist`] when the manifest has no playlist URL
    /// - [`ClipError::UpstreamStatus`] / [`ClipError::UpstreamTransport`]
    /// - [`ClipError::ResolutionExhausted`] once the attempt ceiling is hit
    pub async fn resolve_segments(&self, channel: &str) -> Result<Vec<Segment>> {
        let channel = normalize_channel(channel)?;

        for attempt in 1..=self.max_attempts {
            debug!(
                "Resolving segments for {} (attempt {}/{})",
                channel, attempt, self.max_attempts
            );

            let manifest = match self.cache.get_fresh(&channel) {
                Some(body) => {
                    metrics::record_cache_lookup(true);
                    body
                }
                None => {
                    metrics::record_cache_lookup(false);
                    self.fetch_manifest(&channel).await?
                }
            };

            let playlist_url = parser::first_absolute_url(&manifest)
                .ok_or_else(|| ClipError::NoStreamPlaylist(channel.clone()))?;

            let response = self
                .client
                .get(playlist_url.clone())
                .send()
                .await
                .inspect_err(|_| metrics::record_upstream_error("transport"))?;

            if !response.status().is_success() {
                warn!(
                    "Secondary playlist for {} returned {} (attempt {}/{}), expiring cached manifest",
                    channel,
                    response.status(),
                    attempt,
                    self.max_attempts
                );
                metrics::record_resolve_retry("stale_playlist");
                self.cache.mark_stale(&channel, manifest);
                continue;
            }

            let body = response
                .text()
                .await
                .inspect_err(|_| metrics::record_upstream_error("transport"))?;
            let segments = parser::live_segments(&body, &playlist_url);

            if segments.is_empty() {
                warn!(
                    "No live segments for {} (attempt {}/{})",
                    channel, attempt, self.max_attempts
                );
                metrics::record_resolve_retry("empty_playlist");
                continue;
            }

            self.cache.store(&channel, manifest);
            info!("Resolved {} live segments for {}", segments.len(), channel);
            return Ok(segments);
        }

        Err(ClipError::ResolutionExhausted {
            channel,
            attempts: self.max_attempts,
        })
    }

    async fn fetch_manifest(&self, channel: &str) -> Result<String> {
        let url = self.manifest_url(channel);
        info!("Fetching manifest for {} from upstream", channel);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .inspect_err(|_| metrics::record_upstream_error("transport"))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .inspect_err(|_| metrics::record_upstream_error("transport"))?;

        if status == StatusCode::NOT_FOUND {
            return Err(ClipError::StreamNotFound(channel.to_string()));
        }

        if !status.is_success() {
            metrics::record_upstream_error("status");
            return Err(ClipError::UpstreamStatus {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }
}

/// Percent-encode a single path segment.
fn url_escape(segment: &str) -> String {
    url::form_urlencoded::byte_serialize(segment.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}
