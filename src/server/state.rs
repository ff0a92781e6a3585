use crate::{
    cache::PlaylistCache,
    clipper::{Clipper, ClipperParts},
    config::Config,
    media::{FfmpegTool, MediaTool},
};
use metrics_exporter_prometheus::PrometheusHandle;
use reqwest::Client;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::rate_limit::RateLimiter;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<Config>,
    /// Clip and preview pipeline
    pub clipper: Clipper,
    /// Manifest cache, shared with the clipper's resolver
    pub cache: PlaylistCache,
    /// Per-channel limiter (None when RATE_LIMIT_RPM is 0)
    pub rate_limiter: Option<RateLimiter>,
    /// Prometheus render handle (None when no recorder is installed)
    pub metrics: Option<PrometheusHandle>,
    pub started_at: Instant,
}

impl AppState {
    /// Create state that shells out to the configured ffmpeg binary
    pub fn new(config: Config) -> Self {
        let tool = Arc::new(FfmpegTool::new(config.ffmpeg_path.clone()));
        Self::with_media_tool(config, tool)
    }

    /// Create state with a specific media tool implementation
    pub fn with_media_tool(config: Config, tool: Arc<dyn MediaTool>) -> Self {
        let http_client = Client::builder()
            .timeout(config.request_timeout())
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .build()
            .expect("Failed to create HTTP client");

        let cache = PlaylistCache::new(config.playlist_cache_ttl());

        let clipper = Clipper::new(ClipperParts {
            client: http_client,
            cache: cache.clone(),
            upstream_base_url: config.upstream_base_url.clone(),
            resolve_max_attempts: config.resolve_max_attempts,
            clips_dir: config.clips_dir.clone(),
            previews_dir: config.previews_dir.clone(),
            tool,
        });

        let rate_limiter = (config.rate_limit_rpm > 0).then(|| RateLimiter::new(config.rate_limit_rpm));

        Self {
            config: Arc::new(config),
            clipper,
            cache,
            rate_limiter,
            metrics: None,
            started_at: Instant::now(),
        }
    }

    /// Expose `/metrics` through the given Prometheus handle
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}
