use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Upstream playlist proxy used in DEV mode when none is configured
pub const DEV_UPSTREAM_BASE_URL: &str = "https://luminous.alienpls.org/live";

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub is_dev: bool,
    /// Base of the manifest endpoint; the channel is appended as a path segment
    pub upstream_base_url: String,
    /// Root directory for finished clips
    pub clips_dir: PathBuf,
    /// Root directory for preview images (and their scratch space)
    pub previews_dir: PathBuf,
    /// ffmpeg binary used for clips and previews
    pub ffmpeg_path: PathBuf,
    /// Timeout applied to every upstream request (default: 60)
    pub request_timeout_secs: u64,
    /// Freshness window of a cached manifest (default: 3600)
    pub playlist_cache_ttl_secs: u64,
    /// Passes through the resolver loop before giving up (default: 3)
    pub resolve_max_attempts: u32,
    /// Interval between stale cache sweeps (default: 300)
    pub cache_sweep_interval_secs: u64,
    /// Requests per minute per channel, 0 disables limiting (default: 0)
    pub rate_limit_rpm: u32,
}

impl Config {
    /// Load configuration from environment variables
    /// In DEV mode, provides sensible defaults. In PROD mode, PORT and
    /// UPSTREAM_BASE_URL are required.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let is_dev = env::var("DEV_MODE")
            .unwrap_or_else(|_| "false".to_string())
            .parse()
            .unwrap_or(false);

        // Port: required in prod, defaults to 8989 in dev
        let port = if is_dev {
            env::var("PORT")
                .unwrap_or_else(|_| "8989".to_string())
                .parse()?
        } else {
            env::var("PORT")
                .map_err(|_| "PORT is required in production")?
                .parse()?
        };

        let upstream_base_url = if is_dev {
            env::var("UPSTREAM_BASE_URL").unwrap_or_else(|_| DEV_UPSTREAM_BASE_URL.to_string())
        } else {
            env::var("UPSTREAM_BASE_URL")
                .map_err(|_| "UPSTREAM_BASE_URL is required in production")?
        };

        let clips_dir = env::var("CLIPS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./clips"));
        let previews_dir = env::var("PREVIEWS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./previews"));
        let ffmpeg_path = env::var("FFMPEG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("ffmpeg"));

        Ok(Config {
            port,
            is_dev,
            upstream_base_url,
            clips_dir,
            previews_dir,
            ffmpeg_path,
            request_timeout_secs: parse_or("REQUEST_TIMEOUT_SECS", 60),
            playlist_cache_ttl_secs: parse_or("PLAYLIST_CACHE_TTL_SECS", 3600),
            resolve_max_attempts: parse_or("RESOLVE_MAX_ATTEMPTS", 3),
            cache_sweep_interval_secs: parse_or("CACHE_SWEEP_INTERVAL_SECS", 300),
            rate_limit_rpm: parse_or("RATE_LIMIT_RPM", 0),
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn playlist_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.playlist_cache_ttl_secs)
    }

    pub fn cache_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.cache_sweep_interval_secs.max(1))
    }
}

/// Optional numeric variable; missing or unparseable values use `default`.
fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
