use super::Segment;
use m3u8_rs::parse_media_playlist_res;
use tracing::{debug, warn};
use url::Url;

/// `#EXTINF` title suffix that marks a segment of the live broadcast
/// (as opposed to ad or prefetch entries).
const LIVE_MARKER: &str = "live";

/// Find the first absolute `http(s)://` URL embedded anywhere in a manifest.
///
/// The manifest lists quality variants; the first one is the secondary
/// playlist that carries the actual segments. The URL ends at whitespace
/// or a quote so attribute values (`URI="..."`) are handled too.
pub fn first_absolute_url(manifest: &str) -> Option<Url> {
    manifest.lines().find_map(|line| {
        let start = line
            .match_indices("http")
            .map(|(i, _)| i)
            .find(|&i| line[i..].starts_with("http://") || line[i..].starts_with("https://"))?;

        let candidate = &line[start..];
        let end = candidate
            .find(|c: char| c.is_whitespace() || c == '"' || c == '\'')
            .unwrap_or(candidate.len());

        Url::parse(&candidate[..end]).ok()
    })
}

/// Extract the live segments of a media playlist, in playlist order.
///
/// Segment URIs that are relative get resolved against `base` (the URL the
/// playlist was fetched from). A body that does not parse as a media
/// playlist yields no segments.
pub fn live_segments(body: &str, base: &Url) -> Vec<Segment> {
    let playlist = match parse_media_playlist_res(body.as_bytes()) {
        Ok(playlist) => playlist,
        Err(e) => {
            warn!("Failed to parse media playlist: {:?}", e);
            return Vec::new();
        }
    };

    let segments: Vec<Segment> = playlist
        .segments
        .iter()
        .filter(|segment| {
            segment
                .title
                .as_deref()
                .is_some_and(|title| title.trim_end().ends_with(LIVE_MARKER))
        })
        .filter_map(|segment| match base.join(segment.uri.trim()) {
            Ok(url) => Some(url.to_string()),
            Err(e) => {
                warn!("Skipping unresolvable segment URI {}: {}", segment.uri, e);
                None
            }
        })
        .enumerate()
        .map(|(ordinal, source_url)| Segment {
            ordinal,
            source_url,
        })
        .collect();

    debug!("Extracted {} live segments", segments.len());
    segments
}
