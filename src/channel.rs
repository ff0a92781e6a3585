use crate::error::ClipError;

/// Longest channel name accepted
pub const MAX_CHANNEL_LEN: usize = 64;

/// Normalize a channel name for cache keys, upstream requests and output paths.
///
/// Names are trimmed and lower-cased. Only `[a-z0-9_]` survives because the
/// result becomes a directory name under the clip and preview roots.
///
/// # Errors
/// Returns [`ClipError::InvalidChannel`] for:
/// - Empty names
/// - Names longer than [`MAX_CHANNEL_LEN`]
/// - Any character outside ASCII letters, digits and `_`
pub fn normalize_channel(raw: &str) -> Result<String, ClipError> {
    let channel = raw.trim().to_ascii_lowercase();

    if channel.is_empty() {
        return Err(ClipError::InvalidChannel("empty channel name".to_string()));
    }

    if channel.len() > MAX_CHANNEL_LEN {
        return Err(ClipError::InvalidChannel(format!(
            "channel name longer than {MAX_CHANNEL_LEN} characters"
        )));
    }

    if let Some(bad) = channel
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_'))
    {
        return Err(ClipError::InvalidChannel(format!(
            "character '{bad}' not allowed in {raw}"
        )));
    }

    Ok(channel)
}
