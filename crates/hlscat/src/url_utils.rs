use tracing::trace;
use url::Url;

use crate::HlsError;

/// Parse a user-supplied absolute URL.
pub fn parse_url(input: &str) -> Result<Url, HlsError> {
    Url::parse(input.trim()).map_err(|e| HlsError::invalid_url(input, e))
}

/// Resolve a playlist reference against the playlist's own URL (RFC 3986).
///
/// Absolute references come back unchanged; relative ones are merged with the
/// base's scheme, authority and path.
pub fn resolve_url(base: &Url, reference: &str) -> Result<Url, HlsError> {
    let resolved = base
        .join(reference)
        .map_err(|e| HlsError::invalid_url(reference, e))?;
    trace!("Resolved URI: {} + {} -> {}", base, reference, resolved);
    Ok(resolved)
}

/// File extension of the last path component of `url`, if it has one.
///
/// `clip.mp4` gives `mp4`; `clip`, `clip.` and the dotfile `.hidden` give nothing.
pub fn infer_extension(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let last_component = parsed.path().rsplit('/').next()?;
    let name = last_component.strip_prefix('.').unwrap_or(last_component);

    let pieces: Vec<&str> = name.split('.').collect();
    if pieces.len() < 2 {
        return None;
    }
    pieces
        .last()
        .filter(|extension| !extension.is_empty())
        .map(|extension| extension.to_string())
}
