// HLS media playlist parsing: extracts segment URIs and rejects tags this downloader cannot honour.

use tracing::{debug, trace};

use crate::error::{HlsError, UnsupportedFeature};

/// Segment references of a media playlist, in playlist order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPlaylist {
    /// Segment URIs exactly as written (trimmed), in the order they appear.
    pub segment_uris: Vec<String>,
    /// Reserved for `EXT-X-MAP` support. The parser never fills it because
    /// playlists carrying an init segment map are rejected.
    pub init_segment_uri: Option<String>,
}

impl ParsedPlaylist {
    pub fn is_empty(&self) -> bool {
        self.segment_uris.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segment_uris.len()
    }
}

/// Decode raw playlist bytes. Invalid UTF-8 is replaced rather than rejected
/// and a leading byte order mark is dropped.
pub fn decode_playlist(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    match text.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => text.into_owned(),
    }
}

/// Parse media playlist text into its ordered segment URIs.
///
/// Directive lines are ignored unless they signal a feature listed in
/// [`UnsupportedFeature`], in which case parsing stops at that line. A playlist
/// without any segment is a valid result here; it only becomes an error when
/// assembly is attempted.
pub fn parse_playlist(text: &str) -> Result<ParsedPlaylist, HlsError> {
    let mut parsed = ParsedPlaylist::default();

    for (idx, line) in lines(text).enumerate() {
        let line_number = idx + 1;

        if line.starts_with('#') {
            if let Some(feature) = unsupported_feature(line) {
                debug!(line = line_number, %feature, "Rejecting playlist");
                return Err(HlsError::UnsupportedFeature {
                    feature,
                    line: line_number,
                });
            }
            trace!(line = line_number, directive = line, "Ignoring directive");
            continue;
        }

        let uri = line.trim();
        if uri.is_empty() {
            continue;
        }
        parsed.segment_uris.push(uri.to_string());
    }

    debug!(segments = parsed.len(), "Parsed media playlist");
    Ok(parsed)
}

fn unsupported_feature(directive: &str) -> Option<UnsupportedFeature> {
    if directive.starts_with("#EXT-X-STREAM-INF") {
        Some(UnsupportedFeature::MultivariantPlaylist)
    } else if directive.starts_with("#EXT-X-KEY") {
        Some(UnsupportedFeature::Encryption)
    } else if directive.starts_with("#EXT-X-BYTERANGE") {
        Some(UnsupportedFeature::ByteRange)
    } else if directive.trim() == "#EXT-X-DISCONTINUITY" {
        Some(UnsupportedFeature::Discontinuity)
    } else if directive.starts_with("#EXT-X-MAP") {
        Some(UnsupportedFeature::InitSegmentMap)
    } else {
        None
    }
}

/// Split on `\r\n`, `\r` or `\n`.
fn lines(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = Some(text);
    std::iter::from_fn(move || {
        let current = rest?;
        match current.find(['\r', '\n']) {
            Some(pos) => {
                let sep_len = if current[pos..].starts_with("\r\n") { 2 } else { 1 };
                rest = Some(&current[pos + sep_len..]);
                Some(&current[..pos])
            }
            None => {
                rest = None;
                Some(current)
            }
        }
    })
}
