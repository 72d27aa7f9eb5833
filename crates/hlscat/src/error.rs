use std::path::PathBuf;
use std::time::Duration;

use reqwest::StatusCode;

/// Playlist capabilities this downloader refuses to handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum UnsupportedFeature {
    #[strum(to_string = "multivariant playlist")]
    MultivariantPlaylist,
    #[strum(to_string = "encryption")]
    Encryption,
    #[strum(to_string = "byte-range addressing")]
    ByteRange,
    #[strum(to_string = "discontinuity")]
    Discontinuity,
    #[strum(to_string = "init segment map")]
    InitSegmentMap,
}

impl UnsupportedFeature {
    /// The playlist tag that signals this feature.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::MultivariantPlaylist => "#EXT-X-STREAM-INF",
            Self::Encryption => "#EXT-X-KEY",
            Self::ByteRange => "#EXT-X-BYTERANGE",
            Self::Discontinuity => "#EXT-X-DISCONTINUITY",
            Self::InitSegmentMap => "#EXT-X-MAP",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HlsError {
    #[error("configuration error: {reason}")]
    Configuration { reason: String },

    #[error("invalid URL `{input}`: {reason}")]
    InvalidUrl { input: String, reason: String },

    #[error("unsupported playlist feature: {feature} ({} at line {line})", .feature.tag())]
    UnsupportedFeature {
        feature: UnsupportedFeature,
        line: usize,
    },

    #[error("no media segment URLs in playlist")]
    EmptyPlaylist,

    #[error("request failed with HTTP {status} for {url}")]
    HttpStatus { status: StatusCode, url: String },

    #[error("HTTP request failed for {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request for {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("failed to write output file {}: {source}", .path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("download cancelled")]
    Cancelled,

    #[error("internal error: {reason}")]
    Internal { reason: String },
}

impl HlsError {
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    pub fn internal(reason: impl Into<String>) -> Self {
        Self::Internal {
            reason: reason.into(),
        }
    }

    pub fn invalid_url(input: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidUrl {
            input: input.into(),
            reason: reason.to_string(),
        }
    }

    pub fn http_status(status: StatusCode, url: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            url: url.into(),
        }
    }

    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// HTTP status code carried by the error, if the remote answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            Self::Network { source, .. } => source.status(),
            _ => None,
        }
    }

    /// Whether the failure came from the remote side rather than local input or disk.
    pub fn is_fetch_error(&self) -> bool {
        matches!(
            self,
            Self::HttpStatus { .. } | Self::Network { .. } | Self::Timeout { .. }
        )
    }
}
