use std::path::{Path, PathBuf};

use tracing::{debug, info};
use url::Url;

use crate::HlsError;
use crate::url_utils::infer_extension;

/// Where the assembled media ends up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDescriptor {
    pub path: PathBuf,
}

/// Decide the output path for `requested`.
///
/// A name that already carries an extension is kept verbatim; otherwise
/// `extension_hint` is appended. The check runs on the name resolved against
/// the playlist URL, so it sees the same path component a URL would.
pub fn resolve_output_path(
    playlist_url: &Url,
    requested: &str,
    extension_hint: &str,
) -> OutputDescriptor {
    let has_extension = match playlist_url.join(requested) {
        Ok(resolved) => infer_extension(resolved.as_str()).is_some(),
        Err(e) => {
            debug!(requested, error = %e, "Output name is not URL-like, checking it as a path");
            Path::new(requested).extension().is_some()
        }
    };

    let path = if has_extension {
        PathBuf::from(requested)
    } else {
        PathBuf::from(format!("{requested}.{extension_hint}"))
    };
    OutputDescriptor { path }
}

/// Write the assembled media to `descriptor.path`, replacing any existing file.
pub async fn write_output(descriptor: &OutputDescriptor, data: &[u8]) -> Result<(), HlsError> {
    tokio::fs::write(&descriptor.path, data)
        .await
        .map_err(|source| HlsError::Persistence {
            path: descriptor.path.clone(),
            source,
        })?;
    info!(path = %descriptor.path.display(), bytes = data.len(), "Wrote output file");
    Ok(())
}
