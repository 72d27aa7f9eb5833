// Orchestrates one run: playlist -> segment URLs -> assembled bytes -> output file.

use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::HlsError;
use crate::config::DownloaderConfig;
use crate::fetcher::{HttpFetcher, SegmentFetcher, fetch_with_timeout};
use crate::output::{resolve_output_path, write_output};
use crate::pipeline::{SegmentPipeline, build_jobs};
use crate::playlist::{decode_playlist, parse_playlist};
use crate::url_utils::parse_url;

/// Output name used when the caller does not pick one.
pub const DEFAULT_OUTPUT_NAME: &str = "output";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrabRequest {
    pub playlist_url: String,
    /// Output name, with or without an extension
    pub output: String,
}

impl GrabRequest {
    pub fn new(playlist_url: impl Into<String>) -> Self {
        Self {
            playlist_url: playlist_url.into(),
            output: DEFAULT_OUTPUT_NAME.to_string(),
        }
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = output.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrabOutcome {
    pub path: PathBuf,
    pub bytes_written: usize,
    pub segment_count: usize,
}

/// Downloads a media playlist into a single file.
pub struct HlsCat {
    config: DownloaderConfig,
    fetcher: Arc<dyn SegmentFetcher>,
}

impl HlsCat {
    pub fn new(config: DownloaderConfig) -> Result<Self, HlsError> {
        config.validate()?;
        let fetcher = Arc::new(HttpFetcher::new(&config)?);
        Ok(Self { config, fetcher })
    }

    /// Use a custom fetch implementation instead of HTTP.
    pub fn with_fetcher(
        config: DownloaderConfig,
        fetcher: Arc<dyn SegmentFetcher>,
    ) -> Result<Self, HlsError> {
        config.validate()?;
        Ok(Self { config, fetcher })
    }

    pub fn config(&self) -> &DownloaderConfig {
        &self.config
    }

    #[instrument(skip(self, request, token), fields(url = %request.playlist_url))]
    pub async fn run(
        &self,
        request: GrabRequest,
        token: &CancellationToken,
    ) -> Result<GrabOutcome, HlsError> {
        if request.playlist_url.trim().is_empty() {
            return Err(HlsError::configuration("a playlist URL is required"));
        }
        if request.output.trim().is_empty() {
            return Err(HlsError::configuration("output name must not be empty"));
        }
        let playlist_url = parse_url(&request.playlist_url)?;

        info!("Fetching playlist");
        let raw = fetch_with_timeout(
            self.fetcher.as_ref(),
            &playlist_url,
            self.config.fetch_timeout,
            token,
        )
        .await?;
        let text = decode_playlist(&raw);
        let parsed = parse_playlist(&text)?;

        let jobs = build_jobs(&playlist_url, &parsed)?;
        info!("Going to download {} files", jobs.len());

        let pipeline = SegmentPipeline::new(Arc::clone(&self.fetcher), &self.config);
        let media = pipeline.assemble(jobs, token).await?;

        let descriptor = resolve_output_path(&playlist_url, &request.output, &media.extension_hint);
        debug!(
            path = %descriptor.path.display(),
            extension_hint = %media.extension_hint,
            "Resolved output path"
        );

        write_output(&descriptor, &media.data).await?;

        Ok(GrabOutcome {
            path: descriptor.path,
            bytes_written: media.data.len(),
            segment_count: media.segment_count,
        })
    }
}
