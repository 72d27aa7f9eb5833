pub mod config;
pub mod downloader;
pub mod error;
pub mod fetcher;
pub mod output;
pub mod pipeline;
pub mod playlist;
pub mod url_utils;

pub use config::DownloaderConfig;
pub use downloader::{GrabOutcome, GrabRequest, HlsCat};
pub use error::{HlsError, UnsupportedFeature};
pub use fetcher::{HttpFetcher, SegmentFetcher};
pub use output::OutputDescriptor;
pub use pipeline::{AssembledMedia, JobList, SegmentJob, SegmentPipeline};
pub use playlist::{ParsedPlaylist, parse_playlist};
pub use tokio_util::sync::CancellationToken;
