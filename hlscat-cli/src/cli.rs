use std::time::Duration;

use clap::Parser;
use hlscat_engine::config::{DEFAULT_CONCURRENCY, DEFAULT_USER_AGENT};
use hlscat_engine::downloader::DEFAULT_OUTPUT_NAME;
use hlscat_engine::{DownloaderConfig, GrabRequest, HlsError};

use crate::error::Result;
use crate::params::{parse_headers, parse_params};

/// Download an HLS media playlist into a single media file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// URL of the media playlist
    #[arg(long, env = "HLSCAT_URL")]
    pub url: Option<String>,

    /// Output file name; the segment extension is appended when it has none
    #[arg(short, long, default_value = DEFAULT_OUTPUT_NAME)]
    pub output: String,

    /// Maximum number of segments fetched at once (0 = unbounded)
    #[arg(short, long, env = "HLSCAT_CONCURRENCY", default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Timeout for each request in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// Connection timeout in seconds
    #[arg(long, default_value_t = 10)]
    pub connect_timeout: u64,

    /// User agent sent with every request
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Extra request header, e.g. "Referer: https://example.com" (repeatable)
    #[arg(short = 'H', long = "header")]
    pub headers: Vec<String>,

    /// Extra query parameter as key=value (repeatable)
    #[arg(long = "param")]
    pub params: Vec<String>,

    /// Accept invalid TLS certificates
    #[arg(long)]
    pub insecure: bool,

    /// Route requests through the proxy named by HTTP_PROXY/HTTPS_PROXY
    #[arg(long)]
    pub system_proxy: bool,

    /// Enable debug logging
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    pub fn downloader_config(&self) -> Result<DownloaderConfig> {
        let mut config = DownloaderConfig::default()
            .with_concurrency(self.concurrency)
            .with_fetch_timeout(Duration::from_secs(self.timeout))
            .with_connect_timeout(Duration::from_secs(self.connect_timeout))
            .with_user_agent(self.user_agent.clone())
            .with_danger_accept_invalid_certs(self.insecure)
            .with_system_proxy(self.system_proxy)
            .with_params(parse_params(&self.params)?);

        for (name, value) in parse_headers(&self.headers)? {
            config = config.with_header(&name, &value)?;
        }
        Ok(config)
    }

    pub fn grab_request(&self) -> Result<GrabRequest> {
        let url = self
            .url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| {
                HlsError::configuration("a playlist URL is required (--url or HLSCAT_URL)")
            })?;
        Ok(GrabRequest::new(url).with_output(self.output.clone()))
    }
}
