// Byte fetching: the HTTP implementation plus the timeout and cancellation wrapper shared by every request.

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, trace};
use url::Url;

use crate::HlsError;
use crate::config::DownloaderConfig;

/// Fetches the full body behind a URL, failing on any non-success status.
#[async_trait]
pub trait SegmentFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<Bytes, HlsError>;
}

pub fn install_rustls_provider() {
    static PROVIDER_INSTALLED: OnceLock<()> = OnceLock::new();
    PROVIDER_INSTALLED.get_or_init(|| {
        if let Err(e) = rustls::crypto::aws_lc_rs::default_provider().install_default() {
            // Another crate got there first.
            debug!(existing_provider = ?e, "rustls CryptoProvider already installed");
        }
    });
}

/// Create a reqwest Client with the provided configuration
pub fn create_client(config: &DownloaderConfig) -> Result<Client, HlsError> {
    install_rustls_provider();

    let mut client_builder = Client::builder()
        .pool_max_idle_per_host(config.concurrency.max(1))
        .user_agent(&config.user_agent)
        .default_headers(config.headers.clone())
        .danger_accept_invalid_certs(config.danger_accept_invalid_certs)
        .redirect(if config.follow_redirects {
            reqwest::redirect::Policy::limited(10)
        } else {
            reqwest::redirect::Policy::none()
        });

    if !config.connect_timeout.is_zero() {
        client_builder = client_builder.connect_timeout(config.connect_timeout);
    }

    if config.use_system_proxy {
        debug!("Using system proxy settings");
    } else {
        client_builder = client_builder.no_proxy();
    }

    client_builder
        .build()
        .map_err(|e| HlsError::configuration(format!("failed to build HTTP client: {e}")))
}

/// [`SegmentFetcher`] backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    params: Vec<(String, String)>,
}

impl HttpFetcher {
    pub fn new(config: &DownloaderConfig) -> Result<Self, HlsError> {
        Ok(Self::with_client(create_client(config)?, config.params.clone()))
    }

    pub fn with_client(client: Client, params: Vec<(String, String)>) -> Self {
        Self { client, params }
    }
}

#[async_trait]
impl SegmentFetcher for HttpFetcher {
    #[instrument(skip(self, url), fields(url = %url))]
    async fn fetch(&self, url: &Url) -> Result<Bytes, HlsError> {
        let mut request = self.client.get(url.clone());
        if !self.params.is_empty() {
            request = request.query(&self.params);
        }

        let response = request
            .send()
            .await
            .map_err(|e| HlsError::network(url.as_str(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HlsError::http_status(status, url.as_str()));
        }

        let http_version = response.version();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| HlsError::network(url.as_str(), e))?;

        trace!(
            http_version = ?http_version,
            size = bytes.len(),
            "Fetched"
        );
        Ok(bytes)
    }
}

/// Run one fetch bounded by `timeout` and aborted by `token`.
pub async fn fetch_with_timeout(
    fetcher: &dyn SegmentFetcher,
    url: &Url,
    timeout: Duration,
    token: &CancellationToken,
) -> Result<Bytes, HlsError> {
    tokio::select! {
        biased;

        _ = token.cancelled() => Err(HlsError::Cancelled),
        result = tokio::time::timeout(timeout, fetcher.fetch(url)) => match result {
            Ok(fetched) => fetched,
            Err(_) => Err(HlsError::Timeout {
                url: url.to_string(),
                timeout,
            }),
        },
    }
}
