use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::HlsError;

pub const DEFAULT_USER_AGENT: &str = concat!("hlscat/", env!("CARGO_PKG_VERSION"));

/// Default number of segment requests kept in flight at once.
pub const DEFAULT_CONCURRENCY: usize = 8;

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Extension used for the output file when no segment URL carries one.
pub const FALLBACK_EXTENSION: &str = "ts";

#[derive(Debug, Clone)]
pub struct DownloaderConfig {
    /// Maximum segment requests in flight (0 = all segments at once)
    pub concurrency: usize,

    /// Upper bound for a single fetch, from connect until the body is read.
    /// Applies to the playlist request as well as every segment.
    pub fetch_timeout: Duration,

    /// TCP/TLS connect timeout (0 = reqwest default)
    pub connect_timeout: Duration,

    pub follow_redirects: bool,

    pub user_agent: String,

    /// Headers sent with every request, merged over the defaults
    pub headers: HeaderMap,

    /// Query parameters appended to every request
    pub params: Vec<(String, String)>,

    pub danger_accept_invalid_certs: bool,

    /// Honour `HTTP_PROXY`/`HTTPS_PROXY` and friends. Off by default.
    pub use_system_proxy: bool,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            follow_redirects: true,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            headers: DownloaderConfig::get_default_headers(),
            params: Vec::new(),
            danger_accept_invalid_certs: false,
            use_system_proxy: false,
        }
    }
}

impl DownloaderConfig {
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = follow;
        self
    }

    pub fn with_danger_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.danger_accept_invalid_certs = accept;
        self
    }

    pub fn with_system_proxy(mut self, enabled: bool) -> Self {
        self.use_system_proxy = enabled;
        self
    }

    pub fn with_params(mut self, params: Vec<(String, String)>) -> Self {
        self.params = params;
        self
    }

    /// Merge custom headers over the defaults. Custom values win for the same name.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        for (name, value) in headers.iter() {
            self.headers.insert(name.clone(), value.clone());
        }
        self
    }

    /// Add a single `Name: value` header given as raw strings.
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, HlsError> {
        let name = HeaderName::from_bytes(name.trim().as_bytes()).map_err(|e| {
            HlsError::configuration(format!("invalid header name `{name}`: {e}"))
        })?;
        let value = HeaderValue::from_str(value.trim()).map_err(|e| {
            HlsError::configuration(format!("invalid value for header `{name}`: {e}"))
        })?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Rejects settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), HlsError> {
        if self.fetch_timeout.is_zero() {
            return Err(HlsError::configuration(
                "fetch timeout must be greater than zero",
            ));
        }
        if self.user_agent.trim().is_empty() {
            return Err(HlsError::configuration("user agent must not be empty"));
        }
        Ok(())
    }

    pub fn get_default_headers() -> HeaderMap {
        let mut default_headers = HeaderMap::new();

        default_headers.insert(reqwest::header::ACCEPT, HeaderValue::from_static("*/*"));

        default_headers.insert(
            reqwest::header::CONNECTION,
            HeaderValue::from_static("keep-alive"),
        );
        default_headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = DownloaderConfig::default();
        assert_eq!(config.concurrency, DEFAULT_CONCURRENCY);
        assert_eq!(config.fetch_timeout, DEFAULT_FETCH_TIMEOUT);
        assert!(!config.use_system_proxy);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_fetch_timeout_is_rejected() {
        let config = DownloaderConfig::default().with_fetch_timeout(Duration::ZERO);
        assert!(matches!(
            config.validate(),
            Err(HlsError::Configuration { .. })
        ));
    }

    #[test]
    fn custom_header_overrides_default() {
        let config = DownloaderConfig::default()
            .with_header("Accept", "application/vnd.apple.mpegurl")
            .expect("valid header");
        assert_eq!(
            config.headers.get(reqwest::header::ACCEPT).unwrap(),
            "application/vnd.apple.mpegurl"
        );
        assert!(config.headers.contains_key(reqwest::header::CONNECTION));
    }

    #[test]
    fn invalid_header_name_is_a_configuration_error() {
        let result = DownloaderConfig::default().with_header("bad header", "x");
        assert!(matches!(result, Err(HlsError::Configuration { .. })));
    }

    #[test]
    fn with_headers_merges_over_defaults() {
        let mut custom = HeaderMap::new();
        custom.insert(
            reqwest::header::REFERER,
            HeaderValue::from_static("https://example.com/"),
        );
        let config = DownloaderConfig::default().with_headers(custom);
        assert_eq!(
            config.headers.get(reqwest::header::REFERER).unwrap(),
            "https://example.com/"
        );
        assert!(config.headers.contains_key(reqwest::header::ACCEPT));
    }
}
