//! Configuration types for the course downloader

use std::time::Duration;

/// Default platform root, overridable for mirrors and tests
pub const DEFAULT_BASE_URL: &str = "https://www.udemy.com";

/// Configuration shared by the session, the resolver and the transport
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    /// Platform root every API and page URL is built from
    pub base_url: String,
    pub user_agent: String,
    /// Whole-request timeout for API and page requests
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    /// Maximum silence on a transfer before it is abandoned
    pub read_timeout: Duration,
    /// Ask the resolver for the HD source when one is listed
    pub prefer_high_quality: bool,
    /// Continue `.part` files instead of starting over
    pub allow_resume: bool,
    /// Skip TLS certificate checks on video transfers
    pub accept_invalid_certs: bool,
    /// Minimum gap between two progress events of one transfer
    pub progress_interval: Duration,
}

impl DownloadConfig {
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_prefer_high_quality(mut self, prefer: bool) -> Self {
        self.prefer_high_quality = prefer;
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    pub fn with_allow_resume(mut self, allow: bool) -> Self {
        self.allow_resume = allow;
        self
    }

    /// Absolute URL for a path below the platform root
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: "Mozilla/5.0 (X11; Linux x86_64; rv:18.0) Gecko/20100101 Firefox/32.0"
                .to_string(),
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(15),
            read_timeout: Duration::from_secs(60),
            prefer_high_quality: true,
            allow_resume: true,
            accept_invalid_certs: false,
            progress_interval: Duration::from_millis(100),
        }
    }
}
