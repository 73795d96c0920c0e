//! Library endpoint configuration.
//!
//! All URLs the client talks to are derived from a single base URL, so a
//! mirror or a local mock server can be targeted by changing one value.

use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::user_agent::BROWSER_USER_AGENT;

/// Public address of the library front end.
pub const DEFAULT_BASE_URL: &str = "http://elibrary.misis.ru/";

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes, page scans can be slow to render).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Image quality hint understood by the page viewer plugin.
const PAGE_QUALITY: &str = "large/fast";

/// Errors raised while building a [`LibraryConfig`].
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// The base URL is malformed or not http(s).
    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl {
        /// The rejected URL.
        url: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Immutable connection settings shared by every component.
#[derive(Debug, Clone)]
pub struct LibraryConfig {
    base_url: Url,
    /// TCP connect timeout for every request.
    pub connect_timeout: Duration,
    /// Total per-request timeout.
    pub read_timeout: Duration,
    /// User-Agent sent with every request.
    pub user_agent: String,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).unwrap_or_else(|e| {
                panic!("invalid built-in base URL '{DEFAULT_BASE_URL}': {e}")
            }),
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            read_timeout: Duration::from_secs(READ_TIMEOUT_SECS),
            user_agent: BROWSER_USER_AGENT.to_string(),
        }
    }
}

impl LibraryConfig {
    /// Creates a config for the given base URL with default timeouts.
    ///
    /// A trailing slash is added when missing so endpoint paths resolve
    /// below the base instead of replacing its last segment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] for unparsable or non-http(s) URLs.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        let mut parsed = Url::parse(base_url.trim()).map_err(|e| ConfigError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: format!("scheme '{}' is not supported", parsed.scheme()),
            });
        }
        if !parsed.path().ends_with('/') {
            let path = format!("{}/", parsed.path());
            parsed.set_path(&path);
        }
        parsed.set_query(None);
        parsed.set_fragment(None);
        Ok(Self {
            base_url: parsed,
            ..Self::default()
        })
    }

    /// Overrides both timeouts.
    #[must_use]
    pub fn with_timeouts(mut self, connect: Duration, read: Duration) -> Self {
        self.connect_timeout = connect;
        self.read_timeout = read;
        self
    }

    /// Base URL, always ending in `/`.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Login form endpoint.
    #[must_use]
    pub fn login_url(&self) -> String {
        format!("{}login.php", self.base_url)
    }

    /// Full-text search endpoint.
    #[must_use]
    pub fn search_url(&self) -> String {
        format!("{}search2.php?action=process", self.base_url)
    }

    /// Document details page.
    #[must_use]
    pub fn metadata_url(&self, id: u64) -> String {
        format!("{}view.php?fDocumentId={id}", self.base_url)
    }

    /// Availability probe for one page (0-based).
    #[must_use]
    pub fn availability_url(&self, id: u64, page: u32) -> String {
        self.viewer_url("HashAvailability", id, page)
    }

    /// Page image endpoint (0-based).
    #[must_use]
    pub fn page_image_url(&self, id: u64, page: u32) -> String {
        self.viewer_url("getDoc", id, page)
    }

    fn viewer_url(&self, script: &str, id: u64, page: u32) -> String {
        format!(
            "{}plugins/SecView/{script}.php?id={id}&page={page}&type={PAGE_QUALITY}",
            self.base_url
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_targets_public_library() {
        let config = LibraryConfig::default();
        assert_eq!(config.base_url(), DEFAULT_BASE_URL);
        assert_eq!(config.connect_timeout, Duration::from_secs(30));
        assert_eq!(config.read_timeout, Duration::from_secs(300));
    }

    #[test]
    fn test_new_appends_trailing_slash() {
        let config = LibraryConfig::new("http://127.0.0.1:8080/lib").unwrap();
        assert_eq!(config.base_url(), "http://127.0.0.1:8080/lib/");
        assert_eq!(config.login_url(), "http://127.0.0.1:8080/lib/login.php");
    }

    #[test]
    fn test_new_rejects_non_http_scheme() {
        let err = LibraryConfig::new("ftp://example.com/").unwrap_err();
        assert!(err.to_string().contains("ftp"), "got: {err}");
    }

    #[test]
    fn test_new_rejects_garbage() {
        assert!(LibraryConfig::new("not a url").is_err());
    }

    #[test]
    fn test_viewer_urls_keep_quality_hint_verbatim() {
        let config = LibraryConfig::new("http://host/").unwrap();
        assert_eq!(
            config.availability_url(42, 0),
            "http://host/plugins/SecView/HashAvailability.php?id=42&page=0&type=large/fast"
        );
        assert_eq!(
            config.page_image_url(42, 7),
            "http://host/plugins/SecView/getDoc.php?id=42&page=7&type=large/fast"
        );
    }

    #[test]
    fn test_metadata_and_search_urls() {
        let config = LibraryConfig::new("http://host").unwrap();
        assert_eq!(config.metadata_url(5), "http://host/view.php?fDocumentId=5");
        assert_eq!(config.search_url(), "http://host/search2.php?action=process");
    }
}
