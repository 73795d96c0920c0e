//! Error types for requests against the library front end.

use thiserror::Error;

/// Errors that can occur while talking to the library website.
#[derive(Debug, Error)]
pub enum LibraryError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error requesting {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout requesting {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// HTTP error response (4xx client errors, 5xx server errors).
    #[error("HTTP {status} requesting {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {source}")]
    ClientBuild {
        /// The underlying builder error.
        #[source]
        source: reqwest::Error,
    },

    /// The server rejected the login/password pair.
    #[error("login failed for user '{login}': incorrect login or password")]
    AuthenticationFailed {
        /// The rejected login name.
        login: String,
    },

    /// A catalog search matched nothing.
    #[error("no documents found for query \"{query}\"")]
    NoResults {
        /// The query as typed by the user.
        query: String,
    },

    /// The page did not have the expected structure.
    #[error("unexpected page structure at {url}: {reason}")]
    UnexpectedPage {
        /// The URL the page was fetched from.
        url: String,
        /// What was missing or malformed.
        reason: String,
    },
}

impl LibraryError {
    /// Creates a network error from a reqwest error, classifying timeouts.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        let url = url.into();
        if source.is_timeout() {
            return Self::Timeout { url };
        }
        Self::Network { url, source }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates an authentication failure.
    pub fn authentication_failed(login: impl Into<String>) -> Self {
        Self::AuthenticationFailed {
            login: login.into(),
        }
    }

    /// Creates an empty-search error.
    pub fn no_results(query: impl Into<String>) -> Self {
        Self::NoResults {
            query: query.into(),
        }
    }

    /// Creates an unexpected page structure error.
    pub fn unexpected_page(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnexpectedPage {
            url: url.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_error_timeout_display() {
        let error = LibraryError::Timeout {
            url: "http://host/login.php".to_string(),
        };
        assert!(error.to_string().contains("timeout"));
        assert!(error.to_string().contains("http://host/login.php"));
    }

    #[test]
    fn test_library_error_http_status_display() {
        let error = LibraryError::http_status("http://host/view.php?fDocumentId=1", 503);
        let msg = error.to_string();
        assert!(msg.contains("503"), "Expected '503' in: {msg}");
        assert!(msg.contains("fDocumentId=1"), "Expected URL in: {msg}");
    }

    #[test]
    fn test_library_error_authentication_does_not_echo_password() {
        let error = LibraryError::authentication_failed("student");
        let msg = error.to_string();
        assert!(msg.contains("student"));
        assert!(msg.contains("login failed"));
    }

    #[test]
    fn test_library_error_no_results_quotes_query() {
        let msg = LibraryError::no_results("Algebra").to_string();
        assert_eq!(msg, "no documents found for query \"Algebra\"");
    }
}
