//! Error types for the download module.

use std::path::PathBuf;

use thiserror::Error;

use crate::client::LibraryError;
use crate::pdf::PdfError;

/// Errors that can occur while downloading and saving one document.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The availability probe for page 0 did not report the document.
    #[error("no document with id {id}")]
    BookNotFound {
        /// The requested document id.
        id: u64,
    },

    /// The details page of the document could not be fetched.
    #[error("failed to fetch details of document {id}: {source}")]
    Metadata {
        /// The document id.
        id: u64,
        /// The underlying request error.
        #[source]
        source: LibraryError,
    },

    /// The viewer reported the document but served no first page.
    #[error("document {id} has no pages")]
    EmptyDocument {
        /// The requested document id.
        id: u64,
    },

    /// A page request got no response (connect failure or timeout).
    #[error("failed to fetch page {page} of document {id}: {source}")]
    Transport {
        /// The document id.
        id: u64,
        /// 0-based page number being fetched.
        page: u32,
        /// The underlying request error.
        #[source]
        source: LibraryError,
    },

    /// The viewer kept serving images past the page limit.
    #[error("document {id} exceeds {limit} pages; stopping")]
    TooManyPages {
        /// The document id.
        id: u64,
        /// The page limit that was hit.
        limit: u32,
    },

    /// The acquired pages could not be assembled.
    #[error("failed to assemble document {id}: {source}")]
    Assembly {
        /// The document id.
        id: u64,
        /// The underlying PDF error.
        #[source]
        source: PdfError,
    },

    /// The output directory is missing or not a directory.
    #[error("output directory {path} does not exist or is not a directory")]
    MissingDirectory {
        /// The rejected directory.
        path: PathBuf,
    },

    /// File system error while writing the PDF.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl DownloadError {
    /// Creates a transport error for a page request.
    #[must_use]
    pub fn transport(id: u64, page: u32, source: LibraryError) -> Self {
        Self::Transport { id, page, source }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_download_error_transport_display_names_page() {
        let error = DownloadError::transport(
            12,
            3,
            LibraryError::Timeout {
                url: "http://host/getDoc.php".to_string(),
            },
        );
        let msg = error.to_string();
        assert!(msg.contains("page 3"), "Expected page in: {msg}");
        assert!(msg.contains("document 12"), "Expected id in: {msg}");
        assert!(msg.contains("timeout"), "Expected cause in: {msg}");
    }

    #[test]
    fn test_download_error_io_display() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let error = DownloadError::io(PathBuf::from("/tmp/book.pdf"), io_error);
        assert!(error.to_string().contains("/tmp/book.pdf"));
    }

    #[test]
    fn test_download_error_missing_directory_display() {
        let error = DownloadError::MissingDirectory {
            path: PathBuf::from("/nope"),
        };
        assert!(error.to_string().contains("/nope"));
    }
}
