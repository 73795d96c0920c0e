//! Error types for PDF assembly.

use thiserror::Error;

/// Errors that can occur while assembling page scans into a PDF.
#[derive(Debug, Error)]
pub enum PdfError {
    /// A page is not a JPEG or PNG image.
    #[error("page {page} is not a supported image ({len} bytes)")]
    UnsupportedImage {
        /// 0-based page number.
        page: usize,
        /// Size of the rejected buffer.
        len: usize,
    },

    /// A page image could not be decoded.
    #[error("page {page} could not be decoded: {source}")]
    Decode {
        /// 0-based page number.
        page: usize,
        /// The underlying image error.
        #[source]
        source: image::ImageError,
    },

    /// The finished document could not be serialised.
    #[error("failed to serialise PDF: {source}")]
    Serialize {
        /// The write error reported by the serialiser.
        #[source]
        source: std::io::Error,
    },
}
