//! Document download: page acquisition, PDF assembly and saving.
//!
//! # Flow
//!
//! 1. fetch the details page for the title ([`crate::catalog::get_metadata`])
//! 2. acquire all page scans ([`acquire_pages`])
//! 3. assemble them into an A4 PDF ([`crate::pdf::assemble`])
//! 4. write `<title>.pdf` atomically into the output directory
//!
//! Each document is all-or-nothing: any failure leaves no file behind.

mod acquisition;
mod error;
pub mod filename;
mod output;

use std::path::PathBuf;

use tracing::{info, instrument};

pub use acquisition::{
    AVAILABLE_SENTINEL, AcquisitionState, MAX_PAGES, NoProgress, PageProgress, PageSource,
    acquire_pages, is_available,
};
pub use error::DownloadError;
pub use filename::{pdf_filename, resolve_unique_path};
pub use output::{OutputOptions, OutputPolicy, ensure_output_dir, write_atomically};

use crate::catalog::get_metadata;
use crate::client::{FetchedPage, Session};
use crate::pdf::assemble;

/// A document written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedBook {
    /// Document id.
    pub id: u64,
    /// Title from the details page.
    pub title: String,
    /// Where the PDF was written.
    pub path: PathBuf,
    /// Number of pages in the PDF.
    pub pages: usize,
}

/// A PDF built from acquired page scans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledPdf {
    /// Serialized PDF document.
    pub bytes: Vec<u8>,
    /// Number of pages it holds.
    pub pages: usize,
}

/// Acquires all pages of a document and returns the assembled PDF.
///
/// # Errors
///
/// Returns the errors of [`acquire_pages`], or [`DownloadError::Assembly`].
pub async fn download_pdf(
    source: &dyn PageSource,
    id: u64,
    prefetched_availability: Option<&str>,
    progress: &dyn PageProgress,
    title: Option<&str>,
) -> Result<AssembledPdf, DownloadError> {
    let pages = acquire_pages(source, id, prefetched_availability, progress).await?;
    let bytes = assemble(&pages, title).map_err(|source| DownloadError::Assembly { id, source })?;
    Ok(AssembledPdf {
        bytes,
        pages: pages.len(),
    })
}

/// Downloads one document and saves it as `<title>.pdf`.
///
/// `prefetched_metadata` is the details page when the caller already has it.
///
/// # Errors
///
/// - [`DownloadError::BookNotFound`] when the details page has no document
///   heading or the viewer rejects the id
/// - [`DownloadError::Metadata`] when the details page cannot be fetched
/// - any other [`DownloadError`] from acquisition, assembly or writing
#[instrument(skip(session, prefetched_metadata, output, progress))]
pub async fn save_book(
    session: &Session,
    id: u64,
    prefetched_metadata: Option<&FetchedPage>,
    output: &OutputOptions,
    progress: &dyn PageProgress,
) -> Result<SavedBook, DownloadError> {
    let metadata = get_metadata(session, id, prefetched_metadata)
        .await
        .map_err(|source| DownloadError::Metadata { id, source })?
        .ok_or(DownloadError::BookNotFound { id })?;
    let title = metadata.title().to_string();
    info!(%title, "downloading document");

    let pdf = download_pdf(session, id, None, progress, Some(&title)).await?;

    let path = output.target_path(&pdf_filename(&title, id));
    write_atomically(&path, &pdf.bytes)?;
    info!(path = %path.display(), pages = pdf.pages, "document saved");

    Ok(SavedBook {
        id,
        title,
        path,
        pages: pdf.pages,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Cursor;

    use async_trait::async_trait;
    use image::{ImageFormat, Rgb, RgbImage};

    use super::*;
    use crate::client::{LibraryError, RawResponse};

    /// Serves `pages` JPEG scans, then a 404 error page.
    struct FixedDocument {
        pages: usize,
    }

    fn jpeg() -> Vec<u8> {
        let image = RgbImage::from_pixel(8, 12, Rgb([240, 240, 230]));
        let mut buffer = Cursor::new(Vec::new());
        image.write_to(&mut buffer, ImageFormat::Jpeg).unwrap();
        buffer.into_inner()
    }

    #[async_trait]
    impl PageSource for FixedDocument {
        async fn availability(&self, _id: u64, _page: u32) -> Result<RawResponse, LibraryError> {
            Ok(RawResponse::ok("0"))
        }

        async fn page_image(&self, _id: u64, page: u32) -> Result<RawResponse, LibraryError> {
            if (page as usize) < self.pages {
                Ok(RawResponse::ok(jpeg()))
            } else {
                Ok(RawResponse {
                    status: 404,
                    body: b"<html>Not found</html>".to_vec(),
                })
            }
        }
    }

    #[tokio::test]
    async fn test_download_pdf_assembles_every_page() {
        let source = FixedDocument { pages: 3 };

        let pdf = download_pdf(&source, 9, None, &NoProgress, Some("Scanned notes"))
            .await
            .unwrap();

        assert_eq!(pdf.pages, 3);
        let document = lopdf::Document::load_mem(&pdf.bytes).unwrap();
        assert_eq!(document.get_pages().len(), 3);
    }

    #[tokio::test]
    async fn test_download_pdf_rejected_document_is_not_found() {
        let source = FixedDocument { pages: 2 };

        let err = download_pdf(&source, 9, Some("1"), &NoProgress, None)
            .await
            .unwrap_err();

        assert!(matches!(err, DownloadError::BookNotFound { id: 9 }), "got {err:?}");
    }
}
