//! Page acquisition: walks the pages of a document until the viewer stops
//! serving images.
//!
//! The number of pages is not published anywhere, so the loop probes page
//! after page. Page 0 is gated by the availability probe; every later page is
//! accepted only if its bytes carry an image signature, and the first page that
//! does not is the end of the document. HTTP error statuses from the viewer are
//! content, not failures: past the last page it answers with error pages.

use async_trait::async_trait;
use tracing::{debug, info, instrument, trace};

use super::error::DownloadError;
use crate::client::{LibraryError, RawResponse};
use crate::pdf::detect_page_format;

/// Availability probe body meaning "document exists, page is ready".
pub const AVAILABLE_SENTINEL: &str = "0";

/// Upper bound on pages per document.
pub const MAX_PAGES: u32 = 10_000;

/// Source of availability probes and page images.
///
/// Implemented by [`crate::Session`]; tests use scripted sources.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Asks the viewer to prepare a page; returns the probe response.
    ///
    /// Errors are reserved for requests that got no response at all.
    async fn availability(&self, id: u64, page: u32) -> Result<RawResponse, LibraryError>;

    /// Fetches the image of a page, whatever the response status.
    async fn page_image(&self, id: u64, page: u32) -> Result<RawResponse, LibraryError>;
}

/// Observer notified as pages arrive.
pub trait PageProgress: Send + Sync {
    /// Called after a page was accepted; `pages` is the count so far.
    fn page_fetched(&self, id: u64, pages: usize);

    /// Called once when the end of the document was reached.
    fn finished(&self, id: u64, pages: usize);
}

/// Progress observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl PageProgress for NoProgress {
    fn page_fetched(&self, _id: u64, _pages: usize) {}

    fn finished(&self, _id: u64, _pages: usize) {}
}

/// States of the acquisition loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionState {
    /// Probe page 0 to learn whether the document exists.
    Start,
    /// Fetch page `n` without checking its format.
    Fetching(u32),
    /// Probe and fetch page `n`, keeping it only if it is an image.
    Checking(u32),
    /// End of document; holds the number of pages acquired.
    Done(u32),
    /// The probe for page 0 rejected the id.
    NotFound,
}

/// Returns true when an availability probe body reports the page as ready.
#[must_use]
pub fn is_available(body: &str) -> bool {
    body.trim() == AVAILABLE_SENTINEL
}

fn reports_available(response: &RawResponse) -> bool {
    response.is_success() && is_available(&response.text())
}

/// Acquires every page of a document, in order.
///
/// `prefetched_availability` is the body of an already performed probe for
/// page 0; when given, the loop starts without probing again.
///
/// # Errors
///
/// - [`DownloadError::BookNotFound`] when the page 0 availability check
///   rejects the id or answers with an error status; no other request is made
/// - [`DownloadError::EmptyDocument`] when page 0 is empty or an error page
/// - [`DownloadError::Transport`] when a request gets no response
/// - [`DownloadError::TooManyPages`] past [`MAX_PAGES`]
#[instrument(skip(source, prefetched_availability, progress))]
pub async fn acquire_pages(
    source: &dyn PageSource,
    id: u64,
    prefetched_availability: Option<&str>,
    progress: &dyn PageProgress,
) -> Result<Vec<Vec<u8>>, DownloadError> {
    let mut pages: Vec<Vec<u8>> = Vec::new();
    let mut state = AcquisitionState::Start;

    loop {
        trace!(?state, "acquisition step");
        state = match state {
            AcquisitionState::Start => {
                let availability = match prefetched_availability {
                    Some(body) => RawResponse::ok(body),
                    None => source
                        .availability(id, 0)
                        .await
                        .map_err(|e| DownloadError::transport(id, 0, e))?,
                };
                if reports_available(&availability) {
                    AcquisitionState::Fetching(0)
                } else {
                    debug!(
                        status = availability.status,
                        body = %availability.text().trim(),
                        "availability probe rejected document"
                    );
                    AcquisitionState::NotFound
                }
            }
            AcquisitionState::Fetching(page) => {
                let response = source
                    .page_image(id, page)
                    .await
                    .map_err(|e| DownloadError::transport(id, page, e))?;
                if !response.is_success() || response.body.is_empty() {
                    debug!(status = response.status, "first page missing");
                    return Err(DownloadError::EmptyDocument { id });
                }
                pages.push(response.body);
                progress.page_fetched(id, pages.len());
                AcquisitionState::Checking(page + 1)
            }
            AcquisitionState::Checking(page) => {
                if page >= MAX_PAGES {
                    return Err(DownloadError::TooManyPages {
                        id,
                        limit: MAX_PAGES,
                    });
                }
                // Past the end the availability check may fail too; only the image decides.
                source
                    .availability(id, page)
                    .await
                    .map_err(|e| DownloadError::transport(id, page, e))?;
                let response = source
                    .page_image(id, page)
                    .await
                    .map_err(|e| DownloadError::transport(id, page, e))?;
                if detect_page_format(&response.body).is_some() {
                    pages.push(response.body);
                    progress.page_fetched(id, pages.len());
                    AcquisitionState::Checking(page + 1)
                } else {
                    debug!(
                        page,
                        status = response.status,
                        len = response.body.len(),
                        "non-image response, end of document"
                    );
                    AcquisitionState::Done(page)
                }
            }
            AcquisitionState::Done(count) => {
                progress.finished(id, pages.len());
                info!(pages = count, "all pages acquired");
                return Ok(pages);
            }
            AcquisitionState::NotFound => return Err(DownloadError::BookNotFound { id }),
        };
    }
}
