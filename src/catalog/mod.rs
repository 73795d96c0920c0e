//! Catalog search and document metadata.
//!
//! Both operations scrape HTML produced by the library front end:
//! - [`search`] posts a full-text query and parses the results table
//! - [`metadata::get_metadata`] parses a document details page

pub mod metadata;

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument};

use crate::client::{LibraryError, Session};

pub use metadata::{Metadata, get_metadata, parse_metadata};

/// Cell text the server renders instead of a results table.
pub const NO_DOCUMENTS_MESSAGE: &str = "Документы не найдены";

/// Page-size hint sent with every search so all results arrive on one page.
const SEARCH_PAGE_SIZE: &str = "1000";

/// Compiles a selector at static init; panics on invalid pattern.
pub(crate) fn compile_static_selector(pattern: &str) -> Selector {
    Selector::parse(pattern).unwrap_or_else(|e| panic!("invalid static selector '{pattern}': {e}"))
}

static RESULT_ROW: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector("table.kt_collection tr"));
static LINK: LazyLock<Selector> = LazyLock::new(|| compile_static_selector("a[href]"));
static ANY_CELL: LazyLock<Selector> = LazyLock::new(|| compile_static_selector("td"));

/// Numeric suffix of a document link (`view.php?fDocumentId=123`).
static TRAILING_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)$").unwrap_or_else(|e| panic!("invalid static regex: {e}"))
});

/// One row of the search results table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    /// Server-assigned document id.
    pub id: u64,
    /// Document title (link text).
    pub title: String,
    /// Authors as printed in the results table.
    pub authors: String,
    /// Publication year.
    pub year: i32,
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {} ({})", self.title, self.authors, self.year)
    }
}

/// Builds the structured query the search endpoint expects.
///
/// Double quotes would terminate the quoted term early, so they become single quotes.
#[must_use]
pub fn build_search_query(query: &str) -> String {
    format!("GeneralText contains \"{}\"", query.replace('"', "'"))
}

/// Runs a full-text catalog search.
///
/// # Errors
///
/// - [`LibraryError::NoResults`] when the server reports no matches
/// - [`LibraryError::UnexpectedPage`] when the results page cannot be parsed
/// - a transport [`LibraryError`] when the request fails
#[instrument(skip(session))]
pub async fn search(session: &Session, query: &str) -> Result<Vec<Book>, LibraryError> {
    let expression = build_search_query(query);
    let url = session.config().search_url();
    let page = session
        .post_form(
            &url,
            &[
                ("txtQuery", expression.as_str()),
                ("cbQuickQuery", "1"),
                ("cbQuickGeneral", "1"),
                ("resultsPerPage", SEARCH_PAGE_SIZE),
            ],
        )
        .await?;
    let books = parse_search_results(&page.url, &page.body, query)?;
    info!(results = books.len(), "search complete");
    Ok(books)
}

/// Parses a search results page into books, in page order.
///
/// # Errors
///
/// - [`LibraryError::NoResults`] when the page carries the no-documents message
/// - [`LibraryError::UnexpectedPage`] for rows with missing cells or a bad year,
///   or when the page has neither results nor the no-documents message
pub fn parse_search_results(
    url: &str,
    html: &str,
    query: &str,
) -> Result<Vec<Book>, LibraryError> {
    let document = Html::parse_document(html);
    let mut books = Vec::new();

    for row in document.select(&RESULT_ROW) {
        let Some((id, title)) = row.select(&LINK).find_map(document_link) else {
            continue;
        };
        let cells: Vec<ElementRef<'_>> = row
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|cell| cell.value().name() == "td")
            .collect();
        if cells.len() < 5 {
            return Err(LibraryError::unexpected_page(
                url,
                format!("result row for document {id} has {} cells, expected 5", cells.len()),
            ));
        }
        let authors = element_text(cells[3]);
        let year_text = element_text(cells[4]);
        let year = year_text.parse::<i32>().map_err(|_| {
            LibraryError::unexpected_page(
                url,
                format!("result row for document {id} has non-numeric year '{year_text}'"),
            )
        })?;
        debug!(id, %title, "parsed result row");
        books.push(Book {
            id,
            title,
            authors,
            year,
        });
    }

    if books.is_empty() {
        let sentinel = document
            .select(&ANY_CELL)
            .any(|cell| element_text(cell).contains(NO_DOCUMENTS_MESSAGE));
        if sentinel {
            return Err(LibraryError::no_results(query));
        }
        return Err(LibraryError::unexpected_page(
            url,
            "no results table and no empty-result message",
        ));
    }

    Ok(books)
}

/// Returns books in listing order: the last stored result is shown first.
#[must_use]
pub fn listing_order(books: &[Book]) -> Vec<&Book> {
    books.iter().rev().collect()
}

fn document_link(link: ElementRef<'_>) -> Option<(u64, String)> {
    let href = link.value().attr("href")?.trim();
    let id = TRAILING_ID_RE
        .captures(href)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u64>().ok())
        .filter(|id| *id > 0)?;
    Some((id, element_text(link)))
}

/// Whitespace-collapsed text content of an element.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
