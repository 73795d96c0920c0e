//! elibrary core library
//!
//! Downloads scanned books from an electronic library as PDF files: log in,
//! search the catalog, walk the page viewer of a document and assemble the
//! page scans into one A4 PDF.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`config`] - Base URL, endpoint paths and timeouts
//! - [`client`] - Cookie-carrying HTTP session
//! - [`auth`] - Login form submission
//! - [`catalog`] - Full-text search and document metadata
//! - [`selection`] - Parsing of result selections like `1 3 5-7`
//! - [`download`] - Page acquisition loop and saving
//! - [`pdf`] - Assembly of page scans into a PDF

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod catalog;
pub mod client;
pub mod config;
pub mod download;
pub mod pdf;
pub mod selection;
mod user_agent;

// Re-export commonly used types
pub use auth::authenticate;
pub use catalog::{Book, Metadata, get_metadata, search};
pub use client::{FetchedPage, LibraryError, RawResponse, Session};
pub use config::{ConfigError, LibraryConfig};
pub use download::{
    AssembledPdf, DownloadError, NoProgress, OutputOptions, OutputPolicy, PageProgress, PageSource,
    SavedBook, acquire_pages, download_pdf, save_book,
};
pub use pdf::{PdfError, assemble};
pub use selection::{SelectionError, parse_indexes};
pub use user_agent::BROWSER_USER_AGENT;
