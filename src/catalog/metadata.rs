//! Document details page parsing.

use std::sync::LazyLock;

use scraper::{Html, Selector};
use tracing::{debug, instrument};

use super::{compile_static_selector, element_text};
use crate::client::{FetchedPage, LibraryError, Session};

/// Label preceding the title in the details page heading.
pub const TITLE_LABEL: &str = "Документ:";

/// Key under which the title is stored in every [`Metadata`].
pub const TITLE_KEY: &str = "Title";

static HEADING: LazyLock<Selector> = LazyLock::new(|| compile_static_selector("h2"));
static METADATA_ROW: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector("table.metadatatable tr"));
static ROW_HEADER: LazyLock<Selector> = LazyLock::new(|| compile_static_selector("th"));
static ROW_VALUE: LazyLock<Selector> = LazyLock::new(|| compile_static_selector("td"));

/// Ordered label/value pairs of one document; always starts with [`TITLE_KEY`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    fields: Vec<(String, String)>,
}

impl Metadata {
    fn with_title(title: String) -> Self {
        Self {
            fields: vec![(TITLE_KEY.to_string(), title)],
        }
    }

    /// The document title.
    #[must_use]
    pub fn title(&self) -> &str {
        self.get(TITLE_KEY).unwrap_or_default()
    }

    /// Value of the first field with this label.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == label)
            .map(|(_, value)| value.as_str())
    }

    /// Fields in page order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of fields, title included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Always false; a metadata record carries at least its title.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Fetches and parses the details page of a document.
///
/// `prefetched` is used instead of a new request when the caller already
/// holds the page (the login redirect target).
///
/// Returns `Ok(None)` when the page has no document heading, which is how
/// the server answers for ids that do not exist.
///
/// # Errors
///
/// Returns a transport [`LibraryError`] when the request fails.
#[instrument(skip(session, prefetched), fields(prefetched = prefetched.is_some()))]
pub async fn get_metadata(
    session: &Session,
    id: u64,
    prefetched: Option<&FetchedPage>,
) -> Result<Option<Metadata>, LibraryError> {
    let metadata = if let Some(page) = prefetched {
        parse_metadata(&page.body)
    } else {
        let page = session.get_text(&session.config().metadata_url(id)).await?;
        parse_metadata(&page.body)
    };
    debug!(found = metadata.is_some(), "metadata parsed");
    Ok(metadata)
}

/// Parses a details page; `None` when no title heading is present.
#[must_use]
pub fn parse_metadata(html: &str) -> Option<Metadata> {
    let document = Html::parse_document(html);
    let title = document.select(&HEADING).find_map(|heading| {
        element_text(heading)
            .strip_prefix(TITLE_LABEL)
            .map(|rest| rest.trim().to_string())
    })?;

    let mut metadata = Metadata::with_title(title);
    for row in document.select(&METADATA_ROW) {
        let (Some(label), Some(value)) = (
            row.select(&ROW_HEADER).next().map(element_text),
            row.select(&ROW_VALUE).next().map(element_text),
        ) else {
            continue;
        };
        let label = label.trim_end_matches(':').trim().to_string();
        if label.is_empty() {
            continue;
        }
        metadata.fields.push((label, value));
    }
    Some(metadata)
}
