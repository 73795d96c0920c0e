//! Authenticated HTTP session against the library front end.
//!
//! A [`Session`] owns one `reqwest` client with a shared cookie jar. The jar
//! is filled by [`crate::auth::authenticate`] and then carries the login for
//! every later request. The session itself is never mutated after login.

mod error;

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::cookie::Jar;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, ClientBuilder, Response};
use tracing::{debug, instrument, warn};

pub use error::LibraryError;

use crate::config::LibraryConfig;
use crate::download::PageSource;
use crate::user_agent::browser_headers;

/// A text response captured in full, so it can be handed to a later step
/// instead of being requested twice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// Final URL after redirects.
    pub url: String,
    /// Decoded response body.
    pub body: String,
}

/// Status and body of a response taken as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: Vec<u8>,
}

impl RawResponse {
    /// A `200 OK` response with `body`.
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    /// True for 2xx statuses.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body decoded as UTF-8, invalid sequences replaced.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Cookie-carrying client bound to one library configuration.
#[derive(Debug, Clone)]
pub struct Session {
    client: Client,
    config: Arc<LibraryConfig>,
}

impl Session {
    /// Creates an anonymous session with an empty cookie jar.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::ClientBuild`] when the HTTP client cannot be built.
    pub fn new(config: LibraryConfig) -> Result<Self, LibraryError> {
        let jar = Arc::new(Jar::default());
        let client = build_http_client(&config, jar)?;
        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    /// The configuration this session was built with.
    #[must_use]
    pub fn config(&self) -> &LibraryConfig {
        &self.config
    }

    /// GETs a page and returns its decoded body.
    ///
    /// # Errors
    ///
    /// Returns a transport [`LibraryError`] on network failure or non-success status.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_text(&self, url: &str) -> Result<FetchedPage, LibraryError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| LibraryError::network(url, e))?;
        read_text(url, response).await
    }

    /// POSTs an urlencoded form and returns the decoded body of the final response.
    ///
    /// # Errors
    ///
    /// Returns a transport [`LibraryError`] on network failure or non-success status.
    #[instrument(level = "debug", skip(self, form), fields(fields = form.len()))]
    pub async fn post_form(
        &self,
        url: &str,
        form: &[(&str, &str)],
    ) -> Result<FetchedPage, LibraryError> {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(form.iter())
            .finish();
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .map_err(|e| LibraryError::network(url, e))?;
        read_text(url, response).await
    }

    /// GETs a response without judging its status.
    ///
    /// The page viewer answers past the end of a document with error pages,
    /// so its status is content for the caller rather than a failure.
    ///
    /// # Errors
    ///
    /// Returns a transport [`LibraryError`] only when no response arrives.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_raw(&self, url: &str) -> Result<RawResponse, LibraryError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| LibraryError::network(url, e))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| LibraryError::network(url, e))?;
        if !(200..300).contains(&status) {
            debug!(status, url, "viewer answered with error status");
        }
        Ok(RawResponse {
            status,
            body: body.to_vec(),
        })
    }
}

#[async_trait]
impl PageSource for Session {
    async fn availability(&self, id: u64, page: u32) -> Result<RawResponse, LibraryError> {
        self.get_raw(&self.config.availability_url(id, page)).await
    }

    async fn page_image(&self, id: u64, page: u32) -> Result<RawResponse, LibraryError> {
        self.get_raw(&self.config.page_image_url(id, page)).await
    }
}

fn check_status(url: &str, response: Response) -> Result<Response, LibraryError> {
    let status = response.status();
    if !status.is_success() {
        debug!(%status, url, "request failed with HTTP status");
        return Err(LibraryError::http_status(url, status.as_u16()));
    }
    Ok(response)
}

async fn read_text(url: &str, response: Response) -> Result<FetchedPage, LibraryError> {
    let response = check_status(url, response)?;
    let final_url = response.url().to_string();
    let body = response
        .text()
        .await
        .map_err(|e| LibraryError::network(url, e))?;
    Ok(FetchedPage {
        url: final_url,
        body,
    })
}

/// Builds the shared client: browser headers, explicit timeouts, gzip, cookie jar.
fn build_http_client(config: &LibraryConfig, jar: Arc<Jar>) -> Result<Client, LibraryError> {
    match try_build_client(config, Arc::clone(&jar), false) {
        Ok(client) => Ok(client),
        Err(BuildClientFailure::Panic) => {
            // Some sandboxed environments panic when querying system proxy
            // settings; retry without the system lookup.
            warn!("HTTP client hit system proxy panic; building without system proxy lookup");
            match try_build_client(config, jar, true) {
                Ok(client) => Ok(client),
                Err(BuildClientFailure::Build(source)) => {
                    Err(LibraryError::ClientBuild { source })
                }
                Err(BuildClientFailure::Panic) => Err(LibraryError::unexpected_page(
                    config.base_url(),
                    "HTTP client construction panicked",
                )),
            }
        }
        Err(BuildClientFailure::Build(source)) => Err(LibraryError::ClientBuild { source }),
    }
}

enum BuildClientFailure {
    Panic,
    Build(reqwest::Error),
}

fn try_build_client(
    config: &LibraryConfig,
    jar: Arc<Jar>,
    disable_system_proxy_lookup: bool,
) -> Result<Client, BuildClientFailure> {
    catch_unwind(AssertUnwindSafe(move || {
        let mut builder: ClientBuilder = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.read_timeout)
            .user_agent(config.user_agent.clone())
            .default_headers(browser_headers())
            .gzip(true)
            .cookie_provider(jar);
        if disable_system_proxy_lookup {
            builder = builder.no_proxy();
        }
        builder.build().map_err(BuildClientFailure::Build)
    }))
    .map_err(|_| BuildClientFailure::Panic)?
}
