//! Login against the library front end.
//!
//! The server hands out an anonymous session cookie on the login page and
//! upgrades it when the login form is submitted. After a successful login it
//! redirects to the caller-chosen target, whose response is returned so the
//! caller does not have to request it again.

use tracing::{debug, info, instrument};

use crate::client::{FetchedPage, LibraryError, Session};
use crate::config::LibraryConfig;

/// Message the server renders when the login/password pair is rejected.
pub const LOGIN_FAILED_MESSAGE: &str =
    "Пароль не верен. Пожалуйста, проверьте Ваше Имя и Пароль и попробуйте еще.";

/// Interface language requested in the login form.
const LOGIN_LANGUAGE: &str = "ru_UN";

/// Returns true when the response is the server's wrong-password page.
#[must_use]
pub fn login_failed(page: &FetchedPage) -> bool {
    page.body.contains(LOGIN_FAILED_MESSAGE)
}

/// Logs in and returns the session plus the response to `redirect_target`.
///
/// When no redirect target is given the server redirects to the base URL.
///
/// # Errors
///
/// - [`LibraryError::AuthenticationFailed`] when the credentials are rejected
/// - a transport [`LibraryError`] when a request fails
#[instrument(skip(config, password), fields(base_url = %config.base_url()))]
pub async fn authenticate(
    config: LibraryConfig,
    login: &str,
    password: &str,
    redirect_target: Option<&str>,
) -> Result<(Session, FetchedPage), LibraryError> {
    let session = Session::new(config)?;
    let login_url = session.config().login_url();
    let redirect = redirect_target
        .map_or_else(|| session.config().base_url().to_string(), str::to_string);

    session.get_text(&login_url).await?;
    debug!("anonymous session obtained");

    let response = session
        .post_form(
            &login_url,
            &[
                ("action", "login"),
                ("cookieverify", ""),
                ("redirect", &redirect),
                ("username", login),
                ("password", password),
                ("language", LOGIN_LANGUAGE),
            ],
        )
        .await?;

    if login_failed(&response) {
        return Err(LibraryError::authentication_failed(login));
    }

    info!(login, "logged in");
    Ok((session, response))
}
