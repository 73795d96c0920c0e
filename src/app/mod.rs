//! Application orchestration for the `elibrary` binary.

pub(crate) mod exit_handler;
mod interactive;
mod progress;
pub(crate) mod runtime;
mod settings;
mod terminal;

use thiserror::Error;

/// Arguments that parse but do not describe a runnable request.
#[derive(Debug, Error)]
#[error("{message}")]
pub(crate) struct UsageError {
    message: String,
}

impl UsageError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
