//! Maps the error that ended a run to the process exit code.

use elibrary_core::{ConfigError, DownloadError, LibraryError, SelectionError};

use crate::ProcessExit;
use crate::app::UsageError;

/// Walks the error chain and returns the code of the first classified cause.
pub(crate) fn exit_for_error(error: &anyhow::Error) -> ProcessExit {
    error
        .chain()
        .find_map(classify)
        .unwrap_or(ProcessExit::Failure)
}

fn classify(cause: &(dyn std::error::Error + 'static)) -> Option<ProcessExit> {
    if cause.is::<UsageError>() || cause.is::<SelectionError>() || cause.is::<ConfigError>() {
        return Some(ProcessExit::InvalidArguments);
    }
    if let Some(error) = cause.downcast_ref::<LibraryError>() {
        return match error {
            LibraryError::AuthenticationFailed { .. } => Some(ProcessExit::LoginFailed),
            LibraryError::NoResults { .. } => Some(ProcessExit::NoBooksFound),
            _ => None,
        };
    }
    if let Some(error) = cause.downcast_ref::<DownloadError>() {
        return match error {
            DownloadError::BookNotFound { .. } => Some(ProcessExit::BookNotFound),
            DownloadError::MissingDirectory { .. } => Some(ProcessExit::InvalidArguments),
            _ => None,
        };
    }
    None
}
