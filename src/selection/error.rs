//! Error types for selection expressions.

use thiserror::Error;

/// Errors that can occur while parsing a selection expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    /// A token is not `n` or `n-m`.
    #[error("invalid selection '{token}': {reason}\n  Suggestion: use numbers and ranges like \"1 3 5-7\"")]
    Parse {
        /// The offending token.
        token: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A number is outside `1..=max`.
    #[error("selection {value} is out of range (choose 1-{max})")]
    IndexOutOfRange {
        /// The 1-based number as typed.
        value: u64,
        /// Highest valid number.
        max: usize,
    },

    /// A range whose end precedes its start, such as `5-2`.
    #[error("descending range '{token}': write it as {end}-{start}")]
    DescendingRange {
        /// The offending token.
        token: String,
        /// Range start as typed.
        start: u64,
        /// Range end as typed.
        end: u64,
    },

    /// The expression selects nothing.
    #[error("empty selection")]
    Empty,
}

impl SelectionError {
    /// Creates a `Parse` error for a token.
    pub fn parse(token: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            token: token.into(),
            reason: reason.into(),
        }
    }
}
