//! Numbered result listing and the selection prompt.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use elibrary_core::Book;

pub(crate) const SELECTION_PROMPT: &str =
    "Enter the numbers of the books to download (e.g. 1 3 5-7): ";

/// One line per book, numbered from 1 in display order.
pub(crate) fn render_listing(books: &[&Book]) -> String {
    books
        .iter()
        .enumerate()
        .map(|(index, book)| format!("{}. {book}\n", index + 1))
        .collect()
}

/// Prints the prompt and reads one line; end of input yields an empty string.
pub(crate) fn read_selection(mut input: impl BufRead, mut output: impl Write) -> Result<String> {
    output
        .write_all(SELECTION_PROMPT.as_bytes())
        .and_then(|()| output.flush())
        .context("Failed to write selection prompt")?;
    let mut line = String::new();
    input
        .read_line(&mut line)
        .context("Failed to read selection")?;
    Ok(line.trim().to_string())
}
