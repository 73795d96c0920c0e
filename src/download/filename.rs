//! Output filename derivation and path resolution.

use std::path::{Component, Path, PathBuf};

/// Filename limit in bytes on common filesystems (`NAME_MAX`).
const MAX_NAME_BYTES: usize = 255;

/// Room for `.pdf` plus the longest `_N` suffix [`resolve_unique_path`] adds.
const RESERVED_BYTES: usize = ".pdf".len() + "_18446744073709551615".len();

/// Longest title (in UTF-8 bytes) kept in a filename.
const MAX_TITLE_BYTES: usize = MAX_NAME_BYTES - RESERVED_BYTES;

/// Builds `<title>.pdf`, or `<id>.pdf` when the title leaves nothing usable.
///
/// Titles are cut on a character boundary so the name, including a collision
/// suffix, stays within 255 bytes.
#[must_use]
pub fn pdf_filename(title: &str, id: u64) -> String {
    let sanitized = sanitize_filename(title.trim());
    let truncated = truncate_to_bytes(&sanitized, MAX_TITLE_BYTES).trim_end();
    if truncated.trim_matches(|c| c == '_' || c == ' ').is_empty() {
        return format!("{id}.pdf");
    }
    format!("{truncated}.pdf")
}

fn truncate_to_bytes(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Sanitizes filename for filesystem safety.
///
/// Replaces characters that are invalid on common filesystems:
/// / \ : * ? " < > |
pub(crate) fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        return "_".to_string();
    }

    if is_safe_filename_segment(&sanitized) {
        sanitized
    } else {
        sanitized
            .chars()
            .map(|c| if c == '.' { '_' } else { c })
            .collect()
    }
}

/// Resolves a file path that does not exist yet.
///
/// Example: `book.pdf`, then `book_2.pdf`, `book_3.pdf`, ...
#[must_use]
pub fn resolve_unique_path(dir: &Path, filename: &str) -> PathBuf {
    let base_path = dir.join(filename);
    if !base_path.exists() {
        return base_path;
    }

    let (stem, ext) = match filename.rfind('.') {
        Some(pos) => (&filename[..pos], &filename[pos..]),
        None => (filename, ""),
    };

    for i in 2..1000 {
        let new_path = dir.join(format!("{stem}_{i}{ext}"));
        if !new_path.exists() {
            return new_path;
        }
    }

    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    dir.join(format!("{stem}_{timestamp}{ext}"))
}

fn is_safe_filename_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}
