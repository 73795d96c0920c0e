//! Output directory checks and atomic PDF writes.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use super::error::DownloadError;
use super::filename::resolve_unique_path;

/// What to do when the target file already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputPolicy {
    /// Replace the existing file.
    #[default]
    Overwrite,
    /// Keep the existing file and write `<name>_2.pdf`, `<name>_3.pdf`, ...
    KeepExisting,
}

/// Where and how finished documents are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputOptions {
    /// Existing directory receiving the PDFs.
    pub directory: PathBuf,
    /// Collision policy.
    pub policy: OutputPolicy,
}

impl OutputOptions {
    /// Output into `directory`, overwriting existing files.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            policy: OutputPolicy::default(),
        }
    }

    /// Final path for a filename under the current policy.
    #[must_use]
    pub fn target_path(&self, filename: &str) -> PathBuf {
        match self.policy {
            OutputPolicy::Overwrite => self.directory.join(filename),
            OutputPolicy::KeepExisting => resolve_unique_path(&self.directory, filename),
        }
    }
}

/// Checks that `dir` exists and is a directory.
///
/// # Errors
///
/// Returns [`DownloadError::MissingDirectory`] otherwise.
pub fn ensure_output_dir(dir: &Path) -> Result<(), DownloadError> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(DownloadError::MissingDirectory {
            path: dir.to_path_buf(),
        })
    }
}

/// Writes `bytes` to `path` through a temp file in the same directory, so the
/// target either keeps its old content or receives the complete new one.
///
/// # Errors
///
/// Returns [`DownloadError::Io`] when the temp file cannot be written or renamed.
pub fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), DownloadError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(dir).map_err(|e| DownloadError::io(dir, e))?;
    temp.write_all(bytes)
        .map_err(|e| DownloadError::io(temp.path(), e))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| DownloadError::io(temp.path(), e))?;
    temp.persist(path)
        .map_err(|e| DownloadError::io(path, e.error))?;
    debug!(path = %path.display(), bytes = bytes.len(), "file written");
    Ok(())
}
