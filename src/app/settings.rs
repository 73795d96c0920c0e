//! Merges command-line values with config-file defaults.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use elibrary_core::LibraryConfig;
use elibrary_core::config::{CONNECT_TIMEOUT_SECS, DEFAULT_BASE_URL, READ_TIMEOUT_SECS};

use crate::app_config::{FileConfig, VerbositySetting};
use crate::cli::Args;

/// Effective run settings after merging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RunSettings {
    pub(crate) base_url: String,
    pub(crate) directory: PathBuf,
    pub(crate) connect_timeout_secs: u64,
    pub(crate) read_timeout_secs: u64,
    pub(crate) log_level: &'static str,
    pub(crate) quiet: bool,
}

impl RunSettings {
    /// Builds the library config for these settings.
    pub(crate) fn library_config(&self) -> Result<LibraryConfig> {
        let config = LibraryConfig::new(&self.base_url)
            .with_context(|| format!("Invalid library URL '{}'", self.base_url))?;
        Ok(config.with_timeouts(
            Duration::from_secs(self.connect_timeout_secs),
            Duration::from_secs(self.read_timeout_secs),
        ))
    }
}

/// Command-line values win; the file fills the gaps; built-in defaults last.
pub(crate) fn resolve_settings(args: &Args, file_config: Option<&FileConfig>) -> RunSettings {
    let file = file_config.cloned().unwrap_or_default();

    let base_url = args
        .base_url
        .clone()
        .or(file.base_url)
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let directory = args
        .directory
        .clone()
        .or(file.directory)
        .unwrap_or_else(|| PathBuf::from("."));
    let connect_timeout_secs = args
        .connect_timeout
        .or(file.connect_timeout_secs)
        .unwrap_or(CONNECT_TIMEOUT_SECS);
    let read_timeout_secs = args
        .read_timeout
        .or(file.read_timeout_secs)
        .unwrap_or(READ_TIMEOUT_SECS);

    let cli_sets_verbosity = args.quiet || args.verbose > 0;
    let (log_level, quiet) = match file.verbosity {
        Some(setting) if !cli_sets_verbosity => config_log_level(setting),
        _ => (resolve_default_log_level(args.verbose, args.quiet), args.quiet),
    };

    RunSettings {
        base_url,
        directory,
        connect_timeout_secs,
        read_timeout_secs,
        log_level,
        quiet,
    }
}

pub(crate) fn resolve_default_log_level(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        "error"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

fn config_log_level(setting: VerbositySetting) -> (&'static str, bool) {
    match setting {
        VerbositySetting::Default => ("info", false),
        VerbositySetting::Verbose => ("debug", false),
        VerbositySetting::Quiet => ("error", true),
        VerbositySetting::Debug => ("trace", false),
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    fn args(extra: &[&str]) -> Args {
        let base = ["elibrary", "-l", "reader", "-p", "secret"];
        Args::try_parse_from(base.iter().chain(extra.iter())).unwrap()
    }

    #[test]
    fn test_resolve_settings_defaults_without_file() {
        let settings = resolve_settings(&args(&[]), None);
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
        assert_eq!(settings.directory, PathBuf::from("."));
        assert_eq!(settings.connect_timeout_secs, CONNECT_TIMEOUT_SECS);
        assert_eq!(settings.read_timeout_secs, READ_TIMEOUT_SECS);
        assert_eq!(settings.log_level, "info");
        assert!(!settings.quiet);
    }

    #[test]
    fn test_resolve_settings_file_fills_gaps() {
        let file = FileConfig {
            base_url: Some("http://mirror.local/".to_string()),
            directory: Some(PathBuf::from("/srv/books")),
            connect_timeout_secs: Some(5),
            read_timeout_secs: Some(60),
            verbosity: Some(VerbositySetting::Quiet),
        };
        let settings = resolve_settings(&args(&[]), Some(&file));
        assert_eq!(settings.base_url, "http://mirror.local/");
        assert_eq!(settings.directory, PathBuf::from("/srv/books"));
        assert_eq!(settings.connect_timeout_secs, 5);
        assert_eq!(settings.read_timeout_secs, 60);
        assert_eq!(settings.log_level, "error");
        assert!(settings.quiet);
    }

    #[test]
    fn test_resolve_settings_command_line_wins() {
        let file = FileConfig {
            base_url: Some("http://mirror.local/".to_string()),
            directory: Some(PathBuf::from("/srv/books")),
            read_timeout_secs: Some(60),
            verbosity: Some(VerbositySetting::Quiet),
            ..FileConfig::default()
        };
        let settings = resolve_settings(
            &args(&[
                "--base-url",
                "http://other.local/",
                "-d",
                "out",
                "--read-timeout",
                "90",
                "-v",
            ]),
            Some(&file),
        );
        assert_eq!(settings.base_url, "http://other.local/");
        assert_eq!(settings.directory, PathBuf::from("out"));
        assert_eq!(settings.read_timeout_secs, 90);
        assert_eq!(settings.log_level, "debug");
        assert!(!settings.quiet);
    }

    #[test]
    fn test_resolve_default_log_level() {
        assert_eq!(resolve_default_log_level(0, true), "error");
        assert_eq!(resolve_default_log_level(0, false), "info");
        assert_eq!(resolve_default_log_level(1, false), "debug");
        assert_eq!(resolve_default_log_level(3, false), "trace");
    }

    #[test]
    fn test_library_config_rejects_bad_url() {
        let mut settings = resolve_settings(&args(&[]), None);
        settings.base_url = "ftp://library".to_string();
        assert!(settings.library_config().is_err());
    }
}
