//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Download scanned books from the electronic library as PDF files.
///
/// Either search the catalog with a QUERY and pick results from the listing,
/// or fetch one document directly with --id.
#[derive(Parser, Debug)]
#[command(name = "elibrary")]
#[command(author, version, about)]
pub struct Args {
    /// Library account login
    #[arg(short, long)]
    pub login: String,

    /// Library account password
    #[arg(short, long)]
    pub password: String,

    /// Document id to download instead of searching
    #[arg(short, long, allow_negative_numbers = true)]
    pub id: Option<i64>,

    /// Directory receiving the PDF files (must exist)
    #[arg(short, long)]
    pub directory: Option<PathBuf>,

    /// Results to download, e.g. "1 3 5-7"; prompts when omitted
    #[arg(short, long)]
    pub select: Option<String>,

    /// Write `<Title>_2.pdf` instead of replacing an existing file
    #[arg(long)]
    pub keep_existing: bool,

    /// Library root URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// HTTP connect timeout in seconds (1-3600)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub connect_timeout: Option<u64>,

    /// HTTP read timeout in seconds (1-3600)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub read_timeout: Option<u64>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Full-text search query; words are joined with spaces
    pub query: Vec<String>,
}

impl Args {
    /// The search query as one string, `None` when no words were given.
    #[must_use]
    pub fn joined_query(&self) -> Option<String> {
        let joined = self.query.join(" ");
        let trimmed = joined.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CREDENTIALS: [&str; 5] = ["elibrary", "-l", "reader", "-p", "secret"];

    fn parse(extra: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(CREDENTIALS.iter().chain(extra.iter()))
    }

    #[test]
    fn test_cli_credentials_only_parses_successfully() {
        let args = parse(&[]).unwrap();
        assert_eq!(args.login, "reader");
        assert_eq!(args.password, "secret");
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
        assert!(args.id.is_none());
        assert!(args.joined_query().is_none());
    }

    #[test]
    fn test_cli_missing_login_rejected() {
        let err = Args::try_parse_from(["elibrary", "-p", "secret", "algebra"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_cli_missing_password_rejected() {
        let err = Args::try_parse_from(["elibrary", "--login", "reader"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_cli_query_words_are_joined() {
        let args = parse(&["linear", "algebra"]).unwrap();
        assert_eq!(args.joined_query().as_deref(), Some("linear algebra"));
    }

    #[test]
    fn test_cli_blank_query_is_none() {
        let args = parse(&["  "]).unwrap();
        assert!(args.joined_query().is_none());
    }

    #[test]
    fn test_cli_id_flag() {
        let args = parse(&["-i", "4242"]).unwrap();
        assert_eq!(args.id, Some(4242));

        let args = parse(&["--id", "7"]).unwrap();
        assert_eq!(args.id, Some(7));
    }

    #[test]
    fn test_cli_negative_id_reaches_validation() {
        let args = parse(&["--id", "-3"]).unwrap();
        assert_eq!(args.id, Some(-3));
    }

    #[test]
    fn test_cli_non_numeric_id_rejected() {
        let err = parse(&["--id", "abc"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_directory_and_select() {
        let args = parse(&["-d", "/tmp/books", "-s", "1 3-4", "algebra"]).unwrap();
        assert_eq!(args.directory, Some(PathBuf::from("/tmp/books")));
        assert_eq!(args.select.as_deref(), Some("1 3-4"));
        assert_eq!(args.joined_query().as_deref(), Some("algebra"));
    }

    #[test]
    fn test_cli_timeouts_range_checked() {
        let args = parse(&["--connect-timeout", "5", "--read-timeout", "3600"]).unwrap();
        assert_eq!(args.connect_timeout, Some(5));
        assert_eq!(args.read_timeout, Some(3600));

        let err = parse(&["--read-timeout", "0"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = parse(&["-v"]).unwrap();
        assert_eq!(args.verbose, 1);

        let args = parse(&["-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_quiet_conflicts_with_verbose() {
        let err = parse(&["-q", "-v"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let err = Args::try_parse_from(["elibrary", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_invalid_flag_returns_error() {
        let err = parse(&["--invalid-flag"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }
}
