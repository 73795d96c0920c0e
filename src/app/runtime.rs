use std::io::{self, IsTerminal};

use anyhow::Result;
use clap::Parser;
use elibrary_core::catalog::listing_order;
use elibrary_core::download::ensure_output_dir;
use elibrary_core::{
    LibraryConfig, OutputOptions, OutputPolicy, SavedBook, Session, authenticate, parse_indexes,
    save_book, search,
};
use tracing::{debug, info, warn};

use crate::ProcessExit;
use crate::app::progress::PageStatusLine;
use crate::app::settings::{self, RunSettings};
use crate::app::{UsageError, interactive, terminal};
use crate::app_config;
use crate::cli::Args;

/// What the command line asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Target {
    Document(u64),
    Search(String),
}

pub(crate) fn resolve_target(args: &Args) -> Result<Target, UsageError> {
    match (args.id, args.joined_query()) {
        (Some(id), query) => {
            if query.is_some() {
                warn!(id, "--id given; ignoring the search query");
            }
            u64::try_from(id)
                .ok()
                .filter(|id| *id > 0)
                .map(Target::Document)
                .ok_or_else(|| UsageError::new(format!("document id must be positive, got {id}")))
        }
        (None, Some(query)) => Ok(Target::Search(query)),
        (None, None) => Err(UsageError::new(
            "nothing to do: pass a search query or --id <ID>",
        )),
    }
}

pub(crate) async fn run() -> Result<ProcessExit> {
    let args = Args::parse();
    let file_config = app_config::load_default_file_config()?;
    let settings = settings::resolve_settings(&args, file_config.as_ref());

    let no_color =
        terminal::should_disable_color(terminal::no_color_env_requested(), terminal::is_dumb_terminal());
    terminal::init_tracing(settings.log_level, no_color);
    debug!(?settings, "settings resolved");

    let target = resolve_target(&args)?;
    ensure_output_dir(&settings.directory)?;
    let config = settings.library_config()?;

    let output = OutputOptions {
        directory: settings.directory.clone(),
        policy: if args.keep_existing {
            OutputPolicy::KeepExisting
        } else {
            OutputPolicy::Overwrite
        },
    };
    let run = Run {
        args: &args,
        settings: &settings,
        output,
        show_progress: terminal::should_use_spinner(
            io::stderr().is_terminal(),
            settings.quiet,
            terminal::is_dumb_terminal(),
        ),
    };

    match target {
        Target::Document(id) => run.download_document(config, id).await?,
        Target::Search(query) => run.search_and_download(config, &query).await?,
    }
    Ok(ProcessExit::Success)
}

struct Run<'a> {
    args: &'a Args,
    settings: &'a RunSettings,
    output: OutputOptions,
    show_progress: bool,
}

impl Run<'_> {
    async fn download_document(&self, config: LibraryConfig, id: u64) -> Result<()> {
        let redirect = config.metadata_url(id);
        let (session, landing) =
            authenticate(config, &self.args.login, &self.args.password, Some(&redirect)).await?;
        // The landing page doubles as the details page only if the redirect was honoured.
        let prefetched = (landing.url == redirect).then_some(&landing);
        if prefetched.is_none() {
            debug!(landed = %landing.url, "login did not land on the details page");
        }
        self.save(&session, id, prefetched).await
    }

    async fn search_and_download(&self, config: LibraryConfig, query: &str) -> Result<()> {
        let (session, _) =
            authenticate(config, &self.args.login, &self.args.password, None).await?;
        let books = search(&session, query).await?;
        info!(query, results = books.len(), "search finished");

        let listing = listing_order(&books);
        if self.args.select.is_none() || !self.settings.quiet {
            print!("{}", interactive::render_listing(&listing));
        }
        let expression = match &self.args.select {
            Some(expression) => expression.clone(),
            None => interactive::read_selection(io::stdin().lock(), io::stdout())?,
        };
        let indexes = parse_indexes(&expression, listing.len())?;
        debug!(?indexes, "selection parsed");

        for index in indexes {
            let book = listing[index];
            self.save(&session, book.id, None).await?;
        }
        Ok(())
    }

    async fn save(
        &self,
        session: &Session,
        id: u64,
        prefetched: Option<&elibrary_core::FetchedPage>,
    ) -> Result<()> {
        let progress = PageStatusLine::new(self.show_progress);
        let saved = save_book(session, id, prefetched, &self.output, &progress).await?;
        drop(progress);
        self.report(&saved);
        Ok(())
    }

    fn report(&self, saved: &SavedBook) {
        if !self.settings.quiet {
            println!(
                "Saved \"{}\" ({} pages) to {}",
                saved.title,
                saved.pages,
                saved.path.display()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        let base = ["elibrary", "-l", "reader", "-p", "secret"];
        Args::try_parse_from(base.iter().chain(extra.iter())).unwrap()
    }

    #[test]
    fn test_resolve_target_prefers_id() {
        assert_eq!(
            resolve_target(&args(&["--id", "12", "algebra"])).unwrap(),
            Target::Document(12)
        );
    }

    #[test]
    fn test_resolve_target_search_query() {
        assert_eq!(
            resolve_target(&args(&["linear", "algebra"])).unwrap(),
            Target::Search("linear algebra".to_string())
        );
    }

    #[test]
    fn test_resolve_target_rejects_non_positive_id() {
        let err = resolve_target(&args(&["--id", "0"])).unwrap_err();
        assert!(err.to_string().contains("positive"));
        assert!(resolve_target(&args(&["--id", "-5"])).is_err());
    }

    #[test]
    fn test_resolve_target_requires_query_or_id() {
        let err = resolve_target(&args(&[])).unwrap_err();
        assert!(err.to_string().contains("--id"));
    }
}
