//! CLI entry point for the elibrary tool.

use std::process::ExitCode;

mod app;
mod app_config;
mod cli;

/// Process outcomes and their exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessExit {
    Success,
    Failure,
    InvalidArguments,
    LoginFailed,
    BookNotFound,
    NoBooksFound,
}

impl ProcessExit {
    pub(crate) const fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Failure => 1,
            // Same code clap uses for usage errors.
            Self::InvalidArguments => 2,
            Self::LoginFailed => 3,
            Self::BookNotFound => 4,
            Self::NoBooksFound => 5,
        }
    }
}

impl From<ProcessExit> for ExitCode {
    fn from(exit: ProcessExit) -> Self {
        ExitCode::from(exit.code())
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    match app::runtime::run().await {
        Ok(exit) => exit.into(),
        Err(error) => {
            eprintln!("error: {error:#}");
            app::exit_handler::exit_for_error(&error).into()
        }
    }
}
