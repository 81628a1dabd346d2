//! CLI entry point for instaloader.

use std::process::ExitCode;

mod app;
mod cli;

/// Process outcome mapped to the exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessExit {
    /// Normal or interrupted completion, including per-target failures
    Success,
    /// Fatal configuration, filter, session or unexpected error
    Failure,
}

impl From<ProcessExit> for ExitCode {
    fn from(exit: ProcessExit) -> Self {
        match exit {
            ProcessExit::Success => Self::SUCCESS,
            ProcessExit::Failure => Self::FAILURE,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let result = app::runtime::run_instaloader().await;
    if let Err(error) = &result {
        eprintln!("{}", app::exit_handler::fatal_message(error));
    }
    app::exit_handler::determine_exit_outcome(&result).into()
}
