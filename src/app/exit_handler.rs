//! Exit code logic for the instaloader process.
//!
//! Single responsibility: map the run's outcome to the process exit code and
//! the message printed for fatal errors.

use instaloader_core::FatalError;

use crate::ProcessExit;

/// Interrupted or partially failed runs still complete normally.
pub(crate) fn determine_exit_outcome(result: &anyhow::Result<()>) -> ProcessExit {
    match result {
        Ok(()) => ProcessExit::Success,
        Err(_) => ProcessExit::Failure,
    }
}

/// Message printed for a fatal error.
///
/// Configuration faults are shown as they are; everything else is prefixed
/// with `Fatal error:`.
pub(crate) fn fatal_message(error: &anyhow::Error) -> String {
    match error.downcast_ref::<FatalError>() {
        Some(fatal) if fatal.is_configuration() => fatal.to_string(),
        _ => format!("Fatal error: {error:#}"),
    }
}
