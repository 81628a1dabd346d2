//! One complete run: checks, login, batch loop, session persistence.

use std::path::PathBuf;
use std::sync::atomic::AtomicBool;

use tracing::info;

use crate::error::FatalError;
use crate::filter::Filters;
use crate::item::DescriptorLoader;
use crate::orchestrator::{BatchReport, Orchestrator, RunOptions};
use crate::session::{Prompter, Session, SessionManager};
use crate::target::check_deprecated;
use crate::transport::Transport;

/// Inputs of one run, as given on the command line.
#[derive(Debug, Clone, Default)]
pub struct BatchConfig {
    pub targets: Vec<String>,
    /// Account to log in as
    pub login: Option<String>,
    pub password: Option<String>,
    /// Session file overriding the per-account default
    pub session_file: Option<PathBuf>,
    pub post_filter: Option<String>,
    pub storyitem_filter: Option<String>,
    pub options: RunOptions,
}

/// Collaborators of a run.
pub struct BatchContext<'a, T: Transport> {
    pub transport: &'a T,
    /// `None` disables interactive prompting (quiet mode)
    pub prompter: Option<&'a dyn Prompter>,
    pub loader: &'a dyn DescriptorLoader,
    pub interrupted: &'a AtomicBool,
}

/// Runs the batch described by `config`.
///
/// Removed targets and filter errors are reported before anything else
/// happens. The session, if any, is saved exactly once after the loop, also
/// when the loop stopped on an interrupt.
///
/// # Errors
///
/// Returns [`FatalError`] for configuration, filter and session faults.
/// Failures of individual targets are not errors; they are collected in the
/// returned [`BatchReport`].
#[tracing::instrument(skip_all, fields(targets = config.targets.len()))]
pub async fn run_batch<T: Transport>(
    config: &BatchConfig,
    context: &BatchContext<'_, T>,
) -> Result<BatchReport, FatalError> {
    check_deprecated(config.targets.as_slice())?;
    let filters = Filters::compile(
        config.post_filter.as_deref(),
        config.storyitem_filter.as_deref(),
    )?;

    let manager = SessionManager::new(context.transport, context.prompter);
    let session = match &config.login {
        Some(account) => {
            manager
                .load_or_prompt(
                    account,
                    config.password.as_deref(),
                    config.session_file.as_deref(),
                )
                .await?
        }
        None => Session::anonymous(),
    };

    let retriever = context.transport.retriever(session.credential().cloned());
    let orchestrator = Orchestrator::new(
        retriever.as_ref(),
        context.loader,
        &filters,
        config.options,
        context.interrupted,
    );
    let report = orchestrator.run(config.targets.as_slice()).await;

    manager.persist(&session, config.session_file.as_deref())?;

    report.log_summary();
    if config.targets.is_empty() && session.is_logged_in() {
        info!("No targets were specified, thus nothing has been downloaded.");
    }
    Ok(report)
}
