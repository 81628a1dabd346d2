use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use clap::Parser;
use instaloader_core::batch::{BatchConfig, BatchContext, run_batch};
use instaloader_core::item::JsonDescriptorLoader;
use instaloader_core::orchestrator::RunOptions;
use instaloader_core::session::{Prompter, TerminalPrompter};
use instaloader_core::transport::{BulkOptions, HttpConfig, HttpTransport, ProfileOptions};
use tracing::debug;

use crate::app::{terminal, validation};
use crate::cli::Args;

pub(crate) async fn run_instaloader() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    let default_level = terminal::resolve_default_log_level(args.quiet, args.verbose);
    terminal::init_tracing(default_level, terminal::is_no_color_requested());
    debug!(targets = args.targets.len(), "CLI arguments parsed");

    validation::ensure_password_has_login(&args)?;
    let stories = validation::resolve_stories(&args)?;

    let interrupted = Arc::new(AtomicBool::new(false));
    let transport = HttpTransport::new(http_config(&args))
        .context("failed to build HTTP client for the retrieval service")?
        .with_interrupt(Arc::clone(&interrupted));

    let interrupted_signal = Arc::clone(&interrupted);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupted_signal.store(true, Ordering::SeqCst);
        }
    });

    let prompter = TerminalPrompter;
    let prompter: Option<&dyn Prompter> = if args.quiet { None } else { Some(&prompter) };
    let context = BatchContext {
        transport: &transport,
        prompter,
        loader: &JsonDescriptorLoader,
        interrupted: interrupted.as_ref(),
    };

    let config = batch_config(args, stories);
    let report = run_batch(&config, &context).await?;

    debug!(
        downloaded = report.tally.downloaded,
        skipped = report.tally.skipped,
        failed = report.failed(),
        "Run complete"
    );
    Ok(())
}

fn http_config(args: &Args) -> HttpConfig {
    let mut config = HttpConfig::new(args.endpoint.clone());
    config.max_connection_attempts = args.max_connection_attempts;
    if let Some(user_agent) = &args.user_agent {
        config.user_agent.clone_from(user_agent);
    }
    config
}

fn batch_config(args: Args, stories: bool) -> BatchConfig {
    let options = RunOptions {
        bulk: BulkOptions {
            max_count: args.count,
            fast_update: args.fast_update,
        },
        profile: ProfileOptions {
            profile_pic: !args.no_profile_pic && !args.stories_only,
            posts: !args.profile_pic_only && !args.stories_only,
            stories,
            fast_update: args.fast_update,
        },
    };
    BatchConfig {
        targets: args.targets,
        login: args.login,
        password: args.password,
        session_file: args.session_file,
        post_filter: args.post_filter,
        storyitem_filter: args.storyitem_filter,
        options,
    }
}
