use instaloader_core::FatalError;
use tracing::warn;

use crate::cli::Args;

fn invalid(message: &str) -> FatalError {
    FatalError::InvalidArguments(message.to_string())
}

/// `--password` only makes sense together with `--login`.
pub(crate) fn ensure_password_has_login(args: &Args) -> Result<(), FatalError> {
    if args.password.is_some() && args.login.is_none() {
        return Err(invalid("--password requires --login=USERNAME."));
    }
    Ok(())
}

/// Resolves whether account stories are downloaded.
///
/// `--stories-only` without a login is fatal; plain `--stories` is dropped
/// with a warning.
pub(crate) fn resolve_stories(args: &Args) -> Result<bool, FatalError> {
    let logged_in = args.login.is_some();
    if args.stories_only && !logged_in {
        return Err(invalid("--login=USERNAME required to download stories."));
    }
    if args.stories && !logged_in {
        warn!("--login=USERNAME required to download stories; ignoring --stories.");
        return Ok(false);
    }
    Ok(args.stories || args.stories_only)
}
