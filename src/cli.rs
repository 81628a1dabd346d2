//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;
use url::Url;

use instaloader_core::transport::DEFAULT_MAX_CONNECTION_ATTEMPTS;

/// Default retrieval service endpoint.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8787/";

/// Download pictures, videos and stories for a list of targets.
///
/// Targets are account names, #hashtags, @account (everyone the account
/// follows), :feed, :stories, :saved, or paths to saved *.json / *.json.xz
/// metadata files.
#[derive(Parser)]
#[command(name = "instaloader")]
#[command(author, version, about)]
pub struct Args {
    /// profile | #hashtag | @account | :feed | :stories | :saved | file.json
    #[arg(value_name = "TARGET")]
    pub targets: Vec<String>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Disable user interaction and suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Log in as this account (required for :feed, :saved and stories)
    #[arg(short, long, value_name = "NAME")]
    pub login: Option<String>,

    /// Password for --login; prompted for when omitted and no valid session exists
    #[arg(short, long, value_name = "PASSWORD")]
    pub password: Option<String>,

    /// Session file to load and save instead of the per-account default
    #[arg(short = 'f', long = "sessionfile", value_name = "PATH")]
    pub session_file: Option<PathBuf>,

    /// Only download posts for which EXPR evaluates to true
    #[arg(long, alias = "only-if", value_name = "EXPR")]
    pub post_filter: Option<String>,

    /// Only download story items for which EXPR evaluates to true
    #[arg(long, value_name = "EXPR")]
    pub storyitem_filter: Option<String>,

    /// Stop at the first already downloaded item of each target
    #[arg(short = 'F', long)]
    pub fast_update: bool,

    /// Download at most this many posts per hashtag, feed or saved target
    #[arg(short, long, value_name = "N")]
    pub count: Option<usize>,

    /// Do not download profile pictures
    #[arg(long, conflicts_with = "profile_pic_only")]
    pub no_profile_pic: bool,

    /// Only download profile pictures
    #[arg(long, conflicts_with = "stories_only")]
    pub profile_pic_only: bool,

    /// Also download stories of each profile (requires --login)
    #[arg(short, long)]
    pub stories: bool,

    /// Only download stories of each profile (requires --login)
    #[arg(long)]
    pub stories_only: bool,

    /// Attempts per request before giving up (0 for unbounded)
    #[arg(long, default_value_t = DEFAULT_MAX_CONNECTION_ATTEMPTS, value_name = "N")]
    pub max_connection_attempts: u32,

    /// User-Agent header sent to the retrieval service
    #[arg(long, value_name = "AGENT")]
    pub user_agent: Option<String>,

    /// Base URL of the retrieval service
    #[arg(long, default_value = DEFAULT_ENDPOINT, value_name = "URL")]
    pub endpoint: Url,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_args_parses_successfully() {
        let args = Args::try_parse_from(["instaloader"]).unwrap();
        assert!(args.targets.is_empty());
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
        assert!(args.login.is_none());
        assert_eq!(args.max_connection_attempts, 3); // DEFAULT_MAX_CONNECTION_ATTEMPTS
        assert_eq!(args.endpoint.as_str(), DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_cli_targets_keep_sigils_and_order() {
        let args =
            Args::try_parse_from(["instaloader", "alice", "#travel", "@bob", ":feed"]).unwrap();
        assert_eq!(args.targets, ["alice", "#travel", "@bob", ":feed"]);
    }

    #[test]
    fn test_cli_session_flags() {
        let args = Args::try_parse_from([
            "instaloader",
            "-l",
            "alice",
            "-p",
            "secret",
            "-f",
            "/tmp/session",
        ])
        .unwrap();
        assert_eq!(args.login.as_deref(), Some("alice"));
        assert_eq!(args.password.as_deref(), Some("secret"));
        assert_eq!(args.session_file, Some(PathBuf::from("/tmp/session")));
    }

    #[test]
    fn test_cli_only_if_is_post_filter_alias() {
        let args = Args::try_parse_from(["instaloader", "--only-if", "likes > 5"]).unwrap();
        assert_eq!(args.post_filter.as_deref(), Some("likes > 5"));
    }

    #[test]
    fn test_cli_bulk_flags() {
        let args = Args::try_parse_from(["instaloader", "-F", "-c", "10", "#tag"]).unwrap();
        assert!(args.fast_update);
        assert_eq!(args.count, Some(10));
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["instaloader", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_profile_pic_flags_conflict() {
        let result =
            Args::try_parse_from(["instaloader", "--no-profile-pic", "--profile-pic-only"]);
        assert_eq!(
            result.err().map(|err| err.kind()),
            Some(clap::error::ErrorKind::ArgumentConflict)
        );
    }

    #[test]
    fn test_cli_invalid_endpoint_rejected() {
        let result = Args::try_parse_from(["instaloader", "--endpoint", "not a url"]);
        assert_eq!(
            result.err().map(|err| err.kind()),
            Some(clap::error::ErrorKind::ValueValidation)
        );
    }

    #[test]
    fn test_cli_negative_count_rejected() {
        let result = Args::try_parse_from(["instaloader", "-c", "-1"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let result = Args::try_parse_from(["instaloader", "--help"]);
        assert_eq!(
            result.err().map(|err| err.kind()),
            Some(clap::error::ErrorKind::DisplayHelp)
        );
    }
}
