//! Target classification.
//!
//! Every raw command-line target maps to exactly one [`Target`]:
//!
//! | Raw form              | Target                  |
//! |-----------------------|-------------------------|
//! | `@account`            | followees of `account`  |
//! | `#tag`                | hashtag posts           |
//! | `:feed`               | feed of the login       |
//! | `:stories`            | stories of followees    |
//! | `:saved`              | saved posts             |
//! | existing `*.json[.xz]`| saved descriptor file   |
//! | anything else         | account name            |
//!
//! # Example
//!
//! ```
//! use instaloader_core::target::{Target, classify};
//!
//! assert_eq!(classify("#travel"), Target::Tag("travel".to_string()));
//! assert_eq!(classify("alice/"), Target::AccountName("alice".to_string()));
//! ```

mod accounts;

pub use accounts::{AccountSet, expand_followees};

use std::fmt;
use std::path::{MAIN_SEPARATOR, Path, PathBuf};

use thiserror::Error;
use tracing::debug;

/// Suffixes of saved metadata files accepted as targets.
pub const DESCRIPTOR_SUFFIXES: &[&str] = &[".json", ".json.xz"];

/// Special targets that no longer exist.
const REMOVED_TARGETS: &[&str] = &[":feed-all", ":feed-liked"];

/// What one raw target asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// `@account`: everyone `account` follows
    AccountFollowees(String),
    /// `#tag`
    Tag(String),
    /// `:feed`
    SpecialFeed,
    /// `:stories`
    SpecialStories,
    /// `:saved`
    SpecialSaved,
    /// A saved descriptor on disk
    LocalDescriptorFile(PathBuf),
    /// Plain account name
    AccountName(String),
}

impl Target {
    /// Account or tag name carried by the target, if it has one.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::AccountFollowees(name) | Self::Tag(name) | Self::AccountName(name) => {
                Some(name)
            }
            _ => None,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AccountFollowees(name) => write!(f, "@{name}"),
            Self::Tag(name) => write!(f, "#{name}"),
            Self::SpecialFeed => write!(f, ":feed"),
            Self::SpecialStories => write!(f, ":stories"),
            Self::SpecialSaved => write!(f, ":saved"),
            Self::LocalDescriptorFile(path) => write!(f, "{}", path.display()),
            Self::AccountName(name) => write!(f, "{name}"),
        }
    }
}

/// Fatal problems in the target list found before any work starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetError {
    /// A removed special target was requested
    #[error(
        ":feed-all and :feed-liked were removed. Use :feed as target and eventually --post-filter=viewer_has_liked."
    )]
    Removed {
        /// The removed literal as given
        target: String,
    },
}

/// Classifies `raw`, probing the filesystem for descriptor files.
#[tracing::instrument(level = "debug")]
#[must_use]
pub fn classify(raw: &str) -> Target {
    classify_with(raw, |path| path.is_file())
}

/// Classifies `raw`, using `is_file` to decide whether it names a local file.
#[must_use]
pub fn classify_with(raw: &str, is_file: impl Fn(&Path) -> bool) -> Target {
    let target = raw.trim_end_matches(['/', MAIN_SEPARATOR]);

    let classified = if let Some(account) = target.strip_prefix('@') {
        Target::AccountFollowees(account.to_string())
    } else if let Some(tag) = target.strip_prefix('#') {
        Target::Tag(tag.to_string())
    } else if target == ":feed" {
        Target::SpecialFeed
    } else if target == ":stories" {
        Target::SpecialStories
    } else if target == ":saved" {
        Target::SpecialSaved
    } else if has_descriptor_suffix(target) && is_file(Path::new(target)) {
        Target::LocalDescriptorFile(PathBuf::from(target))
    } else {
        Target::AccountName(target.to_string())
    };
    debug!(raw, target = %classified, "Classified target");
    classified
}

/// Returns true if `target` ends with a saved-metadata suffix.
#[must_use]
pub fn has_descriptor_suffix(target: &str) -> bool {
    DESCRIPTOR_SUFFIXES
        .iter()
        .any(|suffix| target.ends_with(suffix))
}

/// Rejects removed special targets anywhere in the list.
///
/// # Errors
///
/// Returns [`TargetError::Removed`] for the first removed literal found.
pub fn check_deprecated<S: AsRef<str>>(targets: &[S]) -> Result<(), TargetError> {
    match targets
        .iter()
        .map(AsRef::<str>::as_ref)
        .find(|target| REMOVED_TARGETS.contains(target))
    {
        Some(target) => Err(TargetError::Removed {
            target: target.to_string(),
        }),
        None => Ok(()),
    }
}
