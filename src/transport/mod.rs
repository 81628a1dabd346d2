//! Seams to the retrieval service.
//!
//! The orchestrator and the session manager never talk to the network
//! directly. They go through the traits defined here:
//!
//! - [`Authenticator`] logs in and asks who a credential belongs to
//! - [`Retriever`] fetches and saves items for one session
//! - [`Transport`] ties both together and hands out retrievers per credential
//!
//! [`HttpTransport`] is the bundled implementation speaking JSON to a
//! retrieval service.

mod error;
mod http;
mod user_agent;

pub use error::{AuthError, RetrieveError};
pub use http::{DEFAULT_MAX_CONNECTION_ATTEMPTS, HttpConfig, HttpTransport};
pub use user_agent::default_user_agent;

use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::filter::{Filters, Predicate};
use crate::item::{Post, StoryItem};

/// Opaque session credential issued by the service at login.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Raw token, for transports that need to send it.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(..)")
    }
}

/// Limits passed through to bulk downloads (`#tag`, `:feed`, `:saved`, `:stories`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkOptions {
    /// Stop after this many downloaded items
    pub max_count: Option<usize>,
    /// Stop at the first item that is already present locally
    pub fast_update: bool,
}

/// What to fetch for an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileOptions {
    pub profile_pic: bool,
    pub posts: bool,
    pub stories: bool,
    pub fast_update: bool,
}

impl Default for ProfileOptions {
    fn default() -> Self {
        Self {
            profile_pic: true,
            posts: true,
            stories: false,
            fast_update: false,
        }
    }
}

/// Per-call download counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadTally {
    /// Items newly saved
    pub downloaded: usize,
    /// Items rejected by a filter
    pub skipped: usize,
    /// Items that were already present
    pub present: usize,
}

impl DownloadTally {
    /// Records the outcome of one save call.
    pub fn record(&mut self, downloaded: bool) {
        if downloaded {
            self.downloaded += 1;
        } else {
            self.present += 1;
        }
    }

    /// Adds another tally into this one.
    pub fn absorb(&mut self, other: Self) {
        self.downloaded += other.downloaded;
        self.skipped += other.skipped;
        self.present += other.present;
    }
}

/// Logs in and identifies credentials.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Exchanges a username and password for a credential.
    ///
    /// # Errors
    ///
    /// [`AuthError::BadCredentials`] if the service rejects the pair, other
    /// variants for transport faults.
    async fn login(&self, username: &str, password: &str) -> Result<Credential, AuthError>;

    /// Returns the account name `credential` is logged in as, `None` if it is
    /// not (or no longer) valid.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] on transport faults.
    async fn current_user(&self, credential: &Credential) -> Result<Option<String>, AuthError>;
}

/// Fetches and saves items on behalf of one session.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Whether this retriever carries a credential.
    fn is_logged_in(&self) -> bool;

    /// Account names followed by `account`.
    async fn followees(&self, account: &str) -> Result<Vec<String>, RetrieveError>;

    /// Saves one post into `target_dir`; `Ok(false)` if it was already present.
    async fn download_post(&self, post: &Post, target_dir: &Path) -> Result<bool, RetrieveError>;

    /// Saves one story item into `target_dir`; `Ok(false)` if it was already present.
    async fn download_storyitem(
        &self,
        item: &StoryItem,
        target_dir: &Path,
    ) -> Result<bool, RetrieveError>;

    /// Downloads the posts of a hashtag.
    async fn download_hashtag(
        &self,
        tag: &str,
        filter: Option<&Predicate>,
        options: BulkOptions,
    ) -> Result<DownloadTally, RetrieveError>;

    /// Downloads the logged-in account's feed.
    async fn download_feed(
        &self,
        filter: Option<&Predicate>,
        options: BulkOptions,
    ) -> Result<DownloadTally, RetrieveError>;

    /// Downloads the stories of followed accounts.
    async fn download_stories(
        &self,
        filter: Option<&Predicate>,
        options: BulkOptions,
    ) -> Result<DownloadTally, RetrieveError>;

    /// Downloads the logged-in account's saved posts.
    async fn download_saved(
        &self,
        filter: Option<&Predicate>,
        options: BulkOptions,
    ) -> Result<DownloadTally, RetrieveError>;

    /// Downloads an account: picture, posts and (optionally) stories.
    ///
    /// Fails with [`RetrieveError::NotFound`] if the account does not exist
    /// or is not visible to this session.
    async fn download_profile(
        &self,
        account: &str,
        filters: &Filters,
        options: ProfileOptions,
    ) -> Result<DownloadTally, RetrieveError>;

    /// A copy of this retriever with the same configuration and no credential.
    fn anonymous_copy(&self) -> Box<dyn Retriever>;
}

/// A service connection able to authenticate and to retrieve.
pub trait Transport: Authenticator {
    /// A retriever acting with `credential`, or anonymously for `None`.
    fn retriever(&self, credential: Option<Credential>) -> Box<dyn Retriever>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_debug_hides_token() {
        let credential = Credential::new("secret-token");
        assert_eq!(format!("{credential:?}"), "Credential(..)");
        assert_eq!(credential.expose(), "secret-token");
    }

    #[test]
    fn test_tally_record_and_absorb() {
        let mut tally = DownloadTally::default();
        tally.record(true);
        tally.record(false);
        tally.absorb(DownloadTally {
            downloaded: 2,
            skipped: 1,
            present: 0,
        });
        assert_eq!(
            tally,
            DownloadTally {
                downloaded: 3,
                skipped: 1,
                present: 1,
            }
        );
    }

    #[test]
    fn test_profile_options_default_skips_stories() {
        let options = ProfileOptions::default();
        assert!(options.profile_pic && options.posts);
        assert!(!options.stories);
    }
}
