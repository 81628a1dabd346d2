//! Deduplicated account names collected from a run's targets.

use std::collections::BTreeSet;

use tracing::info;

use crate::transport::{RetrieveError, Retriever};

/// Accounts to download after the target pass.
///
/// Names reached through several `@account` expansions or given more than
/// once are downloaded a single time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountSet {
    names: BTreeSet<String>,
}

impl AccountSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `name`; returns false if it was already present.
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        self.names.insert(name.into())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl<S: Into<String>> Extend<S> for AccountSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.names.extend(iter.into_iter().map(Into::into));
    }
}

impl<S: Into<String>> FromIterator<S> for AccountSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

/// Fetches the accounts `account` follows and merges them into `accounts`.
///
/// `account` itself is not added.
///
/// # Errors
///
/// Propagates the [`RetrieveError`] of the followee lookup; `accounts` is left
/// untouched in that case.
pub async fn expand_followees(
    retriever: &dyn Retriever,
    account: &str,
    accounts: &mut AccountSet,
) -> Result<usize, RetrieveError> {
    info!("Retrieving followees of {account}...");
    let followees = retriever.followees(account).await?;
    let before = accounts.len();
    accounts.extend(followees);
    let added = accounts.len() - before;
    info!(account, added, "Merged followees");
    Ok(added)
}
