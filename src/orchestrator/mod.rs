//! The batch loop: targets first, then accounts.
//!
//! Each raw target is classified and handled inside its own failure boundary.
//! Failures become [`ErrorRecord`]s and the loop moves on. Account names, both
//! given directly and reached through `@account` expansion, are collected into
//! an [`AccountSet`] and downloaded after the target pass.
//!
//! An account that is not found while logged in is retried exactly once on an
//! anonymous copy of the retriever. An interrupt is checked between targets
//! and between accounts; it ends the loop without skipping the shutdown path.

mod local;
mod report;

pub use local::{LocalDispatch, dispatch};
pub use report::{BatchReport, ErrorRecord, TargetFault};

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{info, warn};

use crate::filter::Filters;
use crate::item::DescriptorLoader;
use crate::target::{AccountSet, Target, classify, expand_followees};
use crate::transport::{BulkOptions, DownloadTally, ProfileOptions, RetrieveError, Retriever};

/// Pass-through options of one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Applied to `#tag`, `:feed`, `:stories` and `:saved`
    pub bulk: BulkOptions,
    /// Applied to every account download
    pub profile: ProfileOptions,
}

/// Runs one batch against a retriever.
pub struct Orchestrator<'a> {
    retriever: &'a dyn Retriever,
    loader: &'a dyn DescriptorLoader,
    filters: &'a Filters,
    options: RunOptions,
    interrupted: &'a AtomicBool,
}

impl<'a> Orchestrator<'a> {
    #[must_use]
    pub fn new(
        retriever: &'a dyn Retriever,
        loader: &'a dyn DescriptorLoader,
        filters: &'a Filters,
        options: RunOptions,
        interrupted: &'a AtomicBool,
    ) -> Self {
        Self {
            retriever,
            loader,
            filters,
            options,
            interrupted,
        }
    }

    fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }

    /// Processes every target, then every collected account.
    pub async fn run<S: AsRef<str>>(&self, targets: &[S]) -> BatchReport {
        let mut report = BatchReport::default();
        let mut accounts = AccountSet::new();

        for raw in targets {
            if self.is_interrupted() {
                warn!("Interrupted by user.");
                report.mark_interrupted();
                return report;
            }
            let raw = raw.as_ref();
            self.run_target(raw, &mut accounts, &mut report).await;
        }

        self.download_accounts(&accounts, &mut report).await;
        report
    }

    /// One target inside its failure boundary.
    async fn run_target(&self, raw: &str, accounts: &mut AccountSet, report: &mut BatchReport) {
        let post_filter = self.filters.post.as_ref();
        let bulk = self.options.bulk;
        let target = classify(raw);
        if target.name().is_some_and(str::is_empty) {
            report.record(raw, TargetFault::Rejected(format!("{raw:?} names no target")));
            return;
        }
        let result = match target {
            Target::LocalDescriptorFile(path) => {
                self.run_local(raw, &path, report).await;
                return;
            }
            Target::AccountFollowees(account) => {
                if let Err(error) = expand_followees(self.retriever, &account, accounts).await {
                    report.record(raw, error);
                }
                return;
            }
            Target::AccountName(account) => {
                accounts.insert(account);
                return;
            }
            Target::Tag(tag) => {
                info!("Retrieving pictures with hashtag #{tag}...");
                self.retriever.download_hashtag(&tag, post_filter, bulk).await
            }
            Target::SpecialFeed => {
                info!("Retrieving pictures from your feed...");
                self.retriever.download_feed(post_filter, bulk).await
            }
            Target::SpecialStories => {
                info!("Retrieving stories...");
                self.retriever
                    .download_stories(self.filters.storyitem.as_ref(), bulk)
                    .await
            }
            Target::SpecialSaved => {
                info!("Retrieving saved posts...");
                self.retriever.download_saved(post_filter, bulk).await
            }
        };
        absorb(raw, result, report);
    }

    async fn run_local(&self, raw: &str, path: &Path, report: &mut BatchReport) {
        let descriptor = match self.loader.load(path) {
            Ok(descriptor) => descriptor,
            Err(error) => {
                report.record(raw, error);
                return;
            }
        };

        let result = match dispatch(descriptor, path) {
            LocalDispatch::Post { post, target_dir } => match self.filters.accepts(&post) {
                Ok(true) => self.retriever.download_post(&post, &target_dir).await,
                Ok(false) => {
                    info!("<{post} ({raw}) skipped>");
                    return;
                }
                Err(error) => {
                    report.record(raw, error);
                    return;
                }
            },
            LocalDispatch::StoryItem { item, target_dir } => match self.filters.accepts(&item) {
                Ok(true) => self.retriever.download_storyitem(&item, &target_dir).await,
                Ok(false) => {
                    info!("<{item} ({raw}) skipped>");
                    return;
                }
                Err(error) => {
                    report.record(raw, error);
                    return;
                }
            },
            LocalDispatch::Rejected(reason) => {
                report.record(raw, TargetFault::Rejected(reason));
                return;
            }
        };

        match result {
            Ok(downloaded) => report.tally.record(downloaded),
            Err(error) => report.record(raw, error),
        }
    }

    /// Downloads every collected account with the anonymous fallback.
    async fn download_accounts(&self, accounts: &AccountSet, report: &mut BatchReport) {
        if accounts.len() > 1 {
            let names: Vec<&str> = accounts.iter().collect();
            info!("Downloading {} profiles: {}", accounts.len(), names.join(" "));
        }
        for account in accounts.iter() {
            if self.is_interrupted() {
                warn!("Interrupted by user.");
                report.mark_interrupted();
                return;
            }
            report.accounts_attempted += 1;
            let result = self.download_account(account).await;
            absorb(account, result, report);
        }
    }

    async fn download_account(&self, account: &str) -> Result<DownloadTally, RetrieveError> {
        let options = self.options.profile;
        match self
            .retriever
            .download_profile(account, self.filters, options)
            .await
        {
            Err(error) if error.is_not_found() && self.retriever.is_logged_in() => {
                warn!("{error}, trying again anonymously, helps in case you are just blocked.");
                let anonymous = self.retriever.anonymous_copy();
                let options = ProfileOptions {
                    stories: false,
                    ..options
                };
                anonymous
                    .download_profile(account, self.filters, options)
                    .await
            }
            other => other,
        }
    }
}

fn absorb(target: &str, result: Result<DownloadTally, RetrieveError>, report: &mut BatchReport) {
    match result {
        Ok(tally) => report.tally.absorb(tally),
        Err(error) => report.record(target, error),
    }
}
