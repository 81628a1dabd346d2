//! In-memory stand-ins for the retrieval service.

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDateTime;
use instaloader_core::filter::{Filters, Predicate};
use instaloader_core::item::{Post, StoryItem};
use instaloader_core::session::Prompter;
use instaloader_core::transport::{
    AuthError, Authenticator, BulkOptions, Credential, DownloadTally, ProfileOptions,
    RetrieveError, Retriever, Transport,
};

pub fn stamp(text: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S").unwrap()
}

/// Scripted result of an account or bulk download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Downloaded(usize),
    NotFound,
    RateLimited,
}

impl Outcome {
    fn into_result(self, what: &str) -> Result<DownloadTally, RetrieveError> {
        match self {
            Self::Downloaded(downloaded) => Ok(DownloadTally {
                downloaded,
                ..DownloadTally::default()
            }),
            Self::NotFound => Err(RetrieveError::not_found(what)),
            Self::RateLimited => Err(RetrieveError::RateLimited),
        }
    }
}

/// Shared call journal.
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.entries()
            .iter()
            .filter(|entry| entry.starts_with(prefix))
            .count()
    }
}

/// Retriever whose answers are scripted per account, tag and mode.
#[derive(Debug, Clone, Default)]
pub struct FakeRetriever {
    pub logged_in: bool,
    pub journal: Journal,
    /// Followee lists; unknown accounts are not found
    pub followees: HashMap<String, Vec<String>>,
    /// Outcomes of logged-in (or anonymous-only) profile downloads; default 1 item
    pub profiles: HashMap<String, Outcome>,
    /// Outcomes on the anonymous copy; default 1 item
    pub anonymous_profiles: HashMap<String, Outcome>,
    /// Outcomes of hashtag downloads; default 1 item
    pub tags: HashMap<String, Outcome>,
    /// Raises the flag once this account has been downloaded
    pub interrupt_after: Option<(String, Arc<AtomicBool>)>,
    anonymous: bool,
}

impl FakeRetriever {
    pub fn logged_in() -> Self {
        Self {
            logged_in: true,
            ..Self::default()
        }
    }

    fn prefix(&self) -> &'static str {
        if self.anonymous { "anon-" } else { "" }
    }
}

#[async_trait]
impl Retriever for FakeRetriever {
    fn is_logged_in(&self) -> bool {
        self.logged_in
    }

    async fn followees(&self, account: &str) -> Result<Vec<String>, RetrieveError> {
        self.journal.push(format!("followees:{account}"));
        self.followees
            .get(account)
            .cloned()
            .ok_or_else(|| RetrieveError::not_found(format!("Profile {account}")))
    }

    async fn download_post(&self, post: &Post, target_dir: &Path) -> Result<bool, RetrieveError> {
        self.journal
            .push(format!("post:{}:{}", post.shortcode, target_dir.display()));
        Ok(true)
    }

    async fn download_storyitem(
        &self,
        item: &StoryItem,
        target_dir: &Path,
    ) -> Result<bool, RetrieveError> {
        self.journal
            .push(format!("storyitem:{}:{}", item.mediaid, target_dir.display()));
        Ok(true)
    }

    async fn download_hashtag(
        &self,
        tag: &str,
        filter: Option<&Predicate>,
        options: BulkOptions,
    ) -> Result<DownloadTally, RetrieveError> {
        self.journal.push(format!(
            "hashtag:{tag}:filter={}:count={:?}",
            filter.map_or("none", Predicate::source),
            options.max_count
        ));
        self.tags
            .get(tag)
            .copied()
            .unwrap_or(Outcome::Downloaded(1))
            .into_result(&format!("Hashtag #{tag}"))
    }

    async fn download_feed(
        &self,
        _filter: Option<&Predicate>,
        _options: BulkOptions,
    ) -> Result<DownloadTally, RetrieveError> {
        self.journal.push("feed");
        if !self.logged_in {
            return Err(RetrieveError::LoginRequired("feed".to_string()));
        }
        Ok(DownloadTally::default())
    }

    async fn download_stories(
        &self,
        filter: Option<&Predicate>,
        _options: BulkOptions,
    ) -> Result<DownloadTally, RetrieveError> {
        self.journal.push(format!(
            "stories:filter={}",
            filter.map_or("none", Predicate::source)
        ));
        Ok(DownloadTally::default())
    }

    async fn download_saved(
        &self,
        _filter: Option<&Predicate>,
        _options: BulkOptions,
    ) -> Result<DownloadTally, RetrieveError> {
        self.journal.push("saved");
        Ok(DownloadTally::default())
    }

    async fn download_profile(
        &self,
        account: &str,
        _filters: &Filters,
        options: ProfileOptions,
    ) -> Result<DownloadTally, RetrieveError> {
        let stories = if options.stories { ":stories" } else { "" };
        self.journal
            .push(format!("{}profile:{account}{stories}", self.prefix()));
        if let Some((name, flag)) = &self.interrupt_after
            && name == account
        {
            flag.store(true, Ordering::SeqCst);
        }
        let outcomes = if self.anonymous {
            &self.anonymous_profiles
        } else {
            &self.profiles
        };
        outcomes
            .get(account)
            .copied()
            .unwrap_or(Outcome::Downloaded(1))
            .into_result(&format!("Profile {account}"))
    }

    fn anonymous_copy(&self) -> Box<dyn Retriever> {
        self.journal.push("anonymous-copy");
        Box::new(Self {
            logged_in: false,
            anonymous: true,
            ..self.clone()
        })
    }
}

/// Authenticator with a fixed user table and token scheme `token-<user>`.
#[derive(Debug, Clone, Default)]
pub struct FakeTransport {
    /// username -> password
    pub users: HashMap<String, String>,
    /// Tokens the service no longer accepts
    pub revoked: Vec<String>,
    pub journal: Journal,
    pub retriever: FakeRetriever,
}

impl FakeTransport {
    pub fn with_user(username: &str, password: &str) -> Self {
        let mut transport = Self::default();
        transport
            .users
            .insert(username.to_string(), password.to_string());
        transport
    }
}

#[async_trait]
impl Authenticator for FakeTransport {
    async fn login(&self, username: &str, password: &str) -> Result<Credential, AuthError> {
        self.journal.push(format!("login:{username}"));
        match self.users.get(username) {
            Some(expected) if expected == password => {
                Ok(Credential::new(format!("token-{username}")))
            }
            _ => Err(AuthError::BadCredentials {
                username: username.to_string(),
            }),
        }
    }

    async fn current_user(&self, credential: &Credential) -> Result<Option<String>, AuthError> {
        self.journal.push("whoami");
        let token = credential.expose();
        if self.revoked.iter().any(|revoked| revoked == token) {
            return Ok(None);
        }
        Ok(token.strip_prefix("token-").map(str::to_string))
    }
}

impl Transport for FakeTransport {
    fn retriever(&self, credential: Option<Credential>) -> Box<dyn Retriever> {
        Box::new(FakeRetriever {
            logged_in: credential.is_some(),
            ..self.retriever.clone()
        })
    }
}

/// Prompter answering from a fixed list, then giving up.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: Mutex<VecDeque<String>>,
    pub asked: Journal,
}

impl ScriptedPrompter {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: Mutex::new(answers.iter().map(ToString::to_string).collect()),
            asked: Journal::default(),
        }
    }
}

#[async_trait]
impl Prompter for ScriptedPrompter {
    async fn password(&self, username: &str) -> Option<String> {
        self.asked.push(username);
        self.answers.lock().unwrap().pop_front()
    }
}
