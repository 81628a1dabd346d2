//! JSON retrieval service adapter built on reqwest.
//!
//! Every call is a small JSON request against `endpoint`. The session
//! credential, when present, travels in the `X-Session` header. Server errors
//! and connection faults are retried up to `max_connection_attempts`; there is
//! no backoff between attempts. A raised interrupt flag ends the retries of the
//! current request, which is how an unbounded retry loop is skipped.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::{
    AuthError, Authenticator, BulkOptions, Credential, DownloadTally, ProfileOptions,
    RetrieveError, Retriever, Transport, default_user_agent,
};
use crate::filter::{Filters, Predicate};
use crate::item::{Attributes, Post, Profile, StoryItem};

/// Default bound on attempts per request.
pub const DEFAULT_MAX_CONNECTION_ATTEMPTS: u32 = 3;

const CONNECT_TIMEOUT_SECS: u64 = 10;
const READ_TIMEOUT_SECS: u64 = 60;

const SESSION_HEADER: &str = "X-Session";

/// Connection settings shared by every retriever handed out by a transport.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Base URL of the retrieval service
    pub endpoint: Url,
    pub user_agent: String,
    /// Attempts per request; `0` retries without bound
    pub max_connection_attempts: u32,
}

impl HttpConfig {
    /// Settings with the default user agent and attempt bound.
    #[must_use]
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint: normalize_endpoint(endpoint),
            user_agent: default_user_agent(),
            max_connection_attempts: DEFAULT_MAX_CONNECTION_ATTEMPTS,
        }
    }
}

/// `Url::join` replaces the last segment unless the base ends with `/`.
fn normalize_endpoint(mut endpoint: Url) -> Url {
    if !endpoint.path().ends_with('/') {
        let path = format!("{}/", endpoint.path());
        endpoint.set_path(&path);
    }
    endpoint
}

/// Retrieval service client; acts anonymously or with one credential.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    config: Arc<HttpConfig>,
    credential: Option<Credential>,
    interrupted: Arc<AtomicBool>,
}

#[derive(Deserialize)]
struct LoginResponse {
    session: String,
}

#[derive(Deserialize)]
struct WhoamiResponse {
    username: Option<String>,
}

#[derive(Deserialize)]
struct SaveResponse {
    downloaded: bool,
}

#[derive(Serialize)]
struct SaveRequest<'a, T: Serialize> {
    target: &'a str,
    #[serde(flatten)]
    item: T,
}

impl HttpTransport {
    /// Creates an anonymous transport.
    ///
    /// # Errors
    ///
    /// Returns the reqwest error if the HTTP client cannot be built.
    pub fn new(config: HttpConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(READ_TIMEOUT_SECS))
            .user_agent(config.user_agent.clone())
            .gzip(true)
            .build()?;
        Ok(Self {
            client,
            config: Arc::new(config),
            credential: None,
            interrupted: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Shares `interrupted` with this transport and every retriever it hands out.
    #[must_use]
    pub fn with_interrupt(mut self, interrupted: Arc<AtomicBool>) -> Self {
        self.interrupted = interrupted;
        self
    }

    /// The same connection acting with `credential`.
    #[must_use]
    pub fn with_credential(&self, credential: Option<Credential>) -> Self {
        Self {
            client: self.client.clone(),
            config: Arc::clone(&self.config),
            credential,
            interrupted: Arc::clone(&self.interrupted),
        }
    }

    fn url(&self, path: &str) -> Result<Url, RetrieveError> {
        self.config
            .endpoint
            .join(path)
            .map_err(|error| RetrieveError::Decode {
                path: path.to_string(),
                message: error.to_string(),
            })
    }

    /// Sends one request, retrying server errors and connection faults.
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
        credential: Option<&Credential>,
    ) -> Result<Response, RetrieveError> {
        let url = self.url(path)?;
        let max_attempts = self.config.max_connection_attempts;
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let mut request = self.client.request(method.clone(), url.clone());
            if let Some(credential) = credential {
                request = request.header(SESSION_HEADER, credential.expose());
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            let failure = match request.send().await {
                Ok(response) if response.status().is_server_error() => RetrieveError::Service {
                    status: response.status().as_u16(),
                    path: path.to_string(),
                },
                Ok(response) => return Ok(response),
                Err(error) => RetrieveError::Connection {
                    attempts: attempt,
                    message: error.to_string(),
                },
            };

            if self.interrupted.load(Ordering::SeqCst) {
                warn!(path, attempt, error = %failure, "Request interrupted, giving up");
                return Err(RetrieveError::Interrupted {
                    path: path.to_string(),
                    attempts: attempt,
                });
            }
            if max_attempts != 0 && attempt >= max_attempts {
                return Err(match failure {
                    RetrieveError::Connection { message, .. } => RetrieveError::Connection {
                        attempts: attempt,
                        message,
                    },
                    other => other,
                });
            }
            warn!(path, attempt, error = %failure, "Request failed, retrying");
        }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
        what: &str,
    ) -> Result<T, RetrieveError> {
        let response = self
            .send(method, path, body, self.credential.as_ref())
            .await?;
        let response = check_status(response, path, what)?;
        decode(response, path).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, what: &str) -> Result<T, RetrieveError> {
        self.call(Method::GET, path, None, what).await
    }

    async fn save<T: Serialize + Send>(
        &self,
        path: &str,
        target: &str,
        item: T,
    ) -> Result<bool, RetrieveError> {
        let body = serde_json::to_value(SaveRequest { target, item }).map_err(|error| {
            RetrieveError::Decode {
                path: path.to_string(),
                message: error.to_string(),
            }
        })?;
        let saved: SaveResponse = self.call(Method::POST, path, Some(&body), path).await?;
        Ok(saved.downloaded)
    }

    fn require_login(&self, what: &str) -> Result<(), RetrieveError> {
        if self.credential.is_some() {
            Ok(())
        } else {
            Err(RetrieveError::LoginRequired(format!(
                "--login=USERNAME required to download {what}."
            )))
        }
    }

    /// Filters and saves `posts` in order, honouring count and fast-update.
    async fn save_posts(
        &self,
        target: &str,
        posts: Vec<Post>,
        filter: Option<&Predicate>,
        options: BulkOptions,
    ) -> Result<DownloadTally, RetrieveError> {
        let mut tally = DownloadTally::default();
        for post in posts {
            if options
                .max_count
                .is_some_and(|max_count| tally.downloaded >= max_count)
            {
                break;
            }
            if !passes(filter, &post, &post.to_string())? {
                info!("{post} skipped");
                tally.skipped += 1;
                continue;
            }
            let downloaded = self.save("downloads/post", target, &post).await?;
            tally.record(downloaded);
            if options.fast_update && !downloaded {
                debug!(target, "Reached an already present post");
                break;
            }
        }
        Ok(tally)
    }

    async fn save_storyitems(
        &self,
        target: &str,
        items: Vec<StoryItem>,
        filter: Option<&Predicate>,
        options: BulkOptions,
    ) -> Result<DownloadTally, RetrieveError> {
        let mut tally = DownloadTally::default();
        for item in items {
            if options
                .max_count
                .is_some_and(|max_count| tally.downloaded >= max_count)
            {
                break;
            }
            if !passes(filter, &item, &item.to_string())? {
                info!("{item} skipped");
                tally.skipped += 1;
                continue;
            }
            let downloaded = self.save("downloads/storyitem", target, &item).await?;
            tally.record(downloaded);
            if options.fast_update && !downloaded {
                debug!(target, "Reached an already present story item");
                break;
            }
        }
        Ok(tally)
    }
}

fn passes(
    filter: Option<&Predicate>,
    item: &dyn Attributes,
    label: &str,
) -> Result<bool, RetrieveError> {
    let Some(filter) = filter else {
        return Ok(true);
    };
    filter
        .evaluate(item)
        .map_err(|source| RetrieveError::Filter {
            item: label.to_string(),
            source,
        })
}

fn check_status(response: Response, path: &str, what: &str) -> Result<Response, RetrieveError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            RetrieveError::LoginRequired(format!("{what} requires login"))
        }
        StatusCode::NOT_FOUND => RetrieveError::not_found(what),
        StatusCode::TOO_MANY_REQUESTS => RetrieveError::RateLimited,
        _ => RetrieveError::Service {
            status: status.as_u16(),
            path: path.to_string(),
        },
    })
}

async fn decode<T: DeserializeOwned>(response: Response, path: &str) -> Result<T, RetrieveError> {
    response
        .json::<T>()
        .await
        .map_err(|error| RetrieveError::Decode {
            path: path.to_string(),
            message: error.to_string(),
        })
}

fn segment(name: &str) -> String {
    urlencoding::encode(name).into_owned()
}

#[async_trait]
impl Authenticator for HttpTransport {
    #[instrument(skip(self, password))]
    async fn login(&self, username: &str, password: &str) -> Result<Credential, AuthError> {
        let body = json!({ "username": username, "password": password });
        let response = self
            .send(Method::POST, "login", Some(&body), None)
            .await?;
        if matches!(
            response.status(),
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            return Err(AuthError::BadCredentials {
                username: username.to_string(),
            });
        }
        let response = check_status(response, "login", "login")?;
        let login: LoginResponse = decode(response, "login").await?;
        Ok(Credential::new(login.session))
    }

    async fn current_user(&self, credential: &Credential) -> Result<Option<String>, AuthError> {
        let response = self
            .send(Method::GET, "whoami", None, Some(credential))
            .await?;
        if matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            return Ok(None);
        }
        let response = check_status(response, "whoami", "whoami")?;
        let whoami: WhoamiResponse = decode(response, "whoami").await?;
        Ok(whoami.username)
    }
}

#[async_trait]
impl Retriever for HttpTransport {
    fn is_logged_in(&self) -> bool {
        self.credential.is_some()
    }

    async fn followees(&self, account: &str) -> Result<Vec<String>, RetrieveError> {
        let path = format!("profiles/{}/followees", segment(account));
        self.get(&path, &format!("Profile {account}")).await
    }

    async fn download_post(&self, post: &Post, target_dir: &Path) -> Result<bool, RetrieveError> {
        let target = target_dir.to_string_lossy();
        self.save("downloads/post", &target, post).await
    }

    async fn download_storyitem(
        &self,
        item: &StoryItem,
        target_dir: &Path,
    ) -> Result<bool, RetrieveError> {
        let target = target_dir.to_string_lossy();
        self.save("downloads/storyitem", &target, item).await
    }

    #[instrument(skip(self, filter))]
    async fn download_hashtag(
        &self,
        tag: &str,
        filter: Option<&Predicate>,
        options: BulkOptions,
    ) -> Result<DownloadTally, RetrieveError> {
        let path = format!("hashtags/{}/posts", segment(tag));
        let posts: Vec<Post> = self.get(&path, &format!("Hashtag #{tag}")).await?;
        self.save_posts(&format!("#{tag}"), posts, filter, options)
            .await
    }

    #[instrument(skip(self, filter))]
    async fn download_feed(
        &self,
        filter: Option<&Predicate>,
        options: BulkOptions,
    ) -> Result<DownloadTally, RetrieveError> {
        self.require_login("feed")?;
        let posts: Vec<Post> = self.get("feed", "Feed").await?;
        self.save_posts(":feed", posts, filter, options).await
    }

    #[instrument(skip(self, filter))]
    async fn download_stories(
        &self,
        filter: Option<&Predicate>,
        options: BulkOptions,
    ) -> Result<DownloadTally, RetrieveError> {
        self.require_login("stories")?;
        let items: Vec<StoryItem> = self.get("stories", "Stories").await?;
        self.save_storyitems(":stories", items, filter, options)
            .await
    }

    #[instrument(skip(self, filter))]
    async fn download_saved(
        &self,
        filter: Option<&Predicate>,
        options: BulkOptions,
    ) -> Result<DownloadTally, RetrieveError> {
        self.require_login("saved posts")?;
        let posts: Vec<Post> = self.get("saved", "Saved posts").await?;
        self.save_posts(":saved", posts, filter, options).await
    }

    #[instrument(skip(self, filters))]
    async fn download_profile(
        &self,
        account: &str,
        filters: &Filters,
        options: ProfileOptions,
    ) -> Result<DownloadTally, RetrieveError> {
        let what = format!("Profile {account}");
        let base = format!("profiles/{}", segment(account));
        let profile: Profile = self.get(&base, &what).await?;

        let mut tally = DownloadTally::default();
        if options.profile_pic {
            let downloaded = self
                .save("downloads/profile-pic", account, &profile)
                .await?;
            tally.record(downloaded);
        }

        let per_item = BulkOptions {
            max_count: None,
            fast_update: options.fast_update,
        };
        if options.posts {
            info!("Retrieving posts from profile {account}.");
            let posts: Vec<Post> = self.get(&format!("{base}/posts"), &what).await?;
            tally.absorb(
                self.save_posts(account, posts, filters.post.as_ref(), per_item)
                    .await?,
            );
        }
        if options.stories {
            self.require_login("stories")?;
            info!("Retrieving stories from profile {account}.");
            let items: Vec<StoryItem> = self.get(&format!("{base}/stories"), &what).await?;
            tally.absorb(
                self.save_storyitems(account, items, filters.storyitem.as_ref(), per_item)
                    .await?,
            );
        }
        Ok(tally)
    }

    fn anonymous_copy(&self) -> Box<dyn Retriever> {
        Box::new(self.with_credential(None))
    }
}

impl Transport for HttpTransport {
    fn retriever(&self, credential: Option<Credential>) -> Box<dyn Retriever> {
        Box::new(self.with_credential(credential))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_gets_trailing_slash() {
        let config = HttpConfig::new(Url::parse("http://localhost:8080/api").unwrap());
        assert_eq!(config.endpoint.as_str(), "http://localhost:8080/api/");
        assert_eq!(
            config.endpoint.join("profiles/alice").unwrap().as_str(),
            "http://localhost:8080/api/profiles/alice"
        );
    }

    #[test]
    fn test_segment_escapes_path_characters() {
        assert_eq!(segment("a/b c"), "a%2Fb%20c");
        assert_eq!(segment("alice"), "alice");
    }

    #[test]
    fn test_with_credential_shares_config() {
        let transport =
            HttpTransport::new(HttpConfig::new(Url::parse("http://localhost:1/").unwrap()))
                .unwrap();
        assert!(!transport.is_logged_in());
        let logged_in = transport.with_credential(Some(Credential::new("token")));
        assert!(logged_in.is_logged_in());
        assert!(Arc::ptr_eq(&transport.config, &logged_in.config));
        assert!(!logged_in.anonymous_copy().is_logged_in());
    }

    #[test]
    fn test_interrupt_flag_is_shared_with_retrievers() {
        let interrupted = Arc::new(AtomicBool::new(false));
        let transport =
            HttpTransport::new(HttpConfig::new(Url::parse("http://localhost:1/").unwrap()))
                .unwrap()
                .with_interrupt(Arc::clone(&interrupted));
        let logged_in = transport.with_credential(Some(Credential::new("token")));
        assert!(Arc::ptr_eq(&logged_in.interrupted, &interrupted));
    }
}
