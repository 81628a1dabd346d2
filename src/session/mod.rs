//! Login session lifecycle: load, validate, prompt, persist.
//!
//! A run with `--login` starts by loading the saved session for that account
//! and asking the service who it belongs to. A missing, stale or foreign
//! session leads to a fresh login with the given password or, failing that, an
//! interactive prompt. The session is written back once at the end of the run.

mod prompt;
mod storage;

pub use prompt::{Prompter, TerminalPrompter};
pub use storage::{
    StorageError, StoredSession, default_session_path, load_session_file, save_session_file,
};

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::transport::{AuthError, Authenticator, Credential};

/// Errors that end the run during login.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A login is needed but prompting is disabled and no password was given
    #[error("Quiet mode requires given password or valid session file.")]
    CredentialsRequired { account: String },

    /// The interactive prompt was closed without a successful login
    #[error("No password entered for {account}; login aborted.")]
    PromptAborted { account: String },

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Authentication state of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    username: Option<String>,
    credential: Option<Credential>,
}

impl Session {
    /// A session without identity.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn logged_in(username: impl Into<String>, credential: Credential) -> Self {
        Self {
            username: Some(username.into()),
            credential: Some(credential),
        }
    }

    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.credential.is_some()
    }

    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    #[must_use]
    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }
}

/// Drives login against an [`Authenticator`].
pub struct SessionManager<'a> {
    authenticator: &'a dyn Authenticator,
    prompter: Option<&'a dyn Prompter>,
}

impl<'a> SessionManager<'a> {
    /// `prompter` is `None` in quiet mode.
    #[must_use]
    pub fn new(authenticator: &'a dyn Authenticator, prompter: Option<&'a dyn Prompter>) -> Self {
        Self {
            authenticator,
            prompter,
        }
    }

    /// Loads or establishes a logged-in session for `account`.
    ///
    /// # Errors
    ///
    /// - [`SessionError::CredentialsRequired`] in quiet mode without usable credentials
    /// - [`SessionError::PromptAborted`] if interactive prompting is abandoned
    /// - [`SessionError::Auth`] if the given password is rejected or the service fails
    /// - [`SessionError::Storage`] if the default session path cannot be determined
    #[tracing::instrument(skip(self, password))]
    pub async fn load_or_prompt(
        &self,
        account: &str,
        password: Option<&str>,
        session_path: Option<&Path>,
    ) -> Result<Session, SessionError> {
        let account = account.to_lowercase();
        let path = resolve_path(&account, session_path)?;

        if let Some(stored) = self.load_stored(&path, session_path.is_some())
            && self.is_valid_for(&stored.credential, &account).await
        {
            info!("Loaded session from {}.", path.display());
            return Ok(Session::logged_in(account, stored.credential));
        }

        let credential = match password {
            Some(password) => self.authenticator.login(&account, password).await?,
            None => self.interactive_login(&account).await?,
        };
        info!("Logged in as {account}.");
        Ok(Session::logged_in(account, credential))
    }

    fn load_stored(&self, path: &Path, explicit: bool) -> Option<StoredSession> {
        match load_session_file(path) {
            Ok(Some(stored)) => Some(stored),
            Ok(None) => {
                if explicit {
                    warn!("Session file {} does not exist.", path.display());
                }
                info!("Session file does not exist yet - Logging in.");
                None
            }
            Err(error) => {
                warn!(path = %path.display(), %error, "Ignoring unreadable session file");
                None
            }
        }
    }

    async fn is_valid_for(&self, credential: &Credential, account: &str) -> bool {
        match self.authenticator.current_user(credential).await {
            Ok(Some(user)) => user.eq_ignore_ascii_case(account),
            Ok(None) => false,
            Err(error) => {
                warn!(%error, "Could not validate saved session");
                false
            }
        }
    }

    async fn interactive_login(&self, account: &str) -> Result<Credential, SessionError> {
        let Some(prompter) = self.prompter else {
            return Err(SessionError::CredentialsRequired {
                account: account.to_string(),
            });
        };
        loop {
            let Some(password) = prompter.password(account).await else {
                return Err(SessionError::PromptAborted {
                    account: account.to_string(),
                });
            };
            match self.authenticator.login(account, &password).await {
                Ok(credential) => return Ok(credential),
                Err(error @ AuthError::BadCredentials { .. }) => {
                    warn!("{error}");
                }
                Err(error) => return Err(error.into()),
            }
        }
    }

    /// Writes `session` to disk if it is logged in.
    ///
    /// Returns whether a file was written.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Storage`] if the file cannot be written.
    pub fn persist(
        &self,
        session: &Session,
        session_path: Option<&Path>,
    ) -> Result<bool, SessionError> {
        let (Some(username), Some(credential)) = (session.username(), session.credential()) else {
            return Ok(false);
        };
        let path = resolve_path(username, session_path)?;
        save_session_file(
            &path,
            &StoredSession {
                username: username.to_string(),
                credential: credential.clone(),
            },
        )?;
        info!("Saved session to {}.", path.display());
        Ok(true)
    }
}

fn resolve_path(account: &str, session_path: Option<&Path>) -> Result<PathBuf, StorageError> {
    match session_path {
        Some(path) => Ok(path.to_path_buf()),
        None => default_session_path(account),
    }
}
