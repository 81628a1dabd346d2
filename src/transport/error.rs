//! Error types for retrieval service calls.

use thiserror::Error;

use crate::filter::EvalError;

/// Errors raised while fetching or saving items.
#[derive(Debug, Error)]
pub enum RetrieveError {
    /// Account, hashtag or item does not exist or is hidden from this session
    #[error("{what} not found")]
    NotFound { what: String },

    /// The call needs a logged-in session
    #[error("login required: {0}")]
    LoginRequired(String),

    /// The service asked us to slow down
    #[error("rate limited by the retrieval service")]
    RateLimited,

    /// All connection attempts failed
    #[error("connection failed after {attempts} attempt(s): {message}")]
    Connection { attempts: u32, message: String },

    /// Unexpected response status
    #[error("retrieval service returned HTTP {status} for {path}")]
    Service { status: u16, path: String },

    /// Retrying was abandoned on user interrupt
    #[error("request for {path} interrupted after {attempts} attempt(s)")]
    Interrupted { path: String, attempts: u32 },

    /// Response body could not be decoded
    #[error("unexpected response for {path}: {message}")]
    Decode { path: String, message: String },

    /// A filter could not be evaluated for an item of the bulk download
    #[error("filter failed on {item}: {source}")]
    Filter {
        item: String,
        #[source]
        source: EvalError,
    },
}

impl RetrieveError {
    #[must_use]
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Whether this is the "not found" fault that triggers the anonymous retry.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Errors raised by login and session validation.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Username/password rejected
    #[error("Login error: wrong password or unknown user {username}")]
    BadCredentials { username: String },

    /// Connection or protocol fault
    #[error("Login error: {0}")]
    Transport(#[from] RetrieveError),
}
