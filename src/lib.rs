//! Instaloader Core Library
//!
//! Batch retrieval of posts, stories and profiles from a list of targets,
//! with user-supplied filter expressions and persisted login sessions.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`filter`] - Restricted expression language for `--post-filter` / `--storyitem-filter`
//! - [`item`] - Post, story item and profile descriptors, saved descriptor loading
//! - [`target`] - Classification of raw targets, account collection
//! - [`session`] - Session load/validate/prompt/persist
//! - [`transport`] - Retrieval service seams and the bundled HTTP adapter
//! - [`orchestrator`] - Per-target failure isolation and anonymous fallback
//! - [`batch`] - One complete run

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod batch;
pub mod error;
pub mod filter;
pub mod item;
pub mod orchestrator;
pub mod session;
pub mod target;
pub mod transport;

// Re-export commonly used types
pub use batch::{BatchConfig, BatchContext, run_batch};
pub use error::FatalError;
pub use filter::{Filters, Predicate, compile};
pub use item::{ItemDescriptor, ItemKind, JsonDescriptorLoader};
pub use orchestrator::{BatchReport, ErrorRecord, Orchestrator, RunOptions};
pub use session::{Session, SessionManager, TerminalPrompter};
pub use target::{AccountSet, Target, classify};
pub use transport::{HttpConfig, HttpTransport, Retriever, Transport};
