//! External collaborators used during selection.
//!
//! Selection is CPU-only except for a handful of lookups: the task index
//! (nightly anti-replay), the pushlog, commit messages and action triggers
//! (backfill). Each is an async trait so selectors can be driven against
//! live services or the in-memory fakes in [`memory`].

#![warn(missing_docs)]

pub mod error;
pub mod retry;
pub mod traits;
pub mod http;
pub mod git;
pub mod action;
pub mod memory;

pub use error::{CollabError, Result};
pub use retry::RetryPolicy;
pub use traits::{index_exists, ActionTrigger, Indexer, Push, Pushlog, Vcs};
pub use http::{HttpIndexer, HttpPushlog};
pub use git::GitVcs;
pub use action::LoggingActionTrigger;
