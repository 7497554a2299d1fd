//! Legacy try syntax.
//!
//! Developers request tasks on try with a commit-message line such as
//! `try: -b do -p linux64 -u mochitests -t none --tag devtools`. Parsing
//! happens in two steps: [`parse_message`] turns the line into raw
//! [`TryArgs`] without looking at the graph, then [`TryOptions::resolve`]
//! expands aliases and validates against the full task graph.

#![warn(missing_docs)]

pub mod error;
mod tokenize;
mod args;
mod aliases;
mod options;

pub use error::{Result, TrySyntaxError};
pub use tokenize::split_try_msg;
pub use args::{parse_message, Notifications, TryArgs};
pub use options::{TestRequest, TryOptions};
