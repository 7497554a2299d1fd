//! Target task selectors.
//!
//! A selector picks the tasks to schedule for one push out of the full task
//! graph. Selectors are registered by name in a [`SelectorRegistry`]; the
//! [`driver`] runs one by name and checks its output.

#![warn(missing_docs)]

pub mod error;
pub mod context;
pub mod registry;
pub mod guard;
pub mod driver;
mod common;

// Selector families
pub mod integration;
pub mod release;
pub mod phase;
pub mod try_tasks;
pub mod nightly;
pub mod cron;
pub mod perf;
pub mod staging;
pub mod backfill;

pub use error::{Result, SelectError};
pub use context::{Environment, SelectionContext};
pub use registry::{global, register_selectors, FnSelector, RegistryError, SelectFn, SelectorRegistry, TargetTaskSelector};
pub use guard::GuardedSelector;
pub use driver::{select, SelectionReport};
pub use try_tasks::TaskAnnotations;
