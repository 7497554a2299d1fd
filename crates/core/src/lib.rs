//! ciselect core data models.
//!
//! This crate defines the read-only inputs of a target task selection run:
//! the task graph, the per-push parameters and the deployment-wide graph
//! configuration.

#![warn(missing_docs)]

// Task attributes
mod attribute;

// Graph and tasks
mod task;
mod phase;

// Push inputs
mod parameters;
mod config;

// Re-exports
pub use attribute::{AttributeError, AttributeValue, Attributes};
pub use task::{GraphError, Task, TaskGraph};
pub use phase::ShippingPhase;
pub use parameters::{ParameterError, Parameters};
pub use config::{ConfigError, GraphConfig};

/// JSON object type used for parameter layers and raw task payloads.
pub type JsonMap = serde_json::Map<String, serde_json::Value>;
