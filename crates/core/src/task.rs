//! Task model - the unit of CI work and the graph that holds every candidate.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::attribute::{AttributeError, AttributeValue, Attributes};

/// A task represents one unit of CI work the repository knows how to produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique label
    #[serde(default)]
    pub label: String,

    /// Coarse classifier (`test`, `build`, `toolchain`, ...)
    pub kind: String,

    /// Declarative attributes
    #[serde(default)]
    pub attributes: Attributes,

    /// Payload submitted to the execution service
    #[serde(default)]
    pub task: serde_json::Value,

    /// Dependency edge name -> label
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
}

impl Task {
    /// Create a new task with no attributes.
    pub fn new(label: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            kind: kind.into(),
            attributes: Attributes::new(),
            task: serde_json::Value::Null,
            dependencies: BTreeMap::new(),
        }
    }

    /// Set an attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes = self.attributes.with(key, value);
        self
    }

    /// Set the raw payload.
    pub fn with_payload(mut self, task: serde_json::Value) -> Self {
        self.task = task;
        self
    }

    /// Add a dependency edge.
    pub fn with_dependency(mut self, edge: impl Into<String>, label: impl Into<String>) -> Self {
        self.dependencies.insert(edge.into(), label.into());
        self
    }

    /// String attribute of this task.
    pub fn attr_str(&self, key: &str) -> Result<Option<&str>, AttributeError> {
        self.attributes.get_str(&self.label, key)
    }

    /// String attribute, empty string when absent.
    pub fn attr_str_or_empty(&self, key: &str) -> Result<&str, AttributeError> {
        Ok(self.attr_str(key)?.unwrap_or(""))
    }

    /// Boolean attribute of this task.
    pub fn attr_bool(&self, key: &str) -> Result<Option<bool>, AttributeError> {
        self.attributes.get_bool(&self.label, key)
    }

    /// Integer attribute of this task.
    pub fn attr_int(&self, key: &str) -> Result<Option<i64>, AttributeError> {
        self.attributes.get_int(&self.label, key)
    }

    /// List-of-strings attribute of this task.
    pub fn attr_str_list(&self, key: &str) -> Result<Option<Vec<&str>>, AttributeError> {
        self.attributes.get_str_list(&self.label, key)
    }

    /// Notification and index routes currently on the payload.
    pub fn routes(&self) -> Vec<&str> {
        self.task
            .get("routes")
            .and_then(|r| r.as_array())
            .map(|routes| routes.iter().filter_map(|r| r.as_str()).collect())
            .unwrap_or_default()
    }

    /// Treeherder tier from the payload; tier 1 when unspecified.
    pub fn treeherder_tier(&self) -> i64 {
        self.task
            .pointer("/extra/treeherder/tier")
            .and_then(|t| t.as_i64())
            .unwrap_or(1)
    }
}

/// Errors raised while building a task graph.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// Malformed JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Two tasks share a label
    #[error("duplicate task label: {0}")]
    DuplicateLabel(String),

    /// Map key and embedded label disagree
    #[error("task keyed as '{key}' carries label '{label}'")]
    LabelMismatch {
        /// Map key
        key: String,
        /// Embedded label
        label: String,
    },
}

/// The full task graph handed to selectors.
///
/// Iteration follows insertion order, so selector output is stable for a
/// given input document.
#[derive(Debug, Clone, Default)]
pub struct TaskGraph {
    tasks: Vec<Task>,
    index: HashMap<String, usize>,
}

impl TaskGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from tasks, rejecting duplicate labels.
    pub fn from_tasks(tasks: impl IntoIterator<Item = Task>) -> Result<Self, GraphError> {
        let mut graph = Self::new();
        for task in tasks {
            graph.insert(task)?;
        }
        Ok(graph)
    }

    /// Parse a `label -> task` JSON document (the full-task-graph dump).
    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        let raw: serde_json::Map<String, serde_json::Value> = serde_json::from_str(json)?;
        let mut graph = Self::new();
        for (key, value) in raw {
            let mut task: Task = serde_json::from_value(value)?;
            if task.label.is_empty() {
                task.label = key;
            } else if task.label != key {
                return Err(GraphError::LabelMismatch { key, label: task.label });
            }
            graph.insert(task)?;
        }
        Ok(graph)
    }

    /// Add a task.
    pub fn insert(&mut self, task: Task) -> Result<(), GraphError> {
        if self.index.contains_key(&task.label) {
            return Err(GraphError::DuplicateLabel(task.label));
        }
        self.index.insert(task.label.clone(), self.tasks.len());
        self.tasks.push(task);
        Ok(())
    }

    /// Look up a task by label.
    pub fn get(&self, label: &str) -> Option<&Task> {
        self.index.get(label).map(|&i| &self.tasks[i])
    }

    /// Whether a label exists.
    pub fn contains(&self, label: &str) -> bool {
        self.index.contains_key(label)
    }

    /// Tasks in graph order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    /// Labels in graph order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.tasks.iter().map(|t| t.label.as_str())
    }

    /// Node set of the graph.
    pub fn nodes(&self) -> BTreeSet<&str> {
        self.labels().collect()
    }

    /// Number of tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the graph is empty.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Labels of tasks accepted by a fallible predicate, in graph order.
    pub fn select_labels<E, F>(&self, mut accept: F) -> Result<Vec<String>, E>
    where
        F: FnMut(&Task) -> Result<bool, E>,
    {
        let mut labels = Vec::new();
        for task in &self.tasks {
            if accept(task)? {
                labels.push(task.label.clone());
            }
        }
        Ok(labels)
    }
}
