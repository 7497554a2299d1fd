//! Read-only view over the per-push parameter set.

use serde_json::Value;
use std::sync::Arc;

use crate::JsonMap;

/// Errors raised by parameter access.
#[derive(Debug, thiserror::Error)]
pub enum ParameterError {
    /// Key (or dotted path) is absent from every layer
    #[error("missing parameter: {0}")]
    Missing(String),

    /// Key is present with an unexpected type
    #[error("parameter '{key}' should be {expected}")]
    WrongType {
        /// Key or dotted path
        key: String,
        /// Expected JSON type
        expected: &'static str,
    },

    /// Top-level document is not a JSON object
    #[error("parameters must be a JSON object")]
    NotAnObject,

    /// Malformed JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

type Result<T> = std::result::Result<T, ParameterError>;

/// Immutable, layered parameter view.
///
/// Overrides never touch the original map; `with_overrides` returns a new
/// view whose top layer shadows the keys it names.
#[derive(Debug, Clone, Default)]
pub struct Parameters {
    layers: Vec<Arc<JsonMap>>,
}

impl Parameters {
    /// Create a view over one map.
    pub fn new(values: JsonMap) -> Self {
        Self { layers: vec![Arc::new(values)] }
    }

    /// Create a view from a JSON value, which must be an object.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self::new(map)),
            _ => Err(ParameterError::NotAnObject),
        }
    }

    /// Parse a parameters document.
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_value(serde_json::from_str(json)?)
    }

    /// Layer `overrides` atop this view.
    pub fn with_overrides(&self, overrides: JsonMap) -> Self {
        let mut layers = self.layers.clone();
        layers.push(Arc::new(overrides));
        Self { layers }
    }

    /// Whether the key exists in any layer (null counts as present).
    pub fn contains(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }

    /// Value for a key; `Missing` when absent, `Ok(Null)` when present but null.
    pub fn get(&self, key: &str) -> Result<&Value> {
        self.lookup(key).ok_or_else(|| ParameterError::Missing(key.to_string()))
    }

    /// Value for a key, treating null as absent.
    pub fn get_opt(&self, key: &str) -> Option<&Value> {
        self.lookup(key).filter(|v| !v.is_null())
    }

    /// Dotted-path access, e.g. `try_task_config.env`.
    pub fn get_path(&self, path: &str) -> Result<&Value> {
        self.get_path_opt(path)
            .ok_or_else(|| ParameterError::Missing(path.to_string()))
    }

    /// Dotted-path access, `None` when any segment is absent or null.
    pub fn get_path_opt(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let mut current = self.get_opt(parts.next()?)?;
        for part in parts {
            current = current.get(part).filter(|v| !v.is_null())?;
        }
        Some(current)
    }

    /// Required string parameter.
    pub fn str(&self, key: &str) -> Result<&str> {
        match self.get(key)? {
            Value::String(s) => Ok(s),
            _ => Err(wrong_type(key, "a string")),
        }
    }

    /// String parameter with a default for absent or null keys.
    pub fn str_or<'a>(&'a self, key: &str, default: &'a str) -> Result<&'a str> {
        match self.get_opt(key) {
            None => Ok(default),
            Some(Value::String(s)) => Ok(s),
            Some(_) => Err(wrong_type(key, "a string")),
        }
    }

    /// Boolean parameter with a default for absent or null keys.
    pub fn bool_or(&self, key: &str, default: bool) -> Result<bool> {
        match self.get_opt(key) {
            None => Ok(default),
            Some(Value::Bool(b)) => Ok(*b),
            Some(_) => Err(wrong_type(key, "a bool")),
        }
    }

    /// List-of-strings parameter; absent or null yields an empty list.
    pub fn str_list(&self, key: &str) -> Result<Vec<&str>> {
        match self.get_opt(key) {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|v| v.as_str().ok_or_else(|| wrong_type(key, "a list of strings")))
                .collect(),
            Some(_) => Err(wrong_type(key, "a list of strings")),
        }
    }

    /// Object parameter; absent or null yields `None`.
    pub fn object(&self, key: &str) -> Result<Option<&JsonMap>> {
        match self.get_opt(key) {
            None => Ok(None),
            Some(Value::Object(map)) => Ok(Some(map)),
            Some(_) => Err(wrong_type(key, "an object")),
        }
    }

    /// The branch/repository this push landed on.
    pub fn project(&self) -> Result<&str> {
        self.str("project")
    }

    /// Release type, empty when unset.
    pub fn release_type(&self) -> Result<&str> {
        self.str_or("release_type", "")
    }

    /// Kinds the driver restricts results to; empty means no restriction.
    pub fn target_kinds(&self) -> Result<Vec<&str>> {
        self.str_list("target-kinds")
    }

    /// Entries of `try_task_config.tasks`, in order.
    pub fn try_config_tasks(&self) -> Result<impl Iterator<Item = &str>> {
        let tasks = match self.get_path_opt("try_task_config.tasks") {
            None => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|v| v.as_str().ok_or_else(|| wrong_type("try_task_config.tasks", "a list of strings")))
                .collect::<Result<Vec<_>>>()?,
            Some(_) => return Err(wrong_type("try_task_config.tasks", "a list of strings")),
        };
        Ok(tasks.into_iter())
    }

    /// Flattened view of every layer, top layer winning.
    pub fn to_map(&self) -> JsonMap {
        let mut merged = JsonMap::new();
        for layer in &self.layers {
            for (k, v) in layer.iter() {
                merged.insert(k.clone(), v.clone());
            }
        }
        merged
    }

    fn lookup(&self, key: &str) -> Option<&Value> {
        self.layers.iter().rev().find_map(|layer| layer.get(key))
    }
}

fn wrong_type(key: &str, expected: &'static str) -> ParameterError {
    ParameterError::WrongType { key: key.to_string(), expected }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params() -> Parameters {
        Parameters::from_value(json!({
            "project": "autoland",
            "backstop": false,
            "owner": null,
            "try_task_config": {
                "tasks": ["test-mochitest-*", "build-linux64/opt"],
                "env": {"MOZHARNESS_TEST_PATHS": "dom/base"}
            }
        })).unwrap()
    }

    #[test]
    fn test_missing_is_distinct_from_null() {
        let p = params();
        assert!(matches!(p.get("nope"), Err(ParameterError::Missing(k)) if k == "nope"));
        assert_eq!(p.get("owner").unwrap(), &Value::Null);
        assert!(p.get_opt("owner").is_none());
        assert!(p.contains("owner"));
    }

    #[test]
    fn test_dotted_path() {
        let p = params();
        assert_eq!(
            p.get_path("try_task_config.env.MOZHARNESS_TEST_PATHS").unwrap(),
            &json!("dom/base")
        );
        assert!(p.get_path("try_task_config.nope").is_err());
    }

    #[test]
    fn test_try_config_tasks() {
        let p = params();
        let tasks: Vec<_> = p.try_config_tasks().unwrap().collect();
        assert_eq!(tasks, vec!["test-mochitest-*", "build-linux64/opt"]);

        let empty = Parameters::default();
        assert_eq!(empty.try_config_tasks().unwrap().count(), 0);
    }

    #[test]
    fn test_defaults_and_types() {
        let p = params();
        assert_eq!(p.str_or("hg_branch", "default").unwrap(), "default");
        assert!(!p.bool_or("backstop", true).unwrap());
        assert!(matches!(p.str("backstop"), Err(ParameterError::WrongType { .. })));
        assert!(p.str_list("target-kinds").unwrap().is_empty());
    }

    #[test]
    fn test_overrides_do_not_mutate_original() {
        let p = params();
        let mut over = JsonMap::new();
        over.insert("project".into(), json!("mozilla-beta"));
        let simulated = p.with_overrides(over);

        assert_eq!(simulated.project().unwrap(), "mozilla-beta");
        assert_eq!(p.project().unwrap(), "autoland");
        assert!(!simulated.bool_or("backstop", true).unwrap());
        assert_eq!(simulated.to_map()["project"], json!("mozilla-beta"));
    }
}
