//! Task attributes - heterogeneous values stamped on tasks at generation time.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// JSON null
    Null,
    /// Boolean flag
    Bool(bool),
    /// Integer (chunk numbers, tiers, duplicate counts)
    Int(i64),
    /// Non-integral number
    Float(f64),
    /// String value
    String(String),
    /// List of values (usually strings)
    List(Vec<AttributeValue>),
    /// Nested mapping
    Map(BTreeMap<String, AttributeValue>),
}

impl AttributeValue {
    /// Name of the variant, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }

    /// Truthiness: null, false, zero and empty containers are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
            Self::String(s) => !s.is_empty(),
            Self::List(l) => !l.is_empty(),
            Self::Map(m) => !m.is_empty(),
        }
    }

    /// Borrow as a string, if this is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for AttributeValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl<T: Into<AttributeValue>> From<Vec<T>> for AttributeValue {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

/// An attribute was present with a type the reader did not expect.
///
/// This signals a broken task definition, not a bad push.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("attribute '{key}' on task '{label}' should be {expected}, found {found}")]
pub struct AttributeError {
    /// Task label
    pub label: String,
    /// Attribute key
    pub key: String,
    /// Expected type
    pub expected: &'static str,
    /// Actual type
    pub found: &'static str,
}

/// Attribute mapping of a task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(BTreeMap<String, AttributeValue>);

impl Attributes {
    /// Create an empty attribute set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Raw value lookup.
    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.0.get(key)
    }

    /// Whether the key is present (even if null).
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Iterate over keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Truthiness of an attribute; absent means false.
    pub fn is_truthy(&self, key: &str) -> bool {
        self.0.get(key).is_some_and(AttributeValue::is_truthy)
    }

    /// String attribute. Null is treated as absent.
    pub fn get_str(&self, label: &str, key: &str) -> Result<Option<&str>, AttributeError> {
        match self.0.get(key) {
            None | Some(AttributeValue::Null) => Ok(None),
            Some(AttributeValue::String(s)) => Ok(Some(s)),
            Some(other) => Err(self.type_error(label, key, "string", other)),
        }
    }

    /// Boolean attribute. Null is treated as absent.
    pub fn get_bool(&self, label: &str, key: &str) -> Result<Option<bool>, AttributeError> {
        match self.0.get(key) {
            None | Some(AttributeValue::Null) => Ok(None),
            Some(AttributeValue::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(self.type_error(label, key, "bool", other)),
        }
    }

    /// Integer attribute. Numeric strings (chunk numbers) are accepted.
    pub fn get_int(&self, label: &str, key: &str) -> Result<Option<i64>, AttributeError> {
        match self.0.get(key) {
            None | Some(AttributeValue::Null) => Ok(None),
            Some(AttributeValue::Int(i)) => Ok(Some(*i)),
            Some(v @ AttributeValue::String(s)) => s
                .parse()
                .map(Some)
                .map_err(|_| self.type_error(label, key, "int", v)),
            Some(other) => Err(self.type_error(label, key, "int", other)),
        }
    }

    /// List-of-strings attribute. Null is treated as absent.
    pub fn get_str_list(&self, label: &str, key: &str) -> Result<Option<Vec<&str>>, AttributeError> {
        match self.0.get(key) {
            None | Some(AttributeValue::Null) => Ok(None),
            Some(AttributeValue::List(items)) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .ok_or_else(|| self.type_error(label, key, "list of strings", item))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Some),
            Some(other) => Err(self.type_error(label, key, "list of strings", other)),
        }
    }

    fn type_error(&self, label: &str, key: &str, expected: &'static str, found: &AttributeValue) -> AttributeError {
        AttributeError {
            label: label.to_string(),
            key: key.to_string(),
            expected,
            found: found.type_name(),
        }
    }
}

impl<K: Into<String>, V: Into<AttributeValue>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untagged_deserialize() {
        let attrs: Attributes = serde_json::from_str(
            r#"{"build_platform": "linux64", "shippable": true, "test_chunk": 3,
                "run_on_projects": ["all"], "nightly": null}"#,
        ).unwrap();

        assert_eq!(attrs.get_str("t", "build_platform").unwrap(), Some("linux64"));
        assert_eq!(attrs.get_bool("t", "shippable").unwrap(), Some(true));
        assert_eq!(attrs.get_int("t", "test_chunk").unwrap(), Some(3));
        assert_eq!(attrs.get_str_list("t", "run_on_projects").unwrap(), Some(vec!["all"]));
        assert_eq!(attrs.get_bool("t", "nightly").unwrap(), None);
        assert!(attrs.contains_key("nightly"));
    }

    #[test]
    fn test_wrong_type_is_error() {
        let attrs = Attributes::new().with("build_platform", true);
        let err = attrs.get_str("build-linux64/opt", "build_platform").unwrap_err();
        assert_eq!(err.expected, "string");
        assert_eq!(err.found, "bool");
        assert!(err.to_string().contains("build-linux64/opt"));
    }

    #[test]
    fn test_truthiness() {
        let attrs = Attributes::new()
            .with("cron", true)
            .with("nightly", false)
            .with("manifests", Vec::<String>::new());
        assert!(attrs.is_truthy("cron"));
        assert!(!attrs.is_truthy("nightly"));
        assert!(!attrs.is_truthy("manifests"));
        assert!(!attrs.is_truthy("missing"));
    }

    #[test]
    fn test_numeric_string_chunk() {
        let attrs = Attributes::new().with("test_chunk", "7");
        assert_eq!(attrs.get_int("t", "test_chunk").unwrap(), Some(7));
    }
}
