//! Deployment-wide graph configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::attribute::AttributeValue;

/// Errors raised while loading graph configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Malformed JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Required key is empty
    #[error("graph config is missing '{0}'")]
    Missing(&'static str),
}

/// Constants shared by every push of one deployment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GraphConfig {
    /// Trust domain, the root of index paths (e.g. `gecko`)
    pub trust_domain: String,

    /// Product source directory, relative to the checkout
    #[serde(default)]
    pub product_dir: Option<String>,

    /// Extra projects treated as release branches by `run_on_projects: [release]`
    #[serde(default)]
    pub release_projects: Vec<String>,

    /// Candidate attribute sets per kind for the `os-integration` selector
    #[serde(default)]
    pub os_integration: BTreeMap<String, Vec<BTreeMap<String, AttributeValue>>>,
}

impl GraphConfig {
    /// Create a config for a trust domain.
    pub fn new(trust_domain: impl Into<String>) -> Self {
        Self {
            trust_domain: trust_domain.into(),
            ..Default::default()
        }
    }

    /// Parse a graph config document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        if config.trust_domain.is_empty() {
            return Err(ConfigError::Missing("trust-domain"));
        }
        Ok(config)
    }

    /// Set the product directory.
    pub fn with_product_dir(mut self, dir: impl Into<String>) -> Self {
        self.product_dir = Some(dir.into());
        self
    }

    /// Add an extra release project.
    pub fn with_release_project(mut self, project: impl Into<String>) -> Self {
        self.release_projects.push(project.into());
        self
    }
}
