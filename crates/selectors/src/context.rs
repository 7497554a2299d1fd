//! Everything a selector may consult besides the graph and parameters.

use chrono::{NaiveDate, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ciselect_collab::memory::{MemoryIndexer, MemoryPushlog, MemoryVcs};
use ciselect_collab::{ActionTrigger, Indexer, LoggingActionTrigger, Pushlog, RetryPolicy, Vcs};
use ciselect_core::GraphConfig;

/// Snapshot of the environment variables selectors honour.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    /// `MOZ_AUTOMATION` is set to a truthy value
    pub moz_automation: bool,
    /// `TASK_ID` of the running decision task
    pub task_id: Option<String>,
}

impl Environment {
    /// Read `MOZ_AUTOMATION` and `TASK_ID` from the process environment.
    pub fn from_process() -> Self {
        Self {
            moz_automation: std::env::var("MOZ_AUTOMATION").is_ok_and(|v| is_truthy(&v)),
            task_id: std::env::var("TASK_ID").ok().filter(|id| !id.is_empty()),
        }
    }

    /// An environment running in automation.
    pub fn automation() -> Self {
        Self {
            moz_automation: true,
            task_id: None,
        }
    }

    /// Set the decision task id.
    pub fn with_task_id(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }
}

fn is_truthy(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "" | "0" | "false" | "no" | "off"
    )
}

/// Selection context handed to every selector.
#[derive(Clone)]
pub struct SelectionContext {
    /// Deployment-wide constants
    pub graph_config: GraphConfig,

    /// Environment snapshot
    pub env: Environment,

    /// Task index
    pub indexer: Arc<dyn Indexer>,

    /// Push history
    pub pushlog: Arc<dyn Pushlog>,

    /// Commit messages
    pub vcs: Arc<dyn Vcs>,

    /// Action trigger
    pub actions: Arc<dyn ActionTrigger>,

    /// Retry policy for collaborator calls
    pub retry: RetryPolicy,

    /// Date the selection runs on
    pub today: NaiveDate,

    /// Root of the source checkout
    pub checkout: PathBuf,
}

impl SelectionContext {
    /// Create a context with offline collaborators and an empty environment.
    pub fn new(graph_config: GraphConfig) -> Self {
        Self {
            graph_config,
            env: Environment::default(),
            indexer: Arc::new(MemoryIndexer::new()),
            pushlog: Arc::new(MemoryPushlog::new()),
            vcs: Arc::new(MemoryVcs::new()),
            actions: Arc::new(LoggingActionTrigger),
            retry: RetryPolicy::default(),
            today: Utc::now().date_naive(),
            checkout: PathBuf::from("."),
        }
    }

    /// Set the environment snapshot.
    pub fn with_env(mut self, env: Environment) -> Self {
        self.env = env;
        self
    }

    /// Set the task index.
    pub fn with_indexer(mut self, indexer: Arc<dyn Indexer>) -> Self {
        self.indexer = indexer;
        self
    }

    /// Set the pushlog.
    pub fn with_pushlog(mut self, pushlog: Arc<dyn Pushlog>) -> Self {
        self.pushlog = pushlog;
        self
    }

    /// Set the VCS.
    pub fn with_vcs(mut self, vcs: Arc<dyn Vcs>) -> Self {
        self.vcs = vcs;
        self
    }

    /// Set the action trigger.
    pub fn with_actions(mut self, actions: Arc<dyn ActionTrigger>) -> Self {
        self.actions = actions;
        self
    }

    /// Set the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the selection date.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Set the checkout root.
    pub fn with_checkout(mut self, checkout: impl AsRef<Path>) -> Self {
        self.checkout = checkout.as_ref().to_path_buf();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthy() {
        assert!(is_truthy("1"));
        assert!(is_truthy("true"));
        assert!(!is_truthy("0"));
        assert!(!is_truthy(""));
        assert!(!is_truthy("False"));
    }

    #[test]
    fn test_builders() {
        let ctx = SelectionContext::new(GraphConfig::new("gecko"))
            .with_env(Environment::automation().with_task_id("DECISION"))
            .with_retry(RetryPolicy::immediate(2))
            .with_checkout("/src/gecko");
        assert!(ctx.env.moz_automation);
        assert_eq!(ctx.env.task_id.as_deref(), Some("DECISION"));
        assert_eq!(ctx.retry.max_attempts, 2);
        assert_eq!(ctx.graph_config.trust_domain, "gecko");
        assert_eq!(ctx.checkout, PathBuf::from("/src/gecko"));
    }
}
