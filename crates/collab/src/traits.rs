//! Collaborator interfaces.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::Result;
use crate::retry::RetryPolicy;

/// Task index owned by the execution service.
#[async_trait]
pub trait Indexer: Send + Sync {
    /// Task id indexed at `index_path`, or `None` when nothing is indexed there.
    async fn find_task(&self, index_path: &str) -> Result<Option<String>>;

    /// Index `task_id` at `index_path`.
    async fn insert_task(&self, index_path: &str, task_id: &str) -> Result<()>;
}

/// Whether anything is indexed at `index_path`, retrying transient failures.
pub async fn index_exists(indexer: &dyn Indexer, index_path: &str, policy: &RetryPolicy) -> Result<bool> {
    let found = policy
        .run("index lookup", || indexer.find_task(index_path))
        .await?;
    Ok(found.is_some())
}

/// One push from the pushlog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Push {
    /// Changeset ids, oldest first
    pub changesets: Vec<String>,
    /// Push time, seconds since the epoch
    pub date: i64,
    /// Pusher
    #[serde(default)]
    pub user: String,
}

impl Push {
    /// Tip changeset of the push.
    pub fn tip(&self) -> Option<&str> {
        self.changesets.last().map(String::as_str)
    }
}

/// Repository push history.
#[async_trait]
pub trait Pushlog: Send + Sync {
    /// Up to `depth` pushes ending at `end_id` (inclusive), keyed by push id.
    async fn get_pushes(&self, repository: &str, end_id: u64, depth: u64) -> Result<BTreeMap<u64, Push>>;
}

/// Read-only version control access.
#[async_trait]
pub trait Vcs: Send + Sync {
    /// Full commit message of `rev` in the checkout at `repo_path`.
    async fn commit_message(&self, repo_path: &Path, rev: &str) -> Result<String>;
}

/// Triggers actions on an existing decision task.
#[async_trait]
pub trait ActionTrigger: Send + Sync {
    /// Trigger action `name` for the push whose decision task is `decision_task_id`.
    async fn trigger_action(&self, name: &str, decision_task_id: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CollabError;
    use crate::memory::MemoryIndexer;

    #[test]
    fn test_push_tip() {
        let push = Push {
            changesets: vec!["a".into(), "b".into()],
            date: 0,
            user: String::new(),
        };
        assert_eq!(push.tip(), Some("b"));
    }

    #[tokio::test]
    async fn test_index_exists() {
        let indexer = MemoryIndexer::new().with_task("gecko.v2.foo", "TASK");
        let policy = RetryPolicy::immediate(3);
        assert!(index_exists(&indexer, "gecko.v2.foo", &policy).await.unwrap());
        assert!(!index_exists(&indexer, "gecko.v2.bar", &policy).await.unwrap());
    }

    #[tokio::test]
    async fn test_index_exists_retries() {
        let indexer = MemoryIndexer::new().with_task("p", "T").failing_lookups(2);
        assert!(index_exists(&indexer, "p", &RetryPolicy::immediate(3)).await.unwrap());

        let flaky = MemoryIndexer::new().failing_lookups(5);
        let err = index_exists(&flaky, "p", &RetryPolicy::immediate(3)).await.unwrap_err();
        assert!(matches!(err, CollabError::Transient(_)));
    }
}
