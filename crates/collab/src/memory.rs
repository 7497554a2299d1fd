//! In-memory collaborators for tests and offline runs.

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tokio::sync::Mutex;

use crate::error::{CollabError, Result};
use crate::traits::{ActionTrigger, Indexer, Push, Pushlog, Vcs};

/// Index held in a map.
#[derive(Debug, Default)]
pub struct MemoryIndexer {
    entries: Mutex<BTreeMap<String, String>>,
    /// Lookups that fail transiently before lookups start working
    failing_lookups: Mutex<u32>,
    lookups: Mutex<Vec<String>>,
}

impl MemoryIndexer {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate an entry.
    pub fn with_task(mut self, index_path: impl Into<String>, task_id: impl Into<String>) -> Self {
        self.entries.get_mut().insert(index_path.into(), task_id.into());
        self
    }

    /// Fail the next `count` lookups with a transient error.
    pub fn failing_lookups(mut self, count: u32) -> Self {
        *self.failing_lookups.get_mut() = count;
        self
    }

    /// Task indexed at a path.
    pub async fn get(&self, index_path: &str) -> Option<String> {
        self.entries.lock().await.get(index_path).cloned()
    }

    /// Every path looked up so far.
    pub async fn lookups(&self) -> Vec<String> {
        self.lookups.lock().await.clone()
    }
}

#[async_trait]
impl Indexer for MemoryIndexer {
    async fn find_task(&self, index_path: &str) -> Result<Option<String>> {
        self.lookups.lock().await.push(index_path.to_string());
        let mut failing = self.failing_lookups.lock().await;
        if *failing > 0 {
            *failing -= 1;
            return Err(CollabError::Transient(format!("index unavailable for {index_path}")));
        }
        Ok(self.entries.lock().await.get(index_path).cloned())
    }

    async fn insert_task(&self, index_path: &str, task_id: &str) -> Result<()> {
        self.entries
            .lock()
            .await
            .insert(index_path.to_string(), task_id.to_string());
        Ok(())
    }
}

/// Fixed push history.
#[derive(Debug, Default)]
pub struct MemoryPushlog {
    pushes: BTreeMap<u64, Push>,
    unavailable: bool,
}

impl MemoryPushlog {
    /// Create an empty pushlog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a push.
    pub fn with_push(mut self, id: u64, push: Push) -> Self {
        self.pushes.insert(id, push);
        self
    }

    /// Make every request fail transiently.
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }
}

#[async_trait]
impl Pushlog for MemoryPushlog {
    async fn get_pushes(&self, repository: &str, end_id: u64, depth: u64) -> Result<BTreeMap<u64, Push>> {
        if self.unavailable {
            return Err(CollabError::Transient(format!("pushlog unavailable for {repository}")));
        }
        if depth == 0 {
            return Ok(BTreeMap::new());
        }
        let start = end_id.saturating_sub(depth);
        Ok(self
            .pushes
            .range(start + 1..=end_id)
            .map(|(id, push)| (*id, push.clone()))
            .collect())
    }
}

/// Commit messages by revision.
#[derive(Debug, Default)]
pub struct MemoryVcs {
    messages: BTreeMap<String, String>,
}

impl MemoryVcs {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a commit.
    pub fn with_commit(mut self, rev: impl Into<String>, message: impl Into<String>) -> Self {
        self.messages.insert(rev.into(), message.into());
        self
    }
}

#[async_trait]
impl Vcs for MemoryVcs {
    async fn commit_message(&self, _repo_path: &Path, rev: &str) -> Result<String> {
        self.messages
            .get(rev)
            .cloned()
            .ok_or_else(|| CollabError::Fatal(format!("unknown revision {rev}")))
    }
}

/// Records triggered actions.
#[derive(Debug, Default)]
pub struct RecordingActionTrigger {
    triggered: Mutex<Vec<(String, String)>>,
    rejected: BTreeSet<String>,
}

impl RecordingActionTrigger {
    /// Create a trigger that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject triggers for a decision task.
    pub fn rejecting(mut self, decision_task_id: impl Into<String>) -> Self {
        self.rejected.insert(decision_task_id.into());
        self
    }

    /// `(action, decision task)` pairs triggered so far.
    pub async fn triggered(&self) -> Vec<(String, String)> {
        self.triggered.lock().await.clone()
    }
}

#[async_trait]
impl ActionTrigger for RecordingActionTrigger {
    async fn trigger_action(&self, name: &str, decision_task_id: &str) -> Result<()> {
        if self.rejected.contains(decision_task_id) {
            return Err(CollabError::Fatal(format!("cannot trigger {name} on {decision_task_id}")));
        }
        self.triggered
            .lock()
            .await
            .push((name.to_string(), decision_task_id.to_string()));
        Ok(())
    }
}
