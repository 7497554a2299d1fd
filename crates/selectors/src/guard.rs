//! Anti-replay guard for scheduled selectors.
//!
//! A cron run may be replayed (retriggered decision task, duplicate hook
//! fire). Guarded selectors claim an index path for the push revision and
//! schedule nothing when the path is already taken.

use async_trait::async_trait;
use tracing::info;

use ciselect_collab::index_exists;
use ciselect_core::{Parameters, TaskGraph};

use crate::context::SelectionContext;
use crate::error::Result;
use crate::registry::{SelectFn, TargetTaskSelector};

/// Whether a decision was already indexed at the path built by `index_path`.
///
/// Outside automation the check is skipped. Otherwise an unclaimed path is
/// claimed for the running decision task when its id is known.
pub async fn already_scheduled<F>(ctx: &SelectionContext, index_path: F) -> Result<bool>
where
    F: FnOnce() -> Result<String>,
{
    if !ctx.env.moz_automation {
        return Ok(false);
    }
    let index_path = index_path()?;
    if index_exists(ctx.indexer.as_ref(), &index_path, &ctx.retry).await? {
        info!("{} already exists, not scheduling anything", index_path);
        return Ok(true);
    }
    if let Some(task_id) = ctx.env.task_id.as_deref() {
        ctx.retry
            .run("index insert", || ctx.indexer.insert_task(&index_path, task_id))
            .await?;
    }
    Ok(false)
}

/// A selector function behind the anti-replay guard.
#[derive(Clone, Copy)]
pub struct GuardedSelector {
    name: &'static str,
    index_key: Option<&'static str>,
    labels: SelectFn,
}

impl GuardedSelector {
    /// Guard keyed by the decision of the selector `name`.
    pub const fn new(name: &'static str, labels: SelectFn) -> Self {
        Self {
            name,
            index_key: None,
            labels,
        }
    }

    /// Guard keyed by a fixed index key instead of the selector name.
    pub const fn with_index_key(mut self, key: &'static str) -> Self {
        self.index_key = Some(key);
        self
    }

    /// Registered name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Index path claimed for the current push.
    pub fn index_path(&self, parameters: &Parameters, ctx: &SelectionContext) -> Result<String> {
        let key = match self.index_key {
            Some(key) => key.to_string(),
            None => format!("taskgraph.decision-{}", self.name.replace('_', "-")),
        };
        Ok(format!(
            "{}.v2.{}.revision.{}.{}",
            ctx.graph_config.trust_domain,
            parameters.project()?,
            parameters.str("head_rev")?,
            key,
        ))
    }
}

#[async_trait]
impl TargetTaskSelector for GuardedSelector {
    async fn select(
        &self,
        graph: &TaskGraph,
        parameters: &Parameters,
        ctx: &SelectionContext,
    ) -> Result<Vec<String>> {
        if already_scheduled(ctx, || self.index_path(parameters, ctx)).await? {
            return Ok(Vec::new());
        }
        (self.labels)(graph, parameters, ctx)
    }

    fn id(&self) -> &'static str {
        self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::fixtures::*;
    use crate::context::Environment;
    use ciselect_collab::memory::MemoryIndexer;
    use serde_json::json;
    use std::sync::Arc;

    fn everything(graph: &TaskGraph, _: &Parameters, _: &SelectionContext) -> Result<Vec<String>> {
        Ok(graph.labels().map(String::from).collect())
    }

    #[test]
    fn test_index_paths() {
        let p = params(json!({"project": "mozilla-central", "head_rev": "abc123"}));
        let nightly = GuardedSelector::new("nightly_win64_aarch64", everything);
        assert_eq!(
            nightly.index_path(&p, &ctx()).unwrap(),
            "gecko.v2.mozilla-central.revision.abc123.taskgraph.decision-nightly-win64-aarch64"
        );
        let searchfox = GuardedSelector::new("searchfox_index", everything).with_index_key("searchfox-index");
        assert_eq!(
            searchfox.index_path(&p, &ctx()).unwrap(),
            "gecko.v2.mozilla-central.revision.abc123.searchfox-index"
        );
    }

    #[tokio::test]
    async fn test_missing_head_rev_is_fatal_in_automation() {
        let p = params(json!({"project": "mozilla-central"}));
        let ctx = ctx().with_env(Environment::automation());
        assert!(already_scheduled(&ctx, || GuardedSelector::new("x", everything).index_path(&p, &ctx))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_claimed_path_is_not_reclaimed() {
        let indexer = Arc::new(MemoryIndexer::new().with_task("p", "first"));
        let ctx = ctx()
            .with_env(Environment::automation().with_task_id("second"))
            .with_indexer(indexer.clone());
        assert!(already_scheduled(&ctx, || Ok("p".to_string())).await.unwrap());
        assert_eq!(indexer.get("p").await.as_deref(), Some("first"));
    }
}
