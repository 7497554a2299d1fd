//! Backfill of browsertime tests for perf-reviewed landings.
//!
//! Once a day, every push from the previous day whose commit was reviewed by
//! the perftest reviewers gets the `backfill-all-browsertime` action
//! triggered on its decision task. The selector itself schedules nothing.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use ciselect_core::{ParameterError, Parameters, TaskGraph};

use crate::context::SelectionContext;
use crate::error::{Result, SelectError};
use crate::registry::{RegistryError, SelectorRegistry, TargetTaskSelector};

/// Action triggered on each reviewed push.
pub const BACKFILL_ACTION: &str = "backfill-all-browsertime";

/// How many pushes back to look.
const PUSH_DEPTH: u64 = 200;

const REVIEWER_GROUP: &str = "perftest-reviewers";

pub(crate) fn register(registry: &mut SelectorRegistry) -> std::result::Result<(), RegistryError> {
    registry.register("backfill_all_browsertime", Arc::new(BackfillAllBrowsertime))
}

/// The `backfill_all_browsertime` selector.
#[derive(Debug, Clone, Copy, Default)]
pub struct BackfillAllBrowsertime;

/// Whether a commit message carries a perftest-reviewer review.
///
/// Only paragraphs starting with `bug ` count; the review marker is `r=`
/// followed, on the same paragraph, by the reviewer group.
pub fn reviewed_by_perftest(commit_message: &str) -> bool {
    commit_message.split("\n\n").any(|paragraph| {
        let paragraph = paragraph.trim_start().to_lowercase();
        if !paragraph.starts_with("bug ") {
            return false;
        }
        paragraph
            .find("r=")
            .is_some_and(|at| paragraph[at..].contains(REVIEWER_GROUP))
    })
}

fn pushlog_id(parameters: &Parameters) -> Result<u64> {
    let id = match parameters.get("pushlog_id")? {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_u64(),
        _ => None,
    };
    id.ok_or_else(|| {
        SelectError::Parameter(ParameterError::WrongType {
            key: "pushlog_id".to_string(),
            expected: "a push id",
        })
    })
}

fn push_day(date: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(date, 0).map(|t| t.date_naive())
}

impl BackfillAllBrowsertime {
    async fn decision_task(&self, ctx: &SelectionContext, project: &str, push_id: u64) -> Option<String> {
        let index_path = format!(
            "{}.v2.{}.pushlog-id.{}.decision",
            ctx.graph_config.trust_domain, project, push_id
        );
        match ctx.retry.run("decision lookup", || ctx.indexer.find_task(&index_path)).await {
            Ok(Some(task_id)) => Some(task_id),
            Ok(None) => {
                info!("Could not find decision task for push {}", push_id);
                None
            }
            Err(e) => {
                info!("Could not find decision task for push {}: {}", push_id, e);
                None
            }
        }
    }
}

#[async_trait]
impl TargetTaskSelector for BackfillAllBrowsertime {
    async fn select(
        &self,
        _graph: &TaskGraph,
        parameters: &Parameters,
        ctx: &SelectionContext,
    ) -> Result<Vec<String>> {
        let project = parameters.project()?;
        let repository = parameters.str("head_repository")?;
        let end_id = pushlog_id(parameters)?;
        let product_dir = ctx
            .graph_config
            .product_dir
            .as_deref()
            .ok_or(SelectError::MissingConfig("product-dir"))?;
        let repo_path = ctx.checkout.join(product_dir);
        let Some(yesterday) = ctx.today.pred_opt() else {
            return Ok(Vec::new());
        };

        let pushes = ctx
            .retry
            .run("pushlog query", || ctx.pushlog.get_pushes(repository, end_id, PUSH_DEPTH))
            .await?;

        for (&push_id, push) in pushes.iter().rev() {
            let Some(day) = push_day(push.date) else {
                warn!("push {} has an invalid date {}", push_id, push.date);
                continue;
            };
            if day < yesterday {
                break;
            }
            if day > yesterday {
                continue;
            }
            let Some(rev) = push.tip() else {
                continue;
            };

            let message = match ctx.vcs.commit_message(&repo_path, rev).await {
                Ok(message) => message,
                Err(e) => {
                    warn!("Could not read commit message of {}: {}", rev, e);
                    continue;
                }
            };
            if !reviewed_by_perftest(&message) {
                debug!("{} was not reviewed by {}", rev, REVIEWER_GROUP);
                continue;
            }

            let Some(decision_task_id) = self.decision_task(ctx, project, push_id).await else {
                continue;
            };
            match ctx.actions.trigger_action(BACKFILL_ACTION, &decision_task_id).await {
                Ok(()) => info!("Triggered {} for push {} ({})", BACKFILL_ACTION, push_id, rev),
                Err(e) => info!("Failed to trigger action for {}: {}", rev, e),
            }
        }
        Ok(Vec::new())
    }

    fn id(&self) -> &'static str {
        "backfill_all_browsertime"
    }
}
