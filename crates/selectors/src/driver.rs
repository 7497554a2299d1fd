//! Selection driver.
//!
//! Looks the selector up, runs it and enforces what every selection result
//! must satisfy: labels exist in the graph, appear once, and belong to the
//! requested `target-kinds`. Try-syntax annotations are computed here, after
//! selection.

use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info};

use ciselect_core::{Parameters, TaskGraph};

use crate::context::SelectionContext;
use crate::error::{Result, SelectError};
use crate::registry::SelectorRegistry;
use crate::try_tasks::{annotations, TaskAnnotations};

/// Outcome of one selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SelectionReport {
    /// Selector that ran
    pub selector: String,

    /// Selected labels, in graph order where the selector keeps it
    pub labels: Vec<String>,

    /// Per-task try annotations, keyed by label
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, TaskAnnotations>,
}

/// Run the selector registered as `name`.
pub async fn select(
    registry: &SelectorRegistry,
    name: &str,
    graph: &TaskGraph,
    parameters: &Parameters,
    ctx: &SelectionContext,
) -> Result<SelectionReport> {
    let selector = registry.get(name)?;
    debug!("running target tasks method '{}'", name);

    let selected = selector.select(graph, parameters, ctx).await?;
    let labels = dedup_known(name, graph, selected)?;
    let labels = restrict_to_target_kinds(graph, parameters, labels)?;

    if labels.is_empty() {
        info!("Target tasks method '{}' selected no tasks; nothing will be scheduled", name);
    } else {
        info!(
            "Target tasks method '{}' selected {} of {} tasks",
            name,
            labels.len(),
            graph.len()
        );
    }

    let annotations = annotations(graph, parameters, &labels)?;
    Ok(SelectionReport {
        selector: name.to_string(),
        labels,
        annotations,
    })
}

/// Drop repeated labels, keeping the first; fail on labels not in the graph.
fn dedup_known(selector: &str, graph: &TaskGraph, labels: Vec<String>) -> Result<Vec<String>> {
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(labels.len());
    for label in labels {
        if !graph.contains(&label) {
            return Err(SelectError::UnknownLabel {
                selector: selector.to_string(),
                label,
            });
        }
        if seen.insert(label.clone()) {
            unique.push(label);
        }
    }
    Ok(unique)
}

/// Keep only tasks of the requested kinds. Dependencies are left to graph
/// generation.
fn restrict_to_target_kinds(graph: &TaskGraph, parameters: &Parameters, labels: Vec<String>) -> Result<Vec<String>> {
    let kinds = parameters.target_kinds()?;
    if kinds.is_empty() {
        return Ok(labels);
    }
    let before = labels.len();
    let kept: Vec<String> = labels
        .into_iter()
        .filter(|label| {
            graph
                .get(label)
                .is_some_and(|task| kinds.contains(&task.kind.as_str()))
        })
        .collect();
    debug!("target-kinds {:?} kept {} of {} tasks", kinds, kept.len(), before);
    Ok(kept)
}
