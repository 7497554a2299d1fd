//! Helpers shared by selector families.

use std::collections::HashSet;
use tracing::warn;

use ciselect_core::{Parameters, Task, TaskGraph};
use ciselect_filters::{filter_out_devedition, filter_out_shipping_phase, standard_filter};

use crate::context::SelectionContext;
use crate::error::Result;

/// Labels of tasks accepted by `accept`, in graph order.
pub(crate) fn select<F>(graph: &TaskGraph, accept: F) -> Result<Vec<String>>
where
    F: FnMut(&Task) -> Result<bool>,
{
    graph.select_labels(accept)
}

/// Labels from `selected` re-ordered to follow the graph.
pub(crate) fn in_graph_order<'a>(graph: &TaskGraph, selected: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let selected: HashSet<&str> = selected.into_iter().collect();
    graph
        .labels()
        .filter(|label| selected.contains(label))
        .map(String::from)
        .collect()
}

/// Union of label lists, in graph order.
pub(crate) fn union(graph: &TaskGraph, lists: &[Vec<String>]) -> Vec<String> {
    in_graph_order(graph, lists.iter().flatten().map(String::as_str))
}

/// Fixed labels that exist in the graph; the rest are reported and skipped.
pub(crate) fn existing_labels(graph: &TaskGraph, selector: &str, labels: &[&str]) -> Vec<String> {
    labels
        .iter()
        .filter(|label| {
            let present = graph.contains(label);
            if !present {
                warn!("{} wants '{}', which is not in the full task graph", selector, label);
            }
            present
        })
        .map(|label| label.to_string())
        .collect()
}

/// The on-push filter every integration-style selector starts from.
pub(crate) fn default_filter(task: &Task, parameters: &Parameters, ctx: &SelectionContext) -> Result<bool> {
    Ok(standard_filter(task, parameters, &ctx.graph_config)?
        && filter_out_shipping_phase(task, parameters)?
        && filter_out_devedition(task, parameters)?)
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_union_follows_graph_order() {
        let g = graph([Task::new("a", "x"), Task::new("b", "x"), Task::new("c", "x")]);
        let merged = union(&g, &[vec!["c".into()], vec!["a".into(), "c".into()]]);
        assert_eq!(merged, vec!["a", "c"]);
    }

    #[test]
    fn test_existing_labels_skips_missing() {
        let g = graph([Task::new("present", "x")]);
        assert_eq!(existing_labels(&g, "sel", &["present", "absent"]), vec!["present"]);
    }
}
