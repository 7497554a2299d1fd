//! Try push selection.
//!
//! A try push names its tasks either in a structured `try_task_config` or in
//! legacy try syntax in the commit message. Try syntax also carries
//! per-task annotations (rebuild counts, notification routes), computed by
//! [`annotations`] after selection instead of being written into the tasks.

use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

use ciselect_core::{JsonMap, Parameters, TaskGraph};
use ciselect_filters::{filter_by_uncommon_try, filter_unsupported_artifact_builds};
use ciselect_try::{parse_message, Notifications, TryOptions};

use crate::common::{in_graph_order, select};
use crate::context::SelectionContext;
use crate::error::Result;
use crate::registry::{selector_fn, RegistryError, SelectorRegistry};

/// Env var whose presence means the push runs a single test path.
const SINGLE_TEST_PATH_MARKER: &str = "MOZHARNESS_TEST_PATHS";

pub(crate) fn register(registry: &mut SelectorRegistry) -> std::result::Result<(), RegistryError> {
    registry.register("try_tasks", selector_fn!(try_tasks))
}

/// Tasks requested by a try push, dispatched on `try_mode`.
///
/// Without a try mode nothing is scheduled; tasks can be added later by hand.
pub fn try_tasks(graph: &TaskGraph, parameters: &Parameters, _ctx: &SelectionContext) -> Result<Vec<String>> {
    match parameters.get_opt("try_mode").and_then(Value::as_str) {
        Some("try_task_config") => try_task_config(graph, parameters),
        Some("try_option_syntax") => try_option_syntax(graph, parameters),
        other => {
            debug!("try mode {:?} schedules nothing", other);
            Ok(Vec::new())
        }
    }
}

fn is_chunk_number(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

fn try_task_config(graph: &TaskGraph, parameters: &Parameters) -> Result<Vec<String>> {
    let single_test_path = parameters
        .get_path_opt("try_task_config.env")
        .and_then(Value::as_object)
        .is_some_and(|env| env.contains_key(SINGLE_TEST_PATH_MARKER));

    let mut selected = BTreeSet::new();
    let mut missing = BTreeSet::new();

    for requested in parameters.try_config_tasks()? {
        let Some(prefix) = requested.strip_suffix("-*") else {
            if graph.contains(requested) {
                selected.insert(requested);
            } else {
                missing.insert(requested);
            }
            continue;
        };

        let prefix = format!("{prefix}-");
        let mut found: Vec<&str> = graph
            .labels()
            .filter(|label| label.strip_prefix(prefix.as_str()).is_some_and(is_chunk_number))
            .collect();
        if found.is_empty() {
            missing.insert(requested);
            continue;
        }
        if single_test_path {
            found.retain(|label| label.ends_with("-1"));
        }
        selected.extend(found);
    }

    if !missing.is_empty() {
        warn!(
            "The following tasks were requested but do not exist in the full task graph and will be skipped:\n  {}",
            missing.into_iter().collect::<Vec<_>>().join("\n  ")
        );
    }
    Ok(in_graph_order(graph, selected))
}

/// Try options from the push message; empty when it has no try syntax.
pub fn try_options(graph: &TaskGraph, parameters: &Parameters) -> Result<TryOptions> {
    let message = parameters.str_or("message", "")?;
    match parse_message(message)? {
        Some(args) => Ok(TryOptions::resolve(&args, graph)?),
        None => Ok(TryOptions::empty()),
    }
}

fn try_option_syntax(graph: &TaskGraph, parameters: &Parameters) -> Result<Vec<String>> {
    let options = try_options(graph, parameters)?;

    // --artifact behaves like `use-artifact-builds` in a task config.
    let parameters = if options.use_artifact_builds {
        let mut config: JsonMap = parameters.object("try_task_config")?.cloned().unwrap_or_default();
        config.insert("use-artifact-builds".to_string(), Value::Bool(true));
        let mut overrides = JsonMap::new();
        overrides.insert("try_task_config".to_string(), Value::Object(config));
        parameters.with_overrides(overrides)
    } else {
        parameters.clone()
    };

    select(graph, |task| {
        Ok(options.task_matches(task)?
            && filter_by_uncommon_try(&task.label, &[])
            && filter_unsupported_artifact_builds(task, &parameters)?)
    })
}

/// Per-task changes requested by try syntax.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskAnnotations {
    /// How many copies of the task to run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_duplicates: Option<u32>,

    /// Disable automatic retries
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub no_retry: bool,

    /// Extra notification routes
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub routes: Vec<String>,

    /// Extra environment
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

impl TaskAnnotations {
    /// Whether nothing is changed.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

fn notification_routes(notifications: Option<Notifications>, owner: &str) -> Vec<String> {
    match notifications {
        Some(Notifications::All) => vec![format!("notify.email.{owner}.on-any")],
        Some(Notifications::Failure) => vec![
            format!("notify.email.{owner}.on-failed"),
            format!("notify.email.{owner}.on-exception"),
        ],
        None => Vec::new(),
    }
}

/// Annotations for the selected labels of a try-syntax push.
///
/// Other pushes get an empty map. Labels that need no change are left out.
pub fn annotations(
    graph: &TaskGraph,
    parameters: &Parameters,
    labels: &[String],
) -> Result<BTreeMap<String, TaskAnnotations>> {
    if parameters.get_opt("try_mode").and_then(Value::as_str) != Some("try_option_syntax") {
        return Ok(BTreeMap::new());
    }
    let options = try_options(graph, parameters)?;
    if !options.is_present() {
        return Ok(BTreeMap::new());
    }

    let routes = notification_routes(options.notifications, parameters.str_or("owner", "")?);
    let mut result = BTreeMap::new();

    for label in labels {
        let Some(task) = graph.get(label) else {
            continue;
        };
        let suite = task.attr_str("unittest_suite")?;

        let mut duplicates = None;
        if suite.is_some() && options.trigger_tests > 1 {
            duplicates = Some(options.trigger_tests);
        }
        if suite == Some("talos") && options.talos_trigger_tests > 1 {
            duplicates = Some(options.talos_trigger_tests);
        }
        if suite == Some("raptor") && options.raptor_trigger_tests > 1 {
            duplicates = Some(options.raptor_trigger_tests);
        }

        let annotation = TaskAnnotations {
            task_duplicates: duplicates,
            no_retry: options.no_retry,
            routes: routes.clone(),
            env: options.env.clone(),
        };
        if !annotation.is_empty() {
            result.insert(label.clone(), annotation);
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::fixtures::*;
    use ciselect_core::Task;
    use serde_json::json;

    fn mochitest_graph() -> TaskGraph {
        graph([
            Task::new("test-mochitest-1", "test"),
            Task::new("test-mochitest-2", "test"),
            Task::new("test-mochitest-3", "test"),
            Task::new("test-mochitest-browser-chrome-1", "test"),
            Task::new("build-linux64/opt", "build"),
        ])
    }

    #[test]
    fn test_no_try_mode_selects_nothing() {
        let p = params(json!({"project": "try"}));
        assert!(try_tasks(&mochitest_graph(), &p, &ctx()).unwrap().is_empty());
    }

    #[test]
    fn test_chunk_glob() {
        let p = params(json!({
            "try_mode": "try_task_config",
            "try_task_config": {"tasks": ["test-mochitest-*"]}
        }));
        assert_eq!(
            try_tasks(&mochitest_graph(), &p, &ctx()).unwrap(),
            vec!["test-mochitest-1", "test-mochitest-2", "test-mochitest-3"]
        );
    }

    #[test]
    fn test_chunk_glob_with_single_test_path() {
        let p = params(json!({
            "try_mode": "try_task_config",
            "try_task_config": {
                "tasks": ["test-mochitest-*"],
                "env": {"MOZHARNESS_TEST_PATHS": "{\"mochitest-plain\": [\"dom/base/test\"]}"}
            }
        }));
        assert_eq!(try_tasks(&mochitest_graph(), &p, &ctx()).unwrap(), vec!["test-mochitest-1"]);
    }

    #[test]
    fn test_exact_labels_missing_and_duplicates() {
        let p = params(json!({
            "try_mode": "try_task_config",
            "try_task_config": {"tasks": [
                "build-linux64/opt",
                "test-mochitest-2",
                "test-mochitest-*",
                "does-not-exist",
                "nothing-matches-*"
            ]}
        }));
        let labels = try_tasks(&mochitest_graph(), &p, &ctx()).unwrap();
        assert_eq!(
            labels,
            vec!["test-mochitest-1", "test-mochitest-2", "test-mochitest-3", "build-linux64/opt"]
        );
    }

    fn syntax_graph() -> TaskGraph {
        graph([
            everywhere("build-linux64/opt", "build")
                .with_attribute("build_platform", "linux64")
                .with_attribute("build_type", "opt"),
            everywhere("test-linux64/opt-xpcshell", "test")
                .with_attribute("build_platform", "linux64")
                .with_attribute("build_type", "opt")
                .with_attribute("test_platform", "linux64/opt")
                .with_attribute("unittest_try_name", "xpcshell")
                .with_attribute("unittest_suite", "xpcshell")
                .with_attribute("supports-artifact-builds", false),
            everywhere("test-linux64/opt-talos-g1", "test")
                .with_attribute("build_platform", "linux64")
                .with_attribute("build_type", "opt")
                .with_attribute("test_platform", "linux64/opt")
                .with_attribute("talos_try_name", "g1")
                .with_attribute("unittest_suite", "talos"),
            everywhere("build-win64/opt", "build")
                .with_attribute("build_platform", "win64")
                .with_attribute("build_type", "opt"),
        ])
    }

    fn syntax(message: &str) -> Parameters {
        params(json!({
            "project": "try",
            "owner": "dev@example.com",
            "try_mode": "try_option_syntax",
            "message": message
        }))
    }

    #[test]
    fn test_option_syntax_selection() {
        let g = syntax_graph();
        let p = syntax("Bug 1 - stuff try: -b o -p linux64 -u xpcshell -t g1");
        assert_eq!(
            try_tasks(&g, &p, &ctx()).unwrap(),
            vec!["build-linux64/opt", "test-linux64/opt-xpcshell", "test-linux64/opt-talos-g1"]
        );
    }

    #[test]
    fn test_option_syntax_without_try_line_selects_nothing() {
        let p = syntax("Bug 1 - no syntax here");
        assert!(try_tasks(&syntax_graph(), &p, &ctx()).unwrap().is_empty());
        assert!(annotations(&syntax_graph(), &p, &[]).unwrap().is_empty());
    }

    #[test]
    fn test_artifact_drops_unsupported() {
        let g = syntax_graph();
        let p = syntax("try: -b o -p linux64 -u xpcshell --artifact");
        assert_eq!(try_tasks(&g, &p, &ctx()).unwrap(), vec!["build-linux64/opt"]);
    }

    #[test]
    fn test_annotations() {
        let g = syntax_graph();
        let p = syntax("try: -b o -p linux64 -u xpcshell -t g1 --rebuild 3 --rebuild-talos 5 -f --no-retry");
        let labels = try_tasks(&g, &p, &ctx()).unwrap();
        let notes = annotations(&g, &p, &labels).unwrap();

        let xpcshell = &notes["test-linux64/opt-xpcshell"];
        assert_eq!(xpcshell.task_duplicates, Some(3));
        assert!(xpcshell.no_retry);
        assert_eq!(
            xpcshell.routes,
            vec![
                "notify.email.dev@example.com.on-failed",
                "notify.email.dev@example.com.on-exception"
            ]
        );
        assert_eq!(notes["test-linux64/opt-talos-g1"].task_duplicates, Some(5));
        assert_eq!(notes["build-linux64/opt"].task_duplicates, None);
        assert!(!notes.contains_key("build-win64/opt"));
    }

    #[test]
    fn test_annotations_only_for_option_syntax() {
        let p = params(json!({"try_mode": "try_task_config", "try_task_config": {"tasks": []}}));
        assert!(annotations(&syntax_graph(), &p, &["build-linux64/opt".to_string()]).unwrap().is_empty());
    }

    #[test]
    fn test_plain_annotations_are_omitted() {
        let g = syntax_graph();
        let p = syntax("try: -b o -p linux64 -u xpcshell");
        let labels = try_tasks(&g, &p, &ctx()).unwrap();
        assert!(annotations(&g, &p, &labels).unwrap().is_empty());
    }
}
