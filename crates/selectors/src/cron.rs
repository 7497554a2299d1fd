//! Scheduled (cron) selectors that are not nightlies or perf runs.

use std::collections::BTreeMap;
use std::sync::Arc;

use ciselect_core::{AttributeValue, Parameters, Task, TaskGraph};
use ciselect_filters::filter_for_project;

use crate::common::{existing_labels, select};
use crate::context::SelectionContext;
use crate::error::Result;
use crate::guard::GuardedSelector;
use crate::registry::{selector_fn, RegistryError, SelectorRegistry};

const SEARCHFOX: GuardedSelector =
    GuardedSelector::new("searchfox_index", searchfox_index).with_index_key("searchfox-index");

pub(crate) fn register(registry: &mut SelectorRegistry) -> std::result::Result<(), RegistryError> {
    registry.register(SEARCHFOX.name(), Arc::new(SEARCHFOX))?;
    registry.register("updatebot_cron", selector_fn!(updatebot_cron))?;
    registry.register("eslint-build", selector_fn!(eslint_build))?;
    registry.register("customv8_update", selector_fn!(customv8_update))?;
    registry.register("file_update", selector_fn!(file_update))?;
    registry.register("l10n_bump", selector_fn!(l10n_bump))?;
    registry.register("merge_automation", selector_fn!(merge_automation))?;
    registry.register("scriptworker_canary", selector_fn!(scriptworker_canary))?;
    registry.register("cron_bouncer_check", selector_fn!(cron_bouncer_check))?;
    registry.register("system_symbols", selector_fn!(system_symbols))?;
    registry.register("android-l10n-import", selector_fn!(android_l10n_import))?;
    registry.register("android-l10n-sync", selector_fn!(android_l10n_sync))?;
    registry.register("snap_upstream_tasks", selector_fn!(snap_upstream_tasks))?;
    registry.register("holly_tasks", selector_fn!(holly_tasks))?;
    registry.register("os-integration", selector_fn!(os_integration))?;
    Ok(())
}

fn of_kinds(graph: &TaskGraph, kinds: &[&str]) -> Result<Vec<String>> {
    select(graph, |task| Ok(kinds.contains(&task.kind.as_str())))
}

/// Daily Searchfox indexing jobs.
pub fn searchfox_index(graph: &TaskGraph, _parameters: &Parameters, _ctx: &SelectionContext) -> Result<Vec<String>> {
    Ok(existing_labels(
        graph,
        "searchfox_index",
        &[
            "searchfox-linux64-searchfox/debug",
            "searchfox-macosx64-searchfox/debug",
            "searchfox-macosx64-aarch64-searchfox/debug",
            "searchfox-win64-searchfox/debug",
            "searchfox-android-aarch64-searchfox/debug",
            "searchfox-ios-searchfox/debug",
            "source-test-file-metadata-bugzilla-components",
            "source-test-file-metadata-test-info-all",
            "source-test-wpt-metadata-summary",
        ],
    ))
}

/// Vendored dependency update checks.
pub fn updatebot_cron(graph: &TaskGraph, _parameters: &Parameters, _ctx: &SelectionContext) -> Result<Vec<String>> {
    Ok(existing_labels(graph, "updatebot_cron", &["updatebot-cron"]))
}

/// Rebuild of the ESLint plugin bundle.
pub fn eslint_build(graph: &TaskGraph, _parameters: &Parameters, _ctx: &SelectionContext) -> Result<Vec<String>> {
    Ok(existing_labels(graph, "eslint-build", &["source-test-node-eslint-build"]))
}

/// Custom V8 toolchain refresh.
pub fn customv8_update(graph: &TaskGraph, _parameters: &Parameters, _ctx: &SelectionContext) -> Result<Vec<String>> {
    Ok(existing_labels(graph, "customv8_update", &["toolchain-linux64-custom-v8"]))
}

/// Periodic file updates (HSTS, HPKP, blocklists).
pub fn file_update(graph: &TaskGraph, _parameters: &Parameters, _ctx: &SelectionContext) -> Result<Vec<String>> {
    of_kinds(graph, &["repo-update"])
}

/// Localization revision bumps.
pub fn l10n_bump(graph: &TaskGraph, _parameters: &Parameters, _ctx: &SelectionContext) -> Result<Vec<String>> {
    of_kinds(graph, &["l10n-bump"])
}

/// Version bumps and merges between release branches.
pub fn merge_automation(graph: &TaskGraph, _parameters: &Parameters, _ctx: &SelectionContext) -> Result<Vec<String>> {
    of_kinds(graph, &["merge-automation"])
}

/// Scriptworker deployment canaries.
pub fn scriptworker_canary(
    graph: &TaskGraph,
    _parameters: &Parameters,
    _ctx: &SelectionContext,
) -> Result<Vec<String>> {
    of_kinds(graph, &["scriptworker-canary"])
}

/// Bouncer checks for the current project.
pub fn cron_bouncer_check(graph: &TaskGraph, parameters: &Parameters, ctx: &SelectionContext) -> Result<Vec<String>> {
    select(graph, |task| {
        Ok(task.kind == "cron-bouncer-check" && filter_for_project(task, parameters, &ctx.graph_config)?)
    })
}

/// Upload and reprocessing of system library symbols.
pub fn system_symbols(graph: &TaskGraph, _parameters: &Parameters, _ctx: &SelectionContext) -> Result<Vec<String>> {
    of_kinds(graph, &["system-symbols", "system-symbols-upload", "system-symbols-reprocess"])
}

/// Android string import from the localization repository.
pub fn android_l10n_import(
    graph: &TaskGraph,
    _parameters: &Parameters,
    _ctx: &SelectionContext,
) -> Result<Vec<String>> {
    of_kinds(graph, &["android-l10n-import"])
}

/// Android string sync across release branches.
pub fn android_l10n_sync(
    graph: &TaskGraph,
    _parameters: &Parameters,
    _ctx: &SelectionContext,
) -> Result<Vec<String>> {
    of_kinds(graph, &["android-l10n-sync"])
}

/// Snap builds from upstream sources; local snap builds are left out.
pub fn snap_upstream_tasks(
    graph: &TaskGraph,
    _parameters: &Parameters,
    _ctx: &SelectionContext,
) -> Result<Vec<String>> {
    select(graph, |task| {
        Ok(task.label.contains("snap-upstream") && !task.label.contains("-local"))
    })
}

/// Holly only runs updatebot.
pub fn holly_tasks(graph: &TaskGraph, _parameters: &Parameters, _ctx: &SelectionContext) -> Result<Vec<String>> {
    of_kinds(graph, &["updatebot"])
}

/// Whether every `(key, expected)` pair holds on the task.
///
/// A list value matches when the attribute equals one of its items. A
/// missing attribute never matches.
fn attributes_match(task: &Task, expected: &BTreeMap<String, AttributeValue>) -> bool {
    expected.iter().all(|(key, want)| match (task.attributes.get(key), want) {
        (None, _) => false,
        (Some(have), AttributeValue::List(options)) => options.contains(have),
        (Some(have), want) => have == want,
    })
}

/// Tasks picked for OS integration testing by the graph config's candidate
/// attribute sets, keyed by kind.
pub fn os_integration(graph: &TaskGraph, _parameters: &Parameters, ctx: &SelectionContext) -> Result<Vec<String>> {
    let candidates = &ctx.graph_config.os_integration;
    select(graph, |task| {
        Ok(candidates
            .get(&task.kind)
            .is_some_and(|sets| sets.iter().any(|attrs| attributes_match(task, attrs))))
    })
}
