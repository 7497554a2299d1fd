//! Nightly selectors.
//!
//! Every nightly selector is guarded against replays: in automation, a
//! decision already indexed for the same trust domain, project and revision
//! means the nightly was scheduled before and nothing is selected.

use std::sync::Arc;

use ciselect_core::{Parameters, Task, TaskGraph};
use ciselect_filters::{filter_for_project, filter_on_platforms};

use crate::common::{select, union};
use crate::context::SelectionContext;
use crate::error::Result;
use crate::guard::GuardedSelector;
use crate::registry::{RegistryError, SelectorRegistry};

const NIGHTLIES: &[GuardedSelector] = &[
    GuardedSelector::new("nightly_linux", nightly_linux),
    GuardedSelector::new("nightly_macosx", nightly_macosx),
    GuardedSelector::new("nightly_win32", nightly_win32),
    GuardedSelector::new("nightly_win64", nightly_win64),
    GuardedSelector::new("nightly_win64_aarch64", nightly_win64_aarch64),
    GuardedSelector::new("nightly_asan", nightly_asan),
    GuardedSelector::new("nightly_android", nightly_android),
    GuardedSelector::new("nightly_desktop", nightly_desktop),
    GuardedSelector::new("nightly_all", nightly_all),
];

pub(crate) fn register(registry: &mut SelectorRegistry) -> std::result::Result<(), RegistryError> {
    for nightly in NIGHTLIES {
        registry.register(nightly.name(), Arc::new(*nightly))?;
    }
    Ok(())
}

/// Shippable desktop nightly tasks on `platforms`, or on no platform at all
/// when `platforms` is `None`.
fn desktop_nightly_filter(
    task: &Task,
    parameters: &Parameters,
    ctx: &SelectionContext,
    platforms: Option<&[&str]>,
) -> Result<bool> {
    let on_platform = match platforms {
        Some(platforms) => filter_on_platforms(task, platforms)?,
        None => task.attr_str("build_platform")?.is_none(),
    };
    Ok(on_platform
        && filter_for_project(task, parameters, &ctx.graph_config)?
        && task.attributes.is_truthy("shippable")
        // tests and nightly-only builds carry no shipping_product
        && matches!(
            task.attr_str("shipping_product")?,
            None | Some("firefox") | Some("thunderbird")
        )
        && task.kind != "l10n")
}

fn desktop_nightly(
    graph: &TaskGraph,
    parameters: &Parameters,
    ctx: &SelectionContext,
    platforms: &[&str],
) -> Result<Vec<String>> {
    select(graph, |task| desktop_nightly_filter(task, parameters, ctx, Some(platforms)))
}

/// Linux nightly builds and their tests.
pub fn nightly_linux(graph: &TaskGraph, parameters: &Parameters, ctx: &SelectionContext) -> Result<Vec<String>> {
    desktop_nightly(
        graph,
        parameters,
        ctx,
        &["linux64-shippable", "linux-shippable", "linux64-aarch64-shippable"],
    )
}

/// macOS nightly builds and their tests.
pub fn nightly_macosx(graph: &TaskGraph, parameters: &Parameters, ctx: &SelectionContext) -> Result<Vec<String>> {
    desktop_nightly(graph, parameters, ctx, &["macosx64-shippable"])
}

/// 32-bit Windows nightly builds and their tests.
pub fn nightly_win32(graph: &TaskGraph, parameters: &Parameters, ctx: &SelectionContext) -> Result<Vec<String>> {
    desktop_nightly(graph, parameters, ctx, &["win32-shippable"])
}

/// 64-bit Windows nightly builds and their tests.
pub fn nightly_win64(graph: &TaskGraph, parameters: &Parameters, ctx: &SelectionContext) -> Result<Vec<String>> {
    desktop_nightly(graph, parameters, ctx, &["win64-shippable"])
}

/// Windows on ARM nightly builds and their tests.
pub fn nightly_win64_aarch64(
    graph: &TaskGraph,
    parameters: &Parameters,
    ctx: &SelectionContext,
) -> Result<Vec<String>> {
    desktop_nightly(graph, parameters, ctx, &["win64-aarch64-shippable"])
}

/// ASan reporter nightlies.
pub fn nightly_asan(graph: &TaskGraph, parameters: &Parameters, ctx: &SelectionContext) -> Result<Vec<String>> {
    desktop_nightly(
        graph,
        parameters,
        ctx,
        &["linux64-asan-reporter-shippable", "win64-asan-reporter-shippable"],
    )
}

/// GeckoView publication plus the nightly variants of the Android apps.
pub fn nightly_android(graph: &TaskGraph, _parameters: &Parameters, _ctx: &SelectionContext) -> Result<Vec<String>> {
    const NIGHTLY_BUILD_TYPES: &[&str] = &[
        "nightly",
        "focus-nightly",
        "fenix-nightly",
        "fenix-nightly-firebase",
        "focus-nightly-firebase",
    ];
    select(graph, |task| {
        if task.attr_str("shipping_product")? == Some("fennec")
            && matches!(task.kind.as_str(), "beetmover-geckoview" | "upload-symbols")
        {
            return Ok(true);
        }
        let build_type = task.attr_str_or_empty("build-type")?;
        Ok(NIGHTLY_BUILD_TYPES.contains(&build_type))
    })
}

/// Every desktop nightly, plus release tasks that are not platform specific.
pub fn nightly_desktop(graph: &TaskGraph, parameters: &Parameters, ctx: &SelectionContext) -> Result<Vec<String>> {
    let agnostic = select(graph, |task| desktop_nightly_filter(task, parameters, ctx, None))?;
    Ok(union(
        graph,
        &[
            nightly_win32(graph, parameters, ctx)?,
            nightly_win64(graph, parameters, ctx)?,
            nightly_win64_aarch64(graph, parameters, ctx)?,
            nightly_macosx(graph, parameters, ctx)?,
            nightly_linux(graph, parameters, ctx)?,
            nightly_asan(graph, parameters, ctx)?,
            agnostic,
        ],
    ))
}

/// Desktop and Android nightlies.
pub fn nightly_all(graph: &TaskGraph, parameters: &Parameters, ctx: &SelectionContext) -> Result<Vec<String>> {
    Ok(union(
        graph,
        &[
            nightly_desktop(graph, parameters, ctx)?,
            nightly_android(graph, parameters, ctx)?,
        ],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::fixtures::*;
    use crate::context::Environment;
    use crate::error::SelectError;
    use crate::registry::TargetTaskSelector;
    use ciselect_collab::memory::MemoryIndexer;
    use ciselect_collab::RetryPolicy;
    use serde_json::json;

    const LINUX_PATH: &str = "gecko.v2.mozilla-central.revision.abc123.taskgraph.decision-nightly-linux";

    fn nightly_task(label: &str, platform: &str) -> Task {
        everywhere(label, "build")
            .with_attribute("build_platform", platform)
            .with_attribute("shippable", true)
            .with_attribute("nightly", true)
    }

    fn nightly_graph() -> TaskGraph {
        graph([
            nightly_task("build-linux64-shippable/opt", "linux64-shippable"),
            nightly_task("build-win64-shippable/opt", "win64-shippable"),
            nightly_task("build-win64-devedition/opt", "win64-shippable")
                .with_attribute("shipping_product", "devedition"),
            everywhere("release-notify", "release-notify").with_attribute("shippable", true),
            everywhere("build-linux64/opt", "build").with_attribute("build_platform", "linux64"),
            Task::new("beetmover-geckoview-arm", "beetmover-geckoview")
                .with_attribute("shipping_product", "fennec"),
            Task::new("signing-fenix-nightly", "signing").with_attribute("build-type", "fenix-nightly"),
        ])
    }

    fn central() -> Parameters {
        params(json!({"project": "mozilla-central", "head_rev": "abc123"}))
    }

    fn linux() -> GuardedSelector {
        NIGHTLIES[0]
    }

    #[tokio::test]
    async fn test_replayed_nightly_selects_nothing() {
        let indexer = Arc::new(MemoryIndexer::new().with_task(LINUX_PATH, "decision-1"));
        let ctx = ctx().with_env(Environment::automation()).with_indexer(indexer.clone());

        let labels = linux().select(&nightly_graph(), &central(), &ctx).await.unwrap();
        assert!(labels.is_empty());
        assert_eq!(indexer.lookups().await, vec![LINUX_PATH]);
    }

    #[tokio::test]
    async fn test_first_nightly_selects_and_claims_path() {
        let indexer = Arc::new(MemoryIndexer::new());
        let ctx = ctx()
            .with_env(Environment::automation().with_task_id("decision-2"))
            .with_indexer(indexer.clone());

        let labels = linux().select(&nightly_graph(), &central(), &ctx).await.unwrap();
        assert_eq!(labels, vec!["build-linux64-shippable/opt"]);
        assert_eq!(indexer.get(LINUX_PATH).await.as_deref(), Some("decision-2"));
    }

    #[tokio::test]
    async fn test_guard_skipped_outside_automation() {
        let indexer = Arc::new(MemoryIndexer::new().with_task(LINUX_PATH, "decision-1"));
        let ctx = ctx().with_indexer(indexer.clone());
        // no head_rev needed when the guard is off
        let p = params(json!({"project": "mozilla-central"}));

        let labels = linux().select(&nightly_graph(), &p, &ctx).await.unwrap();
        assert_eq!(labels, vec!["build-linux64-shippable/opt"]);
        assert!(indexer.lookups().await.is_empty());
    }

    #[tokio::test]
    async fn test_guard_retries_transient_lookups() {
        let flaky = Arc::new(MemoryIndexer::new().failing_lookups(2));
        let ctx = ctx()
            .with_env(Environment::automation())
            .with_indexer(flaky.clone())
            .with_retry(RetryPolicy::immediate(3));
        let labels = linux().select(&nightly_graph(), &central(), &ctx).await.unwrap();
        assert_eq!(labels.len(), 1);
        assert_eq!(flaky.lookups().await.len(), 3);

        let down = Arc::new(MemoryIndexer::new().failing_lookups(5));
        let ctx = ctx
            .with_indexer(down)
            .with_retry(RetryPolicy::immediate(3));
        let result = linux().select(&nightly_graph(), &central(), &ctx).await;
        assert!(matches!(result, Err(SelectError::Collab(_))));
    }

    #[test]
    fn test_desktop_union_includes_platform_agnostic_tasks() {
        let labels = nightly_desktop(&nightly_graph(), &central(), &ctx()).unwrap();
        assert_eq!(
            labels,
            vec!["build-linux64-shippable/opt", "build-win64-shippable/opt", "release-notify"]
        );
    }

    #[test]
    fn test_android_and_all() {
        let g = nightly_graph();
        assert_eq!(
            nightly_android(&g, &central(), &ctx()).unwrap(),
            vec!["beetmover-geckoview-arm", "signing-fenix-nightly"]
        );
        assert_eq!(nightly_all(&g, &central(), &ctx()).unwrap().len(), 5);
    }
}
