//! Release simulation, code review and reduced per-branch selectors.

use serde_json::Value;

use ciselect_core::{JsonMap, Parameters, Task, TaskGraph};
use ciselect_filters::{filter_for_project, filter_out_android_on_esr, filter_out_cron, filter_release_tasks};

use crate::common::{default_filter, select};
use crate::context::SelectionContext;
use crate::error::{Result, SelectError};
use crate::registry::{selector_fn, RegistryError, SelectorRegistry};

pub(crate) fn register(registry: &mut SelectorRegistry) -> std::result::Result<(), RegistryError> {
    registry.register("release_simulation", selector_fn!(release_simulation))?;
    registry.register("staging_release_builds", selector_fn!(staging_release_builds))?;
    registry.register("codereview", selector_fn!(codereview))?;
    registry.register("cypress_tasks", selector_fn!(cypress_tasks))?;
    registry.register("pine_tasks", selector_fn!(pine_tasks))?;
    registry.register("larch_tasks", selector_fn!(larch_tasks))?;
    registry.register("kaios_tasks", selector_fn!(kaios_tasks))?;
    registry.register("nothing", selector_fn!(nothing))?;
    Ok(())
}

/// Branch a release type ships from.
fn simulated_project(release_type: &str) -> Option<&'static str> {
    match release_type {
        "nightly" => Some("mozilla-central"),
        "beta" => Some("mozilla-beta"),
        "release" => Some("mozilla-release"),
        "esr128" => Some("mozilla-esr128"),
        _ => None,
    }
}

/// Parameters as seen from the branch the release type ships from.
fn simulated(parameters: &Parameters) -> Result<Parameters> {
    let release_type = parameters.release_type()?;
    let project = simulated_project(release_type)
        .ok_or_else(|| SelectError::SimulationReleaseType(release_type.to_string()))?;
    let mut overrides = JsonMap::new();
    overrides.insert("project".to_string(), Value::String(project.to_string()));
    Ok(parameters.with_overrides(overrides))
}

/// What a push to the release branch would run, from a staging repository.
pub fn release_simulation(graph: &TaskGraph, parameters: &Parameters, ctx: &SelectionContext) -> Result<Vec<String>> {
    let target = simulated(parameters)?;
    select(graph, |task| {
        Ok(filter_release_tasks(task, &target)?
            && filter_out_cron(task, &target)
            && filter_for_project(task, &target, &ctx.graph_config)?
            && filter_out_android_on_esr(task, &target)?)
    })
}

/// Build-phase tasks of shipped products, for staging releases.
pub fn staging_release_builds(
    graph: &TaskGraph,
    parameters: &Parameters,
    ctx: &SelectionContext,
) -> Result<Vec<String>> {
    let target = simulated(parameters)?;
    let beta = target.release_type()? == "beta";
    select(graph, |task| {
        if task.attr_str_or_empty("shipping_product")?.is_empty() {
            return Ok(false);
        }
        if !filter_out_android_on_esr(task, &target)? {
            return Ok(false);
        }
        if !beta && task.attr_str_or_empty("build_platform")?.contains("devedition") {
            return Ok(false);
        }
        Ok(task.attr_str("shipping_phase")? == Some("build")
            && filter_for_project(task, &target, &ctx.graph_config)?)
    })
}

/// Code review analyzers.
pub fn codereview(graph: &TaskGraph, _parameters: &Parameters, _ctx: &SelectionContext) -> Result<Vec<String>> {
    select(graph, |task| {
        Ok(task.kind == "code-review" || task.attr_bool("code-review")?.unwrap_or(false))
    })
}

fn is_android(task: &Task) -> Result<bool> {
    Ok(task.attr_str_or_empty("build_platform")?.contains("android"))
}

fn is_reftest_or_wpt(task: &Task) -> Result<bool> {
    let suite = task.attr_str_or_empty("unittest_suite")?;
    Ok(suite.contains("reftest") || suite.starts_with("web-platform-tests"))
}

fn is_perf_test(task: &Task) -> Result<bool> {
    Ok(matches!(task.attr_str("unittest_suite")?, Some("talos") | Some("raptor")))
}

/// Default tasks without Android.
pub fn cypress_tasks(graph: &TaskGraph, parameters: &Parameters, ctx: &SelectionContext) -> Result<Vec<String>> {
    select(graph, |task| Ok(default_filter(task, parameters, ctx)? && !is_android(task)?))
}

/// Default tasks without Android, reftests or web-platform-tests.
pub fn pine_tasks(graph: &TaskGraph, parameters: &Parameters, ctx: &SelectionContext) -> Result<Vec<String>> {
    select(graph, |task| {
        Ok(default_filter(task, parameters, ctx)? && !is_android(task)? && !is_reftest_or_wpt(task)?)
    })
}

/// Pine's set without performance tests.
pub fn larch_tasks(graph: &TaskGraph, parameters: &Parameters, ctx: &SelectionContext) -> Result<Vec<String>> {
    select(graph, |task| {
        Ok(default_filter(task, parameters, ctx)?
            && !is_android(task)?
            && !is_reftest_or_wpt(task)?
            && !is_perf_test(task)?)
    })
}

/// KaiOS has no tasks in this graph.
pub fn kaios_tasks(_graph: &TaskGraph, _parameters: &Parameters, _ctx: &SelectionContext) -> Result<Vec<String>> {
    Ok(Vec::new())
}

/// Schedule nothing, e.g. for `DONTBUILD` pushes.
pub fn nothing(_graph: &TaskGraph, _parameters: &Parameters, _ctx: &SelectionContext) -> Result<Vec<String>> {
    Ok(Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::fixtures::*;
    use serde_json::json;

    #[test]
    fn test_codereview() {
        let g = graph([
            Task::new("A", "code-review"),
            Task::new("B", "test").with_attribute("code-review", true),
            Task::new("C", "test"),
        ]);
        let p = params(json!({"project": "try"}));
        assert_eq!(codereview(&g, &p, &ctx()).unwrap(), vec!["A", "B"]);
    }

    #[test]
    fn test_nothing() {
        let g = graph([everywhere("a", "build")]);
        let p = params(json!({"project": "autoland"}));
        assert!(nothing(&g, &p, &ctx()).unwrap().is_empty());
        assert!(kaios_tasks(&g, &p, &ctx()).unwrap().is_empty());
    }

    fn simulation_graph() -> TaskGraph {
        graph([
            Task::new("build-linux64-shippable/opt", "build")
                .with_attribute("run_on_projects", vec!["mozilla-beta", "mozilla-release"])
                .with_attribute("build_platform", "linux64-shippable")
                .with_attribute("shipping_product", "firefox")
                .with_attribute("shipping_phase", "build"),
            Task::new("build-android-shippable/opt", "build")
                .with_attribute("run_on_projects", vec!["release"])
                .with_attribute("build_platform", "android-arm-shippable")
                .with_attribute("shipping_product", "fennec")
                .with_attribute("shipping_phase", "build"),
            Task::new("central-only", "build")
                .with_attribute("run_on_projects", vec!["mozilla-central"])
                .with_attribute("shipping_product", "firefox")
                .with_attribute("shipping_phase", "build"),
        ])
    }

    #[test]
    fn test_release_simulation_uses_simulated_project() {
        let p = params(json!({"project": "maple", "release_type": "beta"}));
        let labels = release_simulation(&simulation_graph(), &p, &ctx()).unwrap();
        assert_eq!(labels, vec!["build-linux64-shippable/opt", "build-android-shippable/opt"]);

        let release = params(json!({"project": "maple", "release_type": "release"}));
        assert_eq!(
            staging_release_builds(&simulation_graph(), &release, &ctx()).unwrap(),
            vec!["build-linux64-shippable/opt", "build-android-shippable/opt"]
        );
        let esr = params(json!({"project": "maple", "release_type": "esr128"}));
        assert!(staging_release_builds(&simulation_graph(), &esr, &ctx()).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_simulated_release_type() {
        let p = params(json!({"project": "maple", "release_type": "aurora"}));
        assert!(matches!(
            release_simulation(&simulation_graph(), &p, &ctx()),
            Err(SelectError::SimulationReleaseType(t)) if t == "aurora"
        ));
    }

    #[test]
    fn test_reduced_branches() {
        let g = graph([
            everywhere("build-linux64/opt", "build").with_attribute("build_platform", "linux64"),
            everywhere("build-android/opt", "build").with_attribute("build_platform", "android-arm"),
            everywhere("test-reftest", "test").with_attribute("unittest_suite", "reftest"),
            everywhere("test-wpt", "test").with_attribute("unittest_suite", "web-platform-tests"),
            everywhere("test-talos", "test").with_attribute("unittest_suite", "talos"),
        ]);
        let p = params(json!({"project": "pine"}));
        assert_eq!(cypress_tasks(&g, &p, &ctx()).unwrap().len(), 4);
        assert_eq!(pine_tasks(&g, &p, &ctx()).unwrap(), vec!["build-linux64/opt", "test-talos"]);
        assert_eq!(larch_tasks(&g, &p, &ctx()).unwrap(), vec!["build-linux64/opt"]);
    }
}
