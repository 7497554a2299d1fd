//! Release-branch selectors.

use ciselect_core::{Parameters, TaskGraph};
use ciselect_filters::{filter_out_android_on_esr, filter_release_tasks, standard_filter};

use crate::common::select;
use crate::context::SelectionContext;
use crate::error::Result;
use crate::registry::{selector_fn, RegistryError, SelectorRegistry};

pub(crate) fn register(registry: &mut SelectorRegistry) -> std::result::Result<(), RegistryError> {
    registry.register("mozilla_beta_tasks", selector_fn!(mozilla_beta_tasks))?;
    registry.register("mozilla_release_tasks", selector_fn!(mozilla_release_tasks))?;
    registry.register("mozilla_esr128_tasks", selector_fn!(mozilla_esr128_tasks))?;
    Ok(())
}

fn release_branch_tasks(graph: &TaskGraph, parameters: &Parameters, ctx: &SelectionContext) -> Result<Vec<String>> {
    select(graph, |task| {
        Ok(filter_release_tasks(task, parameters)? && standard_filter(task, parameters, &ctx.graph_config)?)
    })
}

/// Tasks for a push to the beta branch.
pub fn mozilla_beta_tasks(graph: &TaskGraph, parameters: &Parameters, ctx: &SelectionContext) -> Result<Vec<String>> {
    release_branch_tasks(graph, parameters, ctx)
}

/// Tasks for a push to the release branch.
pub fn mozilla_release_tasks(graph: &TaskGraph, parameters: &Parameters, ctx: &SelectionContext) -> Result<Vec<String>> {
    release_branch_tasks(graph, parameters, ctx)
}

/// Tasks for a push to the ESR branch.
pub fn mozilla_esr128_tasks(graph: &TaskGraph, parameters: &Parameters, ctx: &SelectionContext) -> Result<Vec<String>> {
    select(graph, |task| {
        Ok(filter_release_tasks(task, parameters)?
            && standard_filter(task, parameters, &ctx.graph_config)?
            && filter_out_android_on_esr(task, parameters)?)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::fixtures::*;
    use ciselect_core::Task;
    use serde_json::json;

    #[test]
    fn test_esr_excludes_android() {
        let g = graph([
            everywhere("A", "build")
                .with_attribute("build_platform", "linux64")
                .with_attribute("shipping_phase", "build"),
            everywhere("B", "build")
                .with_attribute("build_platform", "android-arm")
                .with_attribute("shipping_phase", "build"),
        ]);
        let p = params(json!({
            "project": "mozilla-esr128",
            "release_type": "esr128",
            "hg_branch": "default",
            "required_signoffs": [],
            "signoff_urls": {}
        }));
        assert_eq!(mozilla_esr128_tasks(&g, &p, &ctx()).unwrap(), vec!["A"]);
    }

    #[test]
    fn test_beta_uses_release_filter() {
        let g = graph([
            everywhere("build-linux64/opt", "build")
                .with_attribute("build_platform", "linux64")
                .with_attribute("build_type", "opt"),
            everywhere("build-linux64-shippable/opt", "build")
                .with_attribute("build_platform", "linux64-shippable")
                .with_attribute("build_type", "opt"),
            everywhere("build-android/opt", "build")
                .with_attribute("build_platform", "android-arm")
                .with_attribute("build_type", "opt"),
            Task::new("central-only", "build").with_attribute("run_on_projects", vec!["mozilla-central"]),
        ]);
        let p = params(json!({"project": "mozilla-beta", "release_type": "beta"}));
        assert_eq!(
            mozilla_beta_tasks(&g, &p, &ctx()).unwrap(),
            vec!["build-linux64-shippable/opt", "build-android/opt"]
        );
        let p = params(json!({"project": "mozilla-release", "release_type": "release"}));
        assert_eq!(mozilla_release_tasks(&g, &p, &ctx()).unwrap().len(), 2);
    }
}
