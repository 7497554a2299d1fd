//! Default and integration-branch selectors.

use ciselect_core::{Parameters, Task, TaskGraph};
use ciselect_filters::{filter_out_shippable, platform_family};

use crate::common::{default_filter, select};
use crate::context::SelectionContext;
use crate::error::Result;
use crate::registry::{selector_fn, RegistryError, SelectorRegistry};

pub(crate) fn register(registry: &mut SelectorRegistry) -> std::result::Result<(), RegistryError> {
    registry.register("default", selector_fn!(default_tasks))?;
    registry.register("autoland_tasks", selector_fn!(autoland_tasks))?;
    registry.alias("autoland", "autoland_tasks")?;
    registry.register("mozilla_central_tasks", selector_fn!(mozilla_central_tasks))?;
    registry.alias("mozilla_central", "mozilla_central_tasks")?;
    registry.register("graphics_tasks", selector_fn!(graphics_tasks))?;
    registry.alias("graphics", "graphics_tasks")?;
    Ok(())
}

/// Everything that runs on push for the current project.
pub fn default_tasks(graph: &TaskGraph, parameters: &Parameters, ctx: &SelectionContext) -> Result<Vec<String>> {
    select(graph, |task| default_filter(task, parameters, ctx))
}

/// Default tasks minus shippable opt tests, unless the push is a backstop.
pub fn autoland_tasks(graph: &TaskGraph, parameters: &Parameters, ctx: &SelectionContext) -> Result<Vec<String>> {
    let backstop = parameters.bool_or("backstop", false)?;
    select(graph, |task| {
        if !default_filter(task, parameters, ctx)? {
            return Ok(false);
        }
        if task.kind != "test" || backstop {
            return Ok(true);
        }
        if task.attr_str("build_type")? != Some("opt") {
            return Ok(true);
        }
        Ok(filter_out_shippable(task))
    })
}

/// Whether a test runs against a plain opt build (not shippable, asan, tsan, ...).
///
/// Android has no variants besides shippable; elsewhere plain platforms have
/// no `-` in their name.
fn is_regular_opt_test(task: &Task) -> Result<bool> {
    let (Some(build_platform), Some(build_type)) = (task.attr_str("build_platform")?, task.attr_str("build_type")?)
    else {
        return Ok(false);
    };
    if build_type != "opt" {
        return Ok(false);
    }
    Ok(match platform_family(build_platform) {
        "android" => !task.attributes.is_truthy("shippable"),
        _ => !build_platform.contains('-'),
    })
}

/// Default tasks minus tests against plain opt builds.
pub fn mozilla_central_tasks(graph: &TaskGraph, parameters: &Parameters, ctx: &SelectionContext) -> Result<Vec<String>> {
    select(graph, |task| {
        if !default_filter(task, parameters, ctx)? {
            return Ok(false);
        }
        if task.kind != "test" {
            return Ok(true);
        }
        Ok(!is_regular_opt_test(task)?)
    })
}

/// Mochitest flavours graphics work still cares about.
const GRAPHICS_MOCHITESTS: &[&str] = &["mochitest-webgl", "mochitest-webgpu", "mochitest-gpu"];

/// Default tasks minus mochitest and xpcshell suites unrelated to graphics.
pub fn graphics_tasks(graph: &TaskGraph, parameters: &Parameters, ctx: &SelectionContext) -> Result<Vec<String>> {
    select(graph, |task| {
        if !default_filter(task, parameters, ctx)? {
            return Ok(false);
        }
        if task.kind != "test" {
            return Ok(true);
        }
        let suite = task.attr_str_or_empty("unittest_suite")?;
        if suite.starts_with("xpcshell") {
            return Ok(false);
        }
        if suite.starts_with("mochitest") {
            return Ok(GRAPHICS_MOCHITESTS.iter().any(|m| suite.starts_with(m)));
        }
        Ok(true)
    })
}
