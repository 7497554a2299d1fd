//! Reusable task filters composed from matchers.

use ciselect_core::{GraphConfig, Parameters, ShippingPhase, Task};
use regex::Regex;
use serde_json::Value;

use crate::error::{FilterError, Result};
use crate::matchers::{matches_hg_branch, matches_platforms, matches_project, matches_uncommon_try};
use crate::patterns::LabelPattern;

/// Drop tasks that only run on a cron schedule.
pub fn filter_out_cron(task: &Task, _parameters: &Parameters) -> bool {
    !task.attributes.is_truthy("cron")
}

/// Keep build-phase tasks (or tasks with no phase); nightlies always pass.
pub fn filter_out_shipping_phase(task: &Task, _parameters: &Parameters) -> Result<bool> {
    if task.attributes.is_truthy("nightly") {
        return Ok(true);
    }
    Ok(match task.attr_str("shipping_phase")? {
        None => true,
        Some(phase) => ShippingPhase::parse(phase) == Some(ShippingPhase::Build),
    })
}

/// Drop Developer Edition tasks.
pub fn filter_out_devedition(task: &Task, _parameters: &Parameters) -> Result<bool> {
    Ok(task.attr_str("shipping_product")? != Some("devedition"))
}

/// Keep tasks whose `run_on_projects` includes the push's project.
pub fn filter_for_project(task: &Task, parameters: &Parameters, config: &GraphConfig) -> Result<bool> {
    matches_project(task, parameters, config)
}

/// Keep tasks whose `run_on_hg_branches` matches the push's branch.
pub fn filter_for_hg_branch(task: &Task, parameters: &Parameters) -> Result<bool> {
    matches_hg_branch(task, parameters)
}

/// Drop test tasks whose `test_manifests` attribute is present but empty.
///
/// That happens when test-path filtering removed every manifest a chunk ran.
pub fn filter_tests_without_manifests(task: &Task, _parameters: &Parameters) -> bool {
    !(task.kind == "test"
        && task.attributes.contains_key("test_manifests")
        && !task.attributes.is_truthy("test_manifests"))
}

/// Drop tasks that cannot use artifact builds when the push asked for them.
pub fn filter_unsupported_artifact_builds(task: &Task, parameters: &Parameters) -> Result<bool> {
    let requested = matches!(
        parameters.get_path_opt("try_task_config.use-artifact-builds"),
        Some(Value::Bool(true))
    );
    if !requested {
        return Ok(true);
    }
    Ok(task.attr_bool("supports-artifact-builds")?.unwrap_or(true))
}

/// Drop tasks needing a required signoff that has no signoff URL yet.
pub fn filter_out_missing_signoffs(task: &Task, parameters: &Parameters) -> Result<bool> {
    let required = parameters.str_list("required_signoffs")?;
    if required.is_empty() {
        return Ok(true);
    }
    let urls = parameters.object("signoff_urls")?;
    let task_signoffs = task.attr_str_list("required_signoffs")?.unwrap_or_default();

    for signoff in required {
        let signed = urls.is_some_and(|u| u.contains_key(signoff));
        if !signed && task_signoffs.contains(&signoff) {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Keep tasks built on one of `platforms`.
pub fn filter_on_platforms<S: AsRef<str>>(task: &Task, platforms: &[S]) -> Result<bool> {
    matches_platforms(task, platforms)
}

/// Keep tasks that do not run against shippable builds.
pub fn filter_out_shippable(task: &Task) -> bool {
    !task.attributes.is_truthy("shippable")
}

/// Whether a label passes the uncommon-try list plus any extra patterns.
pub fn filter_by_uncommon_try(label: &str, extra: &[LabelPattern]) -> bool {
    matches_uncommon_try(label) && !extra.iter().any(|p| p.is_match(label))
}

/// Inclusion or exclusion for [`filter_by_regex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegexMode {
    /// Label must match some pattern
    Include,
    /// Label must match no pattern
    Exclude,
}

impl std::str::FromStr for RegexMode {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "include" => Ok(Self::Include),
            "exclude" => Ok(Self::Exclude),
            other => Err(FilterError::Mode(other.to_string())),
        }
    }
}

/// Regex inclusion/exclusion over a label. An empty list passes everything.
pub fn filter_by_regex(label: &str, regexes: &[Regex], mode: RegexMode) -> bool {
    if regexes.is_empty() {
        return true;
    }
    let any_match = regexes.iter().any(|r| r.is_match(label));
    match mode {
        RegexMode::Include => any_match,
        RegexMode::Exclude => !any_match,
    }
}

/// The canonical on-push filter: not cron, right project, right branch, has manifests.
pub fn standard_filter(task: &Task, parameters: &Parameters, config: &GraphConfig) -> Result<bool> {
    Ok(filter_out_cron(task, parameters)
        && filter_for_project(task, parameters, config)?
        && filter_for_hg_branch(task, parameters)?
        && filter_tests_without_manifests(task, parameters))
}
