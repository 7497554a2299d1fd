//! Attribute matchers - pure predicates over one task.

use ciselect_core::{GraphConfig, Parameters, Task};
use std::collections::BTreeSet;

use crate::error::Result;
use crate::patterns::{anchored, uncommon_try_patterns};

/// Branches that run the full release pipeline.
pub const RELEASE_PROJECTS: &[&str] = &[
    "mozilla-central",
    "mozilla-beta",
    "mozilla-release",
    "mozilla-esr115",
    "mozilla-esr128",
    "comm-central",
    "comm-beta",
    "comm-release",
    "comm-esr115",
    "comm-esr128",
];

/// Integration branches that land into trunk.
pub const INTEGRATION_PROJECTS: &[&str] = &["autoland"];

/// Trunk branches, in addition to integration ones.
pub const TRUNK_PROJECTS: &[&str] = &["mozilla-central", "comm-central"];

/// Project that accepts every integration and release task.
const TOOLCHAINS_PROJECT: &str = "toolchains";

/// Whether `project` is in the expanded `run_on_projects` set.
///
/// Tokens: `all` matches everything, `integration`/`release`/`trunk` match the
/// corresponding branch families, anything else is a literal project name.
pub fn match_run_on_projects<S: AsRef<str>>(
    project: &str,
    run_on_projects: &[S],
    extra_release: &[String],
) -> bool {
    let has = |token: &str| run_on_projects.iter().any(|p| p.as_ref() == token);

    if has("all") {
        return true;
    }
    if has("integration")
        && (INTEGRATION_PROJECTS.contains(&project) || project == TOOLCHAINS_PROJECT)
    {
        return true;
    }
    if has("release")
        && (RELEASE_PROJECTS.contains(&project)
            || extra_release.iter().any(|p| p == project)
            || project == TOOLCHAINS_PROJECT)
    {
        return true;
    }
    if has("trunk")
        && (TRUNK_PROJECTS.contains(&project) || INTEGRATION_PROJECTS.contains(&project))
    {
        return true;
    }
    has(project)
}

/// Whether the task runs on the push's project. Absent `run_on_projects` matches nothing.
pub fn matches_project(task: &Task, parameters: &Parameters, config: &GraphConfig) -> Result<bool> {
    let run_on_projects = task.attr_str_list("run_on_projects")?.unwrap_or_default();
    if run_on_projects.is_empty() {
        return Ok(false);
    }
    Ok(match_run_on_projects(
        parameters.project()?,
        &run_on_projects,
        &config.release_projects,
    ))
}

/// Whether the task runs on the push's hg branch.
///
/// Each `run_on_hg_branches` entry is a regex anchored at both ends; absent
/// means `["all"]`.
pub fn matches_hg_branch(task: &Task, parameters: &Parameters) -> Result<bool> {
    let Some(branches) = task.attr_str_list("run_on_hg_branches")? else {
        return Ok(true);
    };
    if branches.contains(&"all") {
        return Ok(true);
    }
    let hg_branch = parameters.str_or("hg_branch", "default")?;
    for expected in branches {
        if anchored(expected)?.is_match(hg_branch) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Whether the task's build platform is one of `platforms`.
pub fn matches_platforms<S: AsRef<str>>(task: &Task, platforms: &[S]) -> Result<bool> {
    Ok(match task.attr_str("build_platform")? {
        Some(platform) => platforms.iter().any(|p| p.as_ref() == platform),
        None => false,
    })
}

/// Whether the task carries every tag in `required`.
pub fn matches_tags(task: &Task, required: &BTreeSet<String>) -> Result<bool> {
    if required.is_empty() {
        return Ok(true);
    }
    let Some(tags) = task.attr_str_list("tags")? else {
        return Ok(false);
    };
    Ok(required.iter().all(|r| tags.contains(&r.as_str())))
}

/// True when the label matches none of the uncommon-try patterns.
pub fn matches_uncommon_try(label: &str) -> bool {
    !uncommon_try_patterns().iter().any(|p| p.is_match(label))
}

/// Platform family of a build platform: `android`, `linux`, `macosx`, `windows` or empty.
pub fn platform_family(build_platform: &str) -> &'static str {
    if build_platform.contains("android") {
        "android"
    } else if build_platform.contains("linux") {
        "linux"
    } else if build_platform.contains("macosx") {
        "macosx"
    } else if build_platform.contains("win") {
        "windows"
    } else {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: serde_json::Value) -> Parameters {
        Parameters::from_value(value).unwrap()
    }

    #[test]
    fn test_match_run_on_projects_tokens() {
        let none: &[String] = &[];
        assert!(match_run_on_projects("try", &["all"], none));
        assert!(match_run_on_projects("autoland", &["integration"], none));
        assert!(!match_run_on_projects("mozilla-beta", &["integration"], none));
        assert!(match_run_on_projects("mozilla-beta", &["release"], none));
        assert!(match_run_on_projects("toolchains", &["release"], none));
        assert!(match_run_on_projects("autoland", &["trunk"], none));
        assert!(match_run_on_projects("mozilla-central", &["trunk"], none));
        assert!(!match_run_on_projects("mozilla-release", &["trunk"], none));
        assert!(match_run_on_projects("oak", &["oak"], none));
        assert!(!match_run_on_projects("oak", &[] as &[&str], none));
    }

    #[test]
    fn test_release_token_extended_by_config() {
        let extra = vec!["mozilla-esr140".to_string()];
        assert!(!match_run_on_projects("mozilla-esr140", &["release"], &[]));
        assert!(match_run_on_projects("mozilla-esr140", &["release"], &extra));
    }

    #[test]
    fn test_matches_project_absent_attribute() {
        let config = GraphConfig::new("gecko");
        let p = params(json!({"project": "autoland"}));
        let task = Task::new("t", "build");
        assert!(!matches_project(&task, &p, &config).unwrap());

        let task = task.with_attribute("run_on_projects", vec!["all"]);
        assert!(matches_project(&task, &p, &config).unwrap());
    }

    #[test]
    fn test_matches_hg_branch() {
        let p = params(json!({"project": "mozilla-beta", "hg_branch": "GECKO_128_RELBRANCH"}));
        assert!(matches_hg_branch(&Task::new("t", "build"), &p).unwrap());

        let task = Task::new("t", "build").with_attribute("run_on_hg_branches", vec!["GECKO_[0-9]+_RELBRANCH"]);
        assert!(matches_hg_branch(&task, &p).unwrap());

        let task = Task::new("t", "build").with_attribute("run_on_hg_branches", vec!["GECKO"]);
        assert!(!matches_hg_branch(&task, &p).unwrap());

        let task = Task::new("t", "build").with_attribute("run_on_hg_branches", vec!["all"]);
        assert!(matches_hg_branch(&task, &p).unwrap());
    }

    #[test]
    fn test_matches_hg_branch_bad_regex_is_fatal() {
        let p = params(json!({"hg_branch": "default"}));
        let task = Task::new("t", "build").with_attribute("run_on_hg_branches", vec!["(default"]);
        assert!(matches_hg_branch(&task, &p).is_err());
    }

    #[test]
    fn test_matches_tags() {
        let required: BTreeSet<String> = ["devtools".to_string()].into();
        let tagged = Task::new("t", "test").with_attribute("tags", vec!["devtools", "webextensions"]);
        let untagged = Task::new("u", "test");

        assert!(matches_tags(&tagged, &required).unwrap());
        assert!(!matches_tags(&untagged, &required).unwrap());
        assert!(matches_tags(&untagged, &BTreeSet::new()).unwrap());
    }

    #[test]
    fn test_matches_uncommon_try() {
        assert!(matches_uncommon_try("build-linux64/opt"));
        assert!(!matches_uncommon_try("build-linux-shippable/opt"));
        assert!(!matches_uncommon_try("test-linux1804-64-ccov/opt-xpcshell"));
        assert!(!matches_uncommon_try("build-linux64-valgrind/opt"));
    }

    #[test]
    fn test_platform_family() {
        assert_eq!(platform_family("android-arm"), "android");
        assert_eq!(platform_family("linux64-asan"), "linux");
        assert_eq!(platform_family("macosx64-shippable"), "macosx");
        assert_eq!(platform_family("win64-aarch64"), "windows");
        assert_eq!(platform_family("ios"), "");
    }

    #[test]
    fn test_matches_platforms() {
        let task = Task::new("t", "build").with_attribute("build_platform", "linux64-shippable");
        assert!(matches_platforms(&task, &["linux64-shippable", "linux-shippable"]).unwrap());
        assert!(!matches_platforms(&task, &["win64-shippable"]).unwrap());
        assert!(!matches_platforms(&Task::new("u", "build"), &["linux64"]).unwrap());
    }
}
