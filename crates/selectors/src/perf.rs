//! Performance-testing cron selectors.
//!
//! Most of these pick raptor/browsertime tests by their try name on the
//! shippable platforms perf testing runs on.

use ciselect_core::{Parameters, Task, TaskGraph};
use ciselect_filters::{accept_raptor_android_build, accept_raptor_desktop_build};

use crate::common::select;
use crate::context::SelectionContext;
use crate::error::Result;
use crate::registry::{selector_fn, RegistryError, SelectorRegistry};

pub(crate) fn register(registry: &mut SelectorRegistry) -> std::result::Result<(), RegistryError> {
    registry.register("daily_beta_perf", selector_fn!(daily_beta_perf))?;
    registry.register("perftest", selector_fn!(perftest))?;
    registry.register("perftest-on-autoland", selector_fn!(perftest_on_autoland))?;
    registry.register("condprof", selector_fn!(condprof))?;
    registry.register("custom-car_perf_testing", selector_fn!(custom_car_perf_testing))?;
    registry.register("general_perf_testing", selector_fn!(general_perf_testing))?;
    registry.register("geckoview-perftest", selector_fn!(geckoview_perftest))?;
    registry.register("sp-perftests", selector_fn!(speedometer_tests))?;
    registry.register("raptor_tp6m", selector_fn!(raptor_tp6m))?;
    registry.register("linux64_clang_trunk_perf", selector_fn!(linux64_clang_trunk_perf))?;
    Ok(())
}

/// A raptor test on a perf platform, with its try name.
fn raptor_test(task: &Task) -> Result<Option<(&str, &str)>> {
    if task.attr_str("unittest_suite")? != Some("raptor") {
        return Ok(None);
    }
    let platform = task.attr_str_or_empty("test_platform")?;
    if !(accept_raptor_desktop_build(platform) || accept_raptor_android_build(platform)) {
        return Ok(None);
    }
    let try_name = task.attr_str("raptor_try_name")?.unwrap_or(&task.label);
    Ok(Some((platform, try_name)))
}

fn is_cron_perftest(task: &Task) -> Result<bool> {
    Ok(task.kind == "perftest" && task.attr_bool("cron")?.unwrap_or(false))
}

/// Talos and raptor tests run daily against beta.
pub fn daily_beta_perf(graph: &TaskGraph, _parameters: &Parameters, _ctx: &SelectionContext) -> Result<Vec<String>> {
    select(graph, |task| {
        let suite = task.attr_str("unittest_suite")?;
        if !matches!(suite, Some("talos") | Some("raptor")) {
            return Ok(false);
        }
        let platform = task.attr_str_or_empty("test_platform")?;
        if !(accept_raptor_desktop_build(platform) || accept_raptor_android_build(platform)) {
            return Ok(false);
        }
        let try_name = task
            .attr_str("raptor_try_name")?
            .or(task.attr_str("talos_try_name")?)
            .unwrap_or(&task.label);
        Ok(!try_name.contains("-profiling"))
    })
}

/// Scheduled mozperftest runs.
pub fn perftest(graph: &TaskGraph, _parameters: &Parameters, _ctx: &SelectionContext) -> Result<Vec<String>> {
    select(graph, is_cron_perftest)
}

/// Scheduled mozperftest runs meant for autoland.
pub fn perftest_on_autoland(
    graph: &TaskGraph,
    _parameters: &Parameters,
    _ctx: &SelectionContext,
) -> Result<Vec<String>> {
    select(graph, |task| Ok(is_cron_perftest(task)? && task.label.contains("-view")))
}

/// Conditioned profile builds; the A51 devices are retired.
pub fn condprof(graph: &TaskGraph, _parameters: &Parameters, _ctx: &SelectionContext) -> Result<Vec<String>> {
    select(graph, |task| Ok(task.kind == "condprof" && !task.label.contains("a51")))
}

/// Browsertime tests against custom Chromium builds.
pub fn custom_car_perf_testing(
    graph: &TaskGraph,
    _parameters: &Parameters,
    _ctx: &SelectionContext,
) -> Result<Vec<String>> {
    select(graph, |task| {
        let Some((platform, try_name)) = raptor_test(task)? else {
            return Ok(false);
        };
        if !try_name.contains("browsertime") {
            return Ok(false);
        }
        if !(try_name.contains("custom-car") || try_name.contains("cstm-car-m")) {
            return Ok(false);
        }
        // S24 only runs speedometer3
        Ok(!platform.contains("hw-s24") || try_name.contains("speedometer3"))
    })
}

/// The general browsertime suite on Firefox.
pub fn general_perf_testing(
    graph: &TaskGraph,
    _parameters: &Parameters,
    _ctx: &SelectionContext,
) -> Result<Vec<String>> {
    select(graph, |task| {
        let Some((_, try_name)) = raptor_test(task)? else {
            return Ok(false);
        };
        Ok(try_name.contains("browsertime")
            && !try_name.contains("network-bench")
            && !try_name.contains("custom-car")
            && !try_name.contains("cstm-car-m")
            && !try_name.contains("chrome"))
    })
}

/// Scheduled mozperftest runs of GeckoView on Android.
pub fn geckoview_perftest(
    graph: &TaskGraph,
    _parameters: &Parameters,
    _ctx: &SelectionContext,
) -> Result<Vec<String>> {
    select(graph, |task| {
        Ok(is_cron_perftest(task)?
            && task.attr_str_or_empty("test_platform")?.contains("android")
            && task.label.contains("geckoview"))
    })
}

/// Speedometer runs on every perf platform.
pub fn speedometer_tests(graph: &TaskGraph, _parameters: &Parameters, _ctx: &SelectionContext) -> Result<Vec<String>> {
    select(graph, |task| {
        Ok(raptor_test(task)?
            .is_some_and(|(_, try_name)| try_name.contains("browsertime") && try_name.contains("speedometer")))
    })
}

/// Cold-start Amazon page loads on Android shippable builds.
pub fn raptor_tp6m(graph: &TaskGraph, _parameters: &Parameters, _ctx: &SelectionContext) -> Result<Vec<String>> {
    select(graph, |task| {
        let platform = task.attr_str_or_empty("build_platform")?;
        if !platform.contains("android") || !platform.contains("shippable") {
            return Ok(false);
        }
        if task.attr_str("unittest_suite")? != Some("raptor") {
            return Ok(false);
        }
        let try_name = task.attr_str("raptor_try_name")?.unwrap_or(&task.label);
        Ok(try_name.contains("-cold")
            && try_name.contains("browsertime")
            && try_name.contains("amazon")
            && !try_name.contains("search"))
    })
}

/// Builds and tests with a trunk clang, to spot compiler perf changes.
pub fn linux64_clang_trunk_perf(
    graph: &TaskGraph,
    _parameters: &Parameters,
    _ctx: &SelectionContext,
) -> Result<Vec<String>> {
    select(graph, |task| {
        Ok(task.attr_str("build_platform")? == Some("linux64-clang-trunk-perf")
            || task
                .attr_str_or_empty("test_platform")?
                .starts_with("linux1804-64-clang-trunk-perf"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::fixtures::*;
    use serde_json::json;

    const DESKTOP: &str = "windows11-64-24h2-shippable/opt";
    const ANDROID: &str = "android-hw-a55-14-0-aarch64-shippable/opt";

    fn raptor(label: &str, platform: &str, try_name: &str) -> Task {
        Task::new(label, "test")
            .with_attribute("unittest_suite", "raptor")
            .with_attribute("test_platform", platform)
            .with_attribute("raptor_try_name", try_name)
    }

    fn perf_graph() -> TaskGraph {
        graph([
            raptor("sp3-desktop", DESKTOP, "browsertime-speedometer3"),
            raptor("sp3-android", ANDROID, "browsertime-speedometer3-geckoview"),
            raptor("sp3-chrome", DESKTOP, "browsertime-speedometer3-custom-car"),
            raptor("sp3-win10", "windows10-64-shippable-qr/opt", "browsertime-speedometer3"),
            raptor("tp6-desktop", DESKTOP, "browsertime-tp6-firefox-amazon"),
            raptor("netbench", DESKTOP, "browsertime-network-bench"),
            raptor("tp6-s24-car", "android-hw-s24-14-0-aarch64-shippable/opt", "browsertime-tp6m-cstm-car-m"),
            Task::new("talos-g1", "test")
                .with_attribute("unittest_suite", "talos")
                .with_attribute("test_platform", DESKTOP)
                .with_attribute("talos_try_name", "g1"),
            Task::new("perftest-view-android", "perftest")
                .with_attribute("cron", true)
                .with_attribute("test_platform", "android-hw-a55/opt"),
            Task::new("perftest-geckoview-startup", "perftest")
                .with_attribute("cron", true)
                .with_attribute("test_platform", "android-hw-a55/opt"),
            Task::new("perftest-on-push", "perftest"),
            Task::new("condprof-a51", "condprof"),
            Task::new("condprof-linux", "condprof"),
        ])
    }

    fn p() -> Parameters {
        params(json!({"project": "mozilla-central"}))
    }

    #[test]
    fn test_raptor_by_try_name() {
        let g = perf_graph();
        assert_eq!(speedometer_tests(&g, &p(), &ctx()).unwrap(), vec!["sp3-desktop", "sp3-android", "sp3-chrome"]);
        assert_eq!(
            general_perf_testing(&g, &p(), &ctx()).unwrap(),
            vec!["sp3-desktop", "sp3-android", "tp6-desktop"]
        );
        assert_eq!(custom_car_perf_testing(&g, &p(), &ctx()).unwrap(), vec!["sp3-chrome"]);
    }

    #[test]
    fn test_daily_beta_includes_talos() {
        let labels = daily_beta_perf(&perf_graph(), &p(), &ctx()).unwrap();
        assert!(labels.contains(&"talos-g1".to_string()));
        assert!(!labels.contains(&"sp3-win10".to_string()));
    }

    #[test]
    fn test_perftest_family() {
        let g = perf_graph();
        assert_eq!(
            perftest(&g, &p(), &ctx()).unwrap(),
            vec!["perftest-view-android", "perftest-geckoview-startup"]
        );
        assert_eq!(perftest_on_autoland(&g, &p(), &ctx()).unwrap(), vec!["perftest-view-android"]);
        assert_eq!(geckoview_perftest(&g, &p(), &ctx()).unwrap(), vec!["perftest-geckoview-startup"]);
        assert_eq!(condprof(&g, &p(), &ctx()).unwrap(), vec!["condprof-linux"]);
    }

    #[test]
    fn test_tp6m_and_clang_trunk() {
        let g = graph([
            Task::new("tp6m-amazon-cold", "test")
                .with_attribute("build_platform", "android-aarch64-shippable")
                .with_attribute("unittest_suite", "raptor")
                .with_attribute("raptor_try_name", "browsertime-tp6m-amazon-cold"),
            Task::new("tp6m-amazon-search-cold", "test")
                .with_attribute("build_platform", "android-aarch64-shippable")
                .with_attribute("unittest_suite", "raptor")
                .with_attribute("raptor_try_name", "browsertime-tp6m-amazon-search-cold"),
            Task::new("build-linux64-clang-trunk-perf/opt", "build")
                .with_attribute("build_platform", "linux64-clang-trunk-perf"),
        ]);
        assert_eq!(raptor_tp6m(&g, &p(), &ctx()).unwrap(), vec!["tp6m-amazon-cold"]);
        assert_eq!(
            linux64_clang_trunk_perf(&g, &p(), &ctx()).unwrap(),
            vec!["build-linux64-clang-trunk-perf/opt"]
        );
    }
}
