//! Filters used by release-branch selectors.

use ciselect_core::{Parameters, ShippingPhase, Task};

use crate::error::Result;

/// Desktop platforms whose plain opt builds are not run on release branches.
const DESKTOP_OPT_PLATFORMS: &[&str] = &["linux", "linux64", "macosx64", "win32", "win64", "win64-aarch64"];

/// Suites still wanted on opt builds of release branches.
const RELEASE_PERF_SUITES: &[&str] = &["talos", "raptor"];

/// Release-branch filter.
///
/// Keeps on-change l10n and perf suites on desktop opt builds, drops
/// everything outside the build phase, and on non-ESR branches drops debug
/// work except 64-bit Linux, hazard and toolchain builds.
pub fn filter_release_tasks(task: &Task, parameters: &Parameters) -> Result<bool> {
    let build_platform = task.attr_str_or_empty("build_platform")?;

    if DESKTOP_OPT_PLATFORMS.contains(&build_platform) {
        if task.kind == "l10n" {
            return Ok(true);
        }
        let suite = task.attr_str("unittest_suite")?;
        let is_perf = suite.is_some_and(|s| RELEASE_PERF_SUITES.contains(&s));
        if task.attr_str("build_type")? == Some("opt") && !is_perf {
            return Ok(false);
        }
    }

    match task.attr_str("shipping_phase")? {
        None => {}
        Some(phase) if ShippingPhase::parse(phase) == Some(ShippingPhase::Build) => {}
        Some(_) => return Ok(false),
    }

    // ESR lives long enough that debug coverage is worth keeping.
    if parameters.release_type()?.starts_with("esr") {
        return Ok(true);
    }

    let build_type = task.attr_str_or_empty("build_type")?;
    let test_platform = task.attr_str_or_empty("test_platform")?;

    if task.kind == "hazard" || build_platform.contains("toolchain") {
        return Ok(true);
    }

    if build_type == "debug" {
        if !build_platform.contains("linux") {
            return Ok(false);
        }
        if task.kind != "spidermonkey" && test_platform.contains("-qr") {
            return Ok(false);
        }
        if !build_platform.contains("64") {
            return Ok(false);
        }
    }

    // webrender android debug tasks carry no build_type.
    if task.kind == "webrender" && task.label.contains("debug") {
        return Ok(false);
    }
    Ok(true)
}

/// Drop Android tasks on ESR release types.
pub fn filter_out_android_on_esr(task: &Task, parameters: &Parameters) -> Result<bool> {
    if parameters.release_type()?.starts_with("esr")
        && task.attr_str_or_empty("build_platform")?.contains("android")
    {
        return Ok(false);
    }
    Ok(true)
}
