//! Attribute matchers and reusable task filters.
//!
//! Matchers are pure predicates over one task; filters compose them with
//! the push parameters. Selectors are built from these pieces.

#![warn(missing_docs)]

pub mod error;
pub mod matchers;
pub mod patterns;
pub mod filters;
pub mod release;
pub mod perf;

pub use error::{FilterError, Result};
pub use matchers::{
    match_run_on_projects, matches_hg_branch, matches_platforms, matches_project,
    matches_tags, matches_uncommon_try, platform_family,
};
pub use filters::{
    filter_by_regex, filter_by_uncommon_try, filter_for_hg_branch, filter_for_project,
    filter_on_platforms, filter_out_cron, filter_out_devedition, filter_out_missing_signoffs,
    filter_out_shippable, filter_out_shipping_phase, filter_tests_without_manifests,
    filter_unsupported_artifact_builds, standard_filter, RegexMode,
};
pub use release::{filter_out_android_on_esr, filter_release_tasks};
pub use perf::{accept_raptor_android_build, accept_raptor_desktop_build};
