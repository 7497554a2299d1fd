//! Try options resolved against the task graph.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, info};

use ciselect_core::{AttributeError, Task, TaskGraph};
use ciselect_filters::{matches_tags, matches_uncommon_try};

use crate::aliases::{build_type_alias, pretty_platform, ridealong_builds, unittest_alias};
use crate::args::{Notifications, TryArgs};
use crate::error::{Result, TrySyntaxError};

/// Kinds matched by build type and build platform.
const BUILD_KINDS: &[&str] = &["build", "artifact-build", "hazard", "l10n", "valgrind", "spidermonkey"];

/// One requested test suite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestRequest {
    /// Suite name as it appears in the `*_try_name` attribute
    pub test: String,
    /// Test platforms from `[...]`; `None` for every platform
    pub platforms: Option<Vec<String>>,
    /// Chunks from a `-N` suffix; `None` for every chunk
    pub only_chunks: Option<BTreeSet<String>>,
}

impl TestRequest {
    fn named(test: impl Into<String>, platforms: Option<Vec<String>>) -> Self {
        Self {
            test: test.into(),
            platforms,
            only_chunks: None,
        }
    }
}

/// Try options after alias expansion and validation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TryOptions {
    /// Build types (`opt`, `debug`)
    pub build_types: BTreeSet<String>,
    /// Build platforms; `None` for every platform
    pub platforms: Option<BTreeSet<String>>,
    /// Unit test suites
    pub unittests: Vec<TestRequest>,
    /// Talos suites
    pub talos: Vec<TestRequest>,
    /// Raptor suites
    pub raptor: Vec<TestRequest>,
    /// Job names; `None` for every job
    pub jobs: Option<Vec<String>>,
    /// Tags every selected test must carry
    pub tags: BTreeSet<String>,
    /// Copies of each unit test
    pub trigger_tests: u32,
    /// Copies of each talos test
    pub talos_trigger_tests: u32,
    /// Copies of each raptor test
    pub raptor_trigger_tests: u32,
    /// Email notifications
    pub notifications: Option<Notifications>,
    /// Disable automatic retries
    pub no_retry: bool,
    /// Interactive tasks
    pub interactive: bool,
    /// Keep nightly tasks
    pub include_nightly: bool,
    /// Extra environment for tasks
    pub env: BTreeMap<String, String>,
    /// Use artifact builds
    pub use_artifact_builds: bool,
    /// Enable the gecko profiler
    pub gecko_profile: bool,

    #[serde(skip)]
    present: bool,
    #[serde(skip)]
    test_tiers: HashMap<String, BTreeSet<i64>>,
    #[serde(skip)]
    task_tiers: HashMap<String, i64>,
}

impl TryOptions {
    /// Options for a push without try syntax. Matches nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether the options came from an actual try line.
    pub fn is_present(&self) -> bool {
        self.present
    }

    /// Expand and validate raw arguments against the graph.
    pub fn resolve(args: &TryArgs, graph: &TaskGraph) -> Result<Self> {
        let build_types = resolve_build_types(args.build_types.as_deref(), graph)?;

        let unittests = parse_test_option("unittest_try_name", &args.unittests, graph)?;
        let talos = parse_test_option("talos_try_name", &args.talos, graph)?;
        let raptor = parse_test_option("raptor_try_name", &args.raptor, graph)?;
        let tests_requested = !(unittests.is_empty() && talos.is_empty() && raptor.is_empty());

        let platforms = resolve_platforms(&args.platforms, tests_requested, graph)?;
        let jobs = resolve_jobs(&args.jobs);

        let mut test_tiers: HashMap<String, BTreeSet<i64>> = HashMap::new();
        let mut task_tiers = HashMap::new();
        for task in graph.tasks() {
            let tier = task.treeherder_tier();
            if tier != 1 {
                task_tiers.insert(task.label.clone(), tier);
            }
            if task.kind == "test" {
                if let Some(name) = task.attr_str("unittest_try_name")? {
                    test_tiers.entry(name.to_string()).or_default().insert(tier);
                }
            }
        }

        Ok(Self {
            build_types,
            platforms,
            unittests,
            talos,
            raptor,
            jobs,
            tags: args.tags.iter().cloned().collect(),
            trigger_tests: args.trigger_tests,
            talos_trigger_tests: args.talos_trigger_tests,
            raptor_trigger_tests: args.raptor_trigger_tests,
            notifications: args.notifications,
            no_retry: args.no_retry,
            interactive: args.interactive,
            include_nightly: args.include_nightly,
            env: args.env.clone(),
            use_artifact_builds: args.artifact,
            gecko_profile: args.gecko_profile,
            present: true,
            test_tiers,
            task_tiers,
        })
    }

    /// Names of the requested unit test suites.
    pub fn unittest_names(&self) -> impl Iterator<Item = &str> {
        self.unittests.iter().map(|t| t.test.as_str())
    }

    /// Whether a task is requested by these options.
    pub fn task_matches(&self, task: &Task) -> Result<bool> {
        if !self.present {
            return Ok(false);
        }

        if let Some(job) = task.attr_str("job_try_name")? {
            return match (&self.jobs, &self.platforms) {
                (Some(jobs), _) => Ok(jobs.iter().any(|j| j == job)),
                // `-j all` still honours `-p`.
                (None, Some(platforms)) => Ok(task
                    .attr_str("build_platform")?
                    .is_some_and(|p| platforms.contains(p))),
                (None, None) => runs_everywhere(task),
            };
        }

        if task.attributes.is_truthy("nightly") && !self.include_nightly {
            return Ok(false);
        }

        if task.kind == "test" {
            if !matches_tags(task, &self.tags)? {
                return Ok(false);
            }
            return Ok(self.match_test(task, &self.unittests, "unittest_try_name")?
                || self.match_test(task, &self.talos, "talos_try_name")?
                || self.match_test(task, &self.raptor, "raptor_try_name")?);
        }

        if BUILD_KINDS.contains(&task.kind.as_str()) {
            if !self.matches_build_type(task)? {
                return Ok(false);
            }
            return match &self.platforms {
                None => runs_everywhere(task),
                Some(platforms) => Ok(task
                    .attr_str("build_platform")?
                    .is_some_and(|p| platforms.contains(p))),
            };
        }

        Ok(false)
    }

    fn matches_build_type(&self, task: &Task) -> Result<bool> {
        Ok(task
            .attr_str("build_type")?
            .is_some_and(|b| self.build_types.contains(b)))
    }

    fn match_test(&self, task: &Task, requests: &[TestRequest], attr_name: &str) -> Result<bool> {
        if !self.matches_build_type(task)? {
            return Ok(false);
        }
        match &self.platforms {
            Some(platforms) => {
                if !task.attr_str("build_platform")?.is_some_and(|p| platforms.contains(p)) {
                    return Ok(false);
                }
            }
            None => {
                if !runs_everywhere(task)? {
                    return Ok(false);
                }
            }
        }

        let Some(name) = task.attr_str(attr_name)? else {
            return Ok(false);
        };
        let Some(request) = requests.iter().find(|r| r.test == name) else {
            return Ok(false);
        };

        if let Some(chunks) = &request.only_chunks {
            let chunk = task.attr_int("test_chunk")?.map(|c| c.to_string());
            if !chunk.is_some_and(|c| chunks.contains(&c)) {
                return Ok(false);
            }
        }

        if let Some(platforms) = &request.platforms {
            if platforms.iter().any(|p| p == "all") {
                return Ok(true);
            }
            let test_platform = task.attr_str_or_empty("test_platform")?;
            let prefix = test_platform.split('/').next().unwrap_or_default();
            return Ok(platforms.iter().any(|p| p == prefix));
        }

        let tier = task.treeherder_tier();
        if tier == 1 {
            return Ok(true);
        }

        // Tier-2/3 tests ride along only when their build is not tier 1, or
        // when the suite has no tier-1 variant at all.
        let build_tier = task
            .dependencies
            .get("build")
            .and_then(|build| self.task_tiers.get(build))
            .copied()
            .unwrap_or(1);
        if tier <= build_tier {
            return Ok(true);
        }
        let has_tier1 = self.test_tiers.get(name).is_some_and(|tiers| tiers.contains(&1));
        if !has_tier1 {
            return Ok(true);
        }
        debug!("not selecting tier {} test {} with a tier-1 variant", tier, task.label);
        Ok(false)
    }
}

/// `-p all` picks what would run on every project.
fn runs_everywhere(task: &Task) -> Result<bool> {
    Ok(task
        .attr_str_list("run_on_projects")?
        .is_some_and(|projects| projects.contains(&"all")))
}

fn resolve_build_types(letters: Option<&str>, graph: &TaskGraph) -> Result<BTreeSet<String>> {
    let requested: BTreeSet<String> = letters
        .unwrap_or_default()
        .chars()
        .filter_map(build_type_alias)
        .map(String::from)
        .collect();

    let mut known = BTreeSet::new();
    for task in graph.tasks() {
        if let Some(build_type) = task.attr_str("build_type")? {
            known.insert(build_type);
        }
    }

    let unknown: Vec<String> = requested
        .iter()
        .filter(|b| !known.contains(b.as_str()))
        .cloned()
        .collect();
    if !unknown.is_empty() {
        return Err(TrySyntaxError::UnknownBuildTypes(unknown));
    }
    Ok(requested)
}

fn resolve_platforms(arg: &str, tests_requested: bool, graph: &TaskGraph) -> Result<Option<BTreeSet<String>>> {
    if arg == "all" {
        return Ok(None);
    }

    let mut results = BTreeSet::new();
    for platform in arg.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        // Tests on macOS only run against shippable builds.
        if platform == "macosx64" && tests_requested {
            info!("adding macosx64-shippable, required for macosx64 tests");
            results.insert("macosx64-shippable".to_string());
        } else {
            results.insert(platform.to_string());
        }
        for ridealong in ridealong_builds(platform) {
            results.insert(ridealong.to_string());
        }
    }

    let mut known = BTreeSet::new();
    for task in graph.tasks() {
        if let Some(p) = task.attr_str("build_platform")? {
            known.insert(p);
        }
        if let Some(p) = task.attr_str("test_platform")? {
            known.insert(p.split('/').next().unwrap_or_default());
        }
    }

    let unknown: Vec<String> = results
        .iter()
        .filter(|p| !known.contains(p.as_str()) && ridealong_origin(p).is_none())
        .cloned()
        .collect();
    if !unknown.is_empty() {
        return Err(TrySyntaxError::UnknownPlatforms(unknown));
    }
    Ok(Some(results))
}

/// Base platform of a ride-along build, if `platform` is one.
fn ridealong_origin(platform: &str) -> Option<&'static str> {
    ["android-api-16", "linux", "linux64", "macosx64", "win32", "win64"]
        .into_iter()
        .find(|base| ridealong_builds(base).iter().any(|b| *b == platform))
}

fn resolve_jobs(jobs: &[String]) -> Option<Vec<String>> {
    let mut names = Vec::new();
    for arg in jobs {
        match arg.as_str() {
            "all" => return None,
            "none" => {}
            list => names.extend(list.split(',').map(str::trim).filter(|j| !j.is_empty()).map(String::from)),
        }
    }
    Some(names)
}

fn parse_test_option(attr_name: &str, arg: &str, graph: &TaskGraph) -> Result<Vec<TestRequest>> {
    if arg == "none" {
        return Ok(Vec::new());
    }

    let mut all_platforms = BTreeSet::new();
    let mut all_tests = BTreeSet::new();
    for task in graph.tasks() {
        if let Some(platform) = task.attr_str("test_platform")? {
            all_platforms.insert(platform.split('/').next().unwrap_or_default().to_string());
        }
        if let Some(name) = task.attr_str(attr_name)? {
            all_tests.insert(name.to_string());
        }
    }

    let requests = parse_test_opts(arg, &all_platforms);
    let Some(first) = requests.first() else {
        return Ok(Vec::new());
    };

    let (first_name, first_platforms) = (first.test.clone(), first.platforms.clone());

    let expanded = match first_name.as_str() {
        "all" => all_tests
            .iter()
            .map(|t| TestRequest::named(t.as_str(), first_platforms.clone()))
            .collect(),
        "common" => common_tests(graph, attr_name)?
            .into_iter()
            .map(|t| TestRequest::named(t, first_platforms.clone()))
            .collect(),
        _ => requests,
    };
    Ok(parse_test_chunks(&all_tests, expanded))
}

/// Suites that run everywhere and are not on the uncommon list.
fn common_tests(graph: &TaskGraph, attr_name: &str) -> std::result::Result<BTreeSet<String>, AttributeError> {
    let mut names = BTreeSet::new();
    for task in graph.tasks() {
        let Some(name) = task.attr_str(attr_name)? else {
            continue;
        };
        let everywhere = task
            .attr_str_list("run_on_projects")?
            .is_some_and(|projects| projects.contains(&"all"));
        if everywhere && matches_uncommon_try(&task.label) {
            names.insert(name.to_string());
        }
    }
    Ok(names)
}

/// Split a `-u`/`-t`/`-r` value into requests.
///
/// The value is read backwards so a `[...]` platform list is known before
/// the test name it belongs to: `a,b[linux64,-Windows 10],c`.
fn parse_test_opts(input: &str, all_platforms: &BTreeSet<String>) -> Vec<TestRequest> {
    let mut tests = Vec::new();
    let mut platforms: Option<Vec<String>> = None;
    let mut token: Vec<char> = Vec::new();
    let mut in_platforms = false;

    let take = |token: &mut Vec<char>| -> String {
        let value: String = token.iter().rev().collect();
        token.clear();
        value
    };

    for c in input.chars().rev() {
        match c {
            ',' if in_platforms => add_platform(&mut platforms, &take(&mut token)),
            ',' => add_test(&mut tests, platforms.take(), &take(&mut token), all_platforms),
            ']' => in_platforms = true,
            '[' => {
                add_platform(&mut platforms, &take(&mut token));
                in_platforms = false;
            }
            _ => token.push(c),
        }
    }
    if !token.is_empty() {
        add_test(&mut tests, platforms.take(), &take(&mut token), all_platforms);
    }

    tests.reverse();
    tests
}

fn add_platform(platforms: &mut Option<Vec<String>>, value: &str) {
    let value = value.trim();
    if value.is_empty() {
        return;
    }
    let (negated, name) = match value.strip_prefix('-') {
        Some(name) => (true, name),
        None => (false, value),
    };
    let expanded: Vec<String> = match pretty_platform(name) {
        Some(names) => names.iter().map(|n| n.to_string()).collect(),
        None => vec![name.to_string()],
    };

    let current = platforms.get_or_insert_with(Vec::new);
    let mut updated: Vec<String> = expanded
        .into_iter()
        .map(|n| if negated { format!("-{n}") } else { n })
        .collect();
    updated.append(current);
    *current = updated;
}

fn add_test(
    tests: &mut Vec<TestRequest>,
    platforms: Option<Vec<String>>,
    value: &str,
    all_platforms: &BTreeSet<String>,
) {
    let name = value.trim();
    if name.is_empty() {
        return;
    }
    let platforms = platforms.map(|requested| normalize_platforms(requested, all_platforms));
    tests.push(TestRequest::named(name, platforms));
}

/// Apply `-platform` negations. A list starting with a negation starts from
/// every known test platform.
fn normalize_platforms(requested: Vec<String>, all_platforms: &BTreeSet<String>) -> Vec<String> {
    let mut results: Vec<String> = match requested.first() {
        Some(first) if first.starts_with('-') => all_platforms.iter().cloned().collect(),
        _ => Vec::new(),
    };
    for platform in requested {
        match platform.strip_prefix('-') {
            Some(excluded) => results.retain(|p| p != excluded),
            None => results.push(platform),
        }
    }
    results
}

/// Collapse `suite-N` requests into one request per suite and expand aliases.
///
/// The result holds one request per suite, sorted by name; for duplicates the
/// last request wins.
fn parse_test_chunks(all_tests: &BTreeSet<String>, tests: Vec<TestRequest>) -> Vec<TestRequest> {
    let mut results = Vec::new();
    let mut seen_chunks: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for mut test in tests {
        match split_chunk_suffix(&test.test) {
            Some((name, chunk)) => {
                let (name, chunk) = (name.to_string(), chunk.to_string());
                if let Some(chunks) = seen_chunks.get_mut(&name) {
                    chunks.insert(chunk);
                } else {
                    seen_chunks.insert(name.clone(), BTreeSet::from([chunk]));
                    test.test = name;
                    test.only_chunks = Some(BTreeSet::new());
                    results.push(test);
                }
            }
            None => match unittest_alias(&test.test) {
                Some(alias) => results.extend(
                    all_tests
                        .iter()
                        .filter(|name| alias.matches(name))
                        .map(|name| TestRequest::named(name.as_str(), test.platforms.clone())),
                ),
                None => results.push(test),
            },
        }
    }

    for test in &mut results {
        if test.only_chunks.is_some() {
            test.only_chunks = seen_chunks.get(&test.test).cloned();
        }
    }

    results
        .into_iter()
        .map(|t| (t.test.clone(), t))
        .collect::<BTreeMap<_, _>>()
        .into_values()
        .collect()
}

/// `mochitest-3` -> `("mochitest", "3")`.
fn split_chunk_suffix(name: &str) -> Option<(&str, &str)> {
    let (base, chunk) = name.rsplit_once('-')?;
    (!chunk.is_empty() && chunk.chars().all(|c| c.is_ascii_digit())).then_some((base, chunk))
}
