//! Label pattern lists, compiled once.

use regex::Regex;
use std::collections::HashMap;
use std::sync::{LazyLock, Mutex, PoisonError};

use crate::error::{FilterError, Result};

/// Labels hidden from try pushes unless explicitly requested.
pub const UNCOMMON_TRY_TASK_LABELS: &[&str] = &[
    // Platforms and/or build types
    r"build-.*-gcp",
    r"mingwclang",
    r"valgrind",
    // Android
    r"android-geckoview-docs",
    r"android-hw",
    // Windows
    r"windows10-64-ref-hw",
    r"windows10-aarch64-qr",
    // Linux (32-bit builds and tests)
    r"linux-",
    r"linux1804-32",
    // Tests
    r"web-platform-tests.*backlog",
    r"-ccov",
    r"-profiling-",
    r"-32-.*-webgpu",
    r"-asan-.*-webgpu",
    r"-tsan-.*-webgpu",
    r"nightlyasrelease",
];

/// Shippable test variants are uncommon unless the suite only runs shippable.
const SHIPPABLE: &str = r"-shippable";
const SHIPPABLE_ONLY_SUITES: &str = r"awsy|browsertime|marionette-headless|mochitest-devtools-chrome-fis|raptor|talos|web-platform-tests-wdspec-headless|mochitest-plain-headless";

/// A label pattern, optionally voided when followed by an exception.
///
/// Stands in for `pattern(?!.*exception)`, which the regex engine cannot
/// express directly.
#[derive(Debug, Clone)]
pub struct LabelPattern {
    pattern: Regex,
    unless_followed_by: Option<Regex>,
}

impl LabelPattern {
    /// Compile a plain search pattern.
    pub fn new(pattern: &str) -> Result<Self> {
        Ok(Self {
            pattern: compile(pattern)?,
            unless_followed_by: None,
        })
    }

    /// Compile a pattern that does not count when `exception` appears later in the label.
    pub fn unless_followed_by(pattern: &str, exception: &str) -> Result<Self> {
        Ok(Self {
            pattern: compile(pattern)?,
            unless_followed_by: Some(compile(exception)?),
        })
    }

    /// Search the label.
    pub fn is_match(&self, label: &str) -> bool {
        match &self.unless_followed_by {
            None => self.pattern.is_match(label),
            Some(exception) => self
                .pattern
                .find_iter(label)
                .any(|m| !exception.is_match(&label[m.end()..])),
        }
    }
}

static UNCOMMON_TRY: LazyLock<Vec<LabelPattern>> = LazyLock::new(|| {
    let mut patterns: Vec<LabelPattern> = UNCOMMON_TRY_TASK_LABELS
        .iter()
        .map(|p| LabelPattern::new(p).expect("static uncommon-try pattern"))
        .collect();
    patterns.push(
        LabelPattern::unless_followed_by(SHIPPABLE, SHIPPABLE_ONLY_SUITES)
            .expect("static shippable pattern"),
    );
    patterns
});

/// The compiled uncommon-try list.
pub fn uncommon_try_patterns() -> &'static [LabelPattern] {
    &UNCOMMON_TRY
}

static ANCHORED: LazyLock<Mutex<HashMap<String, Regex>>> = LazyLock::new(Default::default);

/// Compile `pattern` anchored at both ends, caching the result.
pub fn anchored(pattern: &str) -> Result<Regex> {
    let mut cache = ANCHORED.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(re) = cache.get(pattern) {
        return Ok(re.clone());
    }
    let re = Regex::new(&format!("^(?:{pattern})$")).map_err(|source| FilterError::Regex {
        pattern: pattern.to_string(),
        source,
    })?;
    cache.insert(pattern.to_string(), re.clone());
    Ok(re)
}

/// Compile an unanchored search pattern.
pub fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| FilterError::Regex {
        pattern: pattern.to_string(),
        source,
    })
}

/// Compile a list of search patterns.
pub fn compile_all<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<Regex>> {
    patterns.iter().map(|p| compile(p.as_ref())).collect()
}
