//! Shorthand tables for try syntax.

/// How an alias picks test names.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Alias {
    Prefix(&'static str),
    Contains(&'static str),
    /// `^(plain-)?<prefix>.*$`
    PlainOrPrefix(&'static str),
}

impl Alias {
    pub(crate) fn matches(&self, name: &str) -> bool {
        match self {
            Self::Prefix(p) => name.starts_with(p),
            Self::Contains(infix) => name.contains(infix),
            Self::PlainOrPrefix(p) => {
                name.starts_with(p) || name.strip_prefix("plain-").is_some_and(|n| n.starts_with(p))
            }
        }
    }
}

/// `-u` shorthands. Aliases are expanded only when no chunk suffix is given.
const UNITTEST_ALIASES: &[(&str, Alias)] = &[
    ("cppunit", Alias::Prefix("cppunit")),
    ("crashtest", Alias::Prefix("crashtest")),
    ("crashtest-e10s", Alias::Prefix("crashtest-e10s")),
    ("e10s", Alias::Contains("e10s")),
    ("firefox-ui-functional", Alias::Prefix("firefox-ui-functional")),
    ("gtest", Alias::Prefix("gtest")),
    ("jittest", Alias::Prefix("jittest")),
    ("jittests", Alias::Prefix("jittest")),
    ("jsreftest", Alias::Prefix("jsreftest")),
    ("jsreftest-e10s", Alias::Prefix("jsreftest-e10s")),
    ("marionette", Alias::Prefix("marionette")),
    ("mochitest", Alias::Prefix("mochitest")),
    ("mochitests", Alias::Prefix("mochitest")),
    ("mochitest-e10s", Alias::Prefix("mochitest-e10s")),
    ("mochitests-e10s", Alias::Prefix("mochitest-e10s")),
    ("mochitest-debug", Alias::Prefix("mochitest-debug-")),
    ("mochitest-a11y", Alias::Contains("mochitest-a11y")),
    ("mochitest-bc", Alias::Prefix("mochitest-browser-chrome")),
    ("mochitest-e10s-bc", Alias::Prefix("mochitest-browser-chrome-e10s")),
    ("mochitest-browser-chrome", Alias::Prefix("mochitest-browser-chrome")),
    ("mochitest-e10s-browser-chrome", Alias::Prefix("mochitest-browser-chrome-e10s")),
    ("mochitest-chrome", Alias::Contains("mochitest-chrome")),
    ("mochitest-dt", Alias::Prefix("mochitest-devtools-chrome")),
    ("mochitest-e10s-dt", Alias::Prefix("mochitest-devtools-chrome-e10s")),
    ("mochitest-gl", Alias::Prefix("mochitest-webgl")),
    ("mochitest-gl-e10s", Alias::Prefix("mochitest-webgl-e10s")),
    ("mochitest-gpu", Alias::Prefix("mochitest-gpu")),
    ("mochitest-gpu-e10s", Alias::Prefix("mochitest-gpu-e10s")),
    ("mochitest-media", Alias::Prefix("mochitest-media")),
    ("mochitest-media-e10s", Alias::Prefix("mochitest-media-e10s")),
    ("mochitest-vg", Alias::Prefix("mochitest-valgrind")),
    ("reftest", Alias::PlainOrPrefix("reftest")),
    ("reftest-no-accel", Alias::PlainOrPrefix("reftest-no-accel")),
    ("reftests", Alias::PlainOrPrefix("reftest")),
    ("reftests-e10s", Alias::PlainOrPrefix("reftest-e10s")),
    ("robocop", Alias::Prefix("robocop")),
    ("web-platform-test", Alias::Prefix("web-platform-tests")),
    ("web-platform-tests", Alias::Prefix("web-platform-tests")),
    ("web-platform-tests-e10s", Alias::Prefix("web-platform-tests-e10s")),
    ("web-platform-tests-crashtests", Alias::Prefix("web-platform-tests-crashtest")),
    ("web-platform-tests-print-reftest", Alias::Prefix("web-platform-tests-print-reftest")),
    ("web-platform-tests-reftests", Alias::Prefix("web-platform-tests-reftest")),
    ("web-platform-tests-reftests-e10s", Alias::Prefix("web-platform-tests-reftest-e10s")),
    ("web-platform-tests-wdspec", Alias::Prefix("web-platform-tests-wdspec")),
    ("web-platform-tests-wdspec-e10s", Alias::Prefix("web-platform-tests-wdspec-e10s")),
    ("xpcshell", Alias::Prefix("xpcshell")),
];

pub(crate) fn unittest_alias(name: &str) -> Option<Alias> {
    UNITTEST_ALIASES
        .iter()
        .find(|(alias, _)| *alias == name)
        .map(|&(_, alias)| alias)
}

/// Old builder-name substrings accepted inside `[...]`, mapped to test platforms.
const PLATFORM_PRETTY_NAMES: &[(&str, &[&str])] = &[
    ("Ubuntu", &["linux32", "linux64", "linux64-asan", "linux1804-64", "linux1804-64-asan"]),
    ("x64", &["linux64", "linux64-asan", "linux1804-64", "linux1804-64-asan"]),
    ("Android 7.0 Samsung A51 32bit", &["android-hw-a51-11.0-arm7"]),
    ("Android 7.0 Samsung A51 64bit", &["android-hw-a51-11.0-aarch64"]),
    ("Android 13.0 Google Pixel 5 32bit", &["android-hw-p5-13.0-arm7"]),
    ("Android 13.0 Google Pixel 5 64bit", &["android-hw-p5-13.0-android-aarch64"]),
    ("Windows 10", &["windows10-64"]),
];

pub(crate) fn pretty_platform(name: &str) -> Option<&'static [&'static str]> {
    PLATFORM_PRETTY_NAMES
        .iter()
        .find(|(pretty, _)| *pretty == name)
        .map(|&(_, platforms)| platforms)
}

/// Builds that ride along when their base platform is requested with `-p`.
const RIDEALONG_BUILDS: &[(&str, &[&str])] = &[
    ("android-api-16", &["android-api-16-l10n"]),
    ("linux", &["linux-l10n"]),
    (
        "linux64",
        &["linux64-l10n", "sm-plain", "sm-nonunified", "sm-arm-sim", "sm-arm64-sim", "sm-compacting", "sm-rootanalysis"],
    ),
    ("macosx64", &["macosx64-l10n"]),
    ("win32", &["win32-l10n"]),
    ("win64", &["win64-l10n"]),
];

pub(crate) fn ridealong_builds(platform: &str) -> &'static [&'static str] {
    RIDEALONG_BUILDS
        .iter()
        .find(|(base, _)| *base == platform)
        .map(|&(_, builds)| builds)
        .unwrap_or(&[])
}

/// `-b` letters.
pub(crate) fn build_type_alias(letter: char) -> Option<&'static str> {
    match letter {
        'o' => Some("opt"),
        'd' => Some("debug"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_kinds() {
        let reftest = unittest_alias("reftest").unwrap();
        assert!(reftest.matches("reftest-1"));
        assert!(reftest.matches("plain-reftest"));
        assert!(!reftest.matches("jsreftest"));

        let e10s = unittest_alias("e10s").unwrap();
        assert!(e10s.matches("mochitest-e10s-1"));

        assert!(unittest_alias("not-an-alias").is_none());
    }

    #[test]
    fn test_tables() {
        assert_eq!(pretty_platform("Windows 10"), Some(&["windows10-64"][..]));
        assert!(ridealong_builds("linux64").contains(&"sm-plain"));
        assert!(ridealong_builds("ios").is_empty());
        assert_eq!(build_type_alias('d'), Some("debug"));
        assert_eq!(build_type_alias('x'), None);
    }
}
