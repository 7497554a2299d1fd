//! Platform helpers shared by the performance-testing cron selectors.

/// Whether an Android test platform is one perf crons run on.
pub fn accept_raptor_android_build(platform: &str) -> bool {
    if !platform.contains("android") || !platform.contains("shippable") {
        return false;
    }
    if !platform.contains("aarch64") {
        return false;
    }
    // Pixel 5 is being retired from perf testing.
    if platform.contains("p5") {
        return false;
    }
    ["p6", "s24", "a55"].iter().any(|device| platform.contains(device))
}

/// Whether a desktop test platform is one perf crons run on.
pub fn accept_raptor_desktop_build(platform: &str) -> bool {
    if platform.contains("android") || !platform.contains("shippable") {
        return false;
    }
    if platform.contains("windows") && !platform.contains("windows11") {
        return false;
    }
    true
}
