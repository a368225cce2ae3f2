use once_cell::sync::Lazy;
use regex::Regex;

use icingawatch_types::VERSION_NOT_RUNNING;

/// `v2.4.10` (release builds), `r2.4.10` (Debian) or a bare `2.11.0`,
/// optionally followed by a git describe suffix.
static VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[vr]?(\d+\.\d+\.\d+)").expect("version pattern is valid"));

/// Reduce an Icinga version string to `MAJOR.MINOR.PATCH`.
///
/// Strings that do not start with a version are returned as-is; an empty
/// string reads as not running.
pub fn parse_version(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return VERSION_NOT_RUNNING.to_string();
    }

    VERSION
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| raw.to_string())
}
