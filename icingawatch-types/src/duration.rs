//! Compact duration strings for uptimes.
//!
//! Uptimes are rendered as `"Xd Yh Zm"`, dropping empty components. Seconds
//! only appear when the whole duration is under a minute.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;

/// Format a number of seconds as a compact duration string.
///
/// ```rust
/// use icingawatch_types::format_compact;
///
/// assert_eq!(format_compact(90_061), "1d 1h 1m");
/// assert_eq!(format_compact(45), "45s");
/// assert_eq!(format_compact(3_600), "1h");
/// ```
pub fn format_compact(secs: u64) -> String {
    if secs < MINUTE {
        return format!("{}s", secs);
    }

    let days = secs / DAY;
    let hours = (secs % DAY) / HOUR;
    let minutes = (secs % HOUR) / MINUTE;

    let mut parts = Vec::with_capacity(3);
    if days > 0 {
        parts.push(format!("{}d", days));
    }
    if hours > 0 {
        parts.push(format!("{}h", hours));
    }
    if minutes > 0 {
        parts.push(format!("{}m", minutes));
    }

    parts.join(" ")
}

/// Convert fractional seconds as reported by the API into whole seconds.
///
/// Negative and non-finite inputs clamp to zero.
pub fn whole_secs(secs: f64) -> u64 {
    if secs.is_finite() && secs > 0.0 {
        secs as u64
    } else {
        0
    }
}
