//! Plugin performance data.
//!
//! Check plugins report metrics as `label=value[UOM];warn;crit;min;max`
//! tokens. Only the value of the first field is of interest here.

use thiserror::Error;
use tracing::warn;

use icingawatch_adapters::icinga::CheckResult;

/// Why a performance data token did not yield a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PerfDataError {
    #[error("'{token}' does not start with '{prefix}'")]
    PrefixMismatch { token: String, prefix: String },

    #[error("'{0}' has no '=' separator")]
    MissingValue(String),

    #[error("'{0}' has no numeric value")]
    NotNumeric(String),
}

/// Extract the value of a `label=value;...` token whose label starts with
/// `prefix`.
///
/// Every character other than ASCII digits and `.` is stripped from the
/// value before parsing, which drops units such as `%` or `MB`.
pub fn extract_perf_value(token: &str, prefix: &str) -> Result<f64, PerfDataError> {
    if !token.starts_with(prefix) {
        return Err(PerfDataError::PrefixMismatch {
            token: token.to_string(),
            prefix: prefix.to_string(),
        });
    }

    let (_, value) = token
        .split_once('=')
        .ok_or_else(|| PerfDataError::MissingValue(token.to_string()))?;
    let value = value.split(';').next().unwrap_or_default();

    let numeric: String = value
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    numeric
        .parse()
        .map_err(|_| PerfDataError::NotNumeric(token.to_string()))
}

/// Value for `prefix` across all check results; the last match wins and
/// `0.0` is returned when nothing matches.
pub fn perf_value(results: &[CheckResult], prefix: &str) -> f64 {
    let mut found = 0.0;

    for result in results {
        for token in &result.performance_data {
            match extract_perf_value(token, prefix) {
                Ok(value) => found = value,
                Err(PerfDataError::PrefixMismatch { .. }) => {}
                Err(err) => warn!("Ignoring performance data of {}: {}", result.name, err),
            }
        }
    }

    found
}

/// Volume per hour for a total accumulated over `elapsed_secs`.
///
/// Under an hour the total itself is the best available estimate.
pub fn hourly_rate(total: f64, elapsed_secs: f64) -> f64 {
    let hours = elapsed_secs / 3600.0;
    if hours < 1.0 {
        total
    } else {
        total / hours
    }
}
