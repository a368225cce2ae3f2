//! Turning API responses into a [`Snapshot`](icingawatch_types::Snapshot).
//!
//! ## Submodules
//!
//! - [`builder`]: The per-tick sequence of API calls ([`SnapshotBuilder`])
//! - [`problems`]: Problem counts, severity ranking and display names
//! - [`cluster`]: Queue rates and endpoint counters from status records
//! - [`perfdata`]: Plugin performance data values and hourly rates
//! - [`version`]: Version string normalization
//!
//! ## Data Flow
//!
//! ```text
//! IcingaApi / DnsFilterApi
//!        │
//!        ▼
//! SnapshotBuilder::build()
//!        │
//!        ├──▶ problems::count_problems*() / problem_services()
//!        ├──▶ perfdata::perf_value() (room climate, ISP)
//!        └──▶ cluster::extract()
//!        │
//!        ▼
//!    Snapshot
//! ```

pub mod builder;
pub mod cluster;
pub mod perfdata;
pub mod problems;
pub mod version;

pub use builder::SnapshotBuilder;
pub use perfdata::{extract_perf_value, hourly_rate, PerfDataError};
pub use problems::{
    count_problems, count_problems_services, format_service, host_name_for_display,
    problem_services, ProblemPolicy, ProblemRanking,
};
pub use version::parse_version;

/// Round to two decimals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(1500.0), 1500.0);
        assert_eq!(round2(3.14159), 3.14);
        assert_eq!(round2(0.0), 0.0);
    }
}
