//! Snapshot - every derived metric valid at one poll tick.

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

/// Version string shown while the application status is unavailable.
pub const VERSION_NOT_RUNNING: &str = "Not running";

/// Cluster key for connected API endpoints.
pub const CONNECTED_ENDPOINTS: &str = "num_conn_endpoints";
/// Cluster key for configured but disconnected API endpoints.
pub const NOT_CONNECTED_ENDPOINTS: &str = "num_not_conn_endpoints";

/// A point-in-time view of the monitoring server.
///
/// A snapshot is built from scratch every tick. Each group falls back to
/// its default independently when the corresponding upstream call fails,
/// so a snapshot is always complete even when the server is partially
/// unreachable.
///
/// # Example
///
/// ```rust
/// use icingawatch_types::Snapshot;
///
/// let snapshot = Snapshot::default();
/// assert_eq!(snapshot.hosts.all, 0);
/// assert!(snapshot.room_climate.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Snapshot {
    /// Unix timestamp in milliseconds when this snapshot was taken.
    pub timestamp_ms: u64,

    /// Application info (version, node, start time).
    pub app: AppMetrics,

    /// Checker statistics from the CIB.
    pub checks: CheckMetrics,

    /// Host counters.
    pub hosts: HostCounts,

    /// Service counters.
    pub services: ServiceCounts,

    /// Ranked unhandled problems, down hosts first.
    pub problems: Vec<RankedProblem>,

    /// Work queue rates and cluster connectivity.
    pub cluster: ClusterMetrics,

    /// Room climate readings, `None` when the integration is disabled.
    pub room_climate: Option<RoomClimate>,

    /// ISP link readings, `None` when the integration is disabled.
    pub isp: Option<IspMetrics>,

    /// DNS filter statistics, `None` when the integration is disabled.
    pub dns_filter: Option<DnsFilterMetrics>,
}

impl Snapshot {
    /// Create an empty snapshot taken at the given time.
    pub fn with_timestamp(timestamp_ms: u64) -> Self {
        Self {
            timestamp_ms,
            ..Default::default()
        }
    }

    /// Create an empty snapshot taken now.
    #[cfg(feature = "std")]
    pub fn now() -> Self {
        Self::with_timestamp(current_timestamp_ms())
    }
}

/// General application info.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AppMetrics {
    /// `MAJOR.MINOR.PATCH`, or [`VERSION_NOT_RUNNING`].
    pub version: String,
    /// Name of the node that answered.
    pub node_name: String,
    /// Program start as a Unix timestamp in seconds.
    pub program_start: f64,
}

impl Default for AppMetrics {
    fn default() -> Self {
        Self {
            version: VERSION_NOT_RUNNING.to_string(),
            node_name: String::new(),
            program_start: 0.0,
        }
    }
}

/// Checker statistics.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CheckMetrics {
    /// Average check latency in milliseconds, two decimals.
    pub avg_latency_ms: f64,
    /// Average check execution time in milliseconds, two decimals.
    pub avg_execution_time_ms: f64,
    /// Process uptime in seconds.
    pub uptime_secs: u64,
    /// Process uptime as a compact duration string.
    pub uptime: String,
    pub host_active_checks_1min: f64,
    pub host_passive_checks_1min: f64,
    pub service_active_checks_1min: f64,
    pub service_passive_checks_1min: f64,
}

/// Host counters.
///
/// `all`, `up` and the `problems*` fields come from the object listing;
/// `up` is derived as `all - problems`. The remaining fields are the
/// server's own CIB counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HostCounts {
    pub all: u64,
    pub up: u64,
    pub problems: u64,
    pub problems_down: u64,
    pub down: u64,
    pub in_downtime: u64,
    pub acknowledged: u64,
}

/// Service counters.
///
/// `all`, `ok` and the `problems*` fields come from the object listing;
/// `ok` is derived as `all - problems`. `warning`, `critical`, `unknown`,
/// `in_downtime` and `acknowledged` are the server's own CIB counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ServiceCounts {
    pub all: u64,
    pub ok: u64,
    pub problems: u64,
    pub problems_warning: u64,
    pub problems_critical: u64,
    pub problems_unknown: u64,
    pub warning: u64,
    pub critical: u64,
    pub unknown: u64,
    pub in_downtime: u64,
    pub acknowledged: u64,
}

impl ServiceCounts {
    /// Sum of the unhandled warning, critical and unknown counts.
    pub fn problems_not_ok(&self) -> u64 {
        self.problems_warning + self.problems_critical + self.problems_unknown
    }
}

/// One entry of the ranked problem list.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RankedProblem {
    /// `"<host> - <service>"` or `"<host> is DOWN"`.
    pub label: String,
    /// State code used for coloring (down hosts render as critical).
    pub state: u8,
}

/// Queue rates and cluster connectivity extracted from status records.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClusterMetrics {
    /// `"<component> queue rate"` to items per second.
    pub queue_rates: BTreeMap<String, f64>,
    /// Endpoint and client counters. Top-level keys are stored as-is,
    /// nested ones as `"<component>.<key>"`.
    pub connectivity: BTreeMap<String, f64>,
}

impl ClusterMetrics {
    /// Connected endpoints, zero when not reported.
    pub fn connected_endpoints(&self) -> f64 {
        self.connectivity
            .get(CONNECTED_ENDPOINTS)
            .copied()
            .unwrap_or(0.0)
    }

    /// Disconnected endpoints, zero when not reported.
    pub fn not_connected_endpoints(&self) -> f64 {
        self.connectivity
            .get(NOT_CONNECTED_ENDPOINTS)
            .copied()
            .unwrap_or(0.0)
    }
}

/// Temperature and humidity from a room climate check.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoomClimate {
    pub temperature: f64,
    pub humidity: f64,
}

/// ISP link throughput and usage.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IspMetrics {
    /// Downstream throughput in Mbit/s.
    pub downstream: f64,
    /// Upstream throughput in Mbit/s.
    pub upstream: f64,
    /// Link uptime in seconds.
    pub uptime_secs: u64,
    /// Link uptime as a compact duration string.
    pub uptime: String,
    /// Cumulative received volume since the link came up.
    pub received_total: f64,
    /// Cumulative sent volume since the link came up.
    pub sent_total: f64,
    pub received_per_hour: f64,
    pub sent_per_hour: f64,
}

/// DNS filter statistics for today.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DnsFilterMetrics {
    pub queries_today: u64,
    /// Share of blocked queries in percent, two decimals.
    pub blocked_percentage: f64,
    pub enabled: bool,
}

/// Get current timestamp in milliseconds since Unix epoch.
#[cfg(feature = "std")]
fn current_timestamp_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_degraded_values() {
        let snapshot = Snapshot::with_timestamp(1_703_160_000_000);
        assert_eq!(snapshot.timestamp_ms, 1_703_160_000_000);
        assert_eq!(snapshot.app.version, VERSION_NOT_RUNNING);
        assert_eq!(snapshot.checks.uptime, "");
        assert!(snapshot.problems.is_empty());
        assert!(snapshot.isp.is_none());
        assert!(snapshot.dns_filter.is_none());
    }

    #[test]
    fn missing_endpoint_counters_read_as_zero() {
        let mut cluster = ClusterMetrics::default();
        assert_eq!(cluster.connected_endpoints(), 0.0);

        cluster
            .connectivity
            .insert(CONNECTED_ENDPOINTS.to_string(), 3.0);
        cluster
            .connectivity
            .insert(NOT_CONNECTED_ENDPOINTS.to_string(), 1.0);
        assert_eq!(cluster.connected_endpoints(), 3.0);
        assert_eq!(cluster.not_connected_endpoints(), 1.0);
    }

    #[test]
    fn problems_not_ok_sums_sub_counts() {
        let counts = ServiceCounts {
            problems_warning: 2,
            problems_critical: 3,
            problems_unknown: 1,
            ..Default::default()
        };
        assert_eq!(counts.problems_not_ok(), 6);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_roundtrip() {
        let mut snapshot = Snapshot::with_timestamp(1_703_160_000_000);
        snapshot.hosts.all = 4;
        snapshot.room_climate = Some(RoomClimate {
            temperature: 21.5,
            humidity: 40.0,
        });

        let json = serde_json::to_string(&snapshot).unwrap();
        let parsed: Snapshot = serde_json::from_str(&json).unwrap();

        assert_eq!(snapshot, parsed);
    }
}
