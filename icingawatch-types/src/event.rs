//! Dashboard events: names, emission policy and payload shapes.

use alloc::string::String;
use alloc::vec::Vec;

/// A dashboard widget group fed by one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum EventGroup {
    HostMeter,
    ServiceMeter,
    Stats,
    HostDoughnut,
    ServiceDoughnut,
    EndpointBar,
    ChecksBar,
    DowntimeBar,
    AckBar,
    Severity,
    HostProblems,
    ServiceProblems,
    RoomClimate,
    IspLink,
    IspUsage,
    DnsStats,
}

/// When a group's event is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Emission {
    /// Only when a field feeding the payload differs from the previous tick.
    OnChange,
    /// Every tick.
    Always,
}

/// Every group, its event name and its emission policy, in emission order.
pub const EMISSION_TABLE: &[(EventGroup, &str, Emission)] = &[
    (EventGroup::HostMeter, "icinga-host-meter", Emission::OnChange),
    (EventGroup::ServiceMeter, "icinga-service-meter", Emission::OnChange),
    (EventGroup::Stats, "icinga-stats", Emission::Always),
    (EventGroup::HostDoughnut, "doughnut-pie-hosts", Emission::OnChange),
    (EventGroup::ServiceDoughnut, "doughnut-pie-services", Emission::OnChange),
    (EventGroup::EndpointBar, "bar-chart-endpoints", Emission::OnChange),
    (EventGroup::ChecksBar, "bar-chart-checks", Emission::OnChange),
    (EventGroup::DowntimeBar, "bar-chart-downtimes", Emission::OnChange),
    (EventGroup::AckBar, "bar-chart-acks", Emission::OnChange),
    (EventGroup::Severity, "icinga-severity", Emission::Always),
    (EventGroup::HostProblems, "icinga-host-problems", Emission::Always),
    (EventGroup::ServiceProblems, "icinga-service-problems", Emission::Always),
    (EventGroup::RoomClimate, "icinga-room-climate", Emission::OnChange),
    (EventGroup::IspLink, "icinga-isp", Emission::OnChange),
    (EventGroup::IspUsage, "icinga-isp-usage", Emission::OnChange),
    (EventGroup::DnsStats, "dns-filter-stats", Emission::OnChange),
];

impl EventGroup {
    fn entry(self) -> &'static (EventGroup, &'static str, Emission) {
        EMISSION_TABLE
            .iter()
            .find(|(group, _, _)| *group == self)
            .unwrap_or_else(|| unreachable!("every EventGroup has an EMISSION_TABLE row"))
    }

    /// Name of the event sent to the dashboard.
    pub fn event_name(self) -> &'static str {
        self.entry().1
    }

    /// Emission policy for this group.
    pub fn emission(self) -> Emission {
        self.entry().2
    }
}

/// A named event ready for delivery.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Event {
    /// Widget id the dashboard routes on.
    pub name: &'static str,
    pub payload: Payload,
}

impl Event {
    /// Create an event for a group.
    pub fn new(group: EventGroup, payload: Payload) -> Self {
        Self {
            name: group.event_name(),
            payload,
        }
    }
}

/// Payload shapes understood by the dashboard widgets.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Payload {
    Meter(MeterPayload),
    Stats(StatsPayload),
    Chart(ChartPayload),
    Severity(SeverityPayload),
    ProblemSummary(ProblemSummaryPayload),
    RoomClimate(RoomClimatePayload),
    IspLink(IspLinkPayload),
    IspUsage(IspUsagePayload),
    DnsStats(DnsStatsPayload),
}

/// Gauge of problems against a total.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MeterPayload {
    pub value: u64,
    pub max: u64,
    pub moreinfo: String,
    pub color: String,
}

/// Labelled value list headed by the application version.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StatsPayload {
    pub title: String,
    pub items: Vec<LabelValue>,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LabelValue {
    pub label: String,
    pub value: String,
}

/// Doughnut or bar chart.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ChartPayload {
    #[cfg_attr(feature = "serde", serde(rename = "type", skip_serializing_if = "Option::is_none"))]
    pub kind: Option<String>,
    pub header: String,
    pub labels: Vec<String>,
    pub datasets: Vec<f64>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub moreinfo: Option<String>,
}

/// Ranked problem list.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SeverityPayload {
    pub items: Vec<SeverityItem>,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SeverityItem {
    pub label: String,
    pub color: String,
    pub state: u8,
}

/// Colored counters of unhandled problems.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ProblemSummaryPayload {
    pub items: Vec<ColorValue>,
    pub moreinfo: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ColorValue {
    pub color: String,
    pub value: u64,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RoomClimatePayload {
    pub current: f64,
    pub suffix: String,
    pub moreinfo: String,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct IspLinkPayload {
    pub downstream: f64,
    pub upstream: f64,
    pub uptime: String,
    pub unitinfo: String,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct IspUsagePayload {
    pub received_per_hour: f64,
    pub sent_per_hour: f64,
    pub received_total: f64,
    pub sent_total: f64,
    pub unitinfo: String,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DnsStatsPayload {
    pub queries_today: u64,
    pub blocked_percentage: f64,
    pub enabled: bool,
}
