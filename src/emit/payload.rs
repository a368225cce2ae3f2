//! Widget payloads built from a snapshot.

use icingawatch_types::{
    state_color, state_label, ChartPayload, ColorValue, DnsStatsPayload, EventGroup,
    IspLinkPayload, IspUsagePayload, LabelValue, MeterPayload, Payload, ProblemSummaryPayload,
    RoomClimatePayload, SeverityItem, SeverityPayload, Snapshot, StatsPayload, HOST_DOWN,
    SERVICE_CRITICAL, SERVICE_OK, SERVICE_UNKNOWN, SERVICE_WARNING,
};

use crate::data::{format_service, round2};

const COLOR: &str = "blue";

const SERVICE_STATES: [u8; 4] = [SERVICE_OK, SERVICE_WARNING, SERVICE_CRITICAL, SERVICE_UNKNOWN];

/// Severity list order: critical, warning, unknown, then anything else.
const SEVERITY_ORDER: [u8; 3] = [SERVICE_CRITICAL, SERVICE_WARNING, SERVICE_UNKNOWN];

/// Payload for `group`, or `None` when its integration is disabled.
pub fn build(group: EventGroup, snapshot: &Snapshot) -> Option<Payload> {
    let hosts = &snapshot.hosts;
    let services = &snapshot.services;

    let payload = match group {
        EventGroup::HostMeter => Payload::Meter(MeterPayload {
            value: hosts.problems,
            max: hosts.all,
            moreinfo: format!("Total hosts: {}", hosts.all),
            color: COLOR.into(),
        }),
        EventGroup::ServiceMeter => Payload::Meter(MeterPayload {
            value: services.problems,
            max: services.all,
            moreinfo: format!("Total services: {}", services.all),
            color: COLOR.into(),
        }),
        EventGroup::Stats => Payload::Stats(stats(snapshot)),
        EventGroup::HostDoughnut => {
            let mut moreinfo = format!("Total hosts: {}", hosts.all);
            if hosts.problems_down > 0 {
                moreinfo.push_str(&format!(" (Down: {})", hosts.problems_down));
            }
            chart(
                Some("doughnut"),
                "Hosts",
                &["UP", "Down"],
                vec![hosts.up as f64, hosts.problems_down as f64],
                Some(moreinfo),
            )
        }
        EventGroup::ServiceDoughnut => {
            let mut moreinfo = format!("Total services: {}", services.all);
            let not_ok = services.problems_not_ok();
            if not_ok > 0 {
                moreinfo.push_str(&format!(" (Not OK: {})", not_ok));
            }
            chart(
                Some("doughnut"),
                "Services",
                &SERVICE_STATES.map(|state| state_label(state, false)),
                vec![
                    services.ok as f64,
                    services.problems_warning as f64,
                    services.problems_critical as f64,
                    services.problems_unknown as f64,
                ],
                Some(moreinfo),
            )
        }
        EventGroup::EndpointBar => chart(
            None,
            "Endpoints",
            &["Connected", "Not Connected"],
            vec![
                snapshot.cluster.connected_endpoints(),
                snapshot.cluster.not_connected_endpoints(),
            ],
            None,
        ),
        EventGroup::ChecksBar => chart(
            Some("bar"),
            "Active Checks",
            &["Hosts/min", "Services/min"],
            vec![
                snapshot.checks.host_active_checks_1min,
                snapshot.checks.service_active_checks_1min,
            ],
            None,
        ),
        EventGroup::DowntimeBar => chart(
            Some("bar"),
            "Downtimes",
            &["Hosts", "Services"],
            vec![hosts.in_downtime as f64, services.in_downtime as f64],
            None,
        ),
        EventGroup::AckBar => chart(
            Some("bar"),
            "Acknowledgements",
            &["Hosts", "Services"],
            vec![hosts.acknowledged as f64, services.acknowledged as f64],
            None,
        ),
        EventGroup::Severity => Payload::Severity(severity(snapshot)),
        EventGroup::HostProblems => {
            let mut items = Vec::new();
            if hosts.problems_down > 0 {
                items.push(ColorValue {
                    color: state_color(HOST_DOWN, true).into(),
                    value: hosts.problems_down,
                });
            }
            Payload::ProblemSummary(ProblemSummaryPayload {
                items,
                moreinfo: format!("All Problems: {}", hosts.problems_down),
            })
        }
        EventGroup::ServiceProblems => {
            let items = [
                (SERVICE_CRITICAL, services.problems_critical),
                (SERVICE_WARNING, services.problems_warning),
                (SERVICE_UNKNOWN, services.problems_unknown),
            ]
            .into_iter()
            .filter(|(_, count)| *count > 0)
            .map(|(state, count)| ColorValue {
                color: state_color(state, false).into(),
                value: count,
            })
            .collect();
            Payload::ProblemSummary(ProblemSummaryPayload {
                items,
                moreinfo: format!("All Problems: {}", services.problems_not_ok()),
            })
        }
        EventGroup::RoomClimate => {
            let climate = snapshot.room_climate?;
            Payload::RoomClimate(RoomClimatePayload {
                current: climate.temperature,
                suffix: "°C".into(),
                moreinfo: format!("Humidity: {} %H", climate.humidity.round()),
            })
        }
        EventGroup::IspLink => {
            let isp = snapshot.isp.as_ref()?;
            Payload::IspLink(IspLinkPayload {
                downstream: isp.downstream.round(),
                upstream: isp.upstream.round(),
                uptime: isp.uptime.clone(),
                unitinfo: "In Mbit/s".into(),
            })
        }
        EventGroup::IspUsage => {
            let isp = snapshot.isp.as_ref()?;
            Payload::IspUsage(IspUsagePayload {
                received_per_hour: isp.received_per_hour,
                sent_per_hour: isp.sent_per_hour,
                received_total: isp.received_total,
                sent_total: isp.sent_total,
                unitinfo: "In MB".into(),
            })
        }
        EventGroup::DnsStats => {
            let dns = snapshot.dns_filter?;
            Payload::DnsStats(DnsStatsPayload {
                queries_today: dns.queries_today,
                blocked_percentage: dns.blocked_percentage,
                enabled: dns.enabled,
            })
        }
    };

    Some(payload)
}

fn chart(
    kind: Option<&str>,
    header: &str,
    labels: &[&str],
    datasets: Vec<f64>,
    moreinfo: Option<String>,
) -> Payload {
    Payload::Chart(ChartPayload {
        kind: kind.map(Into::into),
        header: header.into(),
        labels: labels.iter().map(|l| l.to_string()).collect(),
        datasets,
        moreinfo,
    })
}

fn stats(snapshot: &Snapshot) -> StatsPayload {
    let checks = &snapshot.checks;
    let mut items = vec![
        label_value("Uptime", checks.uptime.clone()),
        label_value("Avg latency in ms", format_number(checks.avg_latency_ms)),
        label_value("Host checks/min", format_number(checks.host_active_checks_1min)),
        label_value(
            "Service checks/min",
            format_number(checks.service_active_checks_1min),
        ),
    ];

    items.extend(
        snapshot
            .cluster
            .queue_rates
            .iter()
            .map(|(name, rate)| label_value(name, format_number(*rate))),
    );

    StatsPayload {
        title: format!("Icinga {}", snapshot.app.version),
        items,
        color: COLOR.into(),
    }
}

fn severity(snapshot: &Snapshot) -> SeverityPayload {
    let mut items: Vec<SeverityItem> = snapshot
        .problems
        .iter()
        .map(|problem| SeverityItem {
            label: format_service(&problem.label).to_string(),
            color: state_color(problem.state, false).into(),
            state: problem.state,
        })
        .collect();

    items.sort_by_key(|item| {
        SEVERITY_ORDER
            .iter()
            .position(|state| *state == item.state)
            .unwrap_or(SEVERITY_ORDER.len())
    });

    SeverityPayload {
        items,
        color: COLOR.into(),
    }
}

fn label_value(label: &str, value: String) -> LabelValue {
    LabelValue {
        label: label.to_string(),
        value,
    }
}

/// Two decimals at most, no trailing zeros; zero is `"0"`.
fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    format!("{}", round2(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use icingawatch_types::{DnsFilterMetrics, IspMetrics, RankedProblem, RoomClimate};

    fn snapshot() -> Snapshot {
        let mut snapshot = Snapshot::with_timestamp(0);
        snapshot.app.version = "2.11.0".into();
        snapshot.checks.uptime = "1d 1h 1m".into();
        snapshot.checks.avg_latency_ms = 12.5;
        snapshot.checks.host_active_checks_1min = 12.0;
        snapshot.checks.service_active_checks_1min = 40.0;
        snapshot.hosts.all = 3;
        snapshot.hosts.up = 2;
        snapshot.hosts.problems = 1;
        snapshot.hosts.problems_down = 1;
        snapshot.services.all = 5;
        snapshot.services.ok = 3;
        snapshot.services.problems = 2;
        snapshot.services.problems_warning = 1;
        snapshot.services.problems_critical = 1;
        snapshot
            .cluster
            .queue_rates
            .insert("json_rpc queue rate".into(), 0.0);
        snapshot
            .cluster
            .queue_rates
            .insert("ido-mysql queue rate".into(), 3.14159);
        snapshot
    }

    #[test]
    fn test_stats_items() {
        let Some(Payload::Stats(stats)) = build(EventGroup::Stats, &snapshot()) else {
            panic!("expected stats payload");
        };

        assert_eq!(stats.title, "Icinga 2.11.0");
        let items: Vec<_> = stats
            .items
            .iter()
            .map(|i| (i.label.as_str(), i.value.as_str()))
            .collect();
        assert_eq!(
            items,
            [
                ("Uptime", "1d 1h 1m"),
                ("Avg latency in ms", "12.5"),
                ("Host checks/min", "12"),
                ("Service checks/min", "40"),
                ("ido-mysql queue rate", "3.14"),
                ("json_rpc queue rate", "0"),
            ]
        );
    }

    #[test]
    fn test_doughnuts() {
        let snapshot = snapshot();

        let Some(Payload::Chart(hosts)) = build(EventGroup::HostDoughnut, &snapshot) else {
            panic!("expected chart payload");
        };
        assert_eq!(hosts.kind.as_deref(), Some("doughnut"));
        assert_eq!(hosts.datasets, vec![2.0, 1.0]);
        assert_eq!(hosts.moreinfo.as_deref(), Some("Total hosts: 3 (Down: 1)"));

        let Some(Payload::Chart(services)) = build(EventGroup::ServiceDoughnut, &snapshot) else {
            panic!("expected chart payload");
        };
        assert_eq!(services.labels, ["OK", "Warning", "Critical", "Unknown"]);
        assert_eq!(services.datasets, vec![3.0, 1.0, 1.0, 0.0]);
        assert_eq!(
            services.moreinfo.as_deref(),
            Some("Total services: 5 (Not OK: 2)")
        );
    }

    #[test]
    fn test_endpoint_bar_has_no_type() {
        let Some(Payload::Chart(chart)) = build(EventGroup::EndpointBar, &snapshot()) else {
            panic!("expected chart payload");
        };
        assert!(chart.kind.is_none());
        assert_eq!(chart.datasets, vec![0.0, 0.0]);
    }

    #[test]
    fn test_severity_order() {
        let mut snapshot = snapshot();
        snapshot.problems = vec![
            RankedProblem { label: "a - W".into(), state: SERVICE_WARNING },
            RankedProblem { label: "b - U".into(), state: SERVICE_UNKNOWN },
            RankedProblem { label: "c is DOWN".into(), state: SERVICE_CRITICAL },
            RankedProblem { label: "d - W".into(), state: SERVICE_WARNING },
        ];

        let Some(Payload::Severity(severity)) = build(EventGroup::Severity, &snapshot) else {
            panic!("expected severity payload");
        };
        let labels: Vec<_> = severity.items.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, ["c is DOWN", "a - W", "d - W", "b - U"]);
        assert_eq!(severity.items[0].color, "red");
        assert_eq!(severity.items[3].color, "purple");
    }

    #[test]
    fn test_problem_summaries() {
        let snapshot = snapshot();

        let Some(Payload::ProblemSummary(hosts)) = build(EventGroup::HostProblems, &snapshot)
        else {
            panic!("expected problem summary");
        };
        assert_eq!(hosts.items, vec![ColorValue { color: "red".into(), value: 1 }]);
        assert_eq!(hosts.moreinfo, "All Problems: 1");

        let Some(Payload::ProblemSummary(services)) =
            build(EventGroup::ServiceProblems, &snapshot)
        else {
            panic!("expected problem summary");
        };
        let colors: Vec<_> = services.items.iter().map(|i| i.color.as_str()).collect();
        assert_eq!(colors, ["red", "yellow"]);
        assert_eq!(services.moreinfo, "All Problems: 2");
    }

    #[test]
    fn test_disabled_integrations_have_no_payload() {
        let snapshot = snapshot();
        for group in [
            EventGroup::RoomClimate,
            EventGroup::IspLink,
            EventGroup::IspUsage,
            EventGroup::DnsStats,
        ] {
            assert!(build(group, &snapshot).is_none(), "{:?}", group);
        }
    }

    #[test]
    fn test_integration_payloads() {
        let mut snapshot = snapshot();
        snapshot.room_climate = Some(RoomClimate {
            temperature: 21.5,
            humidity: 40.6,
        });
        snapshot.isp = Some(IspMetrics {
            downstream: 100.4,
            upstream: 39.6,
            uptime: "2h".into(),
            ..Default::default()
        });
        snapshot.dns_filter = Some(DnsFilterMetrics {
            queries_today: 10,
            blocked_percentage: 5.5,
            enabled: true,
        });

        let Some(Payload::RoomClimate(climate)) = build(EventGroup::RoomClimate, &snapshot) else {
            panic!("expected room climate payload");
        };
        assert_eq!(climate.current, 21.5);
        assert_eq!(climate.moreinfo, "Humidity: 41 %H");

        let Some(Payload::IspLink(link)) = build(EventGroup::IspLink, &snapshot) else {
            panic!("expected ISP payload");
        };
        assert_eq!((link.downstream, link.upstream), (100.0, 40.0));
        assert_eq!(link.unitinfo, "In Mbit/s");

        assert!(matches!(
            build(EventGroup::DnsStats, &snapshot),
            Some(Payload::DnsStats(DnsStatsPayload { queries_today: 10, .. }))
        ));
    }
}
