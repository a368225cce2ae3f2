//! Problem counting and severity ranking.
//!
//! An entity is a problem when it is in a non-OK state and nobody has
//! handled it yet (no acknowledgement, no downtime). With the hard state
//! policy active, entities whose last hard state was OK are ignored so
//! flapping soft states do not show up on the dashboard.

use std::collections::HashSet;

use icingawatch_adapters::icinga::ObjectQuery;
use icingawatch_types::{
    ProblemEntity, RankedProblem, ServiceEntity, SERVICE_CRITICAL, SERVICE_OK, SERVICE_UNKNOWN,
    SERVICE_WARNING,
};

/// Default length of the ranked service list.
pub const MAX_RANKED_SERVICES: usize = 30;

/// State reported for down hosts in the ranked list (rendered as critical).
pub const DOWN_HOST_STATE: u8 = 2;

const HOST_ATTRS: &[&str] = &[
    "name",
    "display_name",
    "state",
    "acknowledgement",
    "downtime_depth",
    "last_check",
];

const SERVICE_ATTRS: &[&str] = &[
    "name",
    "display_name",
    "host_name",
    "state",
    "acknowledgement",
    "downtime_depth",
    "last_check",
];

const SERVICE_JOINS: &[&str] = &[
    "host.name",
    "host.display_name",
    "host.state",
    "host.acknowledgement",
    "host.downtime_depth",
    "host.last_check",
];

/// How problems are selected. Fixed when the profile is loaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProblemPolicy {
    /// Ignore entities whose last hard state was OK/Up.
    pub hard_state_only: bool,
}

impl ProblemPolicy {
    /// Minimal host listing; `last_hard_state` only when it is needed.
    pub fn host_query(&self) -> ObjectQuery {
        ObjectQuery::new(self.with_hard_state(HOST_ATTRS))
    }

    /// Minimal service listing joined with its host.
    pub fn service_query(&self) -> ObjectQuery {
        ObjectQuery::new(self.with_hard_state(SERVICE_ATTRS)).joins(SERVICE_JOINS.iter().copied())
    }

    fn with_hard_state(&self, attrs: &[&'static str]) -> Vec<&'static str> {
        let mut attrs = attrs.to_vec();
        if self.hard_state_only {
            attrs.push("last_hard_state");
        }
        attrs
    }

    fn passes(&self, entity: &ProblemEntity) -> bool {
        !self.hard_state_only || !entity.hard_state_recovered()
    }
}

fn state_matches(state: u8, wanted: Option<u8>) -> bool {
    match wanted {
        Some(wanted) => state == wanted,
        None => (SERVICE_WARNING..=SERVICE_UNKNOWN).contains(&state),
    }
}

fn is_open_problem(entity: &ProblemEntity, wanted: Option<u8>, policy: ProblemPolicy) -> bool {
    state_matches(entity.state, wanted) && !entity.is_handled() && policy.passes(entity)
}

/// Count unhandled hosts in a problem state, or in exactly `state`.
pub fn count_problems(hosts: &[ProblemEntity], state: Option<u8>, policy: ProblemPolicy) -> u64 {
    hosts
        .iter()
        .filter(|host| is_open_problem(host, state, policy))
        .count() as u64
}

/// Count unhandled services in a problem state, or in exactly `state`.
///
/// Services on a host that is not Up are not counted: the host problem
/// already covers them.
pub fn count_problems_services(
    services: &[ServiceEntity],
    state: Option<u8>,
    policy: ProblemPolicy,
) -> u64 {
    services
        .iter()
        .filter(|entry| !entry.host.is_host_down())
        .filter(|entry| is_open_problem(&entry.service, state, policy))
        .count() as u64
}

fn base_severity(entity: &ProblemEntity) -> u32 {
    match entity.state {
        SERVICE_OK if entity.has_been_checked() => 16,
        SERVICE_OK => 0,
        SERVICE_WARNING => 32,
        SERVICE_CRITICAL => 128,
        SERVICE_UNKNOWN => 64,
        _ => 256,
    }
}

/// Sort key for a host.
pub fn host_severity(host: &ProblemEntity) -> u32 {
    let modifier = if host.acknowledged {
        2
    } else if host.in_downtime {
        1
    } else {
        4
    };
    base_severity(host) + modifier
}

/// Sort key for a service; unhandled problems on down hosts rank highest.
pub fn service_severity(entry: &ServiceEntity) -> u32 {
    let service = &entry.service;
    let modifier = if service.acknowledged {
        512
    } else if service.in_downtime {
        256
    } else {
        2048
    };
    let host_down = if entry.host.is_host_down() { 1024 } else { 0 };
    base_severity(service) + modifier + host_down
}

/// Scored problem services and the ranked list shown on the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct ProblemRanking<'a> {
    /// Every problem service with its severity, in input order.
    pub problems: Vec<(&'a ServiceEntity, u32)>,
    /// Down hosts first, then the highest-severity services.
    pub ranked: Vec<RankedProblem>,
}

/// Rank unhandled problems.
///
/// All unhandled down hosts come first in input order. They are followed by
/// at most `max_items` services, highest severity first with ties kept in
/// input order. Labels are unique; the first entry with a label wins.
pub fn problem_services<'a>(
    services: &'a [ServiceEntity],
    hosts: &[ProblemEntity],
    max_items: usize,
    policy: ProblemPolicy,
) -> ProblemRanking<'a> {
    let problems: Vec<(&ServiceEntity, u32)> = services
        .iter()
        .filter(|entry| {
            entry.service.state != SERVICE_OK
                && !entry.service.is_handled()
                && !entry.host.is_host_down()
                && policy.passes(&entry.service)
        })
        .map(|entry| (entry, service_severity(entry)))
        .collect();

    let mut ranked: Vec<RankedProblem> = Vec::new();
    let mut seen = HashSet::new();

    for host in hosts
        .iter()
        .filter(|host| host.is_host_down() && !host.is_handled() && policy.passes(host))
    {
        let label = format!("{} is DOWN", host_name_for_display(&host.display_name));
        if seen.insert(label.clone()) {
            ranked.push(RankedProblem {
                label,
                state: DOWN_HOST_STATE,
            });
        }
    }

    let mut by_severity = problems.clone();
    by_severity.sort_by(|a, b| b.1.cmp(&a.1));

    let services_ranked = by_severity
        .into_iter()
        .filter_map(|(entry, _)| {
            let label = format!(
                "{} - {}",
                host_name_for_display(&entry.host.display_name),
                entry.service.display_name
            );
            seen.insert(label.clone()).then(|| RankedProblem {
                label,
                state: entry.service.state,
            })
        })
        .take(max_items);
    ranked.extend(services_ranked);

    ProblemRanking { problems, ranked }
}

/// Shorten a host display name: `"DB: primary (cluster) | tag"` becomes
/// `"DB (primary)"`.
pub fn host_name_for_display(raw: &str) -> String {
    let clean = raw.split(['(', '|']).next().unwrap_or_default();
    let mut parts = clean.split(": ");

    match (parts.next(), parts.next()) {
        (Some(first), Some(second)) => format!("{} ({})", first.trim(), second.trim()),
        _ => clean.trim().to_string(),
    }
}

/// Host part of a `host!service` object name.
pub fn format_service(name: &str) -> &str {
    name.split('!').next().unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use icingawatch_types::{HOST_DOWN, HOST_UP};

    fn entity(name: &str, state: u8) -> ProblemEntity {
        ProblemEntity {
            name: name.to_string(),
            display_name: name.to_string(),
            state,
            last_check: 1_700_000_000.0,
            ..Default::default()
        }
    }

    fn service(host: &str, host_state: u8, name: &str, state: u8) -> ServiceEntity {
        ServiceEntity {
            service: entity(name, state),
            host: entity(host, host_state),
        }
    }

    const SOFT: ProblemPolicy = ProblemPolicy {
        hard_state_only: false,
    };
    const HARD: ProblemPolicy = ProblemPolicy {
        hard_state_only: true,
    };

    #[test]
    fn test_queries_follow_policy() {
        assert!(!SOFT.host_query().attrs.contains(&"last_hard_state".to_string()));
        assert!(HARD.host_query().attrs.contains(&"last_hard_state".to_string()));

        let query = HARD.service_query();
        assert!(query.attrs.contains(&"last_hard_state".to_string()));
        assert!(query.joins.contains(&"host.state".to_string()));
        assert!(query.filter.is_none());
    }

    #[test]
    fn test_handled_hosts_are_not_counted() {
        let mut acked = entity("a", HOST_DOWN);
        acked.acknowledged = true;
        let mut maintenance = entity("b", HOST_DOWN);
        maintenance.in_downtime = true;
        let hosts = vec![acked, maintenance, entity("c", HOST_DOWN), entity("d", HOST_UP)];

        assert_eq!(count_problems(&hosts, None, SOFT), 1);
        assert_eq!(count_problems(&hosts, Some(HOST_DOWN), SOFT), 1);
    }

    #[test]
    fn test_hard_state_policy() {
        let mut soft_problem = entity("a", HOST_DOWN);
        soft_problem.last_hard_state = Some(0);
        let mut hard_problem = entity("b", HOST_DOWN);
        hard_problem.last_hard_state = Some(1);
        let hosts = vec![soft_problem, hard_problem];

        assert_eq!(count_problems(&hosts, None, SOFT), 2);
        assert_eq!(count_problems(&hosts, None, HARD), 1);
    }

    #[test]
    fn test_services_on_down_hosts_are_not_counted() {
        let services = vec![
            service("web", HOST_UP, "http", SERVICE_CRITICAL),
            service("web", HOST_UP, "disk", SERVICE_WARNING),
            service("db", HOST_DOWN, "mysql", SERVICE_CRITICAL),
            service("db", HOST_UP, "ping", SERVICE_OK),
        ];

        assert_eq!(count_problems_services(&services, None, SOFT), 2);
        assert_eq!(count_problems_services(&services, Some(SERVICE_CRITICAL), SOFT), 1);
        assert_eq!(count_problems_services(&services, Some(SERVICE_UNKNOWN), SOFT), 0);
    }

    #[test]
    fn test_service_severity() {
        let critical = service("web", HOST_UP, "http", SERVICE_CRITICAL);
        assert_eq!(service_severity(&critical), 128 + 2048);

        let mut acked = service("web", HOST_UP, "disk", SERVICE_WARNING);
        acked.service.acknowledged = true;
        assert_eq!(service_severity(&acked), 32 + 512);

        let unknown_on_down = service("db", HOST_DOWN, "mysql", SERVICE_UNKNOWN);
        assert_eq!(service_severity(&unknown_on_down), 64 + 2048 + 1024);

        let mut pending = service("db", HOST_UP, "new", SERVICE_OK);
        pending.service.last_check = 0.0;
        pending.service.in_downtime = true;
        assert_eq!(service_severity(&pending), 256);
    }

    #[test]
    fn test_host_severity() {
        let mut host = entity("a", HOST_UP);
        assert_eq!(host_severity(&host), 16 + 4);
        host.state = HOST_DOWN;
        host.acknowledged = true;
        assert_eq!(host_severity(&host), 32 + 2);
    }

    #[test]
    fn test_ranking_puts_down_hosts_first() {
        let hosts = vec![
            entity("web: one", HOST_UP),
            entity("db: primary (cluster)", HOST_DOWN),
        ];
        let services = vec![
            service("web: one", HOST_UP, "Disk", SERVICE_WARNING),
            service("web: one", HOST_UP, "HTTP", SERVICE_CRITICAL),
            service("web: one", HOST_UP, "NTP", SERVICE_UNKNOWN),
            service("db: primary (cluster)", HOST_DOWN, "MySQL", SERVICE_CRITICAL),
        ];

        let ranking = problem_services(&services, &hosts, MAX_RANKED_SERVICES, SOFT);

        assert_eq!(ranking.problems.len(), 3);
        let labels: Vec<_> = ranking.ranked.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(
            labels,
            [
                "db (primary) is DOWN",
                "web (one) - HTTP",
                "web (one) - NTP",
                "web (one) - Disk",
            ]
        );
        assert_eq!(ranking.ranked[0].state, DOWN_HOST_STATE);
        assert_eq!(ranking.ranked[1].state, SERVICE_CRITICAL);
    }

    #[test]
    fn test_ranking_caps_services_only() {
        let hosts = vec![entity("a", HOST_DOWN), entity("b", HOST_DOWN)];
        let services: Vec<_> = (0..5)
            .map(|i| service("c", HOST_UP, &format!("svc{}", i), SERVICE_WARNING))
            .collect();

        let ranking = problem_services(&services, &hosts, 2, SOFT);

        assert_eq!(ranking.ranked.len(), 4);
        assert_eq!(ranking.ranked[2].label, "c - svc0");
        assert_eq!(ranking.ranked[3].label, "c - svc1");
    }

    #[test]
    fn test_handled_services_are_not_counted() {
        let mut acked = service("web", HOST_UP, "http", SERVICE_CRITICAL);
        acked.service.acknowledged = true;
        let mut maintenance = service("web", HOST_UP, "disk", SERVICE_WARNING);
        maintenance.service.in_downtime = true;
        let open = service("web", HOST_UP, "ntp", SERVICE_UNKNOWN);
        let services = vec![acked, maintenance, open];

        for policy in [SOFT, HARD] {
            assert_eq!(count_problems_services(&services, None, policy), 1);
            assert_eq!(
                count_problems_services(&services, Some(SERVICE_CRITICAL), policy),
                0
            );
            let ranking = problem_services(&services, &[], MAX_RANKED_SERVICES, policy);
            let labels: Vec<_> = ranking.ranked.iter().map(|p| p.label.as_str()).collect();
            assert_eq!(labels, ["web - ntp"]);
        }
    }

    #[test]
    fn test_handled_hosts_are_not_counted_with_hard_states() {
        let mut acked = entity("a", HOST_DOWN);
        acked.acknowledged = true;
        acked.last_hard_state = Some(1);
        let mut maintenance = entity("b", HOST_DOWN);
        maintenance.in_downtime = true;
        maintenance.last_hard_state = Some(1);
        let hosts = vec![acked, maintenance];

        assert_eq!(count_problems(&hosts, None, HARD), 0);
        assert!(problem_services(&[], &hosts, MAX_RANKED_SERVICES, HARD)
            .ranked
            .is_empty());
    }

    #[test]
    fn test_hard_state_policy_for_services() {
        let mut recovered = service("web", HOST_UP, "http", SERVICE_CRITICAL);
        recovered.service.last_hard_state = Some(0);
        let mut hard = service("web", HOST_UP, "disk", SERVICE_WARNING);
        hard.service.last_hard_state = Some(1);
        let services = vec![recovered, hard];

        assert_eq!(count_problems_services(&services, None, SOFT), 2);
        assert_eq!(count_problems_services(&services, None, HARD), 1);
        assert_eq!(
            count_problems_services(&services, Some(SERVICE_CRITICAL), HARD),
            0
        );

        let ranking = problem_services(&services, &[], MAX_RANKED_SERVICES, HARD);
        assert_eq!(ranking.problems.len(), 1);
        let labels: Vec<_> = ranking.ranked.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, ["web - disk"]);
    }

    #[test]
    fn test_recovered_down_host_is_not_ranked() {
        let mut recovered = entity("db: primary", HOST_DOWN);
        recovered.last_hard_state = Some(0);
        let mut hard = entity("db: replica", HOST_DOWN);
        hard.last_hard_state = Some(1);
        let hosts = vec![recovered, hard];

        let ranking = problem_services(&[], &hosts, MAX_RANKED_SERVICES, HARD);
        let labels: Vec<_> = ranking.ranked.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, ["db (replica) is DOWN"]);

        let ranking = problem_services(&[], &hosts, MAX_RANKED_SERVICES, SOFT);
        assert_eq!(ranking.ranked.len(), 2);
    }

    #[test]
    fn test_ranked_labels_are_unique() {
        let hosts = vec![
            entity("db: primary (eu)", HOST_DOWN),
            entity("db: primary (us)", HOST_DOWN),
        ];
        let services = vec![
            service("web: one (eu)", HOST_UP, "HTTP", SERVICE_WARNING),
            service("web: one (us)", HOST_UP, "HTTP", SERVICE_CRITICAL),
            service("web: one (us)", HOST_UP, "Disk", SERVICE_WARNING),
        ];

        let ranking = problem_services(&services, &hosts, 2, SOFT);
        let ranked: Vec<_> = ranking
            .ranked
            .iter()
            .map(|p| (p.label.as_str(), p.state))
            .collect();
        assert_eq!(
            ranked,
            [
                ("db (primary) is DOWN", DOWN_HOST_STATE),
                ("web (one) - HTTP", SERVICE_CRITICAL),
                ("web (one) - Disk", SERVICE_WARNING),
            ]
        );
    }

    #[test]
    fn test_host_name_for_display() {
        assert_eq!(host_name_for_display("DB: primary (cluster) | tag"), "DB (primary)");
        assert_eq!(host_name_for_display("standalone"), "standalone");
        assert_eq!(host_name_for_display("router | core"), "router");
    }

    #[test]
    fn test_format_service() {
        assert_eq!(format_service("web1!http"), "web1");
        assert_eq!(format_service("web1"), "web1");
    }
}
