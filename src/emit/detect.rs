//! Change detection between consecutive snapshots.

use icingawatch_types::{Emission, Event, EventGroup, Snapshot, EMISSION_TABLE};

use super::payload;

/// Whether any field feeding `group`'s payload differs between snapshots.
///
/// Groups emitted every tick always report a change.
pub fn changed(group: EventGroup, prev: &Snapshot, next: &Snapshot) -> bool {
    let (ph, nh) = (&prev.hosts, &next.hosts);
    let (ps, ns) = (&prev.services, &next.services);

    match group {
        EventGroup::HostMeter => ph.problems != nh.problems || ph.all != nh.all,
        EventGroup::ServiceMeter => ps.problems != ns.problems || ps.all != ns.all,
        EventGroup::HostDoughnut => {
            ph.up != nh.up || ph.problems_down != nh.problems_down || ph.all != nh.all
        }
        EventGroup::ServiceDoughnut => {
            ps.ok != ns.ok
                || ps.problems_warning != ns.problems_warning
                || ps.problems_critical != ns.problems_critical
                || ps.problems_unknown != ns.problems_unknown
                || ps.all != ns.all
        }
        EventGroup::EndpointBar => {
            prev.cluster.connected_endpoints() != next.cluster.connected_endpoints()
                || prev.cluster.not_connected_endpoints() != next.cluster.not_connected_endpoints()
        }
        EventGroup::ChecksBar => {
            prev.checks.host_active_checks_1min != next.checks.host_active_checks_1min
                || prev.checks.service_active_checks_1min != next.checks.service_active_checks_1min
        }
        EventGroup::DowntimeBar => {
            ph.in_downtime != nh.in_downtime || ps.in_downtime != ns.in_downtime
        }
        EventGroup::AckBar => ph.acknowledged != nh.acknowledged || ps.acknowledged != ns.acknowledged,
        EventGroup::RoomClimate => prev.room_climate != next.room_climate,
        EventGroup::IspLink => {
            let link = |s: &Snapshot| {
                s.isp
                    .as_ref()
                    .map(|isp| (isp.downstream, isp.upstream, isp.uptime.clone()))
            };
            link(prev) != link(next)
        }
        EventGroup::IspUsage => {
            let usage = |s: &Snapshot| {
                s.isp.as_ref().map(|isp| {
                    (
                        isp.received_total,
                        isp.sent_total,
                        isp.received_per_hour,
                        isp.sent_per_hour,
                    )
                })
            };
            usage(prev) != usage(next)
        }
        EventGroup::DnsStats => prev.dns_filter != next.dns_filter,
        EventGroup::Stats
        | EventGroup::Severity
        | EventGroup::HostProblems
        | EventGroup::ServiceProblems => true,
    }
}

/// Events due for `next`, in emission table order.
///
/// Without a previous snapshot every group is due. Groups of disabled
/// integrations are never emitted.
pub fn detect(previous: Option<&Snapshot>, next: &Snapshot) -> Vec<Event> {
    EMISSION_TABLE
        .iter()
        .filter(|(group, _, emission)| match (emission, previous) {
            (Emission::Always, _) | (Emission::OnChange, None) => true,
            (Emission::OnChange, Some(prev)) => changed(*group, prev, next),
        })
        .filter_map(|(group, _, _)| {
            payload::build(*group, next).map(|payload| Event::new(*group, payload))
        })
        .collect()
}
