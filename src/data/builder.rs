//! Builds one [`Snapshot`] per tick from sequential API calls.
//!
//! Every step is independent: a failing call is logged and leaves its part
//! of the snapshot at the defaults, so a partially reachable server still
//! yields a complete snapshot.

use std::sync::Arc;

use tracing::{debug, warn};

use icingawatch_adapters::icinga::{CheckResult, IcingaApi};
use icingawatch_adapters::pihole::DnsFilterApi;
use icingawatch_types::{
    format_compact, whole_secs, DnsFilterMetrics, IspMetrics, ProblemEntity, RoomClimate,
    ServiceEntity, Snapshot, HOST_DOWN, SERVICE_CRITICAL, SERVICE_UNKNOWN, SERVICE_WARNING,
};

use super::cluster;
use super::perfdata::{hourly_rate, perf_value};
use super::problems::{
    count_problems, count_problems_services, problem_services, ProblemPolicy, MAX_RANKED_SERVICES,
};
use super::round2;
use super::version::parse_version;
use crate::config::{IspSource, Profile, RoomClimateSource};

/// Collects snapshots from the Icinga API and the optional DNS filter.
pub struct SnapshotBuilder {
    api: Arc<dyn IcingaApi>,
    dns_filter: Option<Arc<dyn DnsFilterApi>>,
    policy: ProblemPolicy,
    room_climate: Option<RoomClimateSource>,
    isp: Option<IspSource>,
    max_problems: usize,
}

impl SnapshotBuilder {
    /// Builder with every integration disabled.
    pub fn new(api: Arc<dyn IcingaApi>) -> Self {
        Self {
            api,
            dns_filter: None,
            policy: ProblemPolicy::default(),
            room_climate: None,
            isp: None,
            max_problems: MAX_RANKED_SERVICES,
        }
    }

    /// Builder configured from the profile's policy and integrations.
    pub fn from_profile(
        profile: &Profile,
        api: Arc<dyn IcingaApi>,
        dns_filter: Option<Arc<dyn DnsFilterApi>>,
    ) -> Self {
        Self::new(api)
            .policy(profile.policy)
            .room_climate(profile.room_climate.clone())
            .isp(profile.isp.clone())
            .dns_filter(dns_filter)
    }

    pub fn policy(mut self, policy: ProblemPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn room_climate(mut self, source: Option<RoomClimateSource>) -> Self {
        self.room_climate = source;
        self
    }

    pub fn isp(mut self, source: Option<IspSource>) -> Self {
        self.isp = source;
        self
    }

    pub fn dns_filter(mut self, api: Option<Arc<dyn DnsFilterApi>>) -> Self {
        self.dns_filter = api;
        self
    }

    /// Length of the ranked service list (default 30).
    pub fn max_problems(mut self, max: usize) -> Self {
        self.max_problems = max;
        self
    }

    /// Run every step and return the snapshot.
    pub async fn build(&self) -> Snapshot {
        let mut snapshot = Snapshot::now();

        self.application(&mut snapshot).await;
        self.cib(&mut snapshot).await;
        self.objects(&mut snapshot).await;

        if let Some(source) = &self.room_climate {
            snapshot.room_climate = Some(self.collect_room_climate(source).await);
        }
        if let Some(source) = &self.isp {
            snapshot.isp = Some(self.collect_isp(source).await);
        }
        if let Some(dns_filter) = &self.dns_filter {
            snapshot.dns_filter = Some(match dns_filter.summary().await {
                Ok(metrics) => metrics,
                Err(err) => {
                    warn!("DNS filter statistics unavailable: {}", err);
                    DnsFilterMetrics::default()
                }
            });
        }

        match self.api.status_records().await {
            Ok(records) => snapshot.cluster = cluster::extract(&records),
            Err(err) => warn!("Status records unavailable: {}", err),
        }

        snapshot
    }

    async fn application(&self, snapshot: &mut Snapshot) {
        match self.api.application_status().await {
            Ok(app) => {
                snapshot.app.version = parse_version(&app.version);
                snapshot.app.node_name = app.node_name;
                snapshot.app.program_start = app.program_start;
            }
            Err(err) => warn!("Application status unavailable: {}", err),
        }
    }

    async fn cib(&self, snapshot: &mut Snapshot) {
        let cib = match self.api.cib_status().await {
            Ok(cib) => cib,
            Err(err) => {
                warn!("CIB status unavailable: {}", err);
                return;
            }
        };

        let checks = &mut snapshot.checks;
        checks.avg_latency_ms = round2(cib.avg_latency * 1000.0);
        checks.avg_execution_time_ms = round2(cib.avg_execution_time * 1000.0);
        checks.uptime_secs = whole_secs(cib.uptime);
        checks.uptime = format_compact(checks.uptime_secs);
        checks.host_active_checks_1min = cib.active_host_checks_1min;
        checks.host_passive_checks_1min = cib.passive_host_checks_1min;
        checks.service_active_checks_1min = cib.active_service_checks_1min;
        checks.service_passive_checks_1min = cib.passive_service_checks_1min;

        // Float counters saturate at zero when cast.
        snapshot.hosts.down = cib.num_hosts_down as u64;
        snapshot.hosts.in_downtime = cib.num_hosts_in_downtime as u64;
        snapshot.hosts.acknowledged = cib.num_hosts_acknowledged as u64;
        snapshot.services.warning = cib.num_services_warning as u64;
        snapshot.services.critical = cib.num_services_critical as u64;
        snapshot.services.unknown = cib.num_services_unknown as u64;
        snapshot.services.in_downtime = cib.num_services_in_downtime as u64;
        snapshot.services.acknowledged = cib.num_services_acknowledged as u64;
    }

    async fn objects(&self, snapshot: &mut Snapshot) {
        let policy = self.policy;

        let hosts: Vec<ProblemEntity> = match self.api.hosts(&policy.host_query()).await {
            Ok(hosts) => {
                let counts = &mut snapshot.hosts;
                counts.all = hosts.len() as u64;
                counts.problems = count_problems(&hosts, None, policy);
                counts.problems_down = count_problems(&hosts, Some(HOST_DOWN), policy);
                counts.up = counts.all.saturating_sub(counts.problems);
                hosts
            }
            Err(err) => {
                warn!("Host objects unavailable: {}", err);
                Vec::new()
            }
        };

        let services: Vec<ServiceEntity> = match self.api.services(&policy.service_query()).await
        {
            Ok(services) => services,
            Err(err) => {
                warn!("Service objects unavailable: {}", err);
                return;
            }
        };

        let counts = &mut snapshot.services;
        counts.all = services.len() as u64;
        counts.problems = count_problems_services(&services, None, policy);
        counts.problems_warning = count_problems_services(&services, Some(SERVICE_WARNING), policy);
        counts.problems_critical =
            count_problems_services(&services, Some(SERVICE_CRITICAL), policy);
        counts.problems_unknown = count_problems_services(&services, Some(SERVICE_UNKNOWN), policy);
        counts.ok = counts.all.saturating_sub(counts.problems);

        let ranking = problem_services(&services, &hosts, self.max_problems, policy);
        debug!(
            "{} problem services, {} ranked entries",
            ranking.problems.len(),
            ranking.ranked.len()
        );
        snapshot.problems = ranking.ranked;
    }

    async fn collect_room_climate(&self, source: &RoomClimateSource) -> RoomClimate {
        let results = self.check_results("room climate", &source.service).await;
        RoomClimate {
            temperature: perf_value(&results, &source.temperature_key),
            humidity: perf_value(&results, &source.humidity_key),
        }
    }

    async fn collect_isp(&self, source: &IspSource) -> IspMetrics {
        let link = self.check_results("ISP downstream", &source.downstream_service).await;
        let upstream = self.check_results("ISP upstream", &source.upstream_service).await;

        let uptime_secs = whole_secs(perf_value(&link, &source.uptime_key));
        let received_total = perf_value(&link, &source.received_key);
        let sent_total = perf_value(&link, &source.sent_key);

        IspMetrics {
            downstream: perf_value(&link, &source.downstream_key),
            upstream: perf_value(&upstream, &source.upstream_key),
            uptime_secs,
            uptime: format_compact(uptime_secs),
            received_total,
            sent_total,
            received_per_hour: round2(hourly_rate(received_total, uptime_secs as f64)),
            sent_per_hour: round2(hourly_rate(sent_total, uptime_secs as f64)),
        }
    }

    /// Check results of the services whose name contains `service`; empty
    /// when the lookup fails.
    async fn check_results(&self, what: &str, service: &str) -> Vec<CheckResult> {
        let filter = service_filter(service);
        match self.api.check_results(&filter).await {
            Ok(results) => results,
            Err(err) => {
                warn!("{} data unavailable: {}", what, err);
                Vec::new()
            }
        }
    }
}

/// Icinga filter matching services whose name contains `service`.
pub fn service_filter(service: &str) -> String {
    format!("match(\"*{}*\",service.name)", service)
}
