//! In-memory stand-ins for the upstream APIs.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{json, Value};

use icingawatch_adapters::icinga::IcingaApi;
use icingawatch_adapters::pihole::DnsFilterApi;
use icingawatch_adapters::AdapterError;
use icingawatch_types::DnsFilterMetrics;

/// Canned Icinga responses keyed by path and, for object queries, filter.
#[derive(Debug, Default)]
pub struct FakeIcinga {
    routes: Vec<(String, Option<String>, Value)>,
    pub calls: AtomicUsize,
}

impl FakeIcinga {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `path` requests that carry no filter.
    pub fn route(mut self, path: &str, response: Value) -> Self {
        self.routes.push((path.to_string(), None, response));
        self
    }

    /// Answer `path` requests whose body filter is `filter`.
    pub fn filtered(mut self, path: &str, filter: &str, response: Value) -> Self {
        self.routes
            .push((path.to_string(), Some(filter.to_string()), response));
        self
    }

    /// A small but complete monitoring setup.
    pub fn populated() -> Self {
        Self::new()
            .route(
                "status/IcingaApplication",
                json!({"results": [{"status": {"icingaapplication": {"app": {
                    "version": "v2.11.0-1-gabc123",
                    "node_name": "master1",
                    "program_start": 1_700_000_000.0
                }}}}]}),
            )
            .route(
                "status/CIB",
                json!({"results": [{"status": {
                    "avg_latency": 0.0125,
                    "avg_execution_time": 1.5,
                    "uptime": 90061.7,
                    "num_hosts_up": 2.0,
                    "num_hosts_down": 1.0,
                    "num_hosts_in_downtime": 0.0,
                    "num_hosts_acknowledged": 0.0,
                    "num_services_ok": 2.0,
                    "num_services_warning": 1.0,
                    "num_services_critical": 2.0,
                    "num_services_unknown": 0.0,
                    "num_services_in_downtime": 1.0,
                    "num_services_acknowledged": 0.0,
                    "active_host_checks_1min": 12.0,
                    "passive_host_checks_1min": 0.0,
                    "active_service_checks_1min": 40.0,
                    "passive_service_checks_1min": 2.0
                }}]}),
            )
            .route(
                "objects/hosts",
                json!({"results": [
                    {"name": "web1", "attrs": {"display_name": "web: one", "state": 0.0, "acknowledgement": 0.0, "downtime_depth": 0.0, "last_check": 1.0}},
                    {"name": "web2", "attrs": {"display_name": "web: two", "state": 0.0, "acknowledgement": 0.0, "downtime_depth": 0.0, "last_check": 1.0}},
                    {"name": "db1", "attrs": {"display_name": "db: primary (cluster)", "state": 1.0, "acknowledgement": 0.0, "downtime_depth": 0.0, "last_check": 1.0}}
                ]}),
            )
            .route(
                "objects/services",
                json!({"results": [
                    service_row("web1", "web: one", 0.0, "http", "HTTP", 2.0, 0.0),
                    service_row("web1", "web: one", 0.0, "disk", "Disk", 1.0, 0.0),
                    service_row("web2", "web: two", 0.0, "ping", "Ping", 0.0, 0.0),
                    service_row("web2", "web: two", 0.0, "ntp", "NTP", 2.0, 1.0),
                    service_row("db1", "db: primary (cluster)", 1.0, "mysql", "MySQL", 2.0, 0.0)
                ]}),
            )
            .route(
                "status",
                json!({"results": [{"name": "ApiListener", "status": {"api": {
                    "num_conn_endpoints": 1.0,
                    "num_not_conn_endpoints": 0.0,
                    "json_rpc": {"work_queue_item_rate": 0.0}
                }}}]}),
            )
    }
}

fn service_row(
    host: &str,
    host_display: &str,
    host_state: f64,
    name: &str,
    display: &str,
    state: f64,
    downtime_depth: f64,
) -> Value {
    json!({
        "name": format!("{}!{}", host, name),
        "attrs": {
            "name": name,
            "display_name": display,
            "state": state,
            "acknowledgement": 0.0,
            "downtime_depth": downtime_depth,
            "last_check": 1.0
        },
        "joins": {"host": {
            "name": host,
            "display_name": host_display,
            "state": host_state,
            "acknowledgement": 0.0,
            "downtime_depth": 0.0,
            "last_check": 1.0
        }}
    })
}

#[async_trait]
impl IcingaApi for FakeIcinga {
    async fn get(&self, path: &str, body: Option<&Value>) -> Result<Value, AdapterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let filter = body
            .and_then(|b| b.get("filter"))
            .and_then(Value::as_str)
            .map(str::to_string);

        self.routes
            .iter()
            .find(|(p, f, _)| p == path && *f == filter)
            .map(|(_, _, response)| response.clone())
            .ok_or_else(|| AdapterError::Connection(format!("no route for {}", path)))
    }
}

/// DNS filter returning a fixed summary, or failing.
#[derive(Debug)]
pub struct FakeDnsFilter(pub Option<DnsFilterMetrics>);

#[async_trait]
impl DnsFilterApi for FakeDnsFilter {
    async fn summary(&self) -> Result<DnsFilterMetrics, AdapterError> {
        self.0
            .ok_or_else(|| AdapterError::Http("API returned status 500".to_string()))
    }
}
