//! Queue rates and cluster connectivity from the generic `status` records.
//!
//! Each record's status maps a component type (`api`, `idomysqlconnection`,
//! ...) to a block of attributes. Some interesting values sit directly in
//! that block (`api.num_conn_endpoints`), others one level deeper under a
//! named instance (`api.json_rpc.clients`, `idomysqlconnection.ido-mysql.
//! query_queue_item_rate`). [`STATUS_RULES`] lists where each key may be
//! found and what it measures.

use serde_json::Value;

use icingawatch_adapters::icinga::StatusRecord;
use icingawatch_types::ClusterMetrics;

/// What a status key measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricClass {
    /// Items processed per second, stored as `"<instance> queue rate"`.
    QueueRate,
    /// Endpoint or client counter.
    Connectivity,
}

/// Where a status key may appear inside a component block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// `<component>.<key>`, stored under the key itself.
    TopLevel,
    /// `<component>.<instance>.<key>`.
    Nested,
    Both,
}

impl Scope {
    fn top_level(self) -> bool {
        matches!(self, Scope::TopLevel | Scope::Both)
    }

    fn nested(self) -> bool {
        matches!(self, Scope::Nested | Scope::Both)
    }
}

/// A status key to collect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusRule {
    pub key: &'static str,
    pub class: MetricClass,
    pub scope: Scope,
}

const fn rule(key: &'static str, class: MetricClass, scope: Scope) -> StatusRule {
    StatusRule { key, class, scope }
}

pub const STATUS_RULES: &[StatusRule] = &[
    rule("work_queue_item_rate", MetricClass::QueueRate, Scope::Nested),
    rule("query_queue_item_rate", MetricClass::QueueRate, Scope::Nested),
    rule("num_conn_endpoints", MetricClass::Connectivity, Scope::Both),
    rule("num_not_conn_endpoints", MetricClass::Connectivity, Scope::Both),
    rule("anonymous_clients", MetricClass::Connectivity, Scope::Both),
    rule("clients", MetricClass::Connectivity, Scope::Both),
];

/// Apply [`STATUS_RULES`] to every record.
pub fn extract(records: &[StatusRecord]) -> ClusterMetrics {
    extract_with(records, STATUS_RULES)
}

/// Apply the given rules to every record. Non-numeric values are skipped.
pub fn extract_with(records: &[StatusRecord], rules: &[StatusRule]) -> ClusterMetrics {
    let mut metrics = ClusterMetrics::default();

    let blocks = records
        .iter()
        .flat_map(|record| record.status.values())
        .filter_map(Value::as_object);

    for block in blocks {
        for (attr, value) in block {
            for rule in rules {
                if rule.scope.top_level() && attr == rule.key {
                    if let Some(number) = value.as_f64() {
                        store(&mut metrics, rule.class, attr.clone(), number);
                    }
                }

                if !rule.scope.nested() {
                    continue;
                }

                if let Some(number) = value.get(rule.key).and_then(Value::as_f64) {
                    let name = match rule.class {
                        MetricClass::QueueRate => format!("{} queue rate", attr),
                        MetricClass::Connectivity => format!("{}.{}", attr, rule.key),
                    };
                    store(&mut metrics, rule.class, name, number);
                }
            }
        }
    }

    metrics
}

fn store(metrics: &mut ClusterMetrics, class: MetricClass, name: String, value: f64) {
    let target = match class {
        MetricClass::QueueRate => &mut metrics.queue_rates,
        MetricClass::Connectivity => &mut metrics.connectivity,
    };
    target.insert(name, value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(name: &str, status: Value) -> StatusRecord {
        StatusRecord {
            name: name.to_string(),
            status: status.as_object().cloned().unwrap_or_default(),
        }
    }

    #[test]
    fn test_api_listener_record() {
        let records = vec![
            record(
                "ApiListener",
                json!({"api": {
                    "identity": "master1",
                    "num_conn_endpoints": 2.0,
                    "num_not_conn_endpoints": 1.0,
                    "json_rpc": {"anonymous_clients": 0.0, "clients": 3.0, "work_queue_item_rate": 4.25},
                    "http": {"clients": 1.0}
                }}),
            ),
            record(
                "IdoMysqlConnection",
                json!({"idomysqlconnection": {
                    "ido-mysql": {"connected": true, "query_queue_item_rate": 12.5}
                }}),
            ),
            record("CIB", json!({"active_host_checks": 1.5})),
        ];

        let metrics = extract(&records);

        assert_eq!(metrics.connected_endpoints(), 2.0);
        assert_eq!(metrics.not_connected_endpoints(), 1.0);
        assert_eq!(metrics.connectivity.get("json_rpc.clients"), Some(&3.0));
        assert_eq!(metrics.connectivity.get("json_rpc.anonymous_clients"), Some(&0.0));
        assert_eq!(metrics.connectivity.get("http.clients"), Some(&1.0));
        assert_eq!(metrics.queue_rates.get("json_rpc queue rate"), Some(&4.25));
        assert_eq!(metrics.queue_rates.get("ido-mysql queue rate"), Some(&12.5));
        assert_eq!(metrics.queue_rates.len(), 2);
    }

    #[test]
    fn test_scope_is_respected() {
        let records = vec![record(
            "X",
            json!({"component": {
                "work_queue_item_rate": 9.0,
                "inner": {"num_conn_endpoints": 4.0}
            }}),
        )];

        let top_only = [rule("num_conn_endpoints", MetricClass::Connectivity, Scope::TopLevel)];
        let metrics = extract_with(&records, &top_only);
        assert!(metrics.connectivity.is_empty());

        let metrics = extract(&records);
        assert!(metrics.queue_rates.is_empty());
        assert_eq!(metrics.connectivity.get("inner.num_conn_endpoints"), Some(&4.0));
    }

    #[test]
    fn test_no_records() {
        assert_eq!(extract(&[]), ClusterMetrics::default());
    }
}
