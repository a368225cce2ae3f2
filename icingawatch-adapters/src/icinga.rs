//! Icinga 2 REST API client.
//!
//! Talks to the `/v1` API of an Icinga 2 node. Requests carrying a body are
//! sent as `POST` with `X-HTTP-Method-Override: GET`, which is how the API
//! accepts object queries with attribute lists, filters and joins.
//!
//! ## Authentication
//!
//! If `<pki_path>/<node_name>.crt` exists the client authenticates with that
//! certificate, the matching `.key` and `ca.crt` (mutual TLS). Otherwise it
//! falls back to HTTP basic auth. Server certificates are not verified.
//!
//! ## Example
//!
//! ```rust,no_run
//! use icingawatch_adapters::icinga::{IcingaApi, IcingaClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = IcingaClient::builder()
//!         .host("icinga.local")
//!         .port(5665)
//!         .credentials("dashing", "secret")
//!         .build()?;
//!
//!     let app = client.application_status().await?;
//!     println!("Icinga {} on {}", app.version, app.node_name);
//!     Ok(())
//! }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use icingawatch_types::{ProblemEntity, ServiceEntity};

use crate::{AdapterError, RetryPolicy};

const API_VERSION: &str = "v1";

/// Access to the Icinga 2 REST API.
///
/// Only [`IcingaApi::get`] talks to the network. The typed helpers decode
/// its JSON, so a fake implementing `get` is enough to drive everything
/// built on top of this trait.
#[async_trait]
pub trait IcingaApi: Send + Sync {
    /// Request `path` (relative to `/v1`). With a body the request becomes a
    /// `POST` overriding the method to `GET`.
    async fn get(&self, path: &str, body: Option<&Value>) -> Result<Value, AdapterError>;

    /// `status/IcingaApplication`.
    async fn application_status(&self) -> Result<ApplicationStatus, AdapterError> {
        let data = self.get("status/IcingaApplication", None).await?;
        parse_application_status(data)
    }

    /// `status/CIB`.
    async fn cib_status(&self) -> Result<CibStatus, AdapterError> {
        let data = self.get("status/CIB", None).await?;
        parse_cib_status(data)
    }

    /// Every record under `status`.
    async fn status_records(&self) -> Result<Vec<StatusRecord>, AdapterError> {
        let data = self.get("status", None).await?;
        parse_results(data)
    }

    /// `objects/hosts`, reduced to problem entities.
    async fn hosts(&self, query: &ObjectQuery) -> Result<Vec<ProblemEntity>, AdapterError> {
        let data = self.get("objects/hosts", Some(&query.to_body())).await?;
        let rows: Vec<ObjectRow> = parse_results(data)?;
        Ok(rows.into_iter().map(ObjectRow::into_entity).collect())
    }

    /// `objects/services`, each paired with its joined host.
    async fn services(&self, query: &ObjectQuery) -> Result<Vec<ServiceEntity>, AdapterError> {
        let data = self.get("objects/services", Some(&query.to_body())).await?;
        let rows: Vec<ObjectRow> = parse_results(data)?;
        Ok(rows.into_iter().map(ObjectRow::into_service_entity).collect())
    }

    /// Last check results of the services matching `filter`.
    async fn check_results(&self, filter: &str) -> Result<Vec<CheckResult>, AdapterError> {
        let query = ObjectQuery::new(["last_check_result"]).filter(filter);
        let data = self.get("objects/services", Some(&query.to_body())).await?;
        let rows: Vec<ObjectRow> = parse_results(data)?;
        Ok(rows.into_iter().map(ObjectRow::into_check_result).collect())
    }
}

/// Attribute list, filter and joins for an object query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectQuery {
    pub attrs: Vec<String>,
    pub filter: Option<String>,
    pub joins: Vec<String>,
}

impl ObjectQuery {
    /// Query for the given attributes.
    pub fn new<I, S>(attrs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            attrs: attrs.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Restrict results with an Icinga filter expression.
    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Join attributes of related objects, e.g. `host.state`.
    pub fn joins<I, S>(mut self, joins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.joins = joins.into_iter().map(Into::into).collect();
        self
    }

    /// Request body; empty parts are left out.
    pub fn to_body(&self) -> Value {
        let mut body = Map::new();
        if !self.attrs.is_empty() {
            body.insert("attrs".into(), json!(self.attrs));
        }
        if let Some(filter) = &self.filter {
            body.insert("filter".into(), json!(filter));
        }
        if !self.joins.is_empty() {
            body.insert("joins".into(), json!(self.joins));
        }
        Value::Object(body)
    }
}

/// The `app` block of `status/IcingaApplication`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ApplicationStatus {
    /// Raw version string, e.g. `v2.11.0-1-gabc123`.
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub node_name: String,
    /// Unix timestamp in seconds.
    #[serde(default)]
    pub program_start: f64,
}

/// The status block of `status/CIB`. Icinga reports every value as a float.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CibStatus {
    /// Seconds.
    pub avg_latency: f64,
    /// Seconds.
    pub avg_execution_time: f64,
    /// Seconds since the process started.
    pub uptime: f64,
    pub num_hosts_up: f64,
    pub num_hosts_down: f64,
    pub num_hosts_in_downtime: f64,
    pub num_hosts_acknowledged: f64,
    pub num_services_ok: f64,
    pub num_services_warning: f64,
    pub num_services_critical: f64,
    pub num_services_unknown: f64,
    pub num_services_in_downtime: f64,
    pub num_services_acknowledged: f64,
    pub active_host_checks_1min: f64,
    pub passive_host_checks_1min: f64,
    pub active_service_checks_1min: f64,
    pub passive_service_checks_1min: f64,
}

/// One record of the generic `status` endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StatusRecord {
    #[serde(default)]
    pub name: String,
    /// Component type to its status block.
    #[serde(default)]
    pub status: Map<String, Value>,
}

/// Performance data of a service's last check.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckResult {
    pub name: String,
    /// Raw `label=value;warn;crit;min;max` tokens.
    pub performance_data: Vec<String>,
}

/// Icinga 2 API client.
#[derive(Debug, Clone)]
pub struct IcingaClient {
    client: Client,
    base_url: String,
    auth: Auth,
    retry: RetryPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Auth {
    ClientCertificate,
    Basic { username: String, password: String },
}

impl IcingaClient {
    /// Create a new builder for configuring the client.
    pub fn builder() -> IcingaClientBuilder {
        IcingaClientBuilder::default()
    }

    /// `https://<host>:<port>/v1`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether mutual TLS is used instead of basic auth.
    pub fn uses_client_certificate(&self) -> bool {
        self.auth == Auth::ClientCertificate
    }

    async fn request(&self, url: &str, body: Option<&Value>) -> Result<Value, AdapterError> {
        let mut request = match body {
            Some(body) => self
                .client
                .post(url)
                .header("X-HTTP-Method-Override", "GET")
                .json(body),
            None => self.client.get(url),
        };

        if let Auth::Basic { username, password } = &self.auth {
            request = request.basic_auth(username, Some(password));
        }

        let response = request.send().await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(AdapterError::Auth("Invalid credentials".to_string()));
        }

        if !response.status().is_success() {
            return Err(AdapterError::Http(format!(
                "API returned status {}",
                response.status()
            )));
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl IcingaApi for IcingaClient {
    async fn get(&self, path: &str, body: Option<&Value>) -> Result<Value, AdapterError> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        debug!("Requesting {}", url);
        self.retry.run(&url, || self.request(&url, body)).await
    }
}

/// Builder for IcingaClient.
#[derive(Debug, Default)]
pub struct IcingaClientBuilder {
    host: Option<String>,
    port: Option<u16>,
    username: Option<String>,
    password: Option<String>,
    pki_path: Option<PathBuf>,
    node_name: Option<String>,
    retry: Option<RetryPolicy>,
    timeout: Option<Duration>,
}

impl IcingaClientBuilder {
    /// Set the API host (default: "localhost").
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the API port (default: 5665).
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the API user and password used when no client certificate exists.
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Directory holding `<node_name>.crt`, `<node_name>.key` and `ca.crt`.
    pub fn pki_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.pki_path = Some(path.into());
        self
    }

    /// Certificate name (default: the local hostname).
    pub fn node_name(mut self, node_name: impl Into<String>) -> Self {
        self.node_name = Some(node_name.into());
        self
    }

    /// Set the retry policy for unreachable servers (default: 30 x 2s).
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Set the request timeout (default: 30 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the client, loading the client certificate if one exists.
    pub fn build(self) -> Result<IcingaClient, AdapterError> {
        let host = self.host.unwrap_or_else(|| "localhost".to_string());
        let port = self.port.unwrap_or(5665);
        let pki_path = self.pki_path.unwrap_or_else(|| PathBuf::from("pki"));
        let node_name = self.node_name.unwrap_or_else(local_node_name);

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        warn!("Server certificate verification is disabled for the Icinga 2 API");

        let mut builder = Client::builder()
            .use_rustls_tls()
            .danger_accept_invalid_certs(true)
            .default_headers(headers)
            .timeout(self.timeout.unwrap_or(Duration::from_secs(30)));

        let cert_file = pki_path.join(format!("{}.crt", node_name));
        let auth = if cert_file.is_file() {
            debug!(
                "PKI found in {}, using client certificates",
                pki_path.display()
            );
            let (identity, ca) = load_pki(&pki_path, &node_name)?;
            builder = builder.identity(identity).add_root_certificate(ca);
            Auth::ClientCertificate
        } else {
            debug!("PKI not found, using basic auth");
            Auth::Basic {
                username: self.username.unwrap_or_default(),
                password: self.password.unwrap_or_default(),
            }
        };

        let client = builder
            .build()
            .map_err(|e| AdapterError::Certificate(e.to_string()))?;

        Ok(IcingaClient {
            client,
            base_url: format!("https://{}:{}/{}", host, port, API_VERSION),
            auth,
            retry: self.retry.unwrap_or_default(),
        })
    }
}

fn local_node_name() -> String {
    match hostname::get() {
        Ok(name) => name.to_string_lossy().into_owned(),
        Err(err) => {
            warn!("Cannot determine local hostname: {}", err);
            String::new()
        }
    }
}

fn load_pki(
    pki_path: &Path,
    node_name: &str,
) -> Result<(reqwest::Identity, reqwest::Certificate), AdapterError> {
    let read = |file: PathBuf| {
        std::fs::read(&file)
            .map_err(|e| AdapterError::Certificate(format!("{}: {}", file.display(), e)))
    };

    let mut pem = read(pki_path.join(format!("{}.crt", node_name)))?;
    pem.push(b'\n');
    pem.extend(read(pki_path.join(format!("{}.key", node_name)))?);
    let ca = read(pki_path.join("ca.crt"))?;

    let identity = reqwest::Identity::from_pem(&pem)
        .map_err(|e| AdapterError::Certificate(e.to_string()))?;
    let ca = reqwest::Certificate::from_pem(&ca)
        .map_err(|e| AdapterError::Certificate(e.to_string()))?;

    Ok((identity, ca))
}

/// Pull `results` out of a response.
fn parse_results<T: serde::de::DeserializeOwned>(mut data: Value) -> Result<T, AdapterError> {
    let results = data
        .get_mut("results")
        .map(Value::take)
        .ok_or_else(|| AdapterError::Parse("response has no results".to_string()))?;
    Ok(serde_json::from_value(results)?)
}

/// The status block of a single-row status endpoint.
fn first_status(data: Value) -> Result<Value, AdapterError> {
    let rows: Vec<Value> = parse_results(data)?;
    rows.into_iter()
        .next()
        .and_then(|mut row| row.get_mut("status").map(Value::take))
        .ok_or_else(|| AdapterError::Parse("empty status results".to_string()))
}

fn parse_application_status(data: Value) -> Result<ApplicationStatus, AdapterError> {
    let mut status = first_status(data)?;
    let app = status
        .pointer_mut("/icingaapplication/app")
        .map(Value::take)
        .ok_or_else(|| AdapterError::Parse("missing icingaapplication.app".to_string()))?;
    Ok(serde_json::from_value(app)?)
}

fn parse_cib_status(data: Value) -> Result<CibStatus, AdapterError> {
    Ok(serde_json::from_value(first_status(data)?)?)
}

/// A row of `objects/hosts` or `objects/services`.
#[derive(Debug, Default, Deserialize)]
struct ObjectRow {
    #[serde(default)]
    name: String,
    #[serde(default)]
    attrs: ObjectAttrs,
    #[serde(default)]
    joins: ObjectJoins,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ObjectAttrs {
    name: Option<String>,
    display_name: String,
    state: f64,
    acknowledgement: f64,
    downtime_depth: f64,
    last_check: f64,
    last_hard_state: Option<f64>,
    last_check_result: Option<LastCheckResult>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ObjectJoins {
    host: Option<ObjectAttrs>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LastCheckResult {
    performance_data: Option<Vec<Value>>,
}

impl ObjectAttrs {
    fn into_entity(self, fallback_name: String) -> ProblemEntity {
        ProblemEntity {
            name: self.name.unwrap_or(fallback_name),
            display_name: self.display_name,
            state: self.state as u8,
            acknowledged: self.acknowledgement != 0.0,
            in_downtime: self.downtime_depth > 0.0,
            last_check: self.last_check,
            last_hard_state: self.last_hard_state.map(|s| s as u8),
        }
    }
}

impl ObjectRow {
    fn into_entity(self) -> ProblemEntity {
        self.attrs.into_entity(self.name)
    }

    fn into_service_entity(self) -> ServiceEntity {
        let host = self
            .joins
            .host
            .map(|host| host.into_entity(String::new()))
            .unwrap_or_default();
        ServiceEntity {
            service: self.attrs.into_entity(self.name),
            host,
        }
    }

    fn into_check_result(self) -> CheckResult {
        let performance_data = self
            .attrs
            .last_check_result
            .and_then(|result| result.performance_data)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|perf| match perf {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect();

        CheckResult {
            name: self.name,
            performance_data,
        }
    }
}
