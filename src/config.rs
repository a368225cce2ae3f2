//! Configuration profile.
//!
//! Settings come from a JSON file (`config/icinga2.json` by default) with
//! environment variables layered on top. A sibling `<name>.local.json` is
//! read instead of the named file when it exists, so site-specific settings
//! can live outside version control.
//!
//! ```json
//! {
//!   "icinga2": {
//!     "api": { "host": "localhost", "port": 5665, "user": "dashing",
//!              "password": "secret", "pki_path": "pki/", "node_name": "dash" }
//!   },
//!   "dashboard": {
//!     "show_only_hard_state_problems": false,
//!     "timezone": "UTC",
//!     "room_climate_service": "climate",
//!     "isp_downstream_service": "dsl-down",
//!     "isp_upstream_service": "dsl-up",
//!     "dns_filter_url": "http://pi.hole/admin/api.php",
//!     "dns_filter_token": "..."
//!   },
//!   "icingaweb2": { "url": "http://localhost/icingaweb2" }
//! }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, File, FileFormat};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::data::ProblemPolicy;

/// Environment variables and the settings keys they override.
pub const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("ICINGA2_API_HOST", "icinga2.api.host"),
    ("ICINGA2_API_PORT", "icinga2.api.port"),
    ("ICINGA2_API_USERNAME", "icinga2.api.user"),
    ("ICINGA2_API_PASSWORD", "icinga2.api.password"),
    ("ICINGA2_API_CERT_PATH", "icinga2.api.pki_path"),
    ("ICINGA2_API_NODENAME", "icinga2.api.node_name"),
    ("ICINGAWEB2_URL", "icingaweb2.url"),
    (
        "DASHBOARD_SHOW_ONLY_HARD_STATE_PROBLEMS",
        "dashboard.show_only_hard_state_problems",
    ),
    ("DASHBOARD_TIMEZONE", "dashboard.timezone"),
    ("DASHBOARD_INTERVAL", "dashboard.interval"),
    ("DASHBOARD_ROOM_CLIMATE_SERVICE", "dashboard.room_climate_service"),
    ("DASHBOARD_ISP_DOWNSTREAM_SERVICE", "dashboard.isp_downstream_service"),
    ("DASHBOARD_ISP_UPSTREAM_SERVICE", "dashboard.isp_upstream_service"),
    ("DASHBOARD_DNS_FILTER_URL", "dashboard.dns_filter_url"),
    ("DASHBOARD_DNS_FILTER_TOKEN", "dashboard.dns_filter_token"),
    ("DASHBOARD_DASHING_URL", "dashboard.dashing_url"),
    ("DASHBOARD_DASHING_AUTH_TOKEN", "dashboard.dashing_auth_token"),
];

/// Errors raised while loading the profile. All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Neither the environment nor the file named an API endpoint.
    #[error("no Icinga 2 API host or port in the environment or in {}", .0.display())]
    Missing(PathBuf),

    /// The file could not be read or parsed.
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// A value is present but unusable.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Everything read at startup. Immutable for the life of the process.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub api: ApiSettings,
    pub policy: ProblemPolicy,
    pub timezone: String,
    pub interval: Duration,
    pub icingaweb2_url: String,
    pub room_climate: Option<RoomClimateSource>,
    pub isp: Option<IspSource>,
    pub dns_filter: Option<DnsFilterSource>,
    pub dashing: Option<DashingTarget>,
}

/// Icinga 2 API endpoint and credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    /// Directory with `<node_name>.crt`, `<node_name>.key` and `ca.crt`.
    pub pki_path: PathBuf,
    /// Certificate name; the local hostname when unset.
    pub node_name: Option<String>,
}

/// Service providing temperature and humidity performance data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomClimateSource {
    pub service: String,
    pub temperature_key: String,
    pub humidity_key: String,
}

/// Services providing ISP link performance data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IspSource {
    pub downstream_service: String,
    pub upstream_service: String,
    pub downstream_key: String,
    pub upstream_key: String,
    /// Read from the downstream service.
    pub uptime_key: String,
    /// Read from the downstream service.
    pub received_key: String,
    /// Read from the downstream service.
    pub sent_key: String,
}

/// Pi-hole `api.php` endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsFilterSource {
    pub url: String,
    pub token: String,
}

/// Dashing server receiving widget updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashingTarget {
    pub url: String,
    pub auth_token: String,
}

impl Profile {
    /// Load the profile from `path` and the process environment.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    /// Load the profile from `path`, reading overrides through `env`.
    pub fn load_with<F>(path: &Path, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = resolve_file(path);
        info!("Using config file '{}'", file.display());

        let mut builder = Config::builder().add_source(
            File::from(file.as_path())
                .format(FileFormat::Json)
                .required(false),
        );

        for (var, key) in ENV_OVERRIDES {
            let value = env(var).filter(|v| !v.is_empty());
            builder = builder.set_override_option(*key, value)?;
        }

        let raw: RawSettings = builder.build()?.try_deserialize()?;
        Self::from_raw(raw, &file)
    }

    fn from_raw(raw: RawSettings, file: &Path) -> Result<Self, ConfigError> {
        let api = raw.icinga2.api;
        let dashboard = raw.dashboard;

        let host = non_empty(api.host);
        if host.is_none() && api.port.is_none() {
            return Err(ConfigError::Missing(file.to_path_buf()));
        }

        let interval = dashboard.interval.unwrap_or(15);
        if interval == 0 {
            return Err(ConfigError::Invalid(
                "dashboard.interval must be at least one second".to_string(),
            ));
        }

        let room_climate =
            non_empty(dashboard.room_climate_service).map(|service| RoomClimateSource {
                service,
                temperature_key: or_default(dashboard.room_climate_temperature, "temperature"),
                humidity_key: or_default(dashboard.room_climate_humidity, "humidity"),
            });

        let isp = match (
            non_empty(dashboard.isp_downstream_service),
            non_empty(dashboard.isp_upstream_service),
        ) {
            (Some(downstream_service), Some(upstream_service)) => Some(IspSource {
                downstream_service,
                upstream_service,
                downstream_key: or_default(dashboard.isp_downstream, "downstream_max"),
                upstream_key: or_default(dashboard.isp_upstream, "upstream_max"),
                uptime_key: or_default(dashboard.isp_uptime, "uptime"),
                received_key: or_default(dashboard.isp_received, "received"),
                sent_key: or_default(dashboard.isp_sent, "sent"),
            }),
            _ => None,
        };

        let dns_filter = non_empty(dashboard.dns_filter_url).map(|url| DnsFilterSource {
            url,
            token: dashboard.dns_filter_token.unwrap_or_default(),
        });

        let dashing = non_empty(dashboard.dashing_url).map(|url| DashingTarget {
            url,
            auth_token: dashboard.dashing_auth_token.unwrap_or_default(),
        });

        Ok(Profile {
            api: ApiSettings {
                host: host.unwrap_or_else(|| "localhost".to_string()),
                port: api.port.unwrap_or(5665),
                user: or_default(api.user, "dashing"),
                password: or_default(api.password, "icinga2ondashingr0xx"),
                pki_path: PathBuf::from(or_default(api.pki_path, "pki/")),
                node_name: non_empty(api.node_name),
            },
            policy: ProblemPolicy {
                hard_state_only: dashboard.show_only_hard_state_problems,
            },
            timezone: or_default(dashboard.timezone, "UTC"),
            interval: Duration::from_secs(interval),
            icingaweb2_url: or_default(raw.icingaweb2.url, "http://localhost/icingaweb2"),
            room_climate,
            isp,
            dns_filter,
            dashing,
        })
    }
}

/// `icinga2.local.json` next to `icinga2.json` wins when it exists.
fn resolve_file(path: &Path) -> PathBuf {
    let local = match (path.file_stem(), path.extension()) {
        (Some(stem), Some(ext)) => path.with_file_name(format!(
            "{}.local.{}",
            stem.to_string_lossy(),
            ext.to_string_lossy()
        )),
        (Some(stem), None) => path.with_file_name(format!("{}.local", stem.to_string_lossy())),
        _ => return path.to_path_buf(),
    };

    if local.is_file() {
        local
    } else {
        path.to_path_buf()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn or_default(value: Option<String>, default: &str) -> String {
    non_empty(value).unwrap_or_else(|| default.to_string())
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSettings {
    icinga2: RawIcinga2,
    dashboard: RawDashboard,
    icingaweb2: RawIcingaweb2,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawIcinga2 {
    api: RawApi,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawApi {
    host: Option<String>,
    port: Option<u16>,
    user: Option<String>,
    password: Option<String>,
    pki_path: Option<String>,
    node_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawDashboard {
    show_only_hard_state_problems: bool,
    timezone: Option<String>,
    interval: Option<u64>,
    room_climate_service: Option<String>,
    room_climate_temperature: Option<String>,
    room_climate_humidity: Option<String>,
    isp_downstream_service: Option<String>,
    isp_upstream_service: Option<String>,
    isp_downstream: Option<String>,
    isp_upstream: Option<String>,
    isp_uptime: Option<String>,
    isp_received: Option<String>,
    isp_sent: Option<String>,
    dns_filter_url: Option<String>,
    dns_filter_token: Option<String>,
    dashing_url: Option<String>,
    dashing_auth_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawIcingaweb2 {
    url: Option<String>,
}
