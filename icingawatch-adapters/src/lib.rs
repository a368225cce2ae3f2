//! # icingawatch-adapters
//!
//! HTTP clients for the upstream APIs icingawatch polls.
//!
//! ## Supported Systems
//!
//! - **Icinga 2** (`icinga` feature) - Application and CIB status, generic
//!   status records and host/service objects via the REST API, with mutual
//!   TLS or basic auth and a bounded retry policy
//! - **Pi-hole** (`pihole` feature) - Daily DNS query and block statistics
//!
//! ## Quick Start (Icinga 2)
//!
//! ```rust,no_run
//! use icingawatch_adapters::icinga::{IcingaApi, IcingaClient};
//! use icingawatch_adapters::RetryPolicy;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = IcingaClient::builder()
//!         .host("localhost")
//!         .port(5665)
//!         .credentials("dashing", "secret")
//!         .retry(RetryPolicy::default())
//!         .build()?;
//!
//!     let cib = client.cib_status().await?;
//!     println!("{} hosts up", cib.num_hosts_up);
//!     Ok(())
//! }
//! ```

pub mod error;

#[cfg(feature = "icinga")]
pub mod retry;

#[cfg(feature = "icinga")]
pub mod icinga;

#[cfg(feature = "pihole")]
pub mod pihole;

pub use error::AdapterError;

#[cfg(feature = "icinga")]
pub use retry::RetryPolicy;

// Re-export types for convenience
pub use icingawatch_types::{DnsFilterMetrics, ProblemEntity, ServiceEntity};
