//! # icingawatch
//!
//! Polls the Icinga 2 REST API on a fixed interval and republishes
//! dashboard events whenever the derived health metrics change.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                           Poller                             │
//! │  ┌───────────┐    ┌──────────────┐    ┌─────────┐            │
//! │  │ adapters  │───▶│     data     │───▶│  emit   │──▶ Outputs │
//! │  │ (REST)    │    │ (Snapshot)   │    │ (diff)  │            │
//! │  └───────────┘    └──────────────┘    └─────────┘            │
//! │        ▲                                                     │
//! │        └── config (Profile)                                  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`config`]**: Startup [`Profile`] from a JSON file and environment variables
//! - **[`data`]**: Builds a [`Snapshot`](types::Snapshot) per tick from the API
//! - **[`emit`]**: Change detection, widget payloads and [`Output`] backends
//! - **[`poller`]**: The interval loop tying them together
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Print events as JSON lines
//! icingawatch --config config/icinga2.json
//!
//! # Push to a Dashing dashboard and keep a log file
//! icingawatch --output dashing --output file:events.jsonl
//! ```
//!
//! ### As a library
//!
//! ```no_run
//! use std::sync::Arc;
//! use icingawatch::adapters::icinga::IcingaClient;
//! use icingawatch::{Output, Poller, SnapshotBuilder};
//!
//! # tokio_test::block_on(async {
//! let client = IcingaClient::builder()
//!     .host("icinga.example.com")
//!     .credentials("dashing", "secret")
//!     .build()
//!     .unwrap();
//!
//! let builder = SnapshotBuilder::new(Arc::new(client));
//! let mut poller = Poller::new(builder, vec![Output::Stdout], std::time::Duration::from_secs(15));
//! let events = poller.tick().await;
//! println!("emitted {} events", events.len());
//! # });
//! ```

pub mod config;
pub mod data;
pub mod emit;
pub mod poller;

#[cfg(test)]
mod testing;

pub use icingawatch_adapters as adapters;
pub use icingawatch_types as types;

pub use config::{ConfigError, Profile};
pub use data::SnapshotBuilder;
pub use emit::{Output, OutputError, OutputTarget};
pub use poller::Poller;
