//! # icingawatch-types
//!
//! Core types shared by the icingawatch crates: the per-tick metrics
//! [`Snapshot`], the reduced host/service [`ProblemEntity`], and the
//! dashboard [`Event`] names and payload shapes.
//!
//! ## Design Goals
//!
//! - **Zero required dependencies**: Core types work without any serialization framework
//! - **Optional serialization**: Enable the `serde` feature to (de)serialize snapshots
//!   and serialize event payloads
//! - **Explicit emission table**: Which dashboard groups are change-gated and which
//!   are sent every tick is a static table ([`EMISSION_TABLE`]), not inferred
//!
//! ## Features
//!
//! - `std` (default): Standard library support
//! - `serde`: JSON serialization via serde
//!
//! ## Example
//!
//! ```rust
//! use icingawatch_types::{format_compact, EventGroup, Emission, Snapshot};
//!
//! let snapshot = Snapshot::default();
//! assert_eq!(snapshot.app.version, "Not running");
//!
//! assert_eq!(format_compact(90_061), "1d 1h 1m");
//! assert_eq!(EventGroup::Stats.emission(), Emission::Always);
//! assert_eq!(EventGroup::HostMeter.event_name(), "icinga-host-meter");
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod duration;
mod entity;
mod event;
mod snapshot;

pub use duration::*;
pub use entity::*;
pub use event::*;
pub use snapshot::*;
