//! Turning snapshots into dashboard events and delivering them.
//!
//! - [`detect`]: Which groups are due this tick
//! - [`payload`]: Widget payload for a group
//! - [`output`]: Where events go ([`Output`])

pub mod detect;
pub mod output;
pub mod payload;

pub use detect::{changed, detect};
pub use output::{Output, OutputError, OutputTarget, ParseTargetError};
