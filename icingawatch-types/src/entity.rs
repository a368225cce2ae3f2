//! Hosts and services reduced to the fields problem counting needs.

use alloc::string::String;

/// Host state code for Up.
pub const HOST_UP: u8 = 0;
/// Host state code for Down.
pub const HOST_DOWN: u8 = 1;

/// Service state code for OK.
pub const SERVICE_OK: u8 = 0;
/// Service state code for Warning.
pub const SERVICE_WARNING: u8 = 1;
/// Service state code for Critical.
pub const SERVICE_CRITICAL: u8 = 2;
/// Service state code for Unknown.
pub const SERVICE_UNKNOWN: u8 = 3;

/// A host or service object as seen by the problem aggregator.
///
/// Built fresh from the object listings every tick and never persisted.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProblemEntity {
    /// Unique object name (`host` or `host!service`).
    pub name: String,

    /// Human readable name as configured in Icinga.
    pub display_name: String,

    /// Current state code.
    pub state: u8,

    /// An operator acknowledged the current problem.
    pub acknowledged: bool,

    /// The object is inside at least one downtime.
    pub in_downtime: bool,

    /// Unix timestamp of the last check, `0.0` if never checked.
    pub last_check: f64,

    /// Last hard state; only fetched when hard-state-only filtering is on.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub last_hard_state: Option<u8>,
}

impl ProblemEntity {
    /// Whether the object has been checked at least once.
    pub fn has_been_checked(&self) -> bool {
        self.last_check > 0.0
    }

    /// Whether an operator has handled this object (ack or downtime).
    pub fn is_handled(&self) -> bool {
        self.acknowledged || self.in_downtime
    }

    /// Whether the last hard state was OK/Up.
    ///
    /// An unknown hard state does not count as recovered.
    pub fn hard_state_recovered(&self) -> bool {
        self.last_hard_state == Some(0)
    }

    /// Interpreted as a host: anything but Up is Down.
    pub fn is_host_down(&self) -> bool {
        self.state != HOST_UP
    }
}

/// A service together with the host it runs on (the `host` join).
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ServiceEntity {
    /// The service itself.
    pub service: ProblemEntity,
    /// The joined host attributes.
    pub host: ProblemEntity,
}

/// Human readable label for a state code.
pub fn state_label(state: u8, is_host: bool) -> &'static str {
    match (is_host, state) {
        (true, 0) => "Up",
        (true, _) => "Down",
        (false, SERVICE_OK) => "OK",
        (false, SERVICE_WARNING) => "Warning",
        (false, SERVICE_CRITICAL) => "Critical",
        (false, SERVICE_UNKNOWN) => "Unknown",
        (false, _) => "Undefined",
    }
}

/// Dashboard color for a state code.
pub fn state_color(state: u8, is_host: bool) -> &'static str {
    match (is_host, state) {
        (true, 0) => "green",
        (true, _) => "red",
        (false, SERVICE_OK) => "green",
        (false, SERVICE_WARNING) => "yellow",
        (false, SERVICE_CRITICAL) => "red",
        (false, SERVICE_UNKNOWN) => "purple",
        (false, _) => "gray",
    }
}
