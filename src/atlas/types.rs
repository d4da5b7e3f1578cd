//! RIPE Atlas API data structures.
//!
//! Fields the API sometimes omits or sends as `null` are `Option`s or carry
//! `#[serde(default)]`; unknown fields are ignored.

use serde::{Deserialize, Serialize};

use crate::config::PROBE_STATUS_CONNECTED;

/// Connection status of a probe.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbeStatus {
    #[serde(default)]
    pub since: Option<String>,
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub name: String,
}

/// A user or system tag attached to a probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub slug: String,
}

/// GeoJSON point of a probe location: `coordinates` is `[longitude, latitude]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: [f64; 2],
}

impl Geometry {
    pub fn longitude(&self) -> f64 {
        self.coordinates[0]
    }

    pub fn latitude(&self) -> f64 {
        self.coordinates[1]
    }
}

/// A measurement probe as returned by the probe index and detail endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Probe {
    pub id: u32,
    pub address_v4: Option<String>,
    pub address_v6: Option<String>,
    pub prefix_v4: Option<String>,
    pub prefix_v6: Option<String>,
    pub asn_v4: Option<u32>,
    pub asn_v6: Option<u32>,
    pub country_code: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub status: ProbeStatus,
    pub status_since: Option<i64>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub is_anchor: bool,
    pub first_connected: Option<i64>,
    pub last_connected: Option<i64>,
    #[serde(default)]
    pub total_uptime: u64,
    #[serde(rename = "type")]
    pub probe_type: Option<String>,
}

impl Probe {
    /// True when the probe has a non-empty IPv4 address.
    pub fn has_v4(&self) -> bool {
        self.address_v4.as_deref().is_some_and(|a| !a.is_empty())
    }

    /// True when the probe has a non-empty IPv6 address.
    pub fn has_v6(&self) -> bool {
        self.address_v6.as_deref().is_some_and(|a| !a.is_empty())
    }

    /// Connected and public: the only probes selection ever returns.
    pub fn is_eligible(&self) -> bool {
        self.status.name == PROBE_STATUS_CONNECTED && self.is_public
    }

    /// Country code, if the probe reports a non-empty one.
    pub fn country(&self) -> Option<&str> {
        self.country_code.as_deref().filter(|c| !c.is_empty())
    }
}

/// Paged response of the probe index.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProbeQueryResults {
    #[serde(default)]
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    #[serde(default)]
    pub results: Vec<Probe>,
}

/// Lifecycle state of a measurement.
///
/// Ids: 0 Specified, 1 Scheduled, 2 Ongoing, 4 Stopped, 5 Forced to stop,
/// 6 No suitable probes, 7 Failed, 8 Archived.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeasurementState {
    #[serde(default)]
    pub id: i32,
    #[serde(default)]
    pub name: String,
}

/// Status object of a single measurement.
///
/// `result` is the URL of the streamed result array.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeasurementStatus {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub description: Option<String>,
    pub af: Option<u8>,
    #[serde(default)]
    pub status: MeasurementState,
    pub target: Option<String>,
    pub target_ip: Option<String>,
    pub target_asn: Option<u32>,
    pub resolved_ips: Option<Vec<String>>,
    pub participant_count: Option<u32>,
    pub probes_requested: Option<i64>,
    pub probes_scheduled: Option<i64>,
    pub creation_time: Option<i64>,
    pub start_time: Option<i64>,
    pub stop_time: Option<i64>,
    pub interval: Option<u32>,
    #[serde(default)]
    pub is_oneoff: bool,
    #[serde(default)]
    pub is_public: bool,
    pub result: Option<String>,
}

/// Paged response of the measurement search endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeasurementSearchResults {
    #[serde(default)]
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    #[serde(default)]
    pub results: Vec<MeasurementStatus>,
}
