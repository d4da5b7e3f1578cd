//! RIPE Atlas API access.
//!
//! Wire types for probes and measurements plus the client that fetches them.

mod client;
mod types;

pub use client::AtlasClient;
pub use types::{
    Geometry, MeasurementSearchResults, MeasurementState, MeasurementStatus, Probe,
    ProbeQueryResults, ProbeStatus, Tag,
};
