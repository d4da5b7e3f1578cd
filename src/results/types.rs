//! Measurement result records.
//!
//! The result array mixes record types. Each record is decoded in two steps:
//! the `type` discriminator and the common header are read first, then the
//! `result` payload is interpreted in the shape of that type. Unrecognized
//! types become `MeasurementResult::Other` instead of a decode error.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum_macros::EnumIter;

/// Result types that carry a latency and are aggregated numerically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultKind {
    Ping,
    Http,
    Traceroute,
    Dns,
}

impl ResultKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultKind::Ping => "ping",
            ResultKind::Http => "http",
            ResultKind::Traceroute => "traceroute",
            ResultKind::Dns => "dns",
        }
    }

    fn from_discriminator(kind: &str) -> Option<Self> {
        match kind {
            "ping" => Some(ResultKind::Ping),
            "http" => Some(ResultKind::Http),
            "traceroute" => Some(ResultKind::Traceroute),
            "dns" => Some(ResultKind::Dns),
            _ => None,
        }
    }
}

impl std::fmt::Display for ResultKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields shared by every result record.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordHeader {
    pub probe_id: u32,
    pub timestamp: i64,
    pub measurement_id: Option<u64>,
    /// Address the probe measured from
    pub from: Option<String>,
    pub dst_addr: Option<String>,
}

/// One typed result with its latency in milliseconds.
///
/// `latency` is `None` when the record has no usable sample, e.g. a ping
/// where every packet was lost.
#[derive(Debug, Clone, PartialEq)]
pub struct LatencyRecord {
    pub header: RecordHeader,
    pub latency: Option<f64>,
}

/// A decoded record from a measurement result stream.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawRecord")]
pub enum MeasurementResult {
    Ping(LatencyRecord),
    Http(LatencyRecord),
    Traceroute(LatencyRecord),
    Dns(LatencyRecord),
    /// A type without numeric aggregation; kept so it can be counted.
    Other { kind: String, header: RecordHeader },
}

impl MeasurementResult {
    pub fn header(&self) -> &RecordHeader {
        match self {
            MeasurementResult::Ping(r)
            | MeasurementResult::Http(r)
            | MeasurementResult::Traceroute(r)
            | MeasurementResult::Dns(r) => &r.header,
            MeasurementResult::Other { header, .. } => header,
        }
    }

    pub fn probe_id(&self) -> u32 {
        self.header().probe_id
    }

    pub fn timestamp(&self) -> i64 {
        self.header().timestamp
    }

    /// The aggregated kind, `None` for `Other`.
    pub fn kind(&self) -> Option<ResultKind> {
        match self {
            MeasurementResult::Ping(_) => Some(ResultKind::Ping),
            MeasurementResult::Http(_) => Some(ResultKind::Http),
            MeasurementResult::Traceroute(_) => Some(ResultKind::Traceroute),
            MeasurementResult::Dns(_) => Some(ResultKind::Dns),
            MeasurementResult::Other { .. } => None,
        }
    }

    /// The `type` discriminator as it appeared on the wire.
    pub fn type_name(&self) -> &str {
        match self {
            MeasurementResult::Other { kind, .. } => kind,
            _ => self.kind().map(|k| k.as_str()).unwrap_or_default(),
        }
    }

    pub fn latency(&self) -> Option<f64> {
        match self {
            MeasurementResult::Ping(r)
            | MeasurementResult::Http(r)
            | MeasurementResult::Traceroute(r)
            | MeasurementResult::Dns(r) => r.latency,
            MeasurementResult::Other { .. } => None,
        }
    }
}

#[derive(Deserialize)]
struct RawRecord {
    #[serde(rename = "type")]
    kind: String,
    prb_id: u32,
    #[serde(default)]
    timestamp: i64,
    #[serde(default)]
    msm_id: Option<u64>,
    #[serde(default)]
    from: Option<String>,
    #[serde(default)]
    dst_addr: Option<String>,
    /// Ping summary average, -1 when nothing came back
    #[serde(default)]
    avg: Option<f64>,
    #[serde(default)]
    result: Option<Value>,
}

/// `result` is a single object for some types and an array for others.
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(item) => vec![item],
            OneOrMany::Many(items) => items,
        }
    }
}

/// A ping packet or traceroute reply; `{"x": "*"}` timeouts have no rtt.
#[derive(Deserialize)]
struct RttSample {
    #[serde(default)]
    rtt: Option<f64>,
}

/// An http request or dns query outcome.
#[derive(Deserialize)]
struct RtSample {
    #[serde(default)]
    rt: Option<f64>,
}

#[derive(Deserialize)]
struct Hop {
    #[serde(default)]
    result: Vec<RttSample>,
}

impl TryFrom<RawRecord> for MeasurementResult {
    type Error = String;

    fn try_from(raw: RawRecord) -> Result<Self, Self::Error> {
        let header = RecordHeader {
            probe_id: raw.prb_id,
            timestamp: raw.timestamp,
            measurement_id: raw.msm_id,
            from: raw.from,
            dst_addr: raw.dst_addr,
        };
        let Some(kind) = ResultKind::from_discriminator(&raw.kind) else {
            return Ok(MeasurementResult::Other {
                kind: raw.kind,
                header,
            });
        };

        let payload = raw.result.unwrap_or(Value::Null);
        let latency = match kind {
            ResultKind::Ping => {
                let samples: Vec<RttSample> = payload_items(payload, kind)?;
                mean(samples.into_iter().filter_map(|s| s.rtt))
                    .or(raw.avg.filter(|avg| *avg >= 0.0))
            }
            ResultKind::Traceroute => {
                let hops: Vec<Hop> = payload_items(payload, kind)?;
                hops.into_iter()
                    .last()
                    .and_then(|hop| mean(hop.result.into_iter().filter_map(|s| s.rtt)))
            }
            ResultKind::Http | ResultKind::Dns => {
                let samples: Vec<RtSample> = payload_items(payload, kind)?;
                mean(samples.into_iter().filter_map(|s| s.rt))
            }
        };

        let record = LatencyRecord { header, latency };
        Ok(match kind {
            ResultKind::Ping => MeasurementResult::Ping(record),
            ResultKind::Http => MeasurementResult::Http(record),
            ResultKind::Traceroute => MeasurementResult::Traceroute(record),
            ResultKind::Dns => MeasurementResult::Dns(record),
        })
    }
}

fn payload_items<T: serde::de::DeserializeOwned>(
    payload: Value,
    kind: ResultKind,
) -> Result<Vec<T>, String> {
    if payload.is_null() {
        return Ok(Vec::new());
    }
    serde_json::from_value::<OneOrMany<T>>(payload)
        .map(OneOrMany::into_vec)
        .map_err(|e| format!("malformed {} result payload: {}", kind, e))
}

fn mean(samples: impl Iterator<Item = f64>) -> Option<f64> {
    let (count, sum) = samples.fold((0usize, 0.0), |(n, s), v| (n + 1, s + v));
    (count > 0).then(|| sum / count as f64)
}
