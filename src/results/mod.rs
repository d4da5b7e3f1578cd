//! Measurement result decoding and aggregation.

mod aggregate;
mod decoder;
mod types;

pub use aggregate::{ResultAggregator, ResultSummary, TypeStats};
pub use decoder::{ByteStream, ResultStreamDecoder};
pub use types::{LatencyRecord, MeasurementResult, RecordHeader, ResultKind};
