//! atlas_probes library: RIPE Atlas probe selection and result streaming
//!
//! Two independent flows are provided:
//!
//! - **Probe selection**: a metro (IATA) code is resolved to a city through
//!   the OpenFlights airport dataset, geocoded, and used for a radius query
//!   against the probe index. Connected, public probes matching the requested
//!   address families are returned in ascending id order.
//! - **Result streaming**: the result array of a measurement is decoded
//!   incrementally, each record's probe is enriched through a per-run cache
//!   with a bounded worker pool, and per-type statistics are aggregated in
//!   delivery order.
//!
//! # Example
//!
//! ```no_run
//! use atlas_probes::initialization::{init_atlas_client, init_pipeline_context};
//! use atlas_probes::{run_results_pipeline, Config};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config {
//!     enrichment_workers: 4,
//!     ..Default::default()
//! };
//!
//! let ctx = init_pipeline_context(&config).await?;
//! let report = run_results_pipeline(&ctx, 3679868).await?;
//! println!(
//!     "{} records from {} probes in {} countries",
//!     report.summary.total_records,
//!     report.summary.distinct_probes,
//!     report.summary.distinct_countries
//! );
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

mod airports;
pub mod app;
mod atlas;
pub mod config;
mod enrichment;
mod error_handling;
mod geocode;
pub mod initialization;
mod pipeline;
mod probes;
mod results;

// Re-export public API
pub use airports::{Airport, AirportDirectory, CachePolicy};
pub use atlas::{
    AtlasClient, Geometry, MeasurementSearchResults, MeasurementState, MeasurementStatus, Probe,
    ProbeQueryResults, ProbeStatus, Tag,
};
pub use config::{Config, LogFormat, LogLevel};
pub use enrichment::ProbeEnrichmentCache;
pub use error_handling::{
    categorize_atlas_error, AtlasError, ErrorType, InfoType, InitializationError, NetworkFailure,
    ProcessingStats,
};
pub use geocode::{Coordinates, Geocoder, GoogleGeocoder};
pub use pipeline::{aggregate_stream, run_results_pipeline, PipelineContext, PipelineReport};
pub use probes::{DirectorySource, FamilyFilter, ProbeSelector, SelectionRequest};
pub use results::{
    ByteStream, LatencyRecord, MeasurementResult, RecordHeader, ResultAggregator, ResultKind,
    ResultStreamDecoder, ResultSummary, TypeStats,
};
