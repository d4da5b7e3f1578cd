//! Application initialization and resource setup.
//!
//! This module provides functions to initialize shared resources:
//! - HTTP clients (bounded calls and result streams)
//! - Logger
//! - Worker-pool permits for the enrichment stage
//! - The probe selector and the per-run pipeline context

mod client;
mod logger;

use std::sync::Arc;

use tokio::sync::Semaphore;
use url::Url;

use crate::atlas::AtlasClient;
use crate::config::Config;
use crate::error_handling::InitializationError;
use crate::geocode::GoogleGeocoder;
use crate::pipeline::PipelineContext;
use crate::probes::{DirectorySource, ProbeSelector};

// Re-export public API
pub use client::{init_client, init_stream_client};
pub use logger::init_logger_with;

/// Initializes a semaphore for controlling concurrency.
///
/// Each permit is one slot of the enrichment worker pool. A width of zero
/// would stall the pipeline, so it is clamped to one.
pub fn init_semaphore(count: usize) -> Arc<Semaphore> {
    Arc::new(Semaphore::new(count.max(1)))
}

/// Initializes the RIPE Atlas API client from the configuration.
///
/// # Errors
///
/// Returns `InitializationError` if the HTTP clients cannot be built or the
/// configured base URL does not parse.
pub async fn init_atlas_client(config: &Config) -> Result<Arc<AtlasClient>, InitializationError> {
    let client = init_client(config).await?;
    atlas_client_with(config, client).await
}

async fn atlas_client_with(
    config: &Config,
    client: Arc<reqwest::Client>,
) -> Result<Arc<AtlasClient>, InitializationError> {
    let stream_client = init_stream_client(config).await?;
    let base_url = Url::parse(&config.atlas_base_url)?;
    Ok(Arc::new(AtlasClient::new(client, stream_client, base_url)))
}

/// Builds a fresh pipeline context for one results run.
///
/// The context owns the enrichment cache, so nothing is shared between runs.
pub async fn init_pipeline_context(
    config: &Config,
) -> Result<PipelineContext, InitializationError> {
    let atlas = init_atlas_client(config).await?;
    Ok(PipelineContext::new(atlas, config))
}

/// Builds a probe selector backed by the Google geocoder.
///
/// The API client, geocoder and dataset download share one bounded HTTP
/// client.
///
/// The airport directory is not loaded here; the selector loads it on first
/// use according to the configured cache policy.
pub async fn init_probe_selector(
    config: &Config,
) -> Result<ProbeSelector<GoogleGeocoder>, InitializationError> {
    let client = init_client(config).await?;
    let atlas = atlas_client_with(config, Arc::clone(&client)).await?;
    let geocoder = GoogleGeocoder::new(
        Arc::clone(&client),
        &config.geocoding_base_url,
        config.geocoding_api_key.clone(),
    );
    Ok(ProbeSelector::new(
        atlas,
        geocoder,
        DirectorySource::from_config(client, config),
    ))
}
