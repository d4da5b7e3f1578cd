//! HTTP client initialization.
//!
//! This module provides functions to initialize the HTTP clients used for
//! bounded request/response calls and for unbounded result streams.

use std::sync::Arc;
use std::time::Duration;

use reqwest::ClientBuilder;

use crate::config::{Config, TCP_CONNECT_TIMEOUT_SECS};

/// Initializes the HTTP client used for all bounded API calls.
///
/// Creates a `reqwest::Client` configured with:
/// - User-Agent header from the configuration
/// - Whole-request timeout from the configuration (the per-call deadline)
/// - Connect timeout of `TCP_CONNECT_TIMEOUT_SECS`
/// - Rustls TLS backend (no native TLS)
///
/// # Errors
///
/// Returns a `reqwest::Error` if client creation fails.
pub async fn init_client(config: &Config) -> Result<Arc<reqwest::Client>, reqwest::Error> {
    let client = ClientBuilder::new()
        .timeout(Duration::from_secs(config.timeout_seconds))
        .connect_timeout(Duration::from_secs(TCP_CONNECT_TIMEOUT_SECS))
        .user_agent(config.user_agent.clone())
        .build()?;
    Ok(Arc::new(client))
}

/// Initializes the HTTP client used to read streamed measurement results.
///
/// Result bodies have no size bound, so a whole-request timeout would cut off
/// long streams. Only the connect timeout is set here. `stream_read_timeout_secs`
/// bounds the wait for response headers (`AtlasClient::open_result_stream`)
/// and then every body chunk (the decoder).
///
/// # Errors
///
/// Returns a `reqwest::Error` if client creation fails.
pub async fn init_stream_client(config: &Config) -> Result<Arc<reqwest::Client>, reqwest::Error> {
    let client = ClientBuilder::new()
        .connect_timeout(Duration::from_secs(TCP_CONNECT_TIMEOUT_SECS))
        .user_agent(config.user_agent.clone())
        .build()?;
    Ok(Arc::new(client))
}
