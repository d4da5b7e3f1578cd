//! Error type definitions.
//!
//! This module defines the error taxonomy returned by the library and the
//! counters used to classify non-fatal enrichment failures.

use std::time::Duration;

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use reqwest::StatusCode;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),

    /// A configured URL could not be parsed.
    #[error("Invalid URL in configuration: {0}")]
    InvalidUrlError(#[from] url::ParseError),
}

/// Why a remote call failed at the transport level.
#[derive(Error, Debug)]
pub enum NetworkFailure {
    /// Connection, TLS, body read or client-side timeout reported by reqwest.
    #[error("{0}")]
    Transport(#[from] ReqwestError),

    /// The server answered with a non-success status.
    #[error("server returned {0}")]
    Status(StatusCode),

    /// The call did not complete before its deadline.
    #[error("deadline of {0:?} expired")]
    Deadline(Duration),
}

/// Errors returned by probe selection and the result pipeline.
#[derive(Error, Debug)]
pub enum AtlasError {
    /// Malformed metro code, non-positive radius or similar caller mistake.
    /// Always raised before any network call.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Connection failure, expired deadline or non-success HTTP status.
    #[error("Network error for {url}: {reason}")]
    Network {
        /// Request URL (or a description of the stream being read)
        url: String,
        /// Underlying failure
        #[source]
        reason: NetworkFailure,
    },

    /// Malformed JSON at any decode site.
    #[error("Decode error ({context}): {source}")]
    Decode {
        /// What was being decoded
        context: String,
        /// Parser error, or a description of the framing problem
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The geocoding provider returned no match or an error.
    #[error("Geocoding failed: {0}")]
    GeocodeFailure(String),

    /// Metro code has no match in the airport directory.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The airport dataset could not be fetched, cached or read.
    #[error("Failed to load airport directory from {location}: {source}")]
    DirectoryLoad {
        /// Source URL or cache path
        location: String,
        /// Underlying I/O or network error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl AtlasError {
    pub(crate) fn transport(url: impl Into<String>, error: ReqwestError) -> Self {
        AtlasError::Network {
            url: url.into(),
            reason: NetworkFailure::Transport(error),
        }
    }

    pub(crate) fn status(url: impl Into<String>, status: StatusCode) -> Self {
        AtlasError::Network {
            url: url.into(),
            reason: NetworkFailure::Status(status),
        }
    }

    pub(crate) fn deadline(url: impl Into<String>, timeout: Duration) -> Self {
        AtlasError::Network {
            url: url.into(),
            reason: NetworkFailure::Deadline(timeout),
        }
    }

    pub(crate) fn decode(
        context: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        AtlasError::Decode {
            context: context.into(),
            source: source.into(),
        }
    }

    pub(crate) fn directory(
        location: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        AtlasError::DirectoryLoad {
            location: location.into(),
            source: source.into(),
        }
    }
}

/// Types of non-fatal failures counted during probe enrichment.
///
/// Enrichment failures never stop a pipeline run; they are logged and tallied
/// here so the run summary can report them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum ErrorType {
    ProbeFetchTimeoutError,
    ProbeFetchConnectError,
    ProbeFetchNotFound,        // 404 Not Found
    ProbeFetchTooManyRequests, // 429 Too Many Requests
    ProbeFetchStatusError,     // any other non-success status
    ProbeFetchOtherError,
    ProbeDecodeError,
}

/// Informational counters for the enrichment stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum InfoType {
    ProbeFetched,  // remote probe-detail request succeeded
    ProbeCacheHit, // served from the cache or a shared in-flight fetch
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::ProbeFetchTimeoutError => "Probe fetch timeout",
            ErrorType::ProbeFetchConnectError => "Probe fetch connect error",
            ErrorType::ProbeFetchNotFound => "Probe not found (404)",
            ErrorType::ProbeFetchTooManyRequests => "Too many requests (429)",
            ErrorType::ProbeFetchStatusError => "Probe fetch status error",
            ErrorType::ProbeFetchOtherError => "Probe fetch other error",
            ErrorType::ProbeDecodeError => "Probe decode error",
        }
    }
}

impl InfoType {
    /// Returns a human-readable string representation of the info type.
    pub fn as_str(&self) -> &'static str {
        match self {
            InfoType::ProbeFetched => "Probes fetched",
            InfoType::ProbeCacheHit => "Probe cache hits",
        }
    }
}
