//! Error categorization.
//!
//! Maps enrichment failures onto the `ErrorType` counters.

use super::stats::ProcessingStats;
use super::types::{AtlasError, ErrorType, NetworkFailure};

/// Categorizes a `reqwest::Error` into an `ErrorType`.
pub fn categorize_reqwest_error(error: &reqwest::Error) -> ErrorType {
    if let Some(status) = error.status() {
        return categorize_status(status);
    }

    if error.is_timeout() {
        ErrorType::ProbeFetchTimeoutError
    } else if error.is_connect() {
        ErrorType::ProbeFetchConnectError
    } else if error.is_decode() {
        ErrorType::ProbeDecodeError
    } else {
        ErrorType::ProbeFetchOtherError
    }
}

fn categorize_status(status: reqwest::StatusCode) -> ErrorType {
    match status.as_u16() {
        404 => ErrorType::ProbeFetchNotFound,
        429 => ErrorType::ProbeFetchTooManyRequests,
        _ => ErrorType::ProbeFetchStatusError,
    }
}

/// Categorizes an `AtlasError` raised while enriching a probe.
pub fn categorize_atlas_error(error: &AtlasError) -> ErrorType {
    match error {
        AtlasError::Network { reason, .. } => match reason {
            NetworkFailure::Transport(e) => categorize_reqwest_error(e),
            NetworkFailure::Status(status) => categorize_status(*status),
            NetworkFailure::Deadline(_) => ErrorType::ProbeFetchTimeoutError,
        },
        AtlasError::Decode { .. } => ErrorType::ProbeDecodeError,
        _ => ErrorType::ProbeFetchOtherError,
    }
}

/// Records an enrichment failure in the processing statistics.
pub fn update_error_stats(stats: &ProcessingStats, error: &AtlasError) {
    stats.increment_error(categorize_atlas_error(error));
}
