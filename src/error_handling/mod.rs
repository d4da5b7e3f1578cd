//! Error handling and processing statistics.
//!
//! This module provides:
//! - The `AtlasError` taxonomy returned by selection and the result pipeline
//! - Processing statistics for non-fatal enrichment failures
//! - Error type extraction from `AtlasError`/`reqwest::Error`

mod categorization;
mod stats;
mod types;

// Re-export public API
pub use categorization::{categorize_atlas_error, update_error_stats};
pub use stats::ProcessingStats;
pub use types::{AtlasError, ErrorType, InfoType, InitializationError, NetworkFailure};
