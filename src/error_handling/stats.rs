//! Processing statistics tracking.
//!
//! This module provides thread-safe counters for enrichment failures and
//! informational events during a pipeline run.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use strum::IntoEnumIterator;

use super::types::{ErrorType, InfoType};

/// Thread-safe processing statistics tracker.
///
/// Tracks errors and informational metrics using atomic counters, allowing
/// concurrent access from the enrichment workers. All types are initialized
/// to zero on creation, so the maps are never written after construction.
pub struct ProcessingStats {
    errors: HashMap<ErrorType, AtomicUsize>,
    info: HashMap<InfoType, AtomicUsize>,
}

impl Default for ProcessingStats {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingStats {
    pub fn new() -> Self {
        let errors = ErrorType::iter()
            .map(|error| (error, AtomicUsize::new(0)))
            .collect();
        let info = InfoType::iter()
            .map(|info_type| (info_type, AtomicUsize::new(0)))
            .collect();

        ProcessingStats { errors, info }
    }

    /// Increment an error counter.
    pub fn increment_error(&self, error: ErrorType) {
        if let Some(counter) = self.errors.get(&error) {
            counter.fetch_add(1, Ordering::Relaxed);
        } else {
            log::error!(
                "Attempted to increment error counter for {:?} which is not in the map. \
                 This indicates a bug in ProcessingStats initialization.",
                error
            );
        }
    }

    /// Increment an info counter.
    pub fn increment_info(&self, info_type: InfoType) {
        if let Some(counter) = self.info.get(&info_type) {
            counter.fetch_add(1, Ordering::Relaxed);
        } else {
            log::error!(
                "Attempted to increment info counter for {:?} which is not in the map. \
                 This indicates a bug in ProcessingStats initialization.",
                info_type
            );
        }
    }

    /// Get the count for an error type.
    pub fn get_error_count(&self, error: ErrorType) -> usize {
        self.errors
            .get(&error)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    /// Get the count for an info type.
    pub fn get_info_count(&self, info_type: InfoType) -> usize {
        self.info
            .get(&info_type)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    /// Get total error count across all error types.
    pub fn total_errors(&self) -> usize {
        ErrorType::iter().map(|e| self.get_error_count(e)).sum()
    }

    /// Get total info count across all info types.
    pub fn total_info(&self) -> usize {
        InfoType::iter().map(|i| self.get_info_count(i)).sum()
    }
}
