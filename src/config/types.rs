//! Configuration types.
//!
//! This module defines enums and structs used for command-line argument parsing
//! and library configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::ValueEnum;

use crate::airports::CachePolicy;
use crate::config::constants::*;

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Library configuration (no CLI dependencies).
///
/// # Examples
///
/// ```no_run
/// use atlas_probes::Config;
///
/// let config = Config {
///     enrichment_workers: 4,
///     airports_max_age_secs: Some(30 * 24 * 60 * 60),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Log level
    pub log_level: LogLevel,

    /// Log format
    pub log_format: LogFormat,

    /// Per-request timeout in seconds
    pub timeout_seconds: u64,

    /// HTTP User-Agent header value
    pub user_agent: String,

    /// RIPE Atlas API base URL (must end with `/`)
    pub atlas_base_url: String,

    /// Airport dataset download URL
    pub airports_url: String,

    /// Local cache path for the airport dataset
    pub airports_cache_path: PathBuf,

    /// Maximum age of the cached dataset in seconds. `None` keeps it forever.
    pub airports_max_age_secs: Option<u64>,

    /// Geocoding endpoint
    pub geocoding_base_url: String,

    /// Geocoding API key
    pub geocoding_api_key: Option<String>,

    /// Concurrent probe-detail requests during enrichment
    pub enrichment_workers: usize,

    /// Decoded records buffered ahead of the aggregator
    pub record_queue_capacity: usize,

    /// Probe ids buffered ahead of the enrichment dispatcher
    pub probe_id_queue_capacity: usize,

    /// Deadline for each chunk of a streamed result body, in seconds
    pub stream_read_timeout_secs: u64,
}

impl Config {
    /// Cache policy for the airport dataset.
    pub fn airports_cache_policy(&self) -> CachePolicy {
        match self.airports_max_age_secs {
            Some(secs) => CachePolicy::MaxAge(Duration::from_secs(secs)),
            None => CachePolicy::Forever,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            atlas_base_url: DEFAULT_ATLAS_BASE_URL.to_string(),
            airports_url: DEFAULT_AIRPORTS_URL.to_string(),
            airports_cache_path: PathBuf::from(DEFAULT_AIRPORTS_CACHE_PATH),
            airports_max_age_secs: None,
            geocoding_base_url: DEFAULT_GEOCODING_BASE_URL.to_string(),
            geocoding_api_key: None,
            enrichment_workers: DEFAULT_ENRICHMENT_WORKERS,
            record_queue_capacity: DEFAULT_RECORD_QUEUE_CAPACITY,
            probe_id_queue_capacity: DEFAULT_PROBE_ID_QUEUE_CAPACITY,
            stream_read_timeout_secs: DEFAULT_STREAM_READ_TIMEOUT_SECS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(
            log::LevelFilter::from(LogLevel::Error),
            log::LevelFilter::Error
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Warn),
            log::LevelFilter::Warn
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Info),
            log::LevelFilter::Info
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Debug),
            log::LevelFilter::Debug
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Trace),
            log::LevelFilter::Trace
        );
    }

    #[test]
    fn test_log_level_ordering() {
        let error = log::LevelFilter::from(LogLevel::Error);
        let warn = log::LevelFilter::from(LogLevel::Warn);
        let info = log::LevelFilter::from(LogLevel::Info);
        let debug = log::LevelFilter::from(LogLevel::Debug);
        let trace = log::LevelFilter::from(LogLevel::Trace);

        assert!(error < warn);
        assert!(warn < info);
        assert!(info < debug);
        assert!(debug < trace);
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.timeout_seconds, 10);
        assert_eq!(config.enrichment_workers, 8);
        assert_eq!(config.record_queue_capacity, 100);
        assert_eq!(config.probe_id_queue_capacity, 10);
        assert_eq!(config.airports_cache_path, PathBuf::from("/tmp/airports.dat"));
        assert!(config.atlas_base_url.ends_with('/'));
        assert!(config.geocoding_api_key.is_none());
    }

    #[test]
    fn test_default_cache_policy_is_forever() {
        let config = Config::default();
        assert_eq!(config.airports_cache_policy(), CachePolicy::Forever);
    }

    #[test]
    fn test_cache_policy_with_max_age() {
        let config = Config {
            airports_max_age_secs: Some(3600),
            ..Default::default()
        };
        assert_eq!(
            config.airports_cache_policy(),
            CachePolicy::MaxAge(Duration::from_secs(3600))
        );
    }
}
