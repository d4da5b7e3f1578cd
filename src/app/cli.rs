//! Command-line interface definition.
//!
//! Kept in the library so the parsing can be tested; `main.rs` only parses
//! and dispatches.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::config::{
    Config, LogFormat, LogLevel, DEFAULT_AIRPORTS_CACHE_PATH, DEFAULT_AIRPORTS_URL,
    DEFAULT_ATLAS_BASE_URL, DEFAULT_ENRICHMENT_WORKERS, DEFAULT_GEOCODING_BASE_URL,
    DEFAULT_STREAM_READ_TIMEOUT_SECS, DEFAULT_TIMEOUT_SECS, GEOCODING_API_KEY_ENV,
};

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Select RIPE Atlas probes near a metro and stream measurement results.
#[derive(Debug, Parser)]
#[command(name = "atlas_probes", version, about)]
pub struct Cli {
    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Info, global = true)]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, value_enum, default_value_t = LogFormat::Plain, global = true)]
    pub log_format: LogFormat,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS, global = true)]
    pub timeout_seconds: u64,

    /// RIPE Atlas API base URL
    #[arg(long, default_value = DEFAULT_ATLAS_BASE_URL, global = true)]
    pub atlas_base_url: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Select connected, public probes near a metro
    Probes(ProbesArgs),
    /// Stream and summarize the results of a measurement
    Results(ResultsArgs),
    /// Look up a single probe by id
    Probe {
        /// Probe id
        id: u32,
    },
    /// Search measurements by tag
    Search {
        /// Comma separated tag list
        #[arg(long)]
        tags: String,
    },
}

#[derive(Debug, Args)]
pub struct ProbesArgs {
    /// Metro (IATA airport) code to search around
    #[arg(long, default_value = "IAD")]
    pub metro: String,

    /// Search radius in kilometres
    #[arg(long, default_value_t = 10)]
    pub radius: u32,

    /// Maximum number of probes to return
    #[arg(long, default_value_t = 5)]
    pub count: usize,

    /// Require an IPv4 address
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub v4: bool,

    /// Require an IPv6 address
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub v6: bool,

    /// Airport dataset URL
    #[arg(long, default_value = DEFAULT_AIRPORTS_URL)]
    pub airports_url: String,

    /// Local cache path of the airport dataset
    #[arg(long, default_value = DEFAULT_AIRPORTS_CACHE_PATH)]
    pub airports_cache: PathBuf,

    /// Re-download the cached dataset when older than this many days.
    /// Without it the cached file is used forever.
    #[arg(long)]
    pub airports_max_age_days: Option<u64>,

    /// Geocoding endpoint
    #[arg(long, default_value = DEFAULT_GEOCODING_BASE_URL)]
    pub geocoding_url: String,

    /// Geocoding API key
    #[arg(long, env = GEOCODING_API_KEY_ENV, hide_env_values = true)]
    pub geocoding_api_key: Option<String>,
}

#[derive(Debug, Args)]
pub struct ResultsArgs {
    /// Measurement id
    pub measurement_id: u64,

    /// Concurrent probe-detail requests during enrichment
    #[arg(long, default_value_t = DEFAULT_ENRICHMENT_WORKERS)]
    pub workers: usize,

    /// Seconds to wait for each chunk of the result stream
    #[arg(long, default_value_t = DEFAULT_STREAM_READ_TIMEOUT_SECS)]
    pub stream_read_timeout: u64,
}

impl Cli {
    /// Library configuration for the selected subcommand.
    pub fn to_config(&self) -> Config {
        let mut config = Config {
            log_level: self.log_level.clone(),
            log_format: self.log_format.clone(),
            timeout_seconds: self.timeout_seconds,
            atlas_base_url: self.atlas_base_url.clone(),
            ..Default::default()
        };
        match &self.command {
            Command::Probes(args) => {
                config.airports_url = args.airports_url.clone();
                config.airports_cache_path = args.airports_cache.clone();
                config.airports_max_age_secs = args
                    .airports_max_age_days
                    .map(|days| days.saturating_mul(SECONDS_PER_DAY));
                config.geocoding_base_url = args.geocoding_url.clone();
                config.geocoding_api_key = args.geocoding_api_key.clone();
            }
            Command::Results(args) => {
                config.enrichment_workers = args.workers;
                config.stream_read_timeout_secs = args.stream_read_timeout;
            }
            Command::Probe { .. } | Command::Search { .. } => {}
        }
        config
    }
}
