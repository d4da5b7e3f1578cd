//! Configuration constants.
//!
//! This module defines the defaults and fixed protocol values used throughout
//! the crate: remote endpoints, timeouts, queue capacities and the reference
//! dataset location.

/// RIPE Atlas API v2 base URL. Endpoint paths are joined onto this.
pub const DEFAULT_ATLAS_BASE_URL: &str = "https://atlas.ripe.net/api/v2/";

/// Google Maps geocoding endpoint.
pub const DEFAULT_GEOCODING_BASE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";

/// Environment variable holding the geocoding API key
pub const GEOCODING_API_KEY_ENV: &str = "GOOGLE_GEOCODING_API_KEY";

/// OpenFlights airport dataset, fetched once and cached locally.
pub const DEFAULT_AIRPORTS_URL: &str =
    "https://raw.githubusercontent.com/jpatokal/openflights/master/data/airports.dat";

/// Local cache location for the airport dataset.
///
/// With the default cache policy the presence of this file alone suppresses
/// any re-download. Delete it to force a refresh.
pub const DEFAULT_AIRPORTS_CACHE_PATH: &str = "/tmp/airports.dat";

/// Number of columns in an airport dataset row
pub const AIRPORT_FIELD_COUNT: usize = 14;

/// Metro (IATA) codes are always three characters
pub const METRO_CODE_LEN: usize = 3;

/// Probe index filter: status id 1 is "Connected"
pub const PROBE_STATUS_CONNECTED_ID: u32 = 1;

/// Status name a probe must carry to be eligible for selection
pub const PROBE_STATUS_CONNECTED: &str = "Connected";

/// Per-request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// TCP connection timeout in seconds (also the only whole-request bound on the
/// result stream client)
pub const TCP_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Maximum time to wait for the next chunk of a streamed result body
pub const DEFAULT_STREAM_READ_TIMEOUT_SECS: u64 = 30;

/// Width of the enrichment worker pool (concurrent probe-detail requests)
pub const DEFAULT_ENRICHMENT_WORKERS: usize = 8;

/// Capacity of the decoded-record queue between decoder and aggregator
pub const DEFAULT_RECORD_QUEUE_CAPACITY: usize = 100;

/// Capacity of the probe-id queue between decoder and enrichment dispatcher
pub const DEFAULT_PROBE_ID_QUEUE_CAPACITY: usize = 10;

/// Maximum size of the airport dataset download (16MB, the real file is ~1MB)
pub const MAX_AIRPORTS_DOWNLOAD_SIZE: usize = 16 * 1024 * 1024;

/// Default User-Agent string for API requests.
pub const DEFAULT_USER_AGENT: &str = concat!("atlas_probes/", env!("CARGO_PKG_VERSION"));

/// Aggregator progress is logged every this many records
pub const PROGRESS_LOG_EVERY_RECORDS: usize = 1000;
