//! Metro code to city/country resolution.
//!
//! Metro codes are IATA airport codes. The OpenFlights airport dataset is
//! downloaded once, cached on disk according to a `CachePolicy`, and parsed
//! into an in-memory `AirportDirectory`.

mod cache;
mod parse;

pub use cache::CachePolicy;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::METRO_CODE_LEN;
use crate::error_handling::AtlasError;

/// One row of the airport dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Airport {
    pub id: i32,
    pub name: String,
    pub city: String,
    pub country: String,
    /// IATA code, the metro code lookups match against
    pub iata: String,
    pub icao: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Feet above sea level
    pub altitude: i32,
    /// Hours offset from UTC
    pub utc_offset: f64,
    pub dst: String,
    pub tz_database: String,
    pub record_type: String,
    pub source: String,
}

/// In-memory airport dataset, in file order.
#[derive(Debug, Clone, Default)]
pub struct AirportDirectory {
    airports: Vec<Airport>,
}

impl AirportDirectory {
    /// Loads the directory, downloading `source_url` to `cache_path` unless
    /// `policy` allows the cached file to be reused.
    ///
    /// # Errors
    ///
    /// `AtlasError::DirectoryLoad` on network or disk failure. Malformed rows
    /// are never an error.
    pub async fn load(
        client: &reqwest::Client,
        source_url: &str,
        cache_path: &Path,
        policy: CachePolicy,
    ) -> Result<Self, AtlasError> {
        let data = match cache::load_cached(cache_path, policy).await? {
            Some(data) => data,
            None => cache::download_and_cache(client, source_url, cache_path).await?,
        };
        let directory = Self::parse(&data)?;
        log::info!("Loaded {} airports", directory.len());
        Ok(directory)
    }

    /// Parses raw dataset bytes.
    pub fn parse(data: &[u8]) -> Result<Self, AtlasError> {
        Ok(Self::from_airports(parse::parse_airports(data)?))
    }

    pub fn from_airports(airports: Vec<Airport>) -> Self {
        Self { airports }
    }

    pub fn len(&self) -> usize {
        self.airports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.airports.is_empty()
    }

    /// Finds the airport for a metro code.
    ///
    /// The match is case-insensitive and exact; when several rows share a
    /// code, the first one in file order wins.
    ///
    /// # Errors
    ///
    /// `AtlasError::NotFound` if the code is not three characters long or no
    /// row carries it.
    pub fn find_by_metro_code(&self, code: &str) -> Result<&Airport, AtlasError> {
        if code.chars().count() != METRO_CODE_LEN {
            return Err(AtlasError::NotFound(format!(
                "metro code {:?} is not {} characters",
                code, METRO_CODE_LEN
            )));
        }
        self.airports
            .iter()
            .find(|a| a.iata.eq_ignore_ascii_case(code))
            .ok_or_else(|| {
                AtlasError::NotFound(format!("no city/country match for metro {}", code))
            })
    }
}
