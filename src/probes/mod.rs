//! Probe selection around a metro.
//!
//! A metro code is resolved to a city and country through the airport
//! directory, geocoded, and used as the centre of a radius query against the
//! probe index. The server-ordered answer is filtered by address family and
//! cut to the requested count.

mod filter;

pub use filter::FamilyFilter;

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::airports::{AirportDirectory, CachePolicy};
use crate::atlas::{AtlasClient, Probe};
use crate::config::{Config, METRO_CODE_LEN};
use crate::error_handling::AtlasError;
use crate::geocode::Geocoder;

/// Parameters of one `ProbeSelector::select` call.
#[derive(Debug, Clone)]
pub struct SelectionRequest {
    /// Three-letter metro (IATA) code
    pub metro: String,
    /// Search radius around the metro, must be positive
    pub radius_km: u32,
    /// Maximum number of probes to return
    pub count: usize,
    pub want_v4: bool,
    pub want_v6: bool,
}

/// Where the airport directory is loaded from on first use.
#[derive(Clone)]
pub struct DirectorySource {
    pub client: Arc<reqwest::Client>,
    pub url: String,
    pub cache_path: PathBuf,
    pub policy: CachePolicy,
}

impl DirectorySource {
    pub fn from_config(client: Arc<reqwest::Client>, config: &Config) -> Self {
        Self {
            client,
            url: config.airports_url.clone(),
            cache_path: config.airports_cache_path.clone(),
            policy: config.airports_cache_policy(),
        }
    }
}

/// Selects eligible probes near a metro.
///
/// The airport directory is loaded lazily on the first `select` call that
/// passes validation, so invalid requests never touch the network or disk.
pub struct ProbeSelector<G: Geocoder> {
    atlas: Arc<AtlasClient>,
    geocoder: G,
    source: Option<DirectorySource>,
    directory: OnceCell<AirportDirectory>,
}

impl<G: Geocoder> ProbeSelector<G> {
    pub fn new(atlas: Arc<AtlasClient>, geocoder: G, source: DirectorySource) -> Self {
        Self {
            atlas,
            geocoder,
            source: Some(source),
            directory: OnceCell::new(),
        }
    }

    /// Builds a selector over an already loaded directory.
    pub fn with_directory(atlas: Arc<AtlasClient>, geocoder: G, directory: AirportDirectory) -> Self {
        Self {
            atlas,
            geocoder,
            source: None,
            directory: OnceCell::new_with(Some(directory)),
        }
    }

    async fn directory(&self) -> Result<&AirportDirectory, AtlasError> {
        self.directory
            .get_or_try_init(|| async {
                match &self.source {
                    Some(source) => {
                        AirportDirectory::load(
                            &source.client,
                            &source.url,
                            &source.cache_path,
                            source.policy,
                        )
                        .await
                    }
                    None => Err(AtlasError::directory(
                        "airport directory",
                        "no directory source configured",
                    )),
                }
            })
            .await
    }

    /// Returns up to `request.count` connected, public probes near the metro
    /// that match the requested address families, in ascending id order.
    ///
    /// Only the first page of the probe index answer is considered.
    ///
    /// # Errors
    ///
    /// - `Validation` for a metro code that is not three characters or a zero
    ///   radius, before any I/O
    /// - `DirectoryLoad` / `NotFound` from the airport directory
    /// - `GeocodeFailure` from the geocoder
    /// - `Network` / `Decode` from the probe query
    pub async fn select(&self, request: &SelectionRequest) -> Result<Vec<Probe>, AtlasError> {
        validate(request)?;

        let directory = self.directory().await?;
        let airport = directory.find_by_metro_code(&request.metro)?;
        log::debug!(
            "Metro {} resolved to {}, {}",
            request.metro,
            airport.city,
            airport.country
        );

        let at = self
            .geocoder
            .resolve(&airport.city, &airport.country)
            .await?;
        log::debug!("{}, {} geocoded to {}", airport.city, airport.country, at);

        let page = self.atlas.query_probes(at, request.radius_km).await?;
        let returned = page.results.len();
        let filter = FamilyFilter::from_flags(request.want_v4, request.want_v6);
        let selected: Vec<Probe> = page
            .results
            .into_iter()
            .filter(|probe| probe.is_eligible() && filter.matches(probe))
            .take(request.count)
            .collect();

        log::info!(
            "Selected {} of {} probes within {}km of {} ({:?})",
            selected.len(),
            returned,
            request.radius_km,
            request.metro,
            filter
        );
        Ok(selected)
    }
}

fn validate(request: &SelectionRequest) -> Result<(), AtlasError> {
    if request.metro.chars().count() != METRO_CODE_LEN {
        return Err(AtlasError::Validation(format!(
            "metro code must be {} characters, got {:?}",
            METRO_CODE_LEN, request.metro
        )));
    }
    if request.radius_km == 0 {
        return Err(AtlasError::Validation(
            "radius must be greater than 0 km".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::airports::Airport;
    use crate::geocode::Coordinates;
    use httptest::Server;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use url::Url;

    struct CountingGeocoder {
        calls: AtomicUsize,
    }

    impl Geocoder for CountingGeocoder {
        async fn resolve(&self, _city: &str, _country: &str) -> Result<Coordinates, AtlasError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Coordinates::new(38.9445, -77.4558))
        }
    }

    fn selector(server: &Server) -> ProbeSelector<CountingGeocoder> {
        let http = Arc::new(reqwest::Client::new());
        let base = Url::parse(&server.url_str("/api/v2/")).unwrap();
        let atlas = Arc::new(AtlasClient::new(Arc::clone(&http), http, base));
        let directory = AirportDirectory::from_airports(vec![Airport {
            city: "Washington".into(),
            country: "United States".into(),
            iata: "IAD".into(),
            ..Default::default()
        }]);
        let geocoder = CountingGeocoder {
            calls: AtomicUsize::new(0),
        };
        ProbeSelector::with_directory(atlas, geocoder, directory)
    }

    fn request(metro: &str, radius_km: u32) -> SelectionRequest {
        SelectionRequest {
            metro: metro.to_string(),
            radius_km,
            count: 5,
            want_v4: true,
            want_v6: true,
        }
    }

    #[tokio::test]
    async fn test_invalid_metro_fails_before_any_call() {
        // No expectations: any request to the server fails the test
        let server = Server::run();
        let selector = selector(&server);
        for metro in ["IA", "IADX", ""] {
            let err = selector.select(&request(metro, 10)).await.unwrap_err();
            assert!(matches!(err, AtlasError::Validation(_)), "{metro}: {err}");
        }
        assert_eq!(selector.geocoder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_zero_radius_fails_before_any_call() {
        let server = Server::run();
        let selector = selector(&server);
        let err = selector.select(&request("IAD", 0)).await.unwrap_err();
        assert!(matches!(err, AtlasError::Validation(_)));
        assert_eq!(selector.geocoder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_metro_is_not_found_without_geocoding() {
        let server = Server::run();
        let selector = selector(&server);
        let err = selector.select(&request("ZZZ", 10)).await.unwrap_err();
        assert!(matches!(err, AtlasError::NotFound(_)), "got: {err}");
        assert_eq!(selector.geocoder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_selector_without_source_reports_directory_error() {
        let server = Server::run();
        let http = Arc::new(reqwest::Client::new());
        let base = Url::parse(&server.url_str("/api/v2/")).unwrap();
        let atlas = Arc::new(AtlasClient::new(Arc::clone(&http), http, base));
        let selector = ProbeSelector {
            atlas,
            geocoder: CountingGeocoder {
                calls: AtomicUsize::new(0),
            },
            source: None,
            directory: OnceCell::new(),
        };
        let err = selector.select(&request("IAD", 10)).await.unwrap_err();
        assert!(matches!(err, AtlasError::DirectoryLoad { .. }), "got: {err}");
    }
}
