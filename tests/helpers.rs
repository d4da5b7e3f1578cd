// Shared test helpers for mock API setup and fixture data.
//
// This module provides common utilities used across multiple test files to reduce duplication.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use httptest::Server;
use serde_json::{json, Value};
use url::Url;

use atlas_probes::{AtlasClient, AtlasError, Coordinates, Geocoder};

/// Two airport rows: Washington Dulles and Frankfurt.
#[allow(dead_code)] // Used by other test files
pub const AIRPORTS_FIXTURE: &str = concat!(
    r#"3714,"Washington Dulles International Airport","Washington","United States","IAD","KIAD",38.94449997,-77.45580292,312,-5,"A","America/New_York","airport","OurAirports""#,
    "\n",
    r#"340,"Frankfurt am Main Airport","Frankfurt","Germany","FRA","EDDF",50.033333,8.570556,364,1,"E","Europe/Berlin","airport","OurAirports""#,
    "\n",
);

/// Builds an API client whose base URL is `/api/v2/` on the mock server.
#[allow(dead_code)] // Used by other test files
pub fn atlas_client(server: &Server) -> Arc<AtlasClient> {
    let http = Arc::new(reqwest::Client::new());
    let base = Url::parse(&server.url_str("/api/v2/")).expect("mock server URL should parse");
    Arc::new(AtlasClient::new(Arc::clone(&http), http, base))
}

/// A connected, public probe with the given addresses.
#[allow(dead_code)] // Used by other test files
pub fn probe_json(id: u32, v4: Option<&str>, v6: Option<&str>) -> Value {
    json!({
        "id": id,
        "address_v4": v4,
        "address_v6": v6,
        "country_code": "US",
        "status": {"id": 1, "name": "Connected", "since": "2024-01-01T00:00:00Z"},
        "tags": [],
        "geometry": {"type": "Point", "coordinates": [-77.45, 38.94]},
        "is_public": true,
        "total_uptime": 1000
    })
}

/// A probe index page in the shape the API returns it.
#[allow(dead_code)] // Used by other test files
pub fn probe_page(probes: Vec<Value>) -> Value {
    json!({
        "count": probes.len(),
        "next": null,
        "previous": null,
        "results": probes
    })
}

/// Geocoder returning a fixed coordinate and recording what it was asked.
#[allow(dead_code)] // Used by other test files
pub struct FixedGeocoder {
    pub at: Coordinates,
    pub calls: AtomicUsize,
    pub last_query: std::sync::Mutex<Option<(String, String)>>,
}

#[allow(dead_code)] // Used by other test files
impl FixedGeocoder {
    pub fn new(at: Coordinates) -> Self {
        Self {
            at,
            calls: AtomicUsize::new(0),
            last_query: std::sync::Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Geocoder for FixedGeocoder {
    async fn resolve(&self, city: &str, country: &str) -> Result<Coordinates, AtlasError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_query.lock().expect("mutex poisoned") =
            Some((city.to_string(), country.to_string()));
        Ok(self.at)
    }
}
