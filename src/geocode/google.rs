//! Google Maps geocoding provider.

use std::sync::Arc;

use serde::Deserialize;

use super::{Coordinates, Geocoder};
use crate::error_handling::AtlasError;

const STATUS_OK: &str = "OK";

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: GeocodeGeometry,
}

#[derive(Debug, Deserialize)]
struct GeocodeGeometry {
    location: GeocodeLocation,
}

#[derive(Debug, Deserialize)]
struct GeocodeLocation {
    lat: f64,
    lng: f64,
}

/// Geocoder backed by the Google Maps geocoding API.
///
/// Sends `address={city},{country}` and takes the first result.
#[derive(Clone)]
pub struct GoogleGeocoder {
    client: Arc<reqwest::Client>,
    base_url: String,
    api_key: Option<String>,
}

impl GoogleGeocoder {
    pub fn new(client: Arc<reqwest::Client>, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
            api_key,
        }
    }
}

impl Geocoder for GoogleGeocoder {
    async fn resolve(&self, city: &str, country: &str) -> Result<Coordinates, AtlasError> {
        let address = format!("{},{}", city, country);
        let mut request = self.client.get(&self.base_url).query(&[("address", &address)]);
        if let Some(key) = &self.api_key {
            request = request.query(&[("key", key)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AtlasError::transport(&self.base_url, e))?;
        if !response.status().is_success() {
            return Err(AtlasError::status(&self.base_url, response.status()));
        }
        let body = response
            .bytes()
            .await
            .map_err(|e| AtlasError::transport(&self.base_url, e))?;
        let parsed: GeocodeResponse = serde_json::from_slice(&body)
            .map_err(|e| AtlasError::decode(format!("geocode response for {}", address), e))?;

        if parsed.status != STATUS_OK {
            let detail = parsed
                .error_message
                .map(|m| format!(": {}", m))
                .unwrap_or_default();
            return Err(AtlasError::GeocodeFailure(format!(
                "provider returned {} for {}{}",
                parsed.status, address, detail
            )));
        }

        let first = parsed.results.into_iter().next().ok_or_else(|| {
            AtlasError::GeocodeFailure(format!("no coordinates found for {}", address))
        })?;

        log::debug!(
            "Geocoded {} to {},{}",
            address,
            first.geometry.location.lat,
            first.geometry.location.lng
        );
        Ok(Coordinates::new(
            first.geometry.location.lat,
            first.geometry.location.lng,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httptest::{matchers::*, responders::*, Expectation, Server};
    use serde_json::json;

    fn geocoder_for(server: &Server, key: Option<&str>) -> GoogleGeocoder {
        GoogleGeocoder::new(
            Arc::new(reqwest::Client::new()),
            &server.url_str("/geocode/json"),
            key.map(str::to_string),
        )
    }

    #[tokio::test]
    async fn test_resolve_returns_first_location() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("GET", "/geocode/json"),
                request::query(url_decoded(contains(("address", "Frankfurt,Germany")))),
                request::query(url_decoded(contains(("key", "secret")))),
            ])
            .respond_with(json_encoded(json!({
                "status": "OK",
                "results": [
                    {"geometry": {"location": {"lat": 50.110924, "lng": 8.682127}}},
                    {"geometry": {"location": {"lat": 1.0, "lng": 2.0}}}
                ]
            }))),
        );

        let geocoder = geocoder_for(&server, Some("secret"));
        let coords = geocoder
            .resolve("Frankfurt", "Germany")
            .await
            .expect("geocode should succeed");
        assert_eq!(coords, Coordinates::new(50.110924, 8.682127));
    }

    #[tokio::test]
    async fn test_zero_results_is_geocode_failure() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/geocode/json"))
                .respond_with(json_encoded(json!({"status": "ZERO_RESULTS", "results": []}))),
        );

        let err = geocoder_for(&server, None)
            .resolve("Nowhere", "Atlantis")
            .await
            .unwrap_err();
        assert!(matches!(err, AtlasError::GeocodeFailure(_)), "got: {err}");
    }

    #[tokio::test]
    async fn test_ok_status_without_results_is_geocode_failure() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/geocode/json"))
                .respond_with(json_encoded(json!({"status": "OK", "results": []}))),
        );

        let err = geocoder_for(&server, None)
            .resolve("Dulles", "United States")
            .await
            .unwrap_err();
        assert!(matches!(err, AtlasError::GeocodeFailure(_)), "got: {err}");
    }

    #[tokio::test]
    async fn test_server_error_is_network_error() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/geocode/json"))
                .respond_with(status_code(500)),
        );

        let err = geocoder_for(&server, None)
            .resolve("Dulles", "United States")
            .await
            .unwrap_err();
        assert!(matches!(err, AtlasError::Network { .. }), "got: {err}");
    }
}
