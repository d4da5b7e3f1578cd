//! HTTP client for the RIPE Atlas v2 API.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use url::Url;

use super::types::{MeasurementSearchResults, MeasurementStatus, Probe, ProbeQueryResults};
use crate::config::PROBE_STATUS_CONNECTED_ID;
use crate::error_handling::AtlasError;
use crate::geocode::Coordinates;

/// Client for the probe and measurement endpoints.
///
/// All endpoints are joined onto `base_url`, so tests can point the client at
/// a local mock server.
pub struct AtlasClient {
    client: Arc<reqwest::Client>,
    stream_client: Arc<reqwest::Client>,
    base_url: Url,
}

impl AtlasClient {
    /// `client` carries the per-request deadline; `stream_client` is used only
    /// for result streams, which are bounded per chunk by the decoder instead.
    pub fn new(
        client: Arc<reqwest::Client>,
        stream_client: Arc<reqwest::Client>,
        base_url: Url,
    ) -> Self {
        Self {
            client,
            stream_client,
            base_url,
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, AtlasError> {
        self.base_url
            .join(path)
            .map_err(|e| AtlasError::Validation(format!("invalid endpoint {}: {}", path, e)))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
        context: &str,
    ) -> Result<T, AtlasError> {
        let response = self
            .client
            .get(url.clone())
            .query(query)
            .send()
            .await
            .map_err(|e| AtlasError::transport(url.as_str(), e))?;

        if !response.status().is_success() {
            return Err(AtlasError::status(url.as_str(), response.status()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AtlasError::transport(url.as_str(), e))?;
        serde_json::from_slice(&body).map_err(|e| AtlasError::decode(context, e))
    }

    /// Queries the probe index for connected, public probes within
    /// `radius_km` of `at`, sorted by id ascending.
    ///
    /// Issues exactly one request; only the first page is returned.
    pub async fn query_probes(
        &self,
        at: Coordinates,
        radius_km: u32,
    ) -> Result<ProbeQueryResults, AtlasError> {
        let url = self.endpoint("probes/")?;
        let query = [
            ("status", PROBE_STATUS_CONNECTED_ID.to_string()),
            ("is_public", "true".to_string()),
            ("radius", format!("{}:{}", at, radius_km)),
            ("sort", "id".to_string()),
        ];
        log::debug!("Querying probes within {}km of {}", radius_km, at);
        self.get_json(url, &query, "probe index response").await
    }

    /// Fetches the full metadata of one probe.
    pub async fn fetch_probe(&self, id: u32) -> Result<Probe, AtlasError> {
        let url = self.endpoint(&format!("probes/{}/", id))?;
        self.get_json(url, &[], &format!("probe {}", id)).await
    }

    /// Fetches the status object of a measurement.
    pub async fn measurement_status(&self, id: u64) -> Result<MeasurementStatus, AtlasError> {
        let url = self.endpoint(&format!("measurements/{}/", id))?;
        self.get_json(url, &[], &format!("measurement {}", id)).await
    }

    /// Searches measurements by a comma separated tag list (first page only).
    pub async fn search_measurement_statuses(
        &self,
        tags: &str,
    ) -> Result<Vec<MeasurementStatus>, AtlasError> {
        let url = self.endpoint("measurements/")?;
        let page: MeasurementSearchResults = self
            .get_json(url, &[("tags", tags.to_string())], "measurement search response")
            .await?;
        Ok(page.results)
    }

    /// Ids of the measurements matching a comma separated tag list.
    pub async fn search_measurements(&self, tags: &str) -> Result<Vec<u64>, AtlasError> {
        let statuses = self.search_measurement_statuses(tags).await?;
        Ok(statuses.into_iter().map(|m| m.id).collect())
    }

    /// Starts the request for a streamed result array.
    ///
    /// Only the status line and headers are read here, and they must arrive
    /// within `header_timeout`; the body is left for `ResultStreamDecoder`.
    pub async fn open_result_stream(
        &self,
        url: &str,
        header_timeout: Duration,
    ) -> Result<reqwest::Response, AtlasError> {
        let response = tokio::time::timeout(header_timeout, self.stream_client.get(url).send())
            .await
            .map_err(|_| AtlasError::deadline(url, header_timeout))?
            .map_err(|e| AtlasError::transport(url, e))?;
        if !response.status().is_success() {
            return Err(AtlasError::status(url, response.status()));
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httptest::{matchers::*, responders::*, Expectation, Server};
    use serde_json::json;

    fn client_for(server: &Server) -> AtlasClient {
        let http = Arc::new(reqwest::Client::new());
        let base = Url::parse(&server.url_str("/api/v2/")).unwrap();
        AtlasClient::new(Arc::clone(&http), http, base)
    }

    #[tokio::test]
    async fn test_query_probes_sends_radius_filter() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("GET", "/api/v2/probes/"),
                request::query(url_decoded(contains(("status", "1")))),
                request::query(url_decoded(contains(("is_public", "true")))),
                request::query(url_decoded(contains(("radius", "38.944500,-77.455800:10")))),
                request::query(url_decoded(contains(("sort", "id")))),
            ])
            .times(1)
            .respond_with(json_encoded(json!({
                "count": 1, "next": null, "previous": null,
                "results": [{"id": 1, "status": {"id": 1, "name": "Connected"}, "is_public": true}]
            }))),
        );

        let results = client_for(&server)
            .query_probes(Coordinates::new(38.9445, -77.4558), 10)
            .await
            .expect("query should succeed");
        assert_eq!(results.results.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_probe_uses_detail_path() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/api/v2/probes/42/"))
                .respond_with(json_encoded(json!({"id": 42, "country_code": "NL"}))),
        );

        let probe = client_for(&server).fetch_probe(42).await.unwrap();
        assert_eq!(probe.id, 42);
        assert_eq!(probe.country(), Some("NL"));
    }

    #[tokio::test]
    async fn test_non_success_status_is_network_error() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/api/v2/probes/7/"))
                .respond_with(status_code(404)),
        );

        let err = client_for(&server).fetch_probe(7).await.unwrap_err();
        assert!(matches!(err, AtlasError::Network { .. }), "got: {err}");
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/api/v2/probes/7/"))
                .respond_with(status_code(200).body("{\"id\": ")),
        );

        let err = client_for(&server).fetch_probe(7).await.unwrap_err();
        assert!(matches!(err, AtlasError::Decode { .. }), "got: {err}");
    }

    #[tokio::test]
    async fn test_search_measurements_returns_ids() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("GET", "/api/v2/measurements/"),
                request::query(url_decoded(contains(("tags", "dns,anycast")))),
            ])
            .respond_with(json_encoded(json!({
                "count": 2, "next": null, "previous": null,
                "results": [{"id": 1001}, {"id": 1002}]
            }))),
        );

        let ids = client_for(&server)
            .search_measurements("dns,anycast")
            .await
            .unwrap();
        assert_eq!(ids, vec![1001, 1002]);
    }

    #[tokio::test]
    async fn test_open_result_stream_rejects_error_status() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/results/"))
                .respond_with(status_code(503)),
        );

        let err = client_for(&server)
            .open_result_stream(&server.url_str("/results/"), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, AtlasError::Network { .. }), "got: {err}");
    }

    #[tokio::test]
    async fn test_open_result_stream_times_out_waiting_for_headers() {
        use crate::error_handling::NetworkFailure;

        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/results/")).respond_with(
                delay_and_then(Duration::from_secs(3), status_code(200).body("[]")),
            ),
        );

        let started = std::time::Instant::now();
        let err = client_for(&server)
            .open_result_stream(&server.url_str("/results/"), Duration::from_millis(200))
            .await
            .unwrap_err();
        assert!(
            matches!(
                err,
                AtlasError::Network {
                    reason: NetworkFailure::Deadline(_),
                    ..
                }
            ),
            "got: {err}"
        );
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
