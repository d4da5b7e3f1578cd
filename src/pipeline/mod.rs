//! Streaming results pipeline.
//!
//! `run_results_pipeline` fetches a measurement's status, opens its result
//! stream and runs the decode, enrich and aggregate stages over it.

mod context;
mod stages;

pub use context::PipelineContext;
pub use stages::aggregate_stream;

use std::sync::Arc;
use std::time::Instant;

use crate::atlas::MeasurementStatus;
use crate::error_handling::{AtlasError, ProcessingStats};
use crate::results::{ResultStreamDecoder, ResultSummary};

/// Outcome of one results run.
pub struct PipelineReport {
    pub measurement: MeasurementStatus,
    pub summary: ResultSummary,
    /// Enrichment failures and cache counters
    pub stats: Arc<ProcessingStats>,
    pub elapsed_seconds: f64,
}

/// Streams and aggregates the results of measurement `measurement_id`.
///
/// # Errors
///
/// `Network`/`Decode` if the status cannot be fetched, has no result URL, or
/// the result stream fails or is malformed. Enrichment failures are not
/// errors; they are counted in `PipelineReport::stats`.
pub async fn run_results_pipeline(
    ctx: &PipelineContext,
    measurement_id: u64,
) -> Result<PipelineReport, AtlasError> {
    let start_time = Instant::now();

    let measurement = ctx.atlas.measurement_status(measurement_id).await?;
    let result_url = measurement.result.clone().ok_or_else(|| {
        AtlasError::decode(
            format!("measurement {}", measurement_id),
            "status has no result URL",
        )
    })?;
    log::info!(
        "Streaming results of measurement {} from {}",
        measurement_id,
        result_url
    );

    let response = ctx
        .atlas
        .open_result_stream(&result_url, ctx.stream_read_timeout)
        .await?;
    let decoder = ResultStreamDecoder::from_response(response, ctx.stream_read_timeout);
    let summary = aggregate_stream(ctx, decoder).await?;

    Ok(PipelineReport {
        measurement,
        summary,
        stats: Arc::clone(&ctx.stats),
        elapsed_seconds: start_time.elapsed().as_secs_f64(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::AtlasClient;
    use crate::config::Config;
    use crate::error_handling::{ErrorType, InfoType};
    use crate::results::ResultKind;
    use httptest::{matchers::*, responders::*, Expectation, Server};
    use serde_json::json;
    use url::Url;

    fn context(server: &Server, workers: usize) -> PipelineContext {
        let http = Arc::new(reqwest::Client::new());
        let base = Url::parse(&server.url_str("/api/v2/")).unwrap();
        let atlas = Arc::new(AtlasClient::new(Arc::clone(&http), http, base));
        let config = Config {
            enrichment_workers: workers,
            record_queue_capacity: 2,
            probe_id_queue_capacity: 1,
            ..Default::default()
        };
        PipelineContext::new(atlas, &config)
    }

    fn expect_status(server: &Server, id: u64) {
        server.expect(
            Expectation::matching(request::method_path("GET", format!("/api/v2/measurements/{id}/")))
                .times(1)
                .respond_with(json_encoded(json!({
                    "id": id,
                    "type": "ping",
                    "status": {"id": 4, "name": "Stopped"},
                    "resolved_ips": ["193.0.6.139"],
                    "result": server.url_str("/results/").to_string()
                }))),
        );
    }

    #[tokio::test]
    async fn test_pipeline_aggregates_in_order_and_enriches_each_probe_once() {
        let server = Server::run();
        expect_status(&server, 100);
        let body = json!([
            {"type": "ping", "prb_id": 1, "result": [{"rtt": 10.0}]},
            {"type": "ping", "prb_id": 2, "result": [{"rtt": 20.0}]},
            {"type": "ping", "prb_id": 1, "result": [{"rtt": 30.0}]},
            {"type": "wifi", "prb_id": 3},
            {"type": "dns", "prb_id": 2, "result": {"rt": 5.0}}
        ]);
        server.expect(
            Expectation::matching(request::method_path("GET", "/results/"))
                .times(1)
                .respond_with(status_code(200).body(body.to_string())),
        );
        for (id, country) in [(1, "DE"), (2, "NL"), (3, "DE")] {
            server.expect(
                Expectation::matching(request::method_path("GET", format!("/api/v2/probes/{id}/")))
                    .times(1)
                    .respond_with(json_encoded(json!({"id": id, "country_code": country}))),
            );
        }

        let ctx = context(&server, 2);
        let report = run_results_pipeline(&ctx, 100).await.expect("pipeline should succeed");
        let summary = &report.summary;

        assert_eq!(report.measurement.id, 100);
        assert_eq!(summary.total_records, 5);
        let ping = summary.stats(ResultKind::Ping).unwrap();
        assert_eq!(ping.count, 3);
        assert_eq!(ping.mean_latency(), Some(20.0));
        assert_eq!(summary.stats(ResultKind::Dns).unwrap().mean_latency(), Some(5.0));
        assert_eq!(summary.unknown_records, 1);
        assert_eq!(summary.distinct_probes, 3);
        assert_eq!(summary.enriched_probes, 3);
        assert_eq!(summary.distinct_countries, 2);
        assert_eq!(summary.country_counts.get("DE"), Some(&2));
        assert_eq!(report.stats.get_info_count(InfoType::ProbeFetched), 3);
    }

    #[tokio::test]
    async fn test_enrichment_failure_leaves_record_unenriched() {
        let server = Server::run();
        expect_status(&server, 200);
        server.expect(
            Expectation::matching(request::method_path("GET", "/results/"))
                .respond_with(status_code(200).body(
                    json!([{"type": "http", "prb_id": 9, "result": [{"rt": 50.0}]}]).to_string(),
                )),
        );
        server.expect(
            Expectation::matching(request::method_path("GET", "/api/v2/probes/9/"))
                .respond_with(status_code(404)),
        );

        let ctx = context(&server, 1);
        let report = run_results_pipeline(&ctx, 200).await.expect("pipeline should succeed");
        assert_eq!(report.summary.total_records, 1);
        assert_eq!(
            report.summary.stats(ResultKind::Http).unwrap().mean_latency(),
            Some(50.0)
        );
        assert_eq!(report.summary.enriched_probes, 0);
        assert_eq!(report.stats.get_error_count(ErrorType::ProbeFetchNotFound), 1);
    }

    #[tokio::test]
    async fn test_malformed_stream_fails_pipeline() {
        let server = Server::run();
        expect_status(&server, 300);
        server.expect(
            Expectation::matching(request::method_path("GET", "/results/"))
                .respond_with(status_code(200).body(r#"[{"type":"ping","prb_id":1},{"type":"#)),
        );
        server.expect(
            Expectation::matching(request::method_path("GET", "/api/v2/probes/1/"))
                .times(0..=1)
                .respond_with(json_encoded(json!({"id": 1}))),
        );

        let ctx = context(&server, 1);
        let err = run_results_pipeline(&ctx, 300).await.err().expect("pipeline should fail");
        assert!(matches!(err, AtlasError::Decode { .. }), "got: {err}");
    }

    #[tokio::test]
    async fn test_status_without_result_url_is_decode_error() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/api/v2/measurements/400/"))
                .respond_with(json_encoded(json!({"id": 400, "result": null}))),
        );

        let ctx = context(&server, 1);
        let err = run_results_pipeline(&ctx, 400).await.err().expect("pipeline should fail");
        assert!(matches!(err, AtlasError::Decode { .. }), "got: {err}");
    }
}
