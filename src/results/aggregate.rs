//! Running statistics over decoded result records.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use super::types::{MeasurementResult, ResultKind};
use crate::atlas::Probe;
use crate::enrichment::ProbeEnrichmentCache;

/// Count and latency accumulator for one result kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TypeStats {
    /// Records of this kind
    pub count: usize,
    /// Records that carried a latency
    pub latency_samples: usize,
    pub latency_sum: f64,
}

impl TypeStats {
    /// Mean latency over the records that carried one.
    pub fn mean_latency(&self) -> Option<f64> {
        (self.latency_samples > 0).then(|| self.latency_sum / self.latency_samples as f64)
    }
}

/// Snapshot of the aggregation, with enrichment figures joined in.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResultSummary {
    pub total_records: usize,
    pub by_kind: BTreeMap<ResultKind, TypeStats>,
    /// Records of types without numeric aggregation
    pub unknown_records: usize,
    pub unknown_types: BTreeMap<String, usize>,
    pub distinct_probes: usize,
    /// Distinct probes whose metadata is in the enrichment cache
    pub enriched_probes: usize,
    /// Records whose probe metadata was already cached when aggregated
    pub records_enriched_on_arrival: usize,
    pub distinct_countries: usize,
    pub country_counts: BTreeMap<String, usize>,
}

impl ResultSummary {
    pub fn stats(&self, kind: ResultKind) -> Option<&TypeStats> {
        self.by_kind.get(&kind)
    }
}

/// Consumes records in delivery order and keeps per-kind statistics.
///
/// Enrichment is read-only here: a record is aggregated the same way whether
/// or not its probe metadata is available.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    total: usize,
    by_kind: BTreeMap<ResultKind, TypeStats>,
    unknown: usize,
    unknown_types: BTreeMap<String, usize>,
    probes: HashSet<u32>,
    enriched_on_arrival: usize,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one record. `probe` is the cached metadata for its probe, if any.
    pub fn record(&mut self, result: &MeasurementResult, probe: Option<&Probe>) {
        self.total += 1;
        self.probes.insert(result.probe_id());
        if probe.is_some() {
            self.enriched_on_arrival += 1;
        }

        match result.kind() {
            Some(kind) => {
                let stats = self.by_kind.entry(kind).or_default();
                stats.count += 1;
                if let Some(latency) = result.latency() {
                    stats.latency_samples += 1;
                    stats.latency_sum += latency;
                }
            }
            None => {
                self.unknown += 1;
                *self
                    .unknown_types
                    .entry(result.type_name().to_string())
                    .or_insert(0) += 1;
            }
        }
    }

    pub fn total_records(&self) -> usize {
        self.total
    }

    pub fn stats(&self, kind: ResultKind) -> Option<&TypeStats> {
        self.by_kind.get(&kind)
    }

    pub fn unknown_records(&self) -> usize {
        self.unknown
    }

    pub fn distinct_probes(&self) -> usize {
        self.probes.len()
    }

    /// Builds a summary, reading probe and country figures from `cache`.
    pub async fn summary(&self, cache: &ProbeEnrichmentCache) -> ResultSummary {
        let mut enriched_probes = 0;
        for id in &self.probes {
            if cache.peek(*id).await.is_some() {
                enriched_probes += 1;
            }
        }
        let country_counts: BTreeMap<String, usize> =
            cache.country_counts().await.into_iter().collect();

        ResultSummary {
            total_records: self.total,
            by_kind: self.by_kind.clone(),
            unknown_records: self.unknown,
            unknown_types: self.unknown_types.clone(),
            distinct_probes: self.probes.len(),
            enriched_probes,
            records_enriched_on_arrival: self.enriched_on_arrival,
            distinct_countries: country_counts.len(),
            country_counts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> MeasurementResult {
        serde_json::from_value(value).unwrap()
    }

    fn ping(probe: u32, rtt: f64) -> MeasurementResult {
        record(json!({"type": "ping", "prb_id": probe, "result": [{"rtt": rtt}]}))
    }

    #[test]
    fn test_ping_mean_and_count() {
        let mut aggregator = ResultAggregator::new();
        for (probe, rtt) in [(1, 10.0), (2, 20.0), (3, 30.0)] {
            aggregator.record(&ping(probe, rtt), None);
        }
        let stats = aggregator.stats(ResultKind::Ping).unwrap();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.mean_latency(), Some(20.0));
        assert_eq!(aggregator.distinct_probes(), 3);
    }

    #[test]
    fn test_other_types_counted_as_unknown_only() {
        let mut aggregator = ResultAggregator::new();
        aggregator.record(&ping(1, 10.0), None);
        aggregator.record(&record(json!({"type": "ntp", "prb_id": 1})), None);
        aggregator.record(&record(json!({"type": "ntp", "prb_id": 2})), None);

        assert_eq!(aggregator.total_records(), 3);
        assert_eq!(aggregator.unknown_records(), 2);
        assert_eq!(aggregator.stats(ResultKind::Ping).unwrap().count, 1);
        assert_eq!(aggregator.stats(ResultKind::Ping).unwrap().mean_latency(), Some(10.0));
        assert_eq!(aggregator.distinct_probes(), 2);
    }

    #[test]
    fn test_records_without_latency_count_but_do_not_skew_mean() {
        let mut aggregator = ResultAggregator::new();
        aggregator.record(&ping(1, 40.0), None);
        aggregator.record(
            &record(json!({"type": "ping", "prb_id": 2, "avg": -1, "result": [{"x": "*"}]})),
            None,
        );
        let stats = aggregator.stats(ResultKind::Ping).unwrap();
        assert_eq!(stats.count, 2);
        assert_eq!(stats.latency_samples, 1);
        assert_eq!(stats.mean_latency(), Some(40.0));
    }

    #[test]
    fn test_kinds_are_kept_apart() {
        let mut aggregator = ResultAggregator::new();
        aggregator.record(&ping(1, 10.0), None);
        aggregator.record(
            &record(json!({"type": "http", "prb_id": 1, "result": [{"rt": 100.0}]})),
            None,
        );
        assert_eq!(aggregator.stats(ResultKind::Http).unwrap().mean_latency(), Some(100.0));
        assert_eq!(aggregator.stats(ResultKind::Ping).unwrap().mean_latency(), Some(10.0));
        assert!(aggregator.stats(ResultKind::Dns).is_none());
    }

    #[test]
    fn test_empty_stats_have_no_mean() {
        assert_eq!(TypeStats::default().mean_latency(), None);
    }
}
