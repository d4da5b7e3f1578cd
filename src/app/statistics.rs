//! Statistics printing for results runs.

use log::info;
use strum::IntoEnumIterator;

use crate::error_handling::{ErrorType, InfoType, ProcessingStats};
use crate::results::{ResultKind, ResultSummary};

/// Prints per-kind counts and mean latencies, then probe and country totals.
pub fn print_result_summary(summary: &ResultSummary, elapsed_seconds: f64) {
    info!(
        "Aggregated {} record{} in {:.1}s",
        summary.total_records,
        if summary.total_records == 1 { "" } else { "s" },
        elapsed_seconds
    );

    for kind in ResultKind::iter() {
        let Some(stats) = summary.stats(kind) else {
            continue;
        };
        match stats.mean_latency() {
            Some(mean) => info!(
                "   {}: {} records, mean latency {:.5} ms ({} with latency)",
                kind, stats.count, mean, stats.latency_samples
            ),
            None => info!("   {}: {} records, no latency samples", kind, stats.count),
        }
    }

    if summary.unknown_records > 0 {
        info!("   unknown types: {} records", summary.unknown_records);
        for (kind, count) in &summary.unknown_types {
            info!("      {}: {}", kind, count);
        }
    }

    info!(
        "Probes seen: {} ({} enriched), countries: {}",
        summary.distinct_probes, summary.enriched_probes, summary.distinct_countries
    );
    let mut countries: Vec<_> = summary.country_counts.iter().collect();
    countries.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    for (country, count) in countries {
        info!("   {}: {}", country, count);
    }
}

/// Prints enrichment error and info counters to the log.
pub fn print_error_statistics(error_stats: &ProcessingStats) {
    let total_errors = error_stats.total_errors();
    let total_info = error_stats.total_info();

    if total_errors > 0 {
        info!("Enrichment Error Counts ({} total):", total_errors);
        for error_type in ErrorType::iter() {
            let count = error_stats.get_error_count(error_type);
            if count > 0 {
                info!("   {}: {}", error_type.as_str(), count);
            }
        }
    }

    if total_info > 0 {
        info!("Enrichment Info Counts ({} total):", total_info);
        for info_type in InfoType::iter() {
            let count = error_stats.get_info_count(info_type);
            if count > 0 {
                info!("   {}: {}", info_type.as_str(), count);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::TypeStats;

    #[test]
    fn test_print_error_statistics_no_errors() {
        let stats = ProcessingStats::new();
        // Should not panic when there are no errors
        print_error_statistics(&stats);
    }

    #[test]
    fn test_print_error_statistics_with_errors_and_info() {
        let stats = ProcessingStats::new();
        stats.increment_error(ErrorType::ProbeFetchTimeoutError);
        stats.increment_error(ErrorType::ProbeFetchNotFound);
        stats.increment_info(InfoType::ProbeFetched);
        print_error_statistics(&stats);
    }

    #[test]
    fn test_print_result_summary_handles_empty_and_full() {
        print_result_summary(&ResultSummary::default(), 0.0);

        let mut summary = ResultSummary {
            total_records: 4,
            unknown_records: 1,
            distinct_probes: 2,
            enriched_probes: 1,
            distinct_countries: 1,
            ..Default::default()
        };
        summary.by_kind.insert(
            ResultKind::Ping,
            TypeStats {
                count: 3,
                latency_samples: 2,
                latency_sum: 30.0,
            },
        );
        summary.unknown_types.insert("wifi".into(), 1);
        summary.country_counts.insert("DE".into(), 1);
        print_result_summary(&summary, 1.5);
    }
}
