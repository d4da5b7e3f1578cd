//! Memoized probe metadata lookups for one pipeline run.
//!
//! Every probe id seen in a result stream is resolved to its full `Probe` at
//! most once per run. The first caller for an id installs a shared fetch;
//! callers arriving while it is in flight join it and receive its outcome,
//! failure included. A failed fetch is removed when it settles, so only calls
//! made after that point try again.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::Mutex;

use crate::atlas::{AtlasClient, Probe};
use crate::error_handling::{update_error_stats, AtlasError, InfoType, ProcessingStats};

type PendingFetch = Shared<BoxFuture<'static, Result<Probe, Arc<AtlasError>>>>;

enum Entry {
    Ready(Probe),
    Pending(PendingFetch),
}

/// Per-run cache from probe id to probe metadata, with per-country counters.
pub struct ProbeEnrichmentCache {
    atlas: Arc<AtlasClient>,
    entries: Mutex<HashMap<u32, Entry>>,
    countries: Mutex<HashMap<String, usize>>,
    stats: Arc<ProcessingStats>,
}

impl ProbeEnrichmentCache {
    pub fn new(atlas: Arc<AtlasClient>) -> Self {
        Self::with_stats(atlas, Arc::new(ProcessingStats::new()))
    }

    pub fn with_stats(atlas: Arc<AtlasClient>, stats: Arc<ProcessingStats>) -> Self {
        Self {
            atlas,
            entries: Mutex::new(HashMap::new()),
            countries: Mutex::new(HashMap::new()),
            stats,
        }
    }

    /// Returns the metadata for `id`, fetching it if no earlier call
    /// succeeded.
    ///
    /// `None` means the record stays unenriched: the fetch failed, was logged
    /// and counted in the processing stats, and nothing was cached.
    ///
    /// All callers that overlap one fetch share it, whatever its outcome, and
    /// a successful probe's country is counted exactly once.
    pub async fn lookup_or_fetch(&self, id: u32) -> Option<Probe> {
        let fetch = {
            let mut entries = self.entries.lock().await;
            match entries.get(&id) {
                Some(Entry::Ready(probe)) => {
                    self.stats.increment_info(InfoType::ProbeCacheHit);
                    return Some(probe.clone());
                }
                Some(Entry::Pending(fetch)) => fetch.clone(),
                None => {
                    let atlas = Arc::clone(&self.atlas);
                    let fetch = async move { atlas.fetch_probe(id).await.map_err(Arc::new) }
                        .boxed()
                        .shared();
                    entries.insert(id, Entry::Pending(fetch.clone()));
                    fetch
                }
            }
        };

        let result = fetch.clone().await;
        let settled_here = self.settle(id, &fetch, &result).await;
        match result {
            Ok(probe) => {
                if !settled_here {
                    self.stats.increment_info(InfoType::ProbeCacheHit);
                }
                Some(probe)
            }
            Err(e) => {
                if settled_here {
                    log::warn!("Failed to enrich probe {}: {}", id, e);
                    update_error_stats(&self.stats, &e);
                }
                None
            }
        }
    }

    /// Cached metadata for `id`, counted as a cache hit when present.
    pub async fn cached(&self, id: u32) -> Option<Probe> {
        let probe = self.peek(id).await;
        if probe.is_some() {
            self.stats.increment_info(InfoType::ProbeCacheHit);
        }
        probe
    }

    /// Replaces the pending entry for `id` with the fetch outcome.
    ///
    /// Returns `true` for the one caller that performs the transition.
    async fn settle(
        &self,
        id: u32,
        fetch: &PendingFetch,
        result: &Result<Probe, Arc<AtlasError>>,
    ) -> bool {
        let mut entries = self.entries.lock().await;
        let still_pending = matches!(
            entries.get(&id),
            Some(Entry::Pending(current)) if current.ptr_eq(fetch)
        );
        if !still_pending {
            return false;
        }

        match result {
            Ok(probe) => {
                entries.insert(id, Entry::Ready(probe.clone()));
                self.count_country(probe).await;
                self.stats.increment_info(InfoType::ProbeFetched);
                log::debug!("Enriched probe {}", id);
            }
            Err(_) => {
                entries.remove(&id);
            }
        }
        true
    }

    async fn count_country(&self, probe: &Probe) {
        // Probes without a country code are cached but not counted
        if let Some(country) = probe.country() {
            let mut countries = self.countries.lock().await;
            *countries.entry(country.to_string()).or_insert(0) += 1;
        }
    }

    /// Cached metadata for `id`, without fetching.
    pub async fn peek(&self, id: u32) -> Option<Probe> {
        let entries = self.entries.lock().await;
        match entries.get(&id) {
            Some(Entry::Ready(probe)) => Some(probe.clone()),
            _ => None,
        }
    }

    /// Number of probes successfully enriched so far.
    pub async fn probe_count(&self) -> usize {
        let entries = self.entries.lock().await;
        entries
            .values()
            .filter(|entry| matches!(entry, Entry::Ready(_)))
            .count()
    }

    /// Snapshot of the country code to probe count map.
    pub async fn country_counts(&self) -> HashMap<String, usize> {
        self.countries.lock().await.clone()
    }

    pub async fn distinct_countries(&self) -> usize {
        self.countries.lock().await.len()
    }

    pub fn stats(&self) -> &Arc<ProcessingStats> {
        &self.stats
    }
}
