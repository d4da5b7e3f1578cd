//! Per-run pipeline state.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;

use crate::atlas::AtlasClient;
use crate::config::Config;
use crate::enrichment::ProbeEnrichmentCache;
use crate::error_handling::ProcessingStats;
use crate::initialization::init_semaphore;

/// Everything one results run shares between its stages.
///
/// A context owns the enrichment cache, so it is built for a single run and
/// dropped afterwards; nothing survives into the next run.
pub struct PipelineContext {
    pub(crate) atlas: Arc<AtlasClient>,
    pub(crate) cache: Arc<ProbeEnrichmentCache>,
    pub(crate) stats: Arc<ProcessingStats>,
    pub(crate) workers: Arc<Semaphore>,
    pub(crate) record_queue_capacity: usize,
    pub(crate) probe_id_queue_capacity: usize,
    pub(crate) stream_read_timeout: Duration,
}

impl PipelineContext {
    pub fn new(atlas: Arc<AtlasClient>, config: &Config) -> Self {
        let stats = Arc::new(ProcessingStats::new());
        let cache = Arc::new(ProbeEnrichmentCache::with_stats(
            Arc::clone(&atlas),
            Arc::clone(&stats),
        ));
        Self {
            atlas,
            cache,
            stats,
            workers: init_semaphore(config.enrichment_workers),
            record_queue_capacity: config.record_queue_capacity.max(1),
            probe_id_queue_capacity: config.probe_id_queue_capacity.max(1),
            stream_read_timeout: Duration::from_secs(config.stream_read_timeout_secs),
        }
    }

    pub fn atlas(&self) -> &Arc<AtlasClient> {
        &self.atlas
    }

    pub fn cache(&self) -> &Arc<ProbeEnrichmentCache> {
        &self.cache
    }

    pub fn stats(&self) -> &Arc<ProcessingStats> {
        &self.stats
    }

    pub fn stream_read_timeout(&self) -> Duration {
        self.stream_read_timeout
    }
}
