//! The three pipeline stages.
//!
//! decode (one task) ──records──▶ aggregate (caller, in order)
//!        └───────probe ids────▶ enrich (dispatcher + bounded workers)
//!
//! Both queues are bounded, so a slow consumer blocks the decoder. The
//! aggregator never waits for enrichment; it reads whatever the cache holds.

use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::context::PipelineContext;
use crate::config::PROGRESS_LOG_EVERY_RECORDS;
use crate::enrichment::ProbeEnrichmentCache;
use crate::error_handling::AtlasError;
use crate::results::{MeasurementResult, ResultAggregator, ResultStreamDecoder, ResultSummary};

/// Runs all stages over `decoder` and returns the final summary.
///
/// A decoder failure cancels enrichment, closes both queues and is returned;
/// enrichment failures only leave records unenriched.
pub async fn aggregate_stream(
    ctx: &PipelineContext,
    decoder: ResultStreamDecoder,
) -> Result<ResultSummary, AtlasError> {
    let cancel = CancellationToken::new();
    let (record_tx, mut record_rx) = mpsc::channel(ctx.record_queue_capacity);
    let (id_tx, id_rx) = mpsc::channel(ctx.probe_id_queue_capacity);

    let decode_task = tokio::spawn(decode_stage(decoder, record_tx, id_tx, cancel.clone()));
    let enrich_task = tokio::spawn(enrich_stage(
        Arc::clone(&ctx.cache),
        Arc::clone(&ctx.workers),
        id_rx,
        cancel.child_token(),
    ));

    let mut aggregator = ResultAggregator::new();
    while let Some(record) = record_rx.recv().await {
        let probe = ctx.cache.peek(record.probe_id()).await;
        aggregator.record(&record, probe.as_ref());
        if aggregator.total_records() % PROGRESS_LOG_EVERY_RECORDS == 0 {
            log::info!(
                "Aggregated {} records from {} probes",
                aggregator.total_records(),
                aggregator.distinct_probes()
            );
        }
    }

    let decoded = match decode_task.await {
        Ok(result) => result,
        Err(join_error) => Err(AtlasError::decode("result decoder task", join_error)),
    };
    if let Err(e) = decoded {
        cancel.cancel();
        if let Err(join_error) = enrich_task.await {
            log::warn!("Enrichment stage panicked: {:?}", join_error);
        }
        return Err(e);
    }

    // Ids queue is closed; wait for in-flight fetches before summarizing
    if let Err(join_error) = enrich_task.await {
        log::warn!("Enrichment stage panicked: {:?}", join_error);
    }
    Ok(aggregator.summary(&ctx.cache).await)
}

async fn decode_stage(
    mut decoder: ResultStreamDecoder,
    records: mpsc::Sender<MeasurementResult>,
    probe_ids: mpsc::Sender<u32>,
    cancel: CancellationToken,
) -> Result<usize, AtlasError> {
    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => break,
            next = decoder.next_record() => next,
        };
        let record = match next {
            Some(Ok(record)) => record,
            Some(Err(e)) => {
                log::warn!(
                    "Result stream failed after {} records: {}",
                    decoder.records_decoded(),
                    e
                );
                cancel.cancel();
                return Err(e);
            }
            None => break,
        };

        log::debug!(
            "Decoded {} result from probe {}",
            record.type_name(),
            record.probe_id()
        );
        // A closed id queue only means enrichment stopped; keep aggregating
        let _ = probe_ids.send(record.probe_id()).await;
        if records.send(record).await.is_err() {
            break;
        }
    }
    log::info!("Result stream finished: {} records", decoder.records_decoded());
    Ok(decoder.records_decoded())
}

async fn enrich_stage(
    cache: Arc<ProbeEnrichmentCache>,
    workers: Arc<Semaphore>,
    mut probe_ids: mpsc::Receiver<u32>,
    cancel: CancellationToken,
) {
    let mut tasks: FuturesUnordered<JoinHandle<()>> = FuturesUnordered::new();

    loop {
        let id = tokio::select! {
            _ = cancel.cancelled() => break,
            Some(done) = tasks.next(), if !tasks.is_empty() => {
                if let Err(join_error) = done {
                    if !join_error.is_cancelled() {
                        log::warn!("Enrichment task panicked: {:?}", join_error);
                    }
                }
                continue;
            }
            id = probe_ids.recv() => match id {
                Some(id) => id,
                None => break,
            },
        };

        if cache.cached(id).await.is_some() {
            continue;
        }

        let permit = tokio::select! {
            _ = cancel.cancelled() => break,
            permit = Arc::clone(&workers).acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => {
                    log::warn!("Worker pool closed, skipping enrichment of probe {}", id);
                    continue;
                }
            },
        };

        let cache = Arc::clone(&cache);
        tasks.push(tokio::spawn(async move {
            let _permit = permit;
            cache.lookup_or_fetch(id).await;
        }));
    }

    if cancel.is_cancelled() {
        for task in tasks.iter() {
            task.abort();
        }
    }
    while let Some(done) = tasks.next().await {
        if let Err(join_error) = done {
            if !join_error.is_cancelled() {
                log::warn!("Enrichment task panicked: {:?}", join_error);
            }
        }
    }
}
