//! Batch dispatcher: bounded-concurrency extraction over many segments
//!
//! A fixed pool of `min(max_concurrency, segments)` tokio tasks pulls work
//! from a shared cursor. Each outcome is written to the slot of its input
//! position, so the returned outcomes follow input order no matter which
//! calls finish first. Workers live in a `JoinSet`; dropping the dispatch
//! future aborts everything still in flight.

use sift_domain::Segment;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::client::SegmentExtractor;
use crate::config::{ExtractorConfig, FailurePolicy};
use crate::error::ExtractorError;
use crate::types::{BatchOutcome, DispatchStats, ExtractionResult, SegmentFailure, SegmentOutcome};

/// Largest backoff exponent; the delay stops doubling after this many retries
const MAX_BACKOFF_EXPONENT: u32 = 5;

/// Dispatcher settings
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchConfig {
    /// Maximum calls in flight
    pub max_concurrency: usize,

    /// Extra attempts for retryable failures
    pub max_retries: u32,

    /// Delay before the first retry, doubled for each later one
    pub retry_backoff: Duration,

    /// Also retry `InvalidFormat` failures
    pub retry_invalid_format: bool,

    /// Behaviour when a segment fails
    pub failure_policy: FailurePolicy,
}

impl DispatchConfig {
    /// Take the dispatcher settings from a pipeline configuration
    pub fn from_config(config: &ExtractorConfig) -> Self {
        Self {
            max_concurrency: config.max_concurrency,
            max_retries: config.max_retries,
            retry_backoff: config.retry_backoff(),
            retry_invalid_format: config.retry_invalid_format,
            failure_policy: config.failure_policy,
        }
    }

    fn should_retry(&self, error: &ExtractorError) -> bool {
        error.is_retryable()
            || (self.retry_invalid_format && matches!(error, ExtractorError::InvalidFormat(_)))
    }

    /// Delay before retry number `attempt` (1-based)
    fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(MAX_BACKOFF_EXPONENT);
        self.retry_backoff.saturating_mul(1 << exponent)
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self::from_config(&ExtractorConfig::default())
    }
}

/// Runs a `SegmentExtractor` over many segments with a concurrency cap
#[derive(Debug, Clone)]
pub struct BatchDispatcher {
    config: DispatchConfig,
}

/// State shared by all workers of one dispatch
struct WorkQueue {
    segments: Arc<[Segment]>,
    cursor: AtomicUsize,
    slots: Mutex<Vec<Option<SegmentOutcome>>>,
    retries: AtomicUsize,
}

impl WorkQueue {
    fn next(&self) -> Option<(usize, &Segment)> {
        let position = self.cursor.fetch_add(1, Ordering::SeqCst);
        self.segments.get(position).map(|segment| (position, segment))
    }

    fn slots(&self) -> MutexGuard<'_, Vec<Option<SegmentOutcome>>> {
        match self.slots.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl BatchDispatcher {
    /// Create a dispatcher; `max_concurrency` must be at least 1
    pub fn new(config: DispatchConfig) -> Result<Self, ExtractorError> {
        if config.max_concurrency == 0 {
            return Err(ExtractorError::InvalidConfiguration(
                "max_concurrency must be greater than 0".to_string(),
            ));
        }
        Ok(Self { config })
    }

    /// Dispatcher settings
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Extract every segment, at most `max_concurrency` at a time
    ///
    /// Under `FailurePolicy::Continue` every segment gets an outcome, in
    /// input order. Under `FailurePolicy::AbortOnFirstError` the first
    /// failure cancels all pending and in-flight work and is returned as
    /// `ExtractorError::Aggregate`.
    pub async fn dispatch<E>(
        &self,
        extractor: Arc<E>,
        segments: Vec<Segment>,
    ) -> Result<BatchOutcome, ExtractorError>
    where
        E: SegmentExtractor + 'static,
    {
        let started = Instant::now();
        let total = segments.len();
        let worker_count = self.config.max_concurrency.min(total);

        info!(
            "Dispatching {} segments to '{}' with {} workers",
            total,
            extractor.model_name(),
            worker_count
        );

        let queue = Arc::new(WorkQueue {
            segments: segments.into(),
            cursor: AtomicUsize::new(0),
            slots: Mutex::new((0..total).map(|_| None).collect()),
            retries: AtomicUsize::new(0),
        });

        let mut workers = JoinSet::new();
        for worker_id in 0..worker_count {
            workers.spawn(run_worker(
                worker_id,
                Arc::clone(&extractor),
                Arc::clone(&queue),
                self.config.clone(),
            ));
        }

        let mut worker_failure = None;
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(failure)) => {
                    workers.abort_all();
                    warn!(
                        "Aborting dispatch: segment {} failed: {}",
                        failure.segment_index, failure.error
                    );
                    return Err(ExtractorError::Aggregate {
                        segment_index: failure.segment_index,
                        source: Box::new(failure.error),
                    });
                }
                Err(e) => {
                    warn!("Extraction worker terminated: {}", e);
                    worker_failure = Some(e.to_string());
                }
            }
        }

        let slots = std::mem::take(&mut *queue.slots());
        let outcomes: Vec<SegmentOutcome> = slots
            .into_iter()
            .enumerate()
            .map(|(position, slot)| {
                slot.unwrap_or_else(|| {
                    Err(SegmentFailure {
                        segment_index: queue.segments[position].index,
                        attempts: 0,
                        error: ExtractorError::Service(format!(
                            "worker terminated: {}",
                            worker_failure.as_deref().unwrap_or("unknown")
                        )),
                    })
                })
            })
            .collect();

        let failed = outcomes.iter().filter(|o| o.is_err()).count();
        let stats = DispatchStats {
            succeeded: outcomes.len() - failed,
            failed,
            retries: queue.retries.load(Ordering::SeqCst),
            elapsed: started.elapsed(),
        };

        info!(
            "Dispatch complete: {} succeeded, {} failed, {} retries in {:?}",
            stats.succeeded, stats.failed, stats.retries, stats.elapsed
        );

        Ok(BatchOutcome { outcomes, stats })
    }
}

async fn run_worker<E: SegmentExtractor>(
    worker_id: usize,
    extractor: Arc<E>,
    queue: Arc<WorkQueue>,
    config: DispatchConfig,
) -> Result<(), SegmentFailure> {
    while let Some((position, segment)) = queue.next() {
        debug!("Worker {} picked segment {}", worker_id, segment.index);

        let outcome = extract_with_retry(extractor.as_ref(), segment, &config, &queue.retries).await;
        let abort_with = match (&outcome, config.failure_policy) {
            (Err(failure), FailurePolicy::AbortOnFirstError) => Some(failure.clone()),
            _ => None,
        };

        queue.slots()[position] = Some(outcome);

        if let Some(failure) = abort_with {
            return Err(failure);
        }
    }
    Ok(())
}

async fn extract_with_retry<E: SegmentExtractor>(
    extractor: &E,
    segment: &Segment,
    config: &DispatchConfig,
    retries: &AtomicUsize,
) -> Result<ExtractionResult, SegmentFailure> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        match extractor.extract(segment).await {
            Ok(result) => {
                debug!(
                    "Segment {}: {} records (attempt {})",
                    segment.index,
                    result.records.len(),
                    attempt
                );
                return Ok(result);
            }
            Err(error) if attempt <= config.max_retries && config.should_retry(&error) => {
                let delay = config.backoff(attempt);
                warn!(
                    "Segment {} attempt {} failed: {}; retrying in {:?}",
                    segment.index, attempt, error, delay
                );
                retries.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(delay).await;
            }
            Err(error) => {
                warn!(
                    "Segment {} failed after {} attempt(s): {}",
                    segment.index, attempt, error
                );
                return Err(SegmentFailure {
                    segment_index: segment.index,
                    attempts: attempt,
                    error,
                });
            }
        }
    }
}
