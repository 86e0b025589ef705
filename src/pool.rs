//! Bounded worker pool and the coordinator loop that feeds it.
//!
//! The coordinator owns ingestion order, batching, duplicate tracking and the
//! [`Aggregator`]. Workers are scoped threads pulling [`WorkItem`]s from a
//! bounded queue and reporting back on an unbounded completion channel.

use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};
use tracing::{debug, warn};

use crate::aggregator::{Aggregator, DuplicateIdTracker};
use crate::constants::batching::FULL_QUEUE_POLL_MS;
use crate::data::{Batch, Finding, Record, Report};
use crate::errors::ValidationError;
use crate::ingestion::AdaptiveBatcher;
use crate::rules::{RuleContext, RuleSet};
use crate::types::{BatchId, WorkerId};

/// Per-record validation applied by workers.
pub trait RecordValidator: Sync {
    /// Findings for one record, in a stable order.
    fn validate(&self, record: &Record) -> Vec<Finding>;
}

/// A resolved rule set bound to the shared correction cache.
#[derive(Clone, Copy)]
pub struct BoundRules<'a> {
    /// Rules enabled for the run.
    pub rules: &'a RuleSet,
    /// Shared state the rules read.
    pub ctx: RuleContext<'a>,
}

impl RecordValidator for BoundRules<'_> {
    fn validate(&self, record: &Record) -> Vec<Finding> {
        self.rules.apply(record, &self.ctx)
    }
}

/// One queued unit of work: a batch plus the validator every worker shares.
pub struct WorkItem<'a, V: ?Sized> {
    /// Records to validate.
    pub batch: Batch,
    /// Validator applied to each record.
    pub validator: &'a V,
}

/// Outcome of one work item.
#[derive(Debug)]
pub enum WorkerReport {
    /// Every record in the batch was validated.
    Completed {
        /// Worker that validated the batch.
        worker: WorkerId,
        /// Batch sequence number.
        batch: BatchId,
        /// Findings for every record in the batch.
        findings: Vec<Finding>,
        /// Records validated.
        processed: u64,
    },
    /// Validation panicked; the batch's findings are discarded.
    Failed {
        /// Worker that hit the panic.
        worker: WorkerId,
        /// Batch sequence number.
        batch: BatchId,
        /// Panic message.
        reason: String,
    },
}

/// Sizing of one pool run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolSettings {
    /// Worker threads.
    pub workers: usize,
    /// Bounded work-queue capacity.
    pub queue_capacity: usize,
    /// Records per batch.
    pub batch_size: usize,
    /// Whether the coordinator tracks duplicate identifiers.
    pub track_duplicates: bool,
}

/// Bookkeeping returned alongside the report.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PoolSummary {
    /// Batches dispatched to workers.
    pub batches: u64,
    /// Records validated per worker.
    pub per_worker: HashMap<WorkerId, u64>,
    /// Identifiers seen more than once (when tracking is enabled).
    pub duplicated_ids: usize,
}

/// Validate one batch, converting a panic into [`WorkerReport::Failed`].
pub fn validate_batch<V>(worker: WorkerId, item: WorkItem<'_, V>) -> WorkerReport
where
    V: RecordValidator + ?Sized,
{
    let WorkItem { batch, validator } = item;
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        let mut findings = Vec::new();
        for record in &batch.records {
            findings.extend(validator.validate(record));
        }
        findings
    }));
    match outcome {
        Ok(findings) => WorkerReport::Completed {
            worker,
            batch: batch.id,
            findings,
            processed: batch.len() as u64,
        },
        Err(payload) => WorkerReport::Failed {
            worker,
            batch: batch.id,
            reason: panic_reason(payload.as_ref()),
        },
    }
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("rule panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("rule panicked: {message}")
    } else {
        "rule panicked".to_string()
    }
}

fn worker_loop<V>(worker: WorkerId, jobs: Receiver<WorkItem<'_, V>>, done: Sender<WorkerReport>)
where
    V: RecordValidator + ?Sized,
{
    for item in jobs.iter() {
        if done.send(validate_batch(worker, item)).is_err() {
            break;
        }
    }
    debug!(worker, "worker exiting");
}

struct Coordinator<'p, P> {
    aggregator: Aggregator,
    duplicates: Option<DuplicateIdTracker>,
    summary: PoolSummary,
    in_flight: usize,
    failure: Option<ValidationError>,
    progress: &'p mut P,
}

impl<P: FnMut(u64)> Coordinator<'_, P> {
    fn observe(&mut self, record: &Record) {
        if let Some(tracker) = self.duplicates.as_mut()
            && let Some(finding) = tracker.observe(record)
        {
            self.aggregator.merge_duplicate(finding);
        }
    }

    /// Enqueue `batch`, processing completions while the queue is full.
    fn dispatch<'a, V: ?Sized>(
        &mut self,
        jobs: &Sender<WorkItem<'a, V>>,
        done: &Receiver<WorkerReport>,
        mut item: WorkItem<'a, V>,
    ) {
        loop {
            match jobs.try_send(item) {
                Ok(()) => {
                    self.in_flight += 1;
                    self.summary.batches += 1;
                    return;
                }
                Err(TrySendError::Full(returned)) => {
                    item = returned;
                    match done.recv_timeout(Duration::from_millis(FULL_QUEUE_POLL_MS)) {
                        Ok(report) => self.complete(report),
                        Err(RecvTimeoutError::Timeout) => {}
                        Err(RecvTimeoutError::Disconnected) => {
                            self.fail(worker_pool_gone(item.batch.id));
                            return;
                        }
                    }
                    if self.failure.is_some() {
                        return;
                    }
                }
                Err(TrySendError::Disconnected(returned)) => {
                    self.fail(worker_pool_gone(returned.batch.id));
                    return;
                }
            }
        }
    }

    fn poll(&mut self, done: &Receiver<WorkerReport>) {
        while let Ok(report) = done.try_recv() {
            self.complete(report);
        }
    }

    fn drain(&mut self, done: &Receiver<WorkerReport>) {
        while self.in_flight > 0 {
            match done.recv() {
                Ok(report) => self.complete(report),
                Err(_) => break,
            }
        }
    }

    fn complete(&mut self, report: WorkerReport) {
        self.in_flight = self.in_flight.saturating_sub(1);
        match report {
            WorkerReport::Completed {
                worker,
                batch,
                findings,
                processed,
            } => {
                if self.failure.is_some() {
                    return;
                }
                debug!(worker, batch, processed, findings = findings.len(), "batch completed");
                *self.summary.per_worker.entry(worker).or_insert(0) += processed;
                self.aggregator.merge_batch(findings, processed);
                let total = self.aggregator.processed();
                (self.progress)(total);
            }
            WorkerReport::Failed {
                worker,
                batch,
                reason,
            } => {
                warn!(worker, batch, reason = %reason, "worker failed");
                self.fail(ValidationError::Worker {
                    worker,
                    batch,
                    reason,
                });
            }
        }
    }

    fn fail(&mut self, err: ValidationError) {
        if self.failure.is_none() {
            self.failure = Some(err);
        }
    }
}

fn worker_pool_gone(batch: BatchId) -> ValidationError {
    ValidationError::Worker {
        worker: 0,
        batch,
        reason: "worker pool exited before the run completed".into(),
    }
}

/// Run `records` through a pool of `settings.workers` threads.
///
/// Returns once the input has ended and every dispatched batch reported back.
/// The first decode error or worker failure stops dispatch; in-flight batches
/// drain before that error is returned, and no partial report is produced.
pub fn run_pool<I, V, P>(
    records: I,
    validator: &V,
    settings: &PoolSettings,
    mut progress: P,
) -> Result<(Report, PoolSummary), ValidationError>
where
    I: Iterator<Item = Result<Record, ValidationError>>,
    V: RecordValidator + ?Sized,
    P: FnMut(u64),
{
    let workers = settings.workers.max(1);
    let (job_tx, job_rx) = crossbeam_channel::bounded::<WorkItem<'_, V>>(
        settings.queue_capacity.max(1),
    );
    let (done_tx, done_rx) = crossbeam_channel::unbounded::<WorkerReport>();
    debug!(
        workers,
        queue_capacity = settings.queue_capacity,
        batch_size = settings.batch_size,
        "starting worker pool"
    );

    let coordinator = thread::scope(|scope| {
        for worker in 0..workers {
            let jobs = job_rx.clone();
            let done = done_tx.clone();
            scope.spawn(move || worker_loop(worker, jobs, done));
        }
        drop(job_rx);
        drop(done_tx);

        let mut coordinator = Coordinator {
            aggregator: Aggregator::new(),
            duplicates: settings.track_duplicates.then(DuplicateIdTracker::new),
            summary: PoolSummary::default(),
            in_flight: 0,
            failure: None,
            progress: &mut progress,
        };
        let mut batcher = AdaptiveBatcher::new(settings.batch_size);
        for next in records {
            match next {
                Ok(record) => {
                    coordinator.observe(&record);
                    if let Some(batch) = batcher.push(record) {
                        coordinator.dispatch(&job_tx, &done_rx, WorkItem { batch, validator });
                    }
                }
                Err(err) => coordinator.fail(err),
            }
            if coordinator.failure.is_some() {
                break;
            }
            coordinator.poll(&done_rx);
        }
        if coordinator.failure.is_none()
            && let Some(batch) = batcher.finish()
        {
            coordinator.dispatch(&job_tx, &done_rx, WorkItem { batch, validator });
        }
        drop(job_tx);
        coordinator.drain(&done_rx);
        coordinator
    });

    let Coordinator {
        aggregator,
        duplicates,
        mut summary,
        failure,
        ..
    } = coordinator;
    if let Some(err) = failure {
        return Err(err);
    }
    summary.duplicated_ids = duplicates.map_or(0, |tracker| tracker.duplicated());
    Ok((aggregator.finish(), summary))
}
