use std::collections::HashMap;
use std::time::Duration;

use crate::correction::CacheStats;
use crate::heuristics::{format_throughput, format_u64_with_commas};
use crate::types::WorkerId;

/// Aggregate skew metrics for per-worker record counts.
#[derive(Clone, Debug, PartialEq)]
pub struct WorkerSkew {
    /// Records validated across all workers.
    pub total: u64,
    /// Workers that completed at least one batch.
    pub workers: usize,
    /// Fewest records handled by one worker.
    pub min: u64,
    /// Most records handled by one worker.
    pub max: u64,
    /// Mean records per worker.
    pub mean: f64,
    /// Largest single-worker share of `total`.
    pub max_share: f64,
    /// `max / min` (infinite when `min` is zero).
    pub ratio: f64,
    /// Per-worker shares, busiest first.
    pub per_worker: Vec<WorkerShare>,
}

/// One worker's share of the validated records.
#[derive(Clone, Debug, PartialEq)]
pub struct WorkerShare {
    /// Worker index.
    pub worker: WorkerId,
    /// Records this worker validated.
    pub records: u64,
    /// Fraction of all validated records.
    pub share: f64,
}

/// Compute skew metrics from per-worker record counts.
///
/// Workers that never completed a batch are absent from `counts`.
pub fn worker_skew(counts: &HashMap<WorkerId, u64>) -> Option<WorkerSkew> {
    let min = *counts.values().min()?;
    let max = *counts.values().max()?;
    let total: u64 = counts.values().sum();
    let workers = counts.len();
    let share = |count: u64| {
        if total == 0 {
            0.0
        } else {
            count as f64 / total as f64
        }
    };
    let ratio = if min == 0 {
        f64::INFINITY
    } else {
        max as f64 / min as f64
    };
    let mut per_worker: Vec<WorkerShare> = counts
        .iter()
        .map(|(worker, records)| WorkerShare {
            worker: *worker,
            records: *records,
            share: share(*records),
        })
        .collect();
    per_worker.sort_by(|a, b| b.records.cmp(&a.records).then_with(|| a.worker.cmp(&b.worker)));
    Some(WorkerSkew {
        total,
        workers,
        min,
        max,
        mean: total as f64 / workers as f64,
        max_share: share(max),
        ratio,
        per_worker,
    })
}

/// Run statistics reported next to the [`Report`](crate::Report).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunStats {
    /// Records validated.
    pub records: u64,
    /// Rows dropped because their column count did not match the header.
    pub skipped_rows: u64,
    /// Batches dispatched.
    pub batches: u64,
    /// Target batch size chosen for the run.
    pub batch_size: usize,
    /// Worker threads started.
    pub workers: usize,
    /// Work-queue capacity.
    pub queue_capacity: usize,
    /// Rules enabled for the run.
    pub rules: Vec<&'static str>,
    /// Identifiers seen more than once.
    pub duplicated_ids: usize,
    /// Balance of records across workers.
    pub worker_skew: Option<WorkerSkew>,
    /// Correction-cache counters at the end of the run.
    pub cache: CacheStats,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
}

impl RunStats {
    /// Human-readable single-line summary.
    pub fn summary(&self) -> String {
        let skew = self
            .worker_skew
            .as_ref()
            .map(|skew| format!("{:.2}", skew.ratio))
            .unwrap_or_else(|| "n/a".to_string());
        format!(
            "{} records in {} batches of {} on {} workers ({}); skipped {} rows; skew {}; cache {} hits / {} misses",
            format_u64_with_commas(self.records),
            format_u64_with_commas(self.batches),
            self.batch_size,
            self.workers,
            format_throughput(self.records, self.elapsed),
            format_u64_with_commas(self.skipped_rows),
            skew,
            format_u64_with_commas(self.cache.hits),
            format_u64_with_commas(self.cache.misses),
        )
    }
}
