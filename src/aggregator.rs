use std::collections::HashMap;

use tracing::debug;

use crate::constants::categories::DUPLICATE_ID;
use crate::data::{Finding, Record, Report};
use crate::fields::ID;
use crate::types::RecordId;

/// Counts identifier occurrences across a run.
///
/// Lives on the coordinator thread and sees records in ingestion order, so
/// duplicate detection does not depend on batch boundaries or worker count.
#[derive(Debug, Default)]
pub struct DuplicateIdTracker {
    seen: HashMap<RecordId, u64>,
}

impl DuplicateIdTracker {
    /// Empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count `record`'s identifier.
    ///
    /// Returns a "Duplicate ID" finding carrying the updated occurrence count
    /// on every repeat; blank identifiers are ignored.
    pub fn observe(&mut self, record: &Record) -> Option<Finding> {
        let id = record.id();
        if id.is_empty() {
            return None;
        }
        let count = self.seen.entry(id.to_string()).or_insert(0);
        *count += 1;
        if *count < 2 {
            return None;
        }
        Some(Finding::new(
            record,
            DUPLICATE_ID,
            ID,
            format!("ID '{id}' appears {count} times in the feed"),
            id,
        ))
    }

    /// Number of identifiers seen more than once.
    pub fn duplicated(&self) -> usize {
        self.seen.values().filter(|count| **count > 1).count()
    }
}

/// Single writer of the run [`Report`].
#[derive(Debug, Default)]
pub struct Aggregator {
    report: Report,
    duplicate_slots: HashMap<RecordId, usize>,
    batches: u64,
}

impl Aggregator {
    /// Aggregator over an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one completed batch.
    pub fn merge_batch(&mut self, findings: Vec<Finding>, processed: u64) {
        self.batches += 1;
        self.report.total_products += processed;
        for finding in findings {
            self.push(finding);
        }
    }

    /// Record a duplicate-identifier finding.
    ///
    /// The first finding for an identifier is appended and counted; later
    /// ones only replace its details, so each duplicated identifier appears
    /// once in the report.
    pub fn merge_duplicate(&mut self, finding: Finding) {
        if let Some(&slot) = self.duplicate_slots.get(&finding.id) {
            self.report.errors[slot].details = finding.details;
            return;
        }
        self.duplicate_slots
            .insert(finding.id.clone(), self.report.errors.len());
        self.push(finding);
    }

    /// Records processed so far.
    pub fn processed(&self) -> u64 {
        self.report.total_products
    }

    /// Batches merged so far.
    pub fn batches(&self) -> u64 {
        self.batches
    }

    /// Findings collected so far.
    pub fn findings(&self) -> usize {
        self.report.errors.len()
    }

    /// Consume the aggregator and return the run report.
    pub fn finish(self) -> Report {
        debug!(
            total_products = self.report.total_products,
            findings = self.report.errors.len(),
            categories = self.report.error_counts.len(),
            batches = self.batches,
            "report aggregated"
        );
        self.report
    }

    fn push(&mut self, finding: Finding) {
        *self
            .report
            .error_counts
            .entry(finding.error_type.clone())
            .or_insert(0) += 1;
        self.report.errors.push(finding);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::GTIN;

    fn record(id: &str) -> Record {
        Record::from_pairs([("id", id), ("gtin", "123")])
    }

    #[test]
    fn tracker_reports_repeats_with_running_count() {
        let mut tracker = DuplicateIdTracker::new();
        assert!(tracker.observe(&record("A")).is_none());
        assert!(tracker.observe(&record("B")).is_none());
        let second = tracker.observe(&record("A")).expect("repeat");
        assert_eq!(second.error_type, DUPLICATE_ID);
        assert_eq!(second.details, "ID 'A' appears 2 times in the feed");
        let third = tracker.observe(&record(" A ")).expect("repeat");
        assert_eq!(third.details, "ID 'A' appears 3 times in the feed");
        assert_eq!(tracker.duplicated(), 1);
    }

    #[test]
    fn tracker_ignores_blank_ids() {
        let mut tracker = DuplicateIdTracker::new();
        for _ in 0..3 {
            assert!(tracker.observe(&record("  ")).is_none());
        }
        assert_eq!(tracker.duplicated(), 0);
    }

    #[test]
    fn counts_match_findings_per_category() {
        let mut aggregator = Aggregator::new();
        let rec = record("A");
        let gtin =
            |details: &str| Finding::new(&rec, "Incorrect GTIN Length", GTIN, details, "123");
        aggregator.merge_batch(vec![gtin("first"), gtin("second")], 5);
        aggregator.merge_batch(Vec::new(), 3);
        let report = aggregator.finish();
        assert_eq!(report.total_products, 8);
        assert_eq!(report.count("Incorrect GTIN Length"), 2);
        assert_eq!(report.errors.len(), 2);
    }

    #[test]
    fn duplicate_findings_are_updated_in_place() {
        let mut tracker = DuplicateIdTracker::new();
        let mut aggregator = Aggregator::new();
        for id in ["A", "A", "B", "A", "B"] {
            if let Some(finding) = tracker.observe(&record(id)) {
                aggregator.merge_duplicate(finding);
            }
        }
        aggregator.merge_batch(Vec::new(), 5);
        let report = aggregator.finish();
        assert_eq!(report.count(DUPLICATE_ID), 2);
        let details: Vec<&str> = report
            .findings_of(DUPLICATE_ID)
            .map(|finding| finding.details.as_str())
            .collect();
        assert_eq!(
            details,
            vec![
                "ID 'A' appears 3 times in the feed",
                "ID 'B' appears 2 times in the feed"
            ]
        );
    }
}
