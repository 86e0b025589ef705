use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::fields::{FieldKey, ID};
use crate::utils::excerpt;

pub use crate::types::{BatchId, ErrorType, FieldName, FieldValue, RecordId};

/// One normalized feed row.
///
/// Field names are normalized column headers; values are kept exactly as read.
/// Records are immutable once built.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    fields: IndexMap<FieldName, FieldValue>,
}

impl Record {
    /// Build a record from `(normalized name, value)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<FieldName>,
        V: Into<FieldValue>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }

    /// Product identifier (empty when the cell was blank).
    pub fn id(&self) -> &str {
        self.raw(ID).unwrap_or_default().trim()
    }

    /// Raw cell value, including blank cells.
    pub fn raw(&self, field: FieldKey) -> Option<&str> {
        self.fields.get(field.as_str()).map(String::as_str)
    }

    /// Cell value trimmed of surrounding whitespace; `None` when absent or blank.
    pub fn value(&self, field: FieldKey) -> Option<&str> {
        self.raw(field)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    /// Returns `true` when `field` has a non-blank value.
    pub fn has(&self, field: FieldKey) -> bool {
        self.value(field).is_some()
    }

    /// Iterate over `(name, raw value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Number of columns carried by this record.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` when the record has no columns.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// One validation result for one record.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    /// Identifier of the offending record.
    pub id: RecordId,
    /// Rule category (key in `errorCounts`).
    pub error_type: ErrorType,
    /// Human-readable explanation.
    pub details: String,
    /// Field the finding refers to.
    pub affected_field: FieldName,
    /// Excerpt of the offending value.
    pub value: String,
}

impl Finding {
    /// Build a finding for `record`, excerpting `value`.
    pub fn new(
        record: &Record,
        error_type: &str,
        field: FieldKey,
        details: impl Into<String>,
        value: &str,
    ) -> Self {
        Self {
            id: record.id().to_string(),
            error_type: error_type.to_string(),
            details: details.into(),
            affected_field: field.as_str().to_string(),
            value: excerpt(value),
        }
    }
}

/// A group of records validated together by one worker.
#[derive(Clone, Debug, Default)]
pub struct Batch {
    /// Sequence number within the run.
    pub id: BatchId,
    /// Records in ingestion order.
    pub records: Vec<Record>,
}

impl Batch {
    /// Records in the batch.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` when the batch holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Aggregate output of a full run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Number of records emitted by ingestion.
    pub total_products: u64,
    /// Occurrences per finding category.
    pub error_counts: BTreeMap<ErrorType, u64>,
    /// Collected findings (order not stable across runs).
    pub errors: Vec<Finding>,
}

impl Report {
    /// Number of findings reported for `error_type`.
    pub fn count(&self, error_type: &str) -> u64 {
        self.error_counts.get(error_type).copied().unwrap_or(0)
    }

    /// Findings of one category.
    pub fn findings_of<'a>(&'a self, error_type: &'a str) -> impl Iterator<Item = &'a Finding> {
        self.errors
            .iter()
            .filter(move |finding| finding.error_type == error_type)
    }

    /// Returns `true` when the run produced no findings.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}
