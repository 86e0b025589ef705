#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Report aggregation and duplicate-identifier tracking.
pub mod aggregator;
/// Command-line runner behind the `feedlint` binary.
pub mod app;
/// Pipeline, batching, cache, and ingestion configuration types.
pub mod config;
/// Centralized constants used across ingestion, rules, and the correction cache.
pub mod constants;
/// Shared spelling-correction cache and dictionaries.
pub mod correction;
/// Record, finding, batch, and report types.
pub mod data;
/// Canonical feed field keys.
pub mod fields;
/// Batch sizing, worker count, and formatting helpers.
pub mod heuristics;
/// Streaming feed reader and adaptive batcher.
pub mod ingestion;
/// Run statistics and worker balance metrics.
pub mod metrics;
/// Validation pipeline entry points.
pub mod pipeline;
/// Bounded worker pool and coordinator loop.
pub mod pool;
/// Rule registry and per-run rule selection.
pub mod rules;
/// Shared type aliases.
pub mod types;
/// Text normalization helpers.
pub mod utils;

mod errors;

pub use config::{BatchSizing, CacheConfig, Concurrency, IngestConfig, PipelineConfig};
pub use correction::{
    CacheStats, CorrectionCache, SpellDictionary, SpellingVerdict, SymSpellDictionary,
    WordListDictionary,
};
pub use data::{Batch, Finding, Record, Report};
pub use errors::ValidationError;
pub use ingestion::{AdaptiveBatcher, FeedReader};
pub use metrics::RunStats;
pub use pipeline::{Pipeline, run};
pub use rules::{RuleCost, RuleGroup, RuleSet, RuleSpec};
pub use types::{BatchId, ErrorType, FieldName, FieldValue, RecordId, RuleName, WorkerId};
