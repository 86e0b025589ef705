use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::batching::{
    CHEAP_BATCH_SIZE, MIXED_BATCH_SIZE, QUEUE_SLOTS_PER_WORKER, SPELLING_BATCH_SIZE,
};
use crate::constants::correction::{
    DEFAULT_CACHE_DIR, DEFAULT_EVICTION_THRESHOLD, DEFAULT_FLUSH_EVERY, DEFAULT_MAX_BYTES,
    DEFAULT_RETAIN_FRACTION, SPELLING_CACHE_FILENAME, SPLIT_CACHE_FILENAME,
};
use crate::errors::ValidationError;

/// Target batch sizes per rule-cost class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSizing {
    /// Used when any spelling rule is enabled (expensive per record).
    pub spelling: usize,
    /// Used when moderate rules are enabled but no spelling rule.
    pub mixed: usize,
    /// Used when only cheap string/regex rules are enabled.
    pub cheap: usize,
}

impl Default for BatchSizing {
    fn default() -> Self {
        Self {
            spelling: SPELLING_BATCH_SIZE,
            mixed: MIXED_BATCH_SIZE,
            cheap: CHEAP_BATCH_SIZE,
        }
    }
}

impl BatchSizing {
    /// Use the same size for every cost class.
    pub fn uniform(size: usize) -> Self {
        Self {
            spelling: size,
            mixed: size,
            cheap: size,
        }
    }
}

/// Worker-count policy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Concurrency {
    /// Available parallel execution units minus one (at least one).
    #[default]
    Auto,
    /// Explicit number of workers.
    Fixed(usize),
}

impl Concurrency {
    /// Parse `auto` or a positive integer.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("auto") {
            return Ok(Concurrency::Auto);
        }
        match trimmed.parse::<usize>() {
            Ok(0) | Err(_) => Err(ValidationError::Configuration(format!(
                "workers must be 'auto' or a positive integer, got '{raw}'"
            ))),
            Ok(count) => Ok(Concurrency::Fixed(count)),
        }
    }
}

/// Parsing behavior for the delimited input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Honour double-quoted cells (tabs and newlines inside quotes stay in the cell).
    pub quoting: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self { quoting: true }
    }
}

/// Correction-cache persistence and eviction settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Directory holding the persisted tables; `None` keeps the cache in memory only.
    pub dir: Option<PathBuf>,
    /// Upper bound on the serialized size of each table (bytes).
    pub max_bytes: u64,
    /// Fraction of `max_bytes` above which the oldest entries are evicted.
    pub eviction_threshold: f64,
    /// Fraction of newest entries kept when evicting.
    pub retain_fraction: f64,
    /// Flush to disk after this many new entries.
    pub flush_every: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: Some(PathBuf::from(DEFAULT_CACHE_DIR)),
            max_bytes: DEFAULT_MAX_BYTES,
            eviction_threshold: DEFAULT_EVICTION_THRESHOLD,
            retain_fraction: DEFAULT_RETAIN_FRACTION,
            flush_every: DEFAULT_FLUSH_EVERY,
        }
    }
}

impl CacheConfig {
    /// Cache settings without any on-disk persistence.
    pub fn in_memory() -> Self {
        Self {
            dir: None,
            ..Self::default()
        }
    }

    /// Cache settings persisting under `dir`.
    pub fn in_dir<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: Some(dir.as_ref().to_path_buf()),
            ..Self::default()
        }
    }

    /// Path of the spelling table file, if persistence is enabled.
    pub fn spelling_path(&self) -> Option<PathBuf> {
        self.dir
            .as_ref()
            .map(|dir| dir.join(SPELLING_CACHE_FILENAME))
    }

    /// Path of the word-split table file, if persistence is enabled.
    pub fn split_path(&self) -> Option<PathBuf> {
        self.dir.as_ref().map(|dir| dir.join(SPLIT_CACHE_FILENAME))
    }

    /// Estimated byte size above which eviction runs.
    pub fn eviction_bytes(&self) -> u64 {
        (self.max_bytes as f64 * self.eviction_threshold) as u64
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.max_bytes == 0 {
            return Err(ValidationError::Configuration(
                "cache max_bytes must be positive".into(),
            ));
        }
        if !(self.eviction_threshold > 0.0 && self.eviction_threshold <= 1.0) {
            return Err(ValidationError::Configuration(
                "cache eviction_threshold must be in (0, 1]".into(),
            ));
        }
        if !(self.retain_fraction > 0.0 && self.retain_fraction < 1.0) {
            return Err(ValidationError::Configuration(
                "cache retain_fraction must be in (0, 1)".into(),
            ));
        }
        if self.flush_every == 0 {
            return Err(ValidationError::Configuration(
                "cache flush_every must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Top-level pipeline configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Worker-count policy.
    pub concurrency: Concurrency,
    /// Batch sizes per rule-cost class.
    pub batch_sizing: BatchSizing,
    /// Bounded work-queue capacity; `None` derives it from the worker count.
    pub queue_capacity: Option<usize>,
    /// Delimited-input parsing options.
    pub ingest: IngestConfig,
    /// Correction-cache settings (used when the pipeline builds its own cache).
    pub cache: CacheConfig,
    /// Optional SymSpell frequency dictionary (`word count` per line).
    pub dictionary_path: Option<PathBuf>,
    /// Optional SymSpell bigram dictionary for compound splitting.
    pub bigram_path: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            concurrency: Concurrency::Auto,
            batch_sizing: BatchSizing::default(),
            queue_capacity: None,
            ingest: IngestConfig::default(),
            cache: CacheConfig::default(),
            dictionary_path: None,
            bigram_path: None,
        }
    }
}

impl PipelineConfig {
    /// Reject zero sizes and out-of-range fractions.
    pub fn validated(self) -> Result<Self, ValidationError> {
        let sizing = self.batch_sizing;
        if sizing.spelling == 0 || sizing.mixed == 0 || sizing.cheap == 0 {
            return Err(ValidationError::Configuration(
                "batch sizes must be positive".into(),
            ));
        }
        if let Concurrency::Fixed(0) = self.concurrency {
            return Err(ValidationError::Configuration(
                "worker count must be positive".into(),
            ));
        }
        if self.queue_capacity == Some(0) {
            return Err(ValidationError::Configuration(
                "queue capacity must be positive".into(),
            ));
        }
        self.cache.validate()?;
        Ok(self)
    }

    /// Work-queue capacity for `workers` threads.
    pub fn queue_capacity_for(&self, workers: usize) -> usize {
        self.queue_capacity
            .unwrap_or(workers.saturating_mul(QUEUE_SLOTS_PER_WORKER))
            .max(1)
    }
}
