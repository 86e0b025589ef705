//! Shared, disk-persisted cache of spelling verdicts and word splits.
//!
//! One [`CorrectionCache`] is built per pipeline (or supplied by the caller)
//! and borrowed by every worker. Each table lives behind an `RwLock`; the
//! dictionary is consulted outside the locks so concurrent misses on
//! different words do not serialize. Flushes are serialized by a mutex and
//! merge with whatever another process wrote since the table was loaded.

mod dictionary;
mod persist;

pub use dictionary::{SpellDictionary, SymSpellDictionary, WordListDictionary, segment_known};
pub use persist::{CacheValue, SplitResult, SpellingVerdict, TableMeta};

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};

use chrono::Utc;
use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::config::CacheConfig;
use crate::constants::correction::{MAX_EDIT_DISTANCE, MAX_SUGGESTIONS, SEED_WORDS};
use crate::errors::ValidationError;
use crate::types::CacheWord;

/// Snapshot of cache counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups served from memory.
    pub hits: u64,
    /// Lookups that had to consult the dictionary.
    pub misses: u64,
    /// Eviction passes across both tables.
    pub evictions: u64,
    /// Successful table writes.
    pub flushes: u64,
    /// Entries currently in the spelling table.
    pub spelling_entries: usize,
    /// Entries currently in the split table.
    pub split_entries: usize,
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    flushes: AtomicU64,
}

struct TableState<V> {
    entries: IndexMap<CacheWord, V>,
    byte_size: u64,
    last_cleanup: i64,
    unflushed: usize,
}

impl<V: CacheValue> TableState<V> {
    fn new(entries: IndexMap<CacheWord, V>, last_cleanup: i64) -> Self {
        let byte_size = persist::table_bytes(&entries);
        Self {
            entries,
            byte_size,
            last_cleanup,
            unflushed: 0,
        }
    }

    fn meta(&self) -> TableMeta {
        TableMeta {
            byte_size: self.byte_size,
            entry_count: self.entries.len() as u64,
            last_cleanup: self.last_cleanup,
        }
    }
}

/// Outcome of inserting a freshly computed entry.
#[derive(Default)]
struct InsertOutcome {
    evicted: bool,
    flush_due: bool,
}

struct Table<V> {
    name: &'static str,
    path: Option<PathBuf>,
    state: RwLock<TableState<V>>,
}

impl<V: CacheValue> Table<V> {
    fn get(&self, word: &str) -> Option<V> {
        self.state
            .read()
            .expect("cache table poisoned")
            .entries
            .get(word)
            .cloned()
    }

    fn len(&self) -> usize {
        self.state.read().expect("cache table poisoned").entries.len()
    }

    /// Insert unless another worker already cached `word`; evict when over budget.
    fn insert(&self, word: CacheWord, value: V, config: &CacheConfig) -> InsertOutcome {
        let mut state = self.state.write().expect("cache table poisoned");
        if state.entries.contains_key(&word) {
            return InsertOutcome::default();
        }
        state.byte_size += persist::entry_bytes(&word, &value);
        state.entries.insert(word, value);
        state.unflushed += 1;
        let mut outcome = InsertOutcome {
            evicted: false,
            flush_due: state.unflushed >= config.flush_every,
        };
        if state.byte_size > config.eviction_bytes() {
            let before = state.entries.len();
            let removed = persist::retain_newest(&mut state.entries, config.retain_fraction);
            state.byte_size = persist::table_bytes(&state.entries);
            state.last_cleanup = Utc::now().timestamp();
            outcome.evicted = true;
            info!(
                table = self.name,
                before,
                removed,
                byte_size = state.byte_size,
                "correction cache evicted oldest entries"
            );
        }
        outcome
    }

    /// Clone the current entries for writing and reset the unflushed counter.
    fn snapshot(&self) -> (TableMeta, IndexMap<CacheWord, V>) {
        let mut state = self.state.write().expect("cache table poisoned");
        state.unflushed = 0;
        (state.meta(), state.entries.clone())
    }
}

/// Shared correction cache backed by a [`SpellDictionary`].
pub struct CorrectionCache {
    dictionary: Box<dyn SpellDictionary>,
    config: CacheConfig,
    spelling: Table<SpellingVerdict>,
    splits: Table<SplitResult>,
    flush_lock: Mutex<()>,
    counters: Counters,
}

impl CorrectionCache {
    /// Open the cache, loading persisted tables from `config.dir` when present.
    ///
    /// Missing, oversized, corrupt or version-mismatched files never fail:
    /// a warning is logged and the spelling table is reseeded with common
    /// domain words.
    pub fn open(config: CacheConfig, dictionary: Box<dyn SpellDictionary>) -> Self {
        let spelling = load_table(
            "spelling",
            config.spelling_path(),
            config.max_bytes,
            seed_entries,
        );
        let splits = load_table("splits", config.split_path(), config.max_bytes, IndexMap::new);
        debug!(
            spelling_entries = spelling.len(),
            split_entries = splits.len(),
            vocabulary = dictionary.vocabulary_size(),
            persistent = config.dir.is_some(),
            "correction cache opened"
        );
        Self {
            dictionary,
            config,
            spelling,
            splits,
            flush_lock: Mutex::new(()),
            counters: Counters::default(),
        }
    }

    /// Cache without on-disk persistence.
    pub fn in_memory(dictionary: Box<dyn SpellDictionary>) -> Self {
        Self::open(CacheConfig::in_memory(), dictionary)
    }

    /// Spelling verdict for `word` (case-insensitive).
    pub fn check_word(&self, word: &str) -> SpellingVerdict {
        let key = word.to_lowercase();
        if let Some(verdict) = self.spelling.get(&key) {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            return verdict;
        }
        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        let verdict = if self.dictionary.is_known(&key) {
            SpellingVerdict::known()
        } else {
            SpellingVerdict {
                valid: false,
                suggestions: self
                    .dictionary
                    .suggestions(&key, MAX_EDIT_DISTANCE, MAX_SUGGESTIONS),
            }
        };
        let outcome = self.spelling.insert(key, verdict.clone(), &self.config);
        self.after_insert(&self.spelling, outcome);
        verdict
    }

    /// Returns `true` when the dictionary knows `word` (cached).
    pub fn is_known(&self, word: &str) -> bool {
        self.check_word(word).valid
    }

    /// Split a merged token into known words (case-insensitive, cached).
    pub fn split_word(&self, word: &str) -> SplitResult {
        let key = word.to_lowercase();
        if let Some(split) = self.splits.get(&key) {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            return split;
        }
        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        let split = self.dictionary.split_compound(&key);
        let outcome = self.splits.insert(key, split.clone(), &self.config);
        self.after_insert(&self.splits, outcome);
        split
    }

    /// Persist both tables. A no-op for in-memory caches.
    pub fn flush(&self) -> Result<(), ValidationError> {
        let spelling = self.flush_table(&self.spelling);
        let splits = self.flush_table(&self.splits);
        spelling.and(splits)
    }

    /// Current counters and table sizes.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
            flushes: self.counters.flushes.load(Ordering::Relaxed),
            spelling_entries: self.spelling.len(),
            split_entries: self.splits.len(),
        }
    }

    /// Directory holding the persisted tables, if any.
    pub fn dir(&self) -> Option<&Path> {
        self.config.dir.as_deref()
    }

    fn after_insert<V: CacheValue>(&self, table: &Table<V>, outcome: InsertOutcome) {
        if outcome.evicted {
            self.counters.evictions.fetch_add(1, Ordering::Relaxed);
        }
        if (outcome.evicted || outcome.flush_due)
            && let Err(err) = self.flush_table(table)
        {
            warn!(table = table.name, error = %err, "correction cache flush failed");
        }
    }

    fn flush_table<V: CacheValue>(&self, table: &Table<V>) -> Result<(), ValidationError> {
        let Some(path) = table.path.as_deref() else {
            return Ok(());
        };
        let _guard = self.flush_lock.lock().expect("cache flush lock poisoned");
        let (mut meta, ours) = table.snapshot();
        let mut merged = match persist::read_table::<V>(path, self.config.max_bytes) {
            Ok(Some((disk_meta, disk))) => {
                meta.last_cleanup = meta.last_cleanup.max(disk_meta.last_cleanup);
                disk.into_iter()
                    .filter(|(word, _)| !ours.contains_key(word))
                    .collect::<IndexMap<_, _>>()
            }
            Ok(None) => IndexMap::new(),
            Err(err) => {
                debug!(table = table.name, error = %err, "ignoring unreadable table on merge");
                IndexMap::new()
            }
        };
        let foreign = merged.len();
        merged.extend(ours);
        let mut byte_size = persist::table_bytes(&merged);
        if byte_size > self.config.eviction_bytes() {
            persist::retain_newest(&mut merged, self.config.retain_fraction);
            byte_size = persist::table_bytes(&merged);
            meta.last_cleanup = Utc::now().timestamp();
        }
        meta.byte_size = byte_size;
        meta.entry_count = merged.len() as u64;
        persist::write_atomic(path, &persist::encode_table(&meta, &merged))?;
        self.counters.flushes.fetch_add(1, Ordering::Relaxed);
        debug!(
            table = table.name,
            path = %path.display(),
            entries = meta.entry_count,
            merged_from_disk = foreign,
            byte_size,
            "correction cache table flushed"
        );
        Ok(())
    }
}

impl Drop for CorrectionCache {
    fn drop(&mut self) {
        if let Err(err) = self.flush() {
            warn!(error = %err, "correction cache flush on shutdown failed");
        }
    }
}

fn seed_entries() -> IndexMap<CacheWord, SpellingVerdict> {
    SEED_WORDS
        .iter()
        .map(|word| (word.to_string(), SpellingVerdict::known()))
        .collect()
}

fn load_table<V, F>(
    name: &'static str,
    path: Option<PathBuf>,
    max_bytes: u64,
    rebuild: F,
) -> Table<V>
where
    V: CacheValue,
    F: Fn() -> IndexMap<CacheWord, V>,
{
    let state = match path.as_deref() {
        None => TableState::new(rebuild(), 0),
        Some(file) => match persist::read_table::<V>(file, max_bytes) {
            Ok(Some((meta, entries))) => {
                debug!(
                    table = name,
                    path = %file.display(),
                    entries = entries.len(),
                    "correction cache table loaded"
                );
                TableState::new(entries, meta.last_cleanup)
            }
            Ok(None) => TableState::new(rebuild(), 0),
            Err(err) => {
                warn!(
                    table = name,
                    path = %file.display(),
                    error = %err,
                    "discarding unusable correction cache table"
                );
                TableState::new(rebuild(), 0)
            }
        },
    };
    Table {
        name,
        path,
        state: RwLock::new(state),
    }
}
