use std::fs;
use std::io::Write;
use std::path::Path;

use indexmap::IndexMap;

use crate::constants::correction::{BITCODE_PREFIX, ENTRY_OVERHEAD_BYTES, TABLE_RECORD_VERSION};
use crate::errors::ValidationError;
use crate::types::CacheWord;

/// Metadata stored alongside every persisted table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, bitcode::Encode, bitcode::Decode)]
pub struct TableMeta {
    /// Estimated serialized size of the entries.
    pub byte_size: u64,
    /// Number of entries in the table.
    pub entry_count: u64,
    /// Unix timestamp (seconds) of the last eviction, 0 if never.
    pub last_cleanup: i64,
}

/// Spelling verdict cached for one word.
#[derive(Clone, Debug, Default, PartialEq, Eq, bitcode::Encode, bitcode::Decode)]
pub struct SpellingVerdict {
    /// Whether the dictionary knows the word.
    pub valid: bool,
    /// Closest known words, best first (empty for valid words).
    pub suggestions: Vec<String>,
}

impl SpellingVerdict {
    /// Verdict for a known word.
    pub fn known() -> Self {
        Self {
            valid: true,
            suggestions: Vec::new(),
        }
    }

    /// Best suggestion, if any.
    pub fn top_suggestion(&self) -> Option<&str> {
        self.suggestions.first().map(String::as_str)
    }
}

/// Split result cached for one word (`None` when the word does not split).
pub type SplitResult = Option<Vec<String>>;

/// Values that can live in a persisted cache table.
pub trait CacheValue: Clone + Send + Sync + bitcode::Encode + for<'a> bitcode::Decode<'a> {
    /// Approximate serialized size of the value in bytes.
    fn estimated_bytes(&self) -> u64;
}

impl CacheValue for SpellingVerdict {
    fn estimated_bytes(&self) -> u64 {
        1 + self
            .suggestions
            .iter()
            .map(|word| word.len() as u64 + 1)
            .sum::<u64>()
    }
}

impl CacheValue for SplitResult {
    fn estimated_bytes(&self) -> u64 {
        match self {
            None => 1,
            Some(parts) => 1 + parts.iter().map(|part| part.len() as u64 + 1).sum::<u64>(),
        }
    }
}

/// Estimated persisted size of one entry.
pub fn entry_bytes<V: CacheValue>(word: &str, value: &V) -> u64 {
    word.len() as u64 + value.estimated_bytes() + ENTRY_OVERHEAD_BYTES
}

/// Estimated persisted size of a whole entry map.
pub fn table_bytes<V: CacheValue>(entries: &IndexMap<CacheWord, V>) -> u64 {
    entries
        .iter()
        .map(|(word, value)| entry_bytes(word, value))
        .sum()
}

/// Drop the oldest entries, keeping the newest `retain_fraction` of them.
///
/// Returns the number of entries removed.
pub fn retain_newest<V>(entries: &mut IndexMap<CacheWord, V>, retain_fraction: f64) -> usize {
    let keep = ((entries.len() as f64) * retain_fraction).floor() as usize;
    let remove = entries.len().saturating_sub(keep);
    if remove > 0 {
        entries.drain(..remove);
    }
    remove
}

/// Encode a table: version byte, bitcode marker, bitcode payload.
pub fn encode_table<V: CacheValue>(meta: &TableMeta, entries: &IndexMap<CacheWord, V>) -> Vec<u8> {
    let rows: Vec<(CacheWord, V)> = entries
        .iter()
        .map(|(word, value)| (word.clone(), value.clone()))
        .collect();
    let payload = bitcode::encode(&(*meta, rows));
    let mut buf = Vec::with_capacity(2 + payload.len());
    buf.push(TABLE_RECORD_VERSION);
    buf.push(BITCODE_PREFIX);
    buf.extend_from_slice(&payload);
    buf
}

/// Decode a table produced by [`encode_table`].
pub fn decode_table<V: CacheValue>(
    bytes: &[u8],
) -> Result<(TableMeta, IndexMap<CacheWord, V>), ValidationError> {
    match bytes.first() {
        None => return Err(ValidationError::Cache("cache table is empty".into())),
        Some(&TABLE_RECORD_VERSION) => {}
        Some(other) => {
            return Err(ValidationError::Cache(format!(
                "cache table version mismatch: found {other}, expected {TABLE_RECORD_VERSION}"
            )));
        }
    }
    if bytes.get(1).copied() != Some(BITCODE_PREFIX) {
        return Err(ValidationError::Cache(
            "bitcode payload missing expected prefix".into(),
        ));
    }
    let (meta, rows): (TableMeta, Vec<(CacheWord, V)>) = bitcode::decode(&bytes[2..])
        .map_err(|err| ValidationError::Cache(format!("corrupt cache table: {err}")))?;
    Ok((meta, rows.into_iter().collect()))
}

/// Read and decode the table at `path`; `Ok(None)` when the file does not exist.
///
/// Files larger than `max_bytes` are rejected without being read.
pub fn read_table<V: CacheValue>(
    path: &Path,
    max_bytes: u64,
) -> Result<Option<(TableMeta, IndexMap<CacheWord, V>)>, ValidationError> {
    let size = match fs::metadata(path) {
        Ok(metadata) => metadata.len(),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    if size > max_bytes {
        return Err(ValidationError::Cache(format!(
            "cache table is {size} bytes, above the {max_bytes} byte limit"
        )));
    }
    let bytes = fs::read(path)?;
    decode_table(&bytes).map(Some)
}

/// Atomically replace the file at `path` with `bytes` (temp file + rename).
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ValidationError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;
    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|err| ValidationError::Io(err.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn spelling_entries() -> IndexMap<CacheWord, SpellingVerdict> {
        let mut entries = IndexMap::new();
        entries.insert("cotton".to_string(), SpellingVerdict::known());
        entries.insert(
            "cottn".to_string(),
            SpellingVerdict {
                valid: false,
                suggestions: vec!["cotton".to_string()],
            },
        );
        entries
    }

    #[test]
    fn table_file_starts_with_version_and_marker() {
        let entries = spelling_entries();
        let meta = TableMeta {
            byte_size: table_bytes(&entries),
            entry_count: 2,
            last_cleanup: 42,
        };
        let bytes = encode_table(&meta, &entries);
        assert_eq!(bytes[0], TABLE_RECORD_VERSION);
        assert_eq!(bytes[1], BITCODE_PREFIX);
        let (decoded_meta, decoded) = decode_table::<SpellingVerdict>(&bytes).unwrap();
        assert_eq!(decoded_meta, meta);
        assert_eq!(decoded, entries);
        let keys: Vec<&str> = decoded.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["cotton", "cottn"]);
    }

    #[test]
    fn decode_rejects_wrong_version_and_garbage() {
        let entries = spelling_entries();
        let mut bytes = encode_table(&TableMeta::default(), &entries);
        bytes[0] = TABLE_RECORD_VERSION + 1;
        assert!(decode_table::<SpellingVerdict>(&bytes).is_err());
        assert!(decode_table::<SpellingVerdict>(b"").is_err());
        let truncated = [TABLE_RECORD_VERSION, BITCODE_PREFIX, 7];
        assert!(decode_table::<SpellingVerdict>(&truncated).is_err());
    }

    #[test]
    fn retain_newest_drops_oldest_entries() {
        let mut entries: IndexMap<CacheWord, SplitResult> =
            (0..10).map(|idx| (format!("w{idx}"), None)).collect();
        let removed = retain_newest(&mut entries, 0.7);
        assert_eq!(removed, 3);
        assert_eq!(entries.len(), 7);
        assert_eq!(entries.keys().next().map(String::as_str), Some("w3"));
    }

    #[test]
    fn read_table_handles_missing_and_oversized_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("split_cache.bin");
        assert!(read_table::<SplitResult>(&path, 1024).unwrap().is_none());

        let mut entries: IndexMap<CacheWord, SplitResult> = IndexMap::new();
        entries.insert(
            "cottonshirt".to_string(),
            Some(vec!["cotton".to_string(), "shirt".to_string()]),
        );
        write_atomic(&path, &encode_table(&TableMeta::default(), &entries)).unwrap();
        let (_, loaded) = read_table::<SplitResult>(&path, 1024).unwrap().unwrap();
        assert_eq!(loaded, entries);
        assert!(read_table::<SplitResult>(&path, 4).is_err());
    }
}
