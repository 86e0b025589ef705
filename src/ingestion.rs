use std::io::Read;

use tracing::debug;

use crate::config::IngestConfig;
use crate::constants::ingestion::FIELD_DELIMITER;
use crate::data::{Batch, Record};
use crate::errors::ValidationError;
use crate::fields::ID;
use crate::types::{BatchId, FieldName};
use crate::utils::normalize_field_name;

/// Streaming reader that turns a tab-delimited feed into normalized records.
///
/// The first non-blank row is the header. Rows whose column count differs
/// from the header are skipped and counted; blank lines are ignored. The
/// first decode or I/O error is yielded once and ends the iteration.
pub struct FeedReader<R: Read> {
    reader: csv::Reader<R>,
    headers: Vec<FieldName>,
    row: csv::StringRecord,
    skipped_rows: u64,
    emitted: u64,
    done: bool,
}

impl<R: Read> FeedReader<R> {
    /// Open `stream` and read its header row.
    ///
    /// An empty stream yields a reader with no headers that emits nothing.
    /// A header without an `id` column is rejected.
    pub fn open(stream: R, config: &IngestConfig) -> Result<Self, ValidationError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(FIELD_DELIMITER)
            .has_headers(false)
            .flexible(true)
            .quoting(config.quoting)
            .from_reader(stream);
        let mut row = csv::StringRecord::new();
        let mut headers = Vec::new();
        while reader.read_record(&mut row)? {
            if is_blank_row(&row) {
                continue;
            }
            headers = row.iter().map(normalize_field_name).collect();
            break;
        }
        let done = headers.is_empty();
        if !done && !headers.iter().any(|name| name == ID.as_str()) {
            return Err(ValidationError::MissingColumn(ID.as_str().to_string()));
        }
        debug!(columns = headers.len(), ?headers, "feed header parsed");
        Ok(Self {
            reader,
            headers,
            row,
            skipped_rows: 0,
            emitted: 0,
            done,
        })
    }

    /// Normalized header names in column order (empty for an empty stream).
    pub fn headers(&self) -> &[FieldName] {
        &self.headers
    }

    /// Rows dropped because their column count did not match the header.
    pub fn skipped_rows(&self) -> u64 {
        self.skipped_rows
    }

    /// Records emitted so far.
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    fn next_record(&mut self) -> Result<Option<Record>, ValidationError> {
        while self.reader.read_record(&mut self.row)? {
            if is_blank_row(&self.row) {
                continue;
            }
            if self.row.len() != self.headers.len() {
                self.skipped_rows += 1;
                debug!(
                    line = self.row.position().map(|pos| pos.line()),
                    expected = self.headers.len(),
                    found = self.row.len(),
                    "skipping malformed row"
                );
                continue;
            }
            let record = Record::from_pairs(
                self.headers
                    .iter()
                    .zip(self.row.iter())
                    .map(|(name, value)| (name.clone(), value.to_string())),
            );
            self.emitted += 1;
            return Ok(Some(record));
        }
        Ok(None)
    }
}

impl<R: Read> Iterator for FeedReader<R> {
    type Item = Result<Record, ValidationError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

fn is_blank_row(row: &csv::StringRecord) -> bool {
    row.iter().all(|cell| cell.trim().is_empty()) && row.len() <= 1
}

/// Accumulates records into batches of a per-run target size.
#[derive(Debug)]
pub struct AdaptiveBatcher {
    target: usize,
    next_id: BatchId,
    pending: Vec<Record>,
}

impl AdaptiveBatcher {
    /// Create a batcher flushing every `target` records (at least one).
    pub fn new(target: usize) -> Self {
        let target = target.max(1);
        Self {
            target,
            next_id: 0,
            pending: Vec::with_capacity(target),
        }
    }

    /// Target batch size for this run.
    pub fn target(&self) -> usize {
        self.target
    }

    /// Number of batches flushed so far.
    pub fn flushed(&self) -> u64 {
        self.next_id
    }

    /// Add a record; returns a full batch once the target is reached.
    pub fn push(&mut self, record: Record) -> Option<Batch> {
        self.pending.push(record);
        if self.pending.len() >= self.target {
            return Some(self.take());
        }
        None
    }

    /// Flush the partial batch left at stream end, if any.
    pub fn finish(&mut self) -> Option<Batch> {
        if self.pending.is_empty() {
            return None;
        }
        Some(self.take())
    }

    fn take(&mut self) -> Batch {
        let records = std::mem::replace(&mut self.pending, Vec::with_capacity(self.target));
        let id = self.next_id;
        self.next_id += 1;
        Batch { id, records }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{GOOGLE_PRODUCT_CATEGORY, TITLE};

    fn read_all(input: &[u8]) -> (Vec<Record>, u64) {
        let mut reader = FeedReader::open(input, &IngestConfig::default()).unwrap();
        let records = reader.by_ref().collect::<Result<Vec<_>, _>>().unwrap();
        (records, reader.skipped_rows())
    }

    #[test]
    fn headers_are_normalized() {
        let input = "\u{feff}ID\tTitle\tGoogle  Product Category\nA1\tRed Tee\tApparel\n";
        let mut reader = FeedReader::open(input.as_bytes(), &IngestConfig::default()).unwrap();
        assert_eq!(
            reader.headers(),
            &["id", "title", "google_product_category"]
        );
        let record = reader.next().unwrap().unwrap();
        assert_eq!(record.id(), "A1");
        assert_eq!(record.value(TITLE), Some("Red Tee"));
        assert_eq!(record.value(GOOGLE_PRODUCT_CATEGORY), Some("Apparel"));
        assert!(reader.next().is_none());
    }

    #[test]
    fn malformed_rows_are_skipped_and_counted() {
        let input = b"id\ttitle\nA\tone\nB\ttwo\textra\nC\n\nD\tfour\n";
        let (records, skipped) = read_all(input);
        let ids: Vec<&str> = records.iter().map(Record::id).collect();
        assert_eq!(ids, vec!["A", "D"]);
        assert_eq!(skipped, 2);
    }

    #[test]
    fn quoted_cells_keep_tabs_and_newlines() {
        let input = b"id\tdescription\nA\t\"line one\nline\ttwo\"\n";
        let (records, skipped) = read_all(input);
        assert_eq!(skipped, 0);
        assert_eq!(
            records[0].value(crate::fields::DESCRIPTION),
            Some("line one\nline\ttwo")
        );
    }

    #[test]
    fn empty_stream_yields_nothing() {
        let (records, skipped) = read_all(b"");
        assert!(records.is_empty());
        assert_eq!(skipped, 0);
    }

    #[test]
    fn missing_id_column_is_fatal() {
        let err = FeedReader::open(&b"sku\ttitle\n1\tx\n"[..], &IngestConfig::default())
            .err()
            .unwrap();
        assert!(matches!(err, ValidationError::MissingColumn(name) if name == "id"));
    }

    #[test]
    fn invalid_utf8_is_a_decode_error() {
        let input = b"id\ttitle\nA\t\xff\xfe\n";
        let mut reader = FeedReader::open(&input[..], &IngestConfig::default()).unwrap();
        let err = reader.next().unwrap().unwrap_err();
        assert!(matches!(err, ValidationError::Decode(_)));
        assert!(reader.next().is_none());
    }

    struct FailingAfter<'a> {
        head: &'a [u8],
    }

    impl Read for FailingAfter<'_> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.head.is_empty() {
                return Err(std::io::Error::other("connection reset"));
            }
            let len = self.head.len().min(buf.len());
            buf[..len].copy_from_slice(&self.head[..len]);
            self.head = &self.head[len..];
            Ok(len)
        }
    }

    #[test]
    fn stream_read_failure_is_a_decode_error() {
        let stream = FailingAfter {
            head: b"id	title
",
        };
        let mut reader = FeedReader::open(stream, &IngestConfig::default()).unwrap();
        let err = reader.next().unwrap().unwrap_err();
        assert!(
            matches!(&err, ValidationError::Decode(message) if message.contains("connection reset"))
        );
        assert!(reader.next().is_none());
    }

    #[test]
    fn batcher_flushes_full_batches_then_remainder() {
        let mut batcher = AdaptiveBatcher::new(2);
        let mut batches = Vec::new();
        for idx in 0..5 {
            let record = Record::from_pairs([("id", format!("r{idx}"))]);
            batches.extend(batcher.push(record));
        }
        batches.extend(batcher.finish());
        let sizes: Vec<usize> = batches.iter().map(Batch::len).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
        let ids: Vec<u64> = batches.iter().map(|batch| batch.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert!(batcher.finish().is_none());
        assert_eq!(batcher.flushed(), 3);
    }
}
