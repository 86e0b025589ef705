/// Product identifier taken from the feed's `id` column.
/// Example: `sku-10442-blue-m`
pub type RecordId = String;
/// Canonical (normalized) feed column name.
/// Examples: `title`, `google_product_category`, `image_link`
pub type FieldName = String;
/// Raw cell value as it appeared in the feed.
/// Example: `Nike Air Jordan 1 Mid - Black/White`
pub type FieldValue = String;
/// Symbolic rule identifier used to enable a rule.
/// Examples: `title_duplicate_words`, `gtin_length`
pub type RuleName = String;
/// Human-readable finding category reported in `errorCounts`.
/// Examples: `Incorrect GTIN Length`, `Duplicate Words In Title`
pub type ErrorType = String;
/// Dictionary word used as a correction-cache key (always lower-cased).
/// Example: `waterproof`
pub type CacheWord = String;
/// Monotonic batch sequence number within a run.
pub type BatchId = u64;
/// Index of a worker thread inside the pool.
pub type WorkerId = usize;
