use crate::fields::FieldKey;

/// Constants used by stream ingestion and header normalization.
pub mod ingestion {
    /// Column delimiter of the feed format.
    pub const FIELD_DELIMITER: u8 = b'\t';
    /// Byte-order mark some exporters prepend to the first header cell.
    pub const UTF8_BOM: char = '\u{feff}';
    /// Separator that replaces internal whitespace in normalized header names.
    pub const HEADER_WORD_SEPARATOR: char = '_';
}

/// Constants used to size batches from the enabled rule mix.
pub mod batching {
    /// Batch size when at least one spelling rule is enabled.
    pub const SPELLING_BATCH_SIZE: usize = 50;
    /// Batch size when moderate (but no spelling) rules are enabled.
    pub const MIXED_BATCH_SIZE: usize = 250;
    /// Batch size when only cheap string/regex rules are enabled.
    pub const CHEAP_BATCH_SIZE: usize = 1_000;
    /// Work-queue slots reserved per worker when no explicit capacity is configured.
    pub const QUEUE_SLOTS_PER_WORKER: usize = 2;
    /// How long the coordinator waits for a completion while the work queue is full.
    pub const FULL_QUEUE_POLL_MS: u64 = 25;
}

/// Constants used by the correction cache and its persisted tables.
pub mod correction {
    /// Default directory for persisted cache files.
    pub const DEFAULT_CACHE_DIR: &str = ".feedlint_cache";
    /// Filename of the spelling verdict table.
    pub const SPELLING_CACHE_FILENAME: &str = "spelling_cache.bin";
    /// Filename of the word-split table.
    pub const SPLIT_CACHE_FILENAME: &str = "split_cache.bin";
    /// Upper bound on the serialized size of one table (bytes).
    pub const DEFAULT_MAX_BYTES: u64 = 8 * 1024 * 1024;
    /// Fraction of `max_bytes` that triggers eviction.
    pub const DEFAULT_EVICTION_THRESHOLD: f64 = 0.9;
    /// Fraction of newest entries kept after eviction.
    pub const DEFAULT_RETAIN_FRACTION: f64 = 0.7;
    /// New entries accumulated before a periodic flush.
    pub const DEFAULT_FLUSH_EVERY: usize = 500;
    /// Maximum number of suggestions stored per word.
    pub const MAX_SUGGESTIONS: usize = 5;
    /// Maximum edit distance used for suggestions.
    pub const MAX_EDIT_DISTANCE: usize = 2;
    /// Shortest fragment accepted when splitting merged words.
    pub const MIN_SPLIT_PART_LEN: usize = 3;
    /// Fixed per-entry overhead added to the serialized size estimate.
    pub const ENTRY_OVERHEAD_BYTES: u64 = 16;
    /// Version tag for persisted cache tables.
    pub const TABLE_RECORD_VERSION: u8 = 1;
    /// Prefix marker for bitcode-encoded payloads.
    pub const BITCODE_PREFIX: u8 = b'B';
    /// Common feed vocabulary used to seed an empty spelling table.
    pub const SEED_WORDS: &[&str] = &[
        "accessories", "adjustable", "apparel", "backpack", "bamboo", "battery",
        "bluetooth", "bracelet", "breathable", "cardigan", "ceramic", "charger",
        "cordless", "cotton", "cushion", "denim", "dishwasher", "durable",
        "ergonomic", "espresso", "fleece", "furniture", "handmade", "headphones",
        "hoodie", "jacket", "keyboard", "lightweight", "linen", "leather",
        "mattress", "microfiber", "necklace", "nylon", "organic", "pillow",
        "polyester", "portable", "premium", "rechargeable", "sandals", "sneakers",
        "spandex", "stainless", "sweater", "trousers", "vintage", "waterproof",
        "wireless", "wool",
    ];
}

/// Constants used by the rule registry and individual rules.
pub mod rules {
    /// Separator between levels of a category path.
    pub const CATEGORY_SEPARATOR: char = '>';
    /// Minimum number of category levels considered specific enough.
    pub const MIN_CATEGORY_DEPTH: usize = 3;
    /// Accepted GTIN lengths (GTIN-8, UPC-A, EAN-13, GTIN-14).
    pub const GTIN_LENGTHS: [usize; 4] = [8, 12, 13, 14];
    /// Maximum title length accepted by merchant platforms.
    pub const MAX_TITLE_CHARS: usize = 150;
    /// Titles shorter than this are flagged.
    pub const MIN_TITLE_CHARS: usize = 20;
    /// Maximum description length accepted by merchant platforms.
    pub const MAX_DESCRIPTION_CHARS: usize = 5_000;
    /// Descriptions shorter than this are flagged.
    pub const MIN_DESCRIPTION_CHARS: usize = 50;
    /// Maximum identifier length.
    pub const MAX_ID_CHARS: usize = 50;
    /// Tokens shorter than this are ignored by word-level title checks.
    pub const MIN_WORD_CHARS: usize = 3;
    /// Fully upper-case titles shorter than this are not flagged.
    pub const MIN_ALL_CAPS_LETTERS: usize = 8;
    /// Characters kept from an offending value in a finding.
    pub const EXCERPT_CHARS: usize = 100;
    /// Suffix appended to truncated excerpts.
    pub const EXCERPT_ELLIPSIS: &str = "...";

    /// Words ignored when looking for duplicated title words.
    pub const STOPWORDS: &[&str] = &[
        "and", "the", "for", "with", "from", "into", "onto", "over", "under", "this",
        "that", "your", "our", "its", "are", "was", "per", "pack", "set", "of", "in",
        "on", "by", "to", "or", "a", "an", "at", "as", "is", "&", "-", "+",
    ];
    /// Unit tokens treated as measurements, never as words.
    pub const UNIT_TOKENS: &[&str] = &[
        "mm", "cm", "m", "km", "in", "inch", "inches", "ft", "yd", "oz", "lb", "lbs",
        "g", "kg", "mg", "ml", "l", "ltr", "gal", "w", "kw", "v", "mah", "gb", "tb",
        "mb", "hz", "ghz", "pcs", "pc", "ct", "pk", "qty", "x",
    ];
    /// Tokens never reported as misspellings.
    pub const SPELLING_IGNORELIST: &[&str] = &[
        "usb", "hdmi", "led", "lcd", "oled", "xl", "xxl", "xxxl", "xs", "wifi", "bpa",
        "ipx", "rgb", "diy", "uv", "eu", "uk", "us", "pvc", "abs", "tpu", "aaa", "aa",
        "ios", "android", "qled", "nfc", "gps", "hd", "uhd", "4k", "8k", "tshirt",
        "unisex", "onesie", "leggings", "joggers", "beanie", "crossbody",
    ];
    /// Terms that must not appear in titles or descriptions.
    pub const PROHIBITED_TERMS: &[&str] = &[
        "replica", "counterfeit", "knockoff", "knock-off", "fake", "bootleg",
        "imitation", "unauthorized copy", "not genuine",
    ];
    /// Promotional phrases disallowed in titles.
    pub const PROMOTIONAL_PHRASES: &[&str] = &[
        "free shipping", "best price", "sale", "discount", "cheapest", "buy now",
        "limited offer", "clearance", "% off", "hot deal", "best seller",
    ];
    /// Placeholder values that indicate an unfilled field.
    pub const PLACEHOLDER_VALUES: &[&str] = &[
        "lorem ipsum", "tbd", "todo", "placeholder", "n/a", "none", "null",
        "undefined", "test product", "sample text",
    ];
    /// Accepted `availability` values.
    pub const AVAILABILITY_VALUES: &[&str] =
        &["in stock", "in_stock", "out of stock", "out_of_stock", "preorder", "backorder"];
    /// Accepted `condition` values.
    pub const CONDITION_VALUES: &[&str] = &["new", "refurbished", "used"];
    /// Accepted `gender` values.
    pub const GENDER_VALUES: &[&str] = &["male", "female", "unisex"];
    /// Accepted `age_group` values.
    pub const AGE_GROUP_VALUES: &[&str] =
        &["newborn", "infant", "toddler", "kids", "adult"];
    /// Category path fragment identifying apparel products.
    pub const APPAREL_CATEGORY_MARKER: &str = "apparel";
    /// Characters flagged when they appear in a title.
    pub const TITLE_SPECIAL_CHARACTERS: &[char] =
        &['!', '*', '$', '?', '^', '{', '}', '~', '<', '>', '|', '@', '#', '\u{2122}', '\u{00ae}'];
}

/// Canonical field names of the product feed.
pub mod fields {
    use super::FieldKey;

    /// Unique product identifier.
    pub const ID: FieldKey = FieldKey::new("id");
    /// Product title.
    pub const TITLE: FieldKey = FieldKey::new("title");
    /// Product description.
    pub const DESCRIPTION: FieldKey = FieldKey::new("description");
    /// Landing-page URL.
    pub const LINK: FieldKey = FieldKey::new("link");
    /// Main image URL.
    pub const IMAGE_LINK: FieldKey = FieldKey::new("image_link");
    /// Price with currency.
    pub const PRICE: FieldKey = FieldKey::new("price");
    /// Sale price with currency.
    pub const SALE_PRICE: FieldKey = FieldKey::new("sale_price");
    /// Stock status.
    pub const AVAILABILITY: FieldKey = FieldKey::new("availability");
    /// Item condition.
    pub const CONDITION: FieldKey = FieldKey::new("condition");
    /// Brand name.
    pub const BRAND: FieldKey = FieldKey::new("brand");
    /// Global trade item number.
    pub const GTIN: FieldKey = FieldKey::new("gtin");
    /// Manufacturer part number.
    pub const MPN: FieldKey = FieldKey::new("mpn");
    /// Whether the product has manufacturer identifiers.
    pub const IDENTIFIER_EXISTS: FieldKey = FieldKey::new("identifier_exists");
    /// Google taxonomy path or numeric id.
    pub const GOOGLE_PRODUCT_CATEGORY: FieldKey = FieldKey::new("google_product_category");
    /// Merchant-defined category path.
    pub const PRODUCT_TYPE: FieldKey = FieldKey::new("product_type");
    /// Size attribute.
    pub const SIZE: FieldKey = FieldKey::new("size");
    /// Color attribute.
    pub const COLOR: FieldKey = FieldKey::new("color");
    /// Material attribute.
    pub const MATERIAL: FieldKey = FieldKey::new("material");
    /// Gender attribute.
    pub const GENDER: FieldKey = FieldKey::new("gender");
    /// Age-group attribute.
    pub const AGE_GROUP: FieldKey = FieldKey::new("age_group");

    /// Fields every product must carry.
    pub const REQUIRED: [FieldKey; 7] = [
        ID,
        TITLE,
        DESCRIPTION,
        LINK,
        IMAGE_LINK,
        PRICE,
        AVAILABILITY,
    ];
}

/// Finding categories reported in `errorCounts`.
pub mod categories {
    /// Size attribute does not appear in the title.
    pub const SIZE_NOT_IN_TITLE: &str = "Size Not In Title";
    /// Color attribute does not appear in the title.
    pub const COLOR_NOT_IN_TITLE: &str = "Color Not In Title";
    /// Brand does not appear in the title.
    pub const BRAND_NOT_IN_TITLE: &str = "Brand Not In Title";
    /// Material attribute does not appear in the title.
    pub const MATERIAL_NOT_IN_TITLE: &str = "Material Not In Title";
    /// A meaningful word is repeated in the title.
    pub const DUPLICATE_TITLE_WORDS: &str = "Duplicate Words In Title";
    /// Title exceeds the maximum length.
    pub const TITLE_TOO_LONG: &str = "Title Too Long";
    /// Title is below the minimum length.
    pub const TITLE_TOO_SHORT: &str = "Title Too Short";
    /// Leading, trailing, or repeated whitespace in the title.
    pub const TITLE_WHITESPACE: &str = "Title Whitespace";
    /// Disallowed symbols in the title.
    pub const TITLE_SPECIAL_CHARACTERS: &str = "Special Characters In Title";
    /// Title written entirely in upper case.
    pub const TITLE_ALL_CAPS: &str = "Title In All Caps";
    /// Sales or shipping language in the title.
    pub const TITLE_PROMOTIONAL: &str = "Promotional Text In Title";
    /// Markup or entities in the title.
    pub const TITLE_HTML: &str = "HTML In Title";
    /// Comma not followed by a space in the description.
    pub const MISSING_SPACE_AFTER_COMMA: &str = "Missing Space After Comma";
    /// Description is below the minimum length.
    pub const DESCRIPTION_TOO_SHORT: &str = "Description Too Short";
    /// Description exceeds the maximum length.
    pub const DESCRIPTION_TOO_LONG: &str = "Description Too Long";
    /// Markup or entities in the description.
    pub const DESCRIPTION_HTML: &str = "HTML In Description";
    /// Runs such as `!!` or `....` in the description.
    pub const DESCRIPTION_REPEATED_PUNCTUATION: &str = "Repeated Punctuation In Description";
    /// Description repeats the title verbatim.
    pub const DESCRIPTION_SAME_AS_TITLE: &str = "Description Same As Title";
    /// Web address embedded in the description.
    pub const DESCRIPTION_URL: &str = "URL In Description";
    /// Leading, trailing, or repeated whitespace in the description.
    pub const DESCRIPTION_WHITESPACE: &str = "Description Whitespace";
    /// Google product category is blank.
    pub const CATEGORY_NOT_SET: &str = "Google Product Category Not Set";
    /// Google product category has too few levels.
    pub const CATEGORY_NOT_SPECIFIC: &str = "Google Product Category Isn't Specific Enough";
    /// Product type is blank.
    pub const PRODUCT_TYPE_NOT_SET: &str = "Product Type Not Set";
    /// Product type has too few levels.
    pub const PRODUCT_TYPE_NOT_SPECIFIC: &str = "Product Type Isn't Specific Enough";
    /// A required field is absent or blank.
    pub const MISSING_REQUIRED_FIELD: &str = "Missing Required Field";
    /// GTIN digit count is not 8, 12, 13 or 14.
    pub const GTIN_LENGTH: &str = "Incorrect GTIN Length";
    /// Price does not look like an amount with a currency.
    pub const INVALID_PRICE: &str = "Invalid Price Format";
    /// Availability is not one of the accepted values.
    pub const INVALID_AVAILABILITY: &str = "Invalid Availability";
    /// Condition is not one of the accepted values.
    pub const INVALID_CONDITION: &str = "Invalid Condition";
    /// Product link is not an http(s) URL.
    pub const INVALID_LINK: &str = "Invalid Link";
    /// Image link is not an http(s) URL.
    pub const INVALID_IMAGE_LINK: &str = "Invalid Image Link";
    /// Identifier is too long or contains whitespace or control characters.
    pub const INVALID_ID: &str = "Invalid ID";
    /// Sale price is not below the regular price.
    pub const SALE_PRICE_NOT_LOWER: &str = "Sale Price Not Lower Than Price";
    /// Gender is not one of the accepted values.
    pub const INVALID_GENDER: &str = "Invalid Gender";
    /// Age group is not one of the accepted values.
    pub const INVALID_AGE_GROUP: &str = "Invalid Age Group";
    /// Apparel item missing color, size, gender or age group.
    pub const MISSING_APPAREL_ATTRIBUTES: &str = "Missing Apparel Attributes";
    /// No GTIN and no brand plus MPN, unless declared absent.
    pub const MISSING_PRODUCT_IDENTIFIERS: &str = "Missing Product Identifiers";
    /// Prohibited term in the title or description.
    pub const PROHIBITED_TERM: &str = "Prohibited Term";
    /// Placeholder value such as `n/a` or `tbd`.
    pub const PLACEHOLDER_TEXT: &str = "Placeholder Text";
    /// Likely misspelled word in the title.
    pub const TITLE_SPELLING: &str = "Spelling Error In Title";
    /// Likely misspelled word in the description.
    pub const DESCRIPTION_SPELLING: &str = "Spelling Error In Description";
    /// Title token that splits into known words.
    pub const MERGED_TITLE_WORDS: &str = "Merged Words In Title";
    /// Identifier seen more than once in the feed.
    pub const DUPLICATE_ID: &str = "Duplicate ID";
}
