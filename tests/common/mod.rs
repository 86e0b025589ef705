#![allow(dead_code)]

use std::fmt::Write;
use std::sync::Arc;

use feedlint::{
    BatchSizing, Concurrency, CorrectionCache, Pipeline, PipelineConfig, WordListDictionary,
};

pub const HEADER: &str = "ID\tTitle\tDescription\tLink\tImage Link\tPrice\tSale Price\tAvailability\tBrand\tColor\tSize\tGTIN\tGoogle Product Category";

/// Synthetic feed exercising most rule categories, including repeated ids.
pub fn mixed_feed(rows: usize) -> String {
    let mut out = format!("{HEADER}\n");
    for idx in 0..rows {
        let id = if idx % 17 == 5 {
            "dup-1".to_string()
        } else {
            format!("sku-{idx}")
        };
        let title = match idx % 4 {
            0 => "Acme Blue Cotton Shirt Shirt",
            1 => "ACME RED WOOL WINTER COAT",
            2 => "Acme Lether Jacket - Free Shipping",
            _ => "Tee",
        };
        let description = match idx % 3 {
            0 => "Soft cotton,breathable and warm for every day of the week and beyond.",
            1 => "Short",
            _ => "Visit https://shop.example for more!! Made from durable leather.",
        };
        let gtin = match idx % 5 {
            0 => "1.2345e7",
            1 => "1234567",
            2 => "",
            _ => "4006381333931",
        };
        let category = if idx % 2 == 0 {
            "Apparel & Accessories > Clothing > Shirts"
        } else {
            "Apparel"
        };
        let price = if idx % 6 == 0 { "$19.99" } else { "19.99 USD" };
        let sale = if idx % 7 == 0 { "25.00 USD" } else { "" };
        writeln!(
            out,
            "{id}\t{title}\t{description}\thttps://shop.example/p/{idx}\thttps://cdn.example/{idx}.jpg\t{price}\t{sale}\tin stock\tAcme\tBlue\tM\t{gtin}\t{category}"
        )
        .unwrap();
    }
    out
}

/// Words the synthetic feeds are spelled with.
pub const VOCABULARY: &[&str] = &[
    "acme", "blue", "cotton", "shirt", "red", "wool", "winter", "coat", "leather", "jacket",
    "free", "shipping", "tee", "soft", "breathable", "and", "warm", "for", "every", "day", "of",
    "the", "week", "beyond", "short", "visit", "more", "made", "from", "durable", "shop",
    "example", "price", "this", "item", "cosy", "linen",
];

/// In-memory correction cache over [`VOCABULARY`].
pub fn vocabulary_cache() -> Arc<CorrectionCache> {
    Arc::new(CorrectionCache::in_memory(Box::new(
        WordListDictionary::from_words(VOCABULARY),
    )))
}

/// Pipeline with a uniform batch size, fixed workers and a fresh vocabulary cache.
pub fn pipeline(batch_size: usize, workers: usize) -> Pipeline {
    let config = PipelineConfig {
        concurrency: Concurrency::Fixed(workers),
        batch_sizing: BatchSizing::uniform(batch_size),
        ..PipelineConfig::default()
    };
    Pipeline::with_cache(config, vocabulary_cache()).unwrap()
}

pub fn all_rule_names() -> Vec<&'static str> {
    feedlint::rules::registry()
        .iter()
        .map(|spec| spec.name)
        .collect()
}
