use std::fs;
use std::path::Path;
use std::sync::Arc;

use feedlint::constants::correction::{SPELLING_CACHE_FILENAME, SPLIT_CACHE_FILENAME};
use feedlint::{
    BatchSizing, CacheConfig, Concurrency, CorrectionCache, Pipeline, PipelineConfig,
    WordListDictionary,
};
use tempfile::tempdir;

const FEED: &str = "id\ttitle\tdescription\n\
                    1\tWarm wool jackte\tSoft cottn lining with leathr trim.\n\
                    2\tWaterproofjacket for winter\tMade from durable nylon.\n\
                    3\tClassic wool sweatr\tBreathable and lightweight.\n";

const SPELLING_RULES: [&str; 3] = ["title_spelling", "description_spelling", "title_merged_words"];

const FREQUENCIES: &str = "warm 900\nwool 850\njacket 800\nwaterproof 700\nwinter 650\n\
                           for 600\nsoft 550\ncotton 500\nlining 450\nwith 400\n\
                           leather 350\ntrim 300\nmade 250\nfrom 200\ndurable 150\n\
                           nylon 100\nclassic 90\nsweater 80\nbreathable 70\nand 60\n\
                           lightweight 50\ncoat 40\n";

fn persistent_pipeline(dir: &Path, cache: CacheConfig) -> Pipeline {
    let dictionary = dir.join("frequency.txt");
    fs::write(&dictionary, FREQUENCIES).unwrap();
    Pipeline::new(PipelineConfig {
        dictionary_path: Some(dictionary),
        concurrency: Concurrency::Fixed(2),
        batch_sizing: BatchSizing::uniform(1),
        cache: CacheConfig {
            dir: Some(dir.to_path_buf()),
            ..cache
        },
        ..PipelineConfig::default()
    })
    .unwrap()
}

#[test]
fn run_persists_both_tables_and_next_run_hits_them() {
    let dir = tempdir().unwrap();
    let (first, first_stats) = persistent_pipeline(dir.path(), CacheConfig::default())
        .run_with_stats(FEED.as_bytes(), |_| {}, &SPELLING_RULES)
        .unwrap();
    assert!(first_stats.cache.misses > 0);
    assert!(dir.path().join(SPELLING_CACHE_FILENAME).exists());
    assert!(dir.path().join(SPLIT_CACHE_FILENAME).exists());

    let (second, second_stats) = persistent_pipeline(dir.path(), CacheConfig::default())
        .run_with_stats(FEED.as_bytes(), |_| {}, &SPELLING_RULES)
        .unwrap();
    assert_eq!(second_stats.cache.misses, 0);
    assert!(second_stats.cache.hits > 0);
    assert_eq!(second.error_counts, first.error_counts);
}

#[test]
fn corrupt_cache_files_never_fail_a_run() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join(SPELLING_CACHE_FILENAME), b"\x00garbage").unwrap();
    fs::write(dir.path().join(SPLIT_CACHE_FILENAME), b"B").unwrap();
    let report = persistent_pipeline(dir.path(), CacheConfig::default())
        .run(FEED.as_bytes(), |_| {}, &SPELLING_RULES)
        .unwrap();
    assert_eq!(report.total_products, 3);

    let reopened = CorrectionCache::open(
        CacheConfig::in_dir(dir.path()),
        Box::new(WordListDictionary::seeded()),
    );
    assert!(reopened.stats().spelling_entries > 0);
}

#[test]
fn small_budget_evicts_during_a_run() {
    let dir = tempdir().unwrap();
    let mut feed = String::from("id\ttitle\n");
    for idx in 0..300_u32 {
        let word: String = [idx / 26 % 26, idx % 26]
            .iter()
            .map(|offset| char::from(b'a' + *offset as u8))
            .collect();
        feed.push_str(&format!("{idx}\tqzx{word} coat\n"));
    }
    let budget = CacheConfig {
        max_bytes: 4_000,
        eviction_threshold: 0.5,
        ..CacheConfig::default()
    };
    let (report, stats) = persistent_pipeline(dir.path(), budget.clone())
        .run_with_stats(feed.as_bytes(), |_| {}, &["title_spelling"])
        .unwrap();
    assert_eq!(report.total_products, 300);
    assert!(stats.cache.evictions >= 1);
    assert!(stats.cache.spelling_entries < 300);

    let reopened = CorrectionCache::open(
        CacheConfig {
            dir: Some(dir.path().to_path_buf()),
            ..budget
        },
        Box::new(WordListDictionary::seeded()),
    );
    assert!(reopened.stats().spelling_entries < 300);
}

#[test]
fn caller_supplied_cache_is_shared_across_pipelines() {
    let cache = Arc::new(CorrectionCache::in_memory(Box::new(
        WordListDictionary::from_words(["warm", "wool", "jacket", "soft", "cotton"]),
    )));
    let config = PipelineConfig {
        concurrency: Concurrency::Fixed(2),
        ..PipelineConfig::default()
    };
    let first = Pipeline::with_cache(config.clone(), Arc::clone(&cache)).unwrap();
    let second = Pipeline::with_cache(config, Arc::clone(&cache)).unwrap();
    let feed = "id\ttitle\n1\tWarm wool jackte\n";

    let report = first.run(feed.as_bytes(), |_| {}, &["title_spelling"]).unwrap();
    assert_eq!(report.count("Spelling Error In Title"), 1);
    let misses = cache.stats().misses;
    second.run(feed.as_bytes(), |_| {}, &["title_spelling"]).unwrap();
    assert_eq!(cache.stats().misses, misses);
    assert!(Arc::ptr_eq(first.cache(), second.cache()));
}
