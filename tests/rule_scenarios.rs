mod common;

use feedlint::constants::categories as cat;
use feedlint::{BatchSizing, CacheConfig, Pipeline, PipelineConfig, Report};

use common::{pipeline, vocabulary_cache};

fn validate(header: &str, rows: &[&str], rules: &[&str]) -> Report {
    let mut feed = format!("{header}\n");
    for row in rows {
        feed.push_str(row);
        feed.push('\n');
    }
    pipeline(4, 2).run(feed.as_bytes(), |_| {}, rules).unwrap()
}

#[test]
fn thousands_separators_are_not_missing_spaces() {
    let report = validate(
        "id\tdescription",
        &[
            "1\tThe price is $6,886,187 for this item.",
            "2\tSoft,warm and cosy.",
        ],
        &["description_missing_space_after_comma"],
    );
    assert_eq!(report.count(cat::MISSING_SPACE_AFTER_COMMA), 1);
    assert_eq!(report.errors[0].id, "2");
}

#[test]
fn duplicated_title_word_is_reported_once() {
    let report = validate(
        "id\ttitle",
        &["1\tNike Air Jordan Jordan Shoes"],
        &["title_duplicate_words"],
    );
    assert_eq!(report.count(cat::DUPLICATE_TITLE_WORDS), 1);
    let details = &report.errors[0].details;
    assert_eq!(details.to_lowercase().matches("jordan").count(), 1);
}

#[test]
fn gtin_scientific_notation_is_accepted() {
    let report = validate(
        "id\tgtin",
        &["1\t1.2345e7", "2\t1234567", "3\t12345678"],
        &["gtin_length"],
    );
    assert_eq!(report.count(cat::GTIN_LENGTH), 1);
    assert_eq!(report.errors[0].id, "2");
    assert_eq!(report.errors[0].value, "1234567");
}

#[test]
fn oversized_gtin_exponents_are_findings_not_failures() {
    let report = validate(
        "id\tgtin",
        &[
            "1\t12345678",
            "2\t1e9223372036854775807",
            "3\t1e99999999999",
            "4\t1234567",
        ],
        &["gtin_length"],
    );
    assert_eq!(report.total_products, 4);
    assert_eq!(report.count(cat::GTIN_LENGTH), 3);
    let mut ids: Vec<&str> = report.errors.iter().map(|f| f.id.as_str()).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec!["2", "3", "4"]);
}

#[test]
fn category_depth_is_enforced() {
    let report = validate(
        "id\tGoogle Product Category",
        &[
            "1\tElectronics > Gadgets",
            "2\tElectronics > Gadgets > Phones",
            "3\t",
        ],
        &["google_product_category"],
    );
    assert_eq!(report.count(cat::CATEGORY_NOT_SPECIFIC), 1);
    assert_eq!(report.count(cat::CATEGORY_NOT_SET), 1);
    let ids: Vec<&str> = report.errors.iter().map(|f| f.id.as_str()).collect();
    assert!(!ids.contains(&"2"));
}

#[test]
fn attributes_must_appear_in_title() {
    let report = validate(
        "id\ttitle\tbrand\tcolor\tsize",
        &[
            "1\tAcme Cotton Shirt Blue M\tAcme\tBlue\tM",
            "2\tCotton Shirt\tAcme\tRed\tXL",
        ],
        &["title_brand", "title_color", "title_size"],
    );
    assert_eq!(report.count(cat::BRAND_NOT_IN_TITLE), 1);
    assert_eq!(report.count(cat::COLOR_NOT_IN_TITLE), 1);
    assert_eq!(report.count(cat::SIZE_NOT_IN_TITLE), 1);
    assert!(report.errors.iter().all(|finding| finding.id == "2"));
}

#[test]
fn duplicate_ids_are_reported_once_per_identifier() {
    let report = validate(
        "id\ttitle",
        &["A\tx", "B\tx", "A\tx", "A\tx", "\tx", "\tx"],
        &["duplicate_ids"],
    );
    assert_eq!(report.total_products, 6);
    assert_eq!(report.count(cat::DUPLICATE_ID), 1);
    assert_eq!(report.errors[0].details, "ID 'A' appears 3 times in the feed");
}

#[test]
fn quoted_cells_may_contain_tabs() {
    let report = validate(
        "id\ttitle\tgtin",
        &["1\t\"Cotton\tShirt\"\t1234567"],
        &["gtin_length", "title_whitespace"],
    );
    assert_eq!(report.total_products, 1);
    assert_eq!(report.count(cat::GTIN_LENGTH), 1);
    assert_eq!(report.count(cat::TITLE_WHITESPACE), 1);
}

#[test]
fn cheap_rules_use_fewer_larger_batches_than_spelling_rules() {
    let mut feed = String::from("id\ttitle\tgtin\n");
    for idx in 0..10_000 {
        feed.push_str(&format!("sku-{idx}\tWarm wool coat\t12345678\n"));
    }
    let config = PipelineConfig {
        batch_sizing: BatchSizing::default(),
        ..PipelineConfig::default()
    };
    let pipeline = Pipeline::with_cache(config, vocabulary_cache()).unwrap();

    let (cheap, cheap_stats) = pipeline
        .run_with_stats(feed.as_bytes(), |_| {}, &["gtin_length", "title_length"])
        .unwrap();
    let (spelling, spelling_stats) = pipeline
        .run_with_stats(feed.as_bytes(), |_| {}, &["gtin_length", "title_spelling"])
        .unwrap();

    assert_eq!(cheap.total_products, 10_000);
    assert_eq!(spelling.total_products, 10_000);
    assert!(cheap_stats.batch_size > spelling_stats.batch_size);
    assert!(cheap_stats.batches < spelling_stats.batches);
    assert_eq!(cheap_stats.batches, 10);
    assert_eq!(spelling_stats.batches, 200);
}

#[test]
fn default_pipeline_without_dictionary_skips_spelling_rules() {
    let pipeline = Pipeline::new(PipelineConfig {
        cache: CacheConfig::in_memory(),
        ..PipelineConfig::default()
    })
    .unwrap();
    let feed = "id\ttitle\tdescription\n1\tCool summer line dress with pillows\tSoft linen.\n";
    let (report, stats) = pipeline
        .run_with_stats(
            feed.as_bytes(),
            |_| {},
            &["title_spelling", "description_spelling", "title_merged_words", "gtin_length"],
        )
        .unwrap();
    assert_eq!(report.total_products, 1);
    assert!(report.is_clean());
    assert_eq!(stats.rules, vec!["gtin_length"]);

    let spelled = common::pipeline(4, 1)
        .run(feed.as_bytes(), |_| {}, &["title_spelling"])
        .unwrap();
    assert!(spelled.count(cat::TITLE_SPELLING) >= 1);
}
