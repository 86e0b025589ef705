use std::io::Read;
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::correction::{CorrectionCache, SpellDictionary, SymSpellDictionary, WordListDictionary};
use crate::data::Report;
use crate::errors::ValidationError;
use crate::heuristics::{batch_size_for, worker_count};
use crate::ingestion::FeedReader;
use crate::metrics::{RunStats, worker_skew};
use crate::pool::{BoundRules, PoolSettings, run_pool};
use crate::rules::{RuleContext, RuleSet};

/// Streaming validation pipeline.
///
/// Owns the run configuration and a shared [`CorrectionCache`]; each call to
/// [`Pipeline::run`] validates one feed stream end to end. Runs on the same
/// pipeline reuse the cache.
pub struct Pipeline {
    config: PipelineConfig,
    cache: Arc<CorrectionCache>,
    has_dictionary: bool,
}

impl Pipeline {
    /// Build a pipeline, loading the configured dictionary and cache tables.
    ///
    /// Without a `dictionary_path` the cache only holds the built-in seed
    /// vocabulary, and spelling-class rules are skipped on every run.
    pub fn new(config: PipelineConfig) -> Result<Self, ValidationError> {
        let config = config.validated()?;
        let (dictionary, has_dictionary): (Box<dyn SpellDictionary>, bool) =
            match config.dictionary_path.as_deref() {
                Some(path) => (
                    Box::new(SymSpellDictionary::open(path, config.bigram_path.as_deref())?),
                    true,
                ),
                None => {
                    if config.bigram_path.is_some() {
                        warn!("bigram dictionary ignored without a frequency dictionary");
                    }
                    (Box::new(WordListDictionary::seeded()), false)
                }
            };
        let cache = CorrectionCache::open(config.cache.clone(), dictionary);
        Ok(Self {
            config,
            cache: Arc::new(cache),
            has_dictionary,
        })
    }

    /// Build a pipeline around a caller-supplied cache.
    ///
    /// `config.cache` and the dictionary paths are ignored; spelling rules
    /// consult the cache's own dictionary.
    pub fn with_cache(
        config: PipelineConfig,
        cache: Arc<CorrectionCache>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            config: config.validated()?,
            cache,
            has_dictionary: true,
        })
    }

    /// Validated configuration of this pipeline.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Correction cache shared by every run of this pipeline.
    pub fn cache(&self) -> &Arc<CorrectionCache> {
        &self.cache
    }

    /// Validate `stream` with the rules named in `enabled_rules`.
    ///
    /// `progress` receives the running number of validated records at least
    /// once per completed batch. Unknown rule names are ignored with a warning.
    pub fn run<R, P, S>(
        &self,
        stream: R,
        progress: P,
        enabled_rules: &[S],
    ) -> Result<Report, ValidationError>
    where
        R: Read,
        P: FnMut(u64),
        S: AsRef<str>,
    {
        self.run_with_stats(stream, progress, enabled_rules)
            .map(|(report, _)| report)
    }

    /// Like [`Pipeline::run`], also returning [`RunStats`].
    pub fn run_with_stats<R, P, S>(
        &self,
        stream: R,
        progress: P,
        enabled_rules: &[S],
    ) -> Result<(Report, RunStats), ValidationError>
    where
        R: Read,
        P: FnMut(u64),
        S: AsRef<str>,
    {
        self.run_rules(stream, progress, &RuleSet::resolve(enabled_rules))
    }

    /// Validate `stream` with an already resolved rule set.
    ///
    /// Spelling-class rules are dropped, with one warning, when the pipeline
    /// has no spelling dictionary.
    pub fn run_rules<R, P>(
        &self,
        stream: R,
        progress: P,
        rules: &RuleSet,
    ) -> Result<(Report, RunStats), ValidationError>
    where
        R: Read,
        P: FnMut(u64),
    {
        let started = Instant::now();
        let narrowed;
        let rules = if rules.uses_spelling() && !self.has_dictionary {
            narrowed = rules.without_spelling();
            let skipped: Vec<&str> = rules
                .names()
                .into_iter()
                .filter(|name| !narrowed.contains(name))
                .collect();
            warn!(?skipped, "no spelling dictionary configured; skipping spelling rules");
            &narrowed
        } else {
            rules
        };
        let mut reader = FeedReader::open(stream, &self.config.ingest)?;
        let workers = worker_count(self.config.concurrency);
        let settings = PoolSettings {
            workers,
            queue_capacity: self.config.queue_capacity_for(workers),
            batch_size: batch_size_for(rules.costs(), &self.config.batch_sizing),
            track_duplicates: rules.tracks_duplicate_ids(),
        };
        info!(
            rules = rules.len(),
            columns = reader.headers().len(),
            workers = settings.workers,
            batch_size = settings.batch_size,
            queue_capacity = settings.queue_capacity,
            "validation run started"
        );

        let validator = BoundRules {
            rules,
            ctx: RuleContext {
                cache: self.cache.as_ref(),
            },
        };
        let outcome = run_pool(reader.by_ref(), &validator, &settings, progress);
        if let Err(err) = self.cache.flush() {
            warn!(error = %err, "correction cache flush after run failed");
        }
        let (report, summary) = outcome?;

        let stats = RunStats {
            records: report.total_products,
            skipped_rows: reader.skipped_rows(),
            batches: summary.batches,
            batch_size: settings.batch_size,
            workers: settings.workers,
            queue_capacity: settings.queue_capacity,
            rules: rules.names(),
            duplicated_ids: summary.duplicated_ids,
            worker_skew: worker_skew(&summary.per_worker),
            cache: self.cache.stats(),
            elapsed: started.elapsed(),
        };
        info!(
            records = stats.records,
            findings = report.errors.len(),
            skipped_rows = stats.skipped_rows,
            batches = stats.batches,
            elapsed_ms = stats.elapsed.as_millis(),
            "validation run finished"
        );
        Ok((report, stats))
    }
}

/// Validate `stream` with the default configuration.
pub fn run<R, P, S>(stream: R, progress: P, enabled_rules: &[S]) -> Result<Report, ValidationError>
where
    R: Read,
    P: FnMut(u64),
    S: AsRef<str>,
{
    Pipeline::new(PipelineConfig::default())?.run(stream, progress, enabled_rules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BatchSizing, CacheConfig, Concurrency};

    fn pipeline(batch: usize, workers: usize) -> Pipeline {
        Pipeline::new(PipelineConfig {
            concurrency: Concurrency::Fixed(workers),
            batch_sizing: BatchSizing::uniform(batch),
            cache: CacheConfig::in_memory(),
            ..PipelineConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn stats_describe_the_run() {
        let input = "id\ttitle\ngtin\n1\tShirt\n2\tShirt\textra\n3\tCoat\n";
        let (report, stats) = pipeline(1, 2)
            .run_with_stats(input.as_bytes(), |_| {}, &["title_length"])
            .unwrap();
        assert_eq!(report.total_products, 2);
        assert_eq!(stats.skipped_rows, 2);
        assert_eq!(stats.batches, 2);
        assert_eq!(stats.workers, 2);
        assert_eq!(stats.rules, vec!["title_length"]);
        assert_eq!(report.count("Title Too Short"), 2);
    }

    #[test]
    fn missing_id_column_is_fatal() {
        let err = pipeline(10, 1)
            .run("sku\ttitle\n1\tShirt\n".as_bytes(), |_| {}, &["title_length"])
            .unwrap_err();
        assert!(matches!(err, ValidationError::MissingColumn(column) if column == "id"));
    }

    #[test]
    fn spelling_rules_are_skipped_without_a_dictionary() {
        let input = "id\ttitle\n1\tCool summer line dress with pillows\n";
        let (report, stats) = pipeline(10, 1)
            .run_with_stats(input.as_bytes(), |_| {}, &["title_spelling", "title_length"])
            .unwrap();
        assert_eq!(report.total_products, 1);
        assert!(report.is_clean());
        assert_eq!(stats.rules, vec!["title_length"]);
        assert_eq!(stats.batch_size, 10);
    }

    #[test]
    fn configured_dictionary_enables_spelling_rules() {
        let dir = tempfile::tempdir().unwrap();
        let words = dir.path().join("frequency.txt");
        let frequencies = "cool 900\nsummer 800\nline 700\ndress 600\nwith 500\n";
        std::fs::write(&words, frequencies).unwrap();
        let config = PipelineConfig {
            dictionary_path: Some(words),
            cache: CacheConfig::in_memory(),
            ..PipelineConfig::default()
        };
        let input = "id\ttitle\n1\tCool summer line dres with\n";
        let (report, stats) = Pipeline::new(config)
            .unwrap()
            .run_with_stats(input.as_bytes(), |_| {}, &["title_spelling"])
            .unwrap();
        assert_eq!(stats.rules, vec!["title_spelling"]);
        assert_eq!(report.count("Spelling Error In Title"), 1);
        assert!(report.errors[0].details.contains("'dres'"));
    }

    #[test]
    fn missing_dictionary_file_is_a_configuration_error() {
        let config = PipelineConfig {
            dictionary_path: Some("/nonexistent/feedlint/words.txt".into()),
            cache: CacheConfig::in_memory(),
            ..PipelineConfig::default()
        };
        assert!(matches!(
            Pipeline::new(config),
            Err(ValidationError::Configuration(_))
        ));
    }
}
