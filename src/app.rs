use std::error::Error;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;

use clap::{Parser, error::ErrorKind};
use tracing::{debug, info};

use crate::config::{BatchSizing, CacheConfig, Concurrency, IngestConfig, PipelineConfig};
use crate::constants::batching::{CHEAP_BATCH_SIZE, MIXED_BATCH_SIZE, SPELLING_BATCH_SIZE};
use crate::constants::correction::DEFAULT_CACHE_DIR;
use crate::heuristics::format_u64_with_commas;
use crate::pipeline::Pipeline;
use crate::rules::{RuleSet, registry};

#[derive(Debug, Parser)]
#[command(
    name = "feedlint",
    disable_help_subcommand = true,
    about = "Validate a tab-delimited product feed",
    long_about = "Stream a tab-delimited product feed through the selected quality rules on a bounded worker pool and print a JSON report of findings.",
    after_help = "Every option can also be set through its FEEDLINT_* environment variable. Logging follows RUST_LOG and is written to stderr."
)]
struct FeedlintCli {
    #[arg(
        value_name = "FEED",
        required_unless_present = "list_rules",
        help = "Path to the tab-delimited feed (first row is the header)"
    )]
    input: Option<PathBuf>,
    #[arg(
        long = "rule",
        value_name = "NAME",
        env = "FEEDLINT_RULES",
        value_delimiter = ',',
        help = "Enable a rule by name, repeat as needed (defaults to every rule)"
    )]
    rules: Vec<String>,
    #[arg(
        long = "all-rules",
        conflicts_with = "rules",
        help = "Enable every registered rule"
    )]
    all_rules: bool,
    #[arg(long = "list-rules", help = "Print the rule catalog and exit")]
    list_rules: bool,
    #[arg(
        long,
        env = "FEEDLINT_WORKERS",
        default_value = "auto",
        value_parser = parse_concurrency,
        help = "Worker threads: 'auto' (cores minus one) or a positive count"
    )]
    workers: Concurrency,
    #[arg(
        long = "batch-size",
        env = "FEEDLINT_BATCH_SIZE",
        value_parser = parse_positive_usize,
        help = "Use one batch size regardless of the enabled rules"
    )]
    batch_size: Option<usize>,
    #[arg(
        long = "spelling-batch-size",
        default_value_t = SPELLING_BATCH_SIZE,
        value_parser = parse_positive_usize,
        help = "Batch size when a spelling rule is enabled"
    )]
    spelling_batch_size: usize,
    #[arg(
        long = "mixed-batch-size",
        default_value_t = MIXED_BATCH_SIZE,
        value_parser = parse_positive_usize,
        help = "Batch size when moderate rules are enabled"
    )]
    mixed_batch_size: usize,
    #[arg(
        long = "cheap-batch-size",
        default_value_t = CHEAP_BATCH_SIZE,
        value_parser = parse_positive_usize,
        help = "Batch size when only cheap rules are enabled"
    )]
    cheap_batch_size: usize,
    #[arg(
        long = "queue-capacity",
        env = "FEEDLINT_QUEUE_CAPACITY",
        value_parser = parse_positive_usize,
        help = "Bounded work-queue capacity (defaults to two slots per worker)"
    )]
    queue_capacity: Option<usize>,
    #[arg(
        long = "cache-dir",
        value_name = "DIR",
        env = "FEEDLINT_CACHE_DIR",
        default_value = DEFAULT_CACHE_DIR,
        help = "Directory for the persisted correction cache"
    )]
    cache_dir: PathBuf,
    #[arg(
        long = "no-cache",
        help = "Keep the correction cache in memory only"
    )]
    no_cache: bool,
    #[arg(
        long,
        value_name = "PATH",
        env = "FEEDLINT_DICTIONARY",
        help = "SymSpell frequency dictionary ('word count' per line) for spelling rules"
    )]
    dictionary: Option<PathBuf>,
    #[arg(
        long,
        value_name = "PATH",
        env = "FEEDLINT_BIGRAMS",
        requires = "dictionary",
        help = "SymSpell bigram dictionary used to split merged words"
    )]
    bigrams: Option<PathBuf>,
    #[arg(
        long,
        short = 'o',
        value_name = "PATH",
        help = "Write the JSON report to a file instead of stdout"
    )]
    output: Option<PathBuf>,
    #[arg(long, help = "Pretty-print the JSON report")]
    pretty: bool,
    #[arg(
        long = "no-quoting",
        help = "Treat double quotes as ordinary characters"
    )]
    no_quoting: bool,
}

impl FeedlintCli {
    fn pipeline_config(&self) -> PipelineConfig {
        let batch_sizing = match self.batch_size {
            Some(size) => BatchSizing::uniform(size),
            None => BatchSizing {
                spelling: self.spelling_batch_size,
                mixed: self.mixed_batch_size,
                cheap: self.cheap_batch_size,
            },
        };
        let cache = if self.no_cache {
            CacheConfig::in_memory()
        } else {
            CacheConfig::in_dir(&self.cache_dir)
        };
        PipelineConfig {
            concurrency: self.workers,
            batch_sizing,
            queue_capacity: self.queue_capacity,
            ingest: IngestConfig {
                quoting: !self.no_quoting,
            },
            cache,
            dictionary_path: self.dictionary.clone(),
            bigram_path: self.bigrams.clone(),
        }
    }

    fn rule_set(&self) -> RuleSet {
        if self.all_rules || self.rules.is_empty() {
            RuleSet::all()
        } else {
            RuleSet::resolve(&self.rules)
        }
    }
}

/// Entry point of the `feedlint` binary.
///
/// `args_iter` excludes the program name.
pub fn run_feedlint<I>(args_iter: I) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .try_init();

    let Some(cli) =
        parse_cli::<FeedlintCli, _>(std::iter::once("feedlint".to_string()).chain(args_iter))?
    else {
        return Ok(());
    };

    if cli.list_rules {
        print_rules(&mut io::stdout().lock())?;
        return Ok(());
    }
    let Some(input) = cli.input.as_deref() else {
        return Err("a feed path is required".into());
    };

    let rules = cli.rule_set();
    if rules.is_empty() {
        let unknown = rules.unknown().join(", ");
        return Err(format!("no known rules selected (unknown: {unknown})").into());
    }
    let pipeline = Pipeline::new(cli.pipeline_config())?;
    let feed = BufReader::new(File::open(input)?);
    info!(feed = %input.display(), rules = rules.len(), "validating feed");
    let (report, stats) = pipeline.run_rules(
        feed,
        |processed| debug!(processed, "records validated"),
        &rules,
    )?;
    info!(
        findings = report.errors.len(),
        categories = report.error_counts.len(),
        "{}",
        stats.summary()
    );

    match cli.output.as_deref() {
        Some(path) => {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent)?;
            }
            let mut writer = BufWriter::new(File::create(path)?);
            write_report(&mut writer, &report, cli.pretty)?;
            writer.flush()?;
            info!(
                path = %path.display(),
                records = %format_u64_with_commas(report.total_products),
                "report written"
            );
        }
        None => {
            let mut stdout = io::stdout().lock();
            write_report(&mut stdout, &report, cli.pretty)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

fn write_report<W: Write>(
    writer: &mut W,
    report: &crate::Report,
    pretty: bool,
) -> Result<(), Box<dyn Error>> {
    if pretty {
        serde_json::to_writer_pretty(&mut *writer, report)?;
    } else {
        serde_json::to_writer(&mut *writer, report)?;
    }
    writeln!(writer)?;
    Ok(())
}

fn print_rules<W: Write>(writer: &mut W) -> io::Result<()> {
    for spec in registry() {
        writeln!(
            writer,
            "{:<40} {:<12} {:<9} {}",
            spec.name,
            spec.group,
            format!("{:?}", spec.cost).to_lowercase(),
            spec.categories.join("; ")
        )?;
    }
    Ok(())
}

fn parse_concurrency(raw: &str) -> Result<Concurrency, String> {
    Concurrency::parse(raw).map_err(|err| err.to_string())
}

fn parse_positive_usize(raw: &str) -> Result<usize, String> {
    let parsed = raw
        .parse::<usize>()
        .map_err(|_| format!("Could not parse '{raw}' as a positive integer"))?;
    if parsed == 0 {
        return Err("value must be greater than zero".to_string());
    }
    Ok(parsed)
}

fn parse_cli<T, I>(args: I) -> Result<Option<T>, Box<dyn Error>>
where
    T: Parser,
    I: IntoIterator,
    I::Item: Into<std::ffi::OsString> + Clone,
{
    match T::try_parse_from(args) {
        Ok(cli) => Ok(Some(cli)),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                err.print()?;
                Ok(None)
            }
            _ => Err(err.into()),
        },
    }
}
