use std::time::Duration;

use crate::config::{BatchSizing, Concurrency};
use crate::rules::RuleCost;

/// Pick the batch size for a run from the cost classes of its enabled rules.
///
/// Any spelling-class rule selects the small spelling size; only cheap rules
/// (or no rules at all) select the large size; anything else the middle size.
pub fn batch_size_for<I>(costs: I, sizing: &BatchSizing) -> usize
where
    I: IntoIterator<Item = RuleCost>,
{
    let heaviest = costs.into_iter().max().unwrap_or(RuleCost::Cheap);
    match heaviest {
        RuleCost::Spelling => sizing.spelling,
        RuleCost::Moderate => sizing.mixed,
        RuleCost::Cheap => sizing.cheap,
    }
}

/// Resolve the worker count: cores minus one under `Auto`, never below one.
pub fn worker_count(concurrency: Concurrency) -> usize {
    match concurrency {
        Concurrency::Auto => num_cpus::get().saturating_sub(1).max(1),
        Concurrency::Fixed(count) => count.max(1),
    }
}

/// Render `value` with thousands separators (`1234567` -> `1,234,567`).
pub fn format_u64_with_commas(value: u64) -> String {
    let raw = value.to_string();
    let mut grouped_reversed = String::with_capacity(raw.len() + (raw.len() / 3));
    for (idx, ch) in raw.chars().rev().enumerate() {
        if idx > 0 && idx % 3 == 0 {
            grouped_reversed.push(',');
        }
        grouped_reversed.push(ch);
    }
    grouped_reversed.chars().rev().collect()
}

/// Records per second, or `n/a` when nothing was measured.
pub fn format_throughput(records: u64, elapsed: Duration) -> String {
    let seconds = elapsed.as_secs_f64();
    if records == 0 || seconds <= 0.0 {
        return "n/a".to_string();
    }
    format!("{:.1} records/s", records as f64 / seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_size_follows_heaviest_cost() {
        let sizing = BatchSizing::default();
        assert_eq!(batch_size_for([], &sizing), sizing.cheap);
        assert_eq!(
            batch_size_for([RuleCost::Cheap, RuleCost::Cheap], &sizing),
            sizing.cheap
        );
        assert_eq!(
            batch_size_for([RuleCost::Cheap, RuleCost::Moderate], &sizing),
            sizing.mixed
        );
        assert_eq!(
            batch_size_for([RuleCost::Moderate, RuleCost::Spelling], &sizing),
            sizing.spelling
        );
        assert!(sizing.spelling < sizing.mixed && sizing.mixed < sizing.cheap);
    }

    #[test]
    fn worker_count_is_at_least_one() {
        assert!(worker_count(Concurrency::Auto) >= 1);
        assert_eq!(worker_count(Concurrency::Fixed(3)), 3);
        assert_eq!(worker_count(Concurrency::Fixed(0)), 1);
    }

    #[test]
    fn formatting_helpers_are_stable() {
        assert_eq!(format_u64_with_commas(0), "0");
        assert_eq!(format_u64_with_commas(1_234_567), "1,234,567");
        assert_eq!(format_throughput(0, Duration::from_secs(1)), "n/a");
        assert_eq!(format_throughput(10, Duration::ZERO), "n/a");
        assert_eq!(
            format_throughput(50, Duration::from_secs(2)),
            "25.0 records/s"
        );
    }
}
