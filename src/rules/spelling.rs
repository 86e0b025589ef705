use std::collections::HashSet;

use super::RuleContext;
use crate::constants::categories as cat;
use crate::constants::correction::MIN_SPLIT_PART_LEN;
use crate::constants::rules::{MIN_WORD_CHARS, SPELLING_IGNORELIST};
use crate::data::{Finding, Record};
use crate::fields::{BRAND, DESCRIPTION, FieldKey, TITLE};
use crate::utils::{char_len, is_measurement_token, word_tokens};

fn brand_words(record: &Record) -> HashSet<String> {
    record
        .value(BRAND)
        .map(|brand| {
            word_tokens(brand)
                .into_iter()
                .map(str::to_lowercase)
                .collect()
        })
        .unwrap_or_default()
}

fn is_acronym(token: &str) -> bool {
    char_len(token) >= 2 && token.chars().all(|ch| !ch.is_lowercase())
}

fn is_title_case(token: &str) -> bool {
    let mut chars = token.chars();
    chars.next().is_some_and(char::is_uppercase) && chars.all(|ch| !ch.is_uppercase())
}

/// Lower-cased candidate for dictionary checks, or `None` when the token is exempt.
fn spelling_candidate(token: &str, position: usize, brand: &HashSet<String>) -> Option<String> {
    let token = token.strip_suffix("'s").unwrap_or(token);
    if char_len(token) < MIN_WORD_CHARS
        || token.contains('\'')
        || token.chars().any(|ch| ch.is_ascii_digit())
        || is_measurement_token(token)
        || is_acronym(token)
        || (position > 0 && is_title_case(token))
    {
        return None;
    }
    let lower = token.to_lowercase();
    if SPELLING_IGNORELIST.contains(&lower.as_str()) || brand.contains(&lower) {
        return None;
    }
    Some(lower)
}

fn check_field(
    record: &Record,
    ctx: &RuleContext<'_>,
    field: FieldKey,
    category: &str,
    out: &mut Vec<Finding>,
) {
    let Some(text) = record.value(field) else {
        return;
    };
    let brand = brand_words(record);
    let mut reported = HashSet::new();
    for (position, token) in word_tokens(text).into_iter().enumerate() {
        let Some(word) = spelling_candidate(token, position, &brand) else {
            continue;
        };
        if reported.contains(&word) {
            continue;
        }
        let verdict = ctx.cache.check_word(&word);
        if verdict.valid {
            continue;
        }
        let Some(suggestion) = verdict.top_suggestion() else {
            continue;
        };
        if suggestion == word {
            continue;
        }
        out.push(Finding::new(
            record,
            category,
            field,
            format!("'{token}' may be misspelled; did you mean '{suggestion}'?"),
            text,
        ));
        reported.insert(word);
    }
}

pub(super) fn title_spelling(record: &Record, ctx: &RuleContext<'_>, out: &mut Vec<Finding>) {
    check_field(record, ctx, TITLE, cat::TITLE_SPELLING, out);
}

pub(super) fn description_spelling(
    record: &Record,
    ctx: &RuleContext<'_>,
    out: &mut Vec<Finding>,
) {
    check_field(record, ctx, DESCRIPTION, cat::DESCRIPTION_SPELLING, out);
}

pub(super) fn merged_words(record: &Record, ctx: &RuleContext<'_>, out: &mut Vec<Finding>) {
    let Some(title) = record.value(TITLE) else {
        return;
    };
    let brand = brand_words(record);
    let mut reported = HashSet::new();
    for token in word_tokens(title) {
        if char_len(token) < MIN_SPLIT_PART_LEN * 2
            || !token.chars().all(char::is_alphabetic)
            || is_acronym(token)
        {
            continue;
        }
        let word = token.to_lowercase();
        if reported.contains(&word)
            || brand.contains(&word)
            || SPELLING_IGNORELIST.contains(&word.as_str())
            || ctx.cache.is_known(&word)
        {
            continue;
        }
        let Some(parts) = ctx.cache.split_word(&word) else {
            continue;
        };
        if parts.len() < 2 {
            continue;
        }
        out.push(Finding::new(
            record,
            cat::MERGED_TITLE_WORDS,
            TITLE,
            format!("'{token}' looks like merged words: '{}'", parts.join(" ")),
            title,
        ));
        reported.insert(word);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::{record, run_rule};

    #[test]
    fn candidates_skip_exempt_tokens() {
        let brand: HashSet<String> = ["acme".to_string()].into_iter().collect();
        assert_eq!(spelling_candidate("cottn", 1, &brand).as_deref(), Some("cottn"));
        assert_eq!(spelling_candidate("Cottn", 0, &brand).as_deref(), Some("cottn"));
        assert_eq!(spelling_candidate("Cottn", 2, &brand), None);
        assert_eq!(spelling_candidate("NASA", 1, &brand), None);
        assert_eq!(spelling_candidate("usb", 1, &brand), None);
        assert_eq!(spelling_candidate("acme", 1, &brand), None);
        assert_eq!(spelling_candidate("10cm", 1, &brand), None);
        assert_eq!(spelling_candidate("xl", 1, &brand), None);
        assert_eq!(spelling_candidate("men's", 1, &brand).as_deref(), Some("men"));
        assert_eq!(spelling_candidate("o'neill", 1, &brand), None);
    }

    #[test]
    fn one_finding_per_distinct_misspelling() {
        let rec = record(&[
            ("id", "1"),
            ("title", "Soft cottn shirt with cottn pockets and jakcet"),
        ]);
        let findings = run_rule("title_spelling", &rec);
        assert_eq!(findings.len(), 2);
        assert!(findings[0].details.contains("'cotton'"));
        assert!(findings[1].details.contains("'jacket'"));
        assert!(findings.iter().all(|f| f.error_type == cat::TITLE_SPELLING));
    }

    #[test]
    fn words_without_suggestions_are_not_reported() {
        let rec = record(&[("id", "1"), ("description", "made from qwxzzy wool")]);
        assert!(run_rule("description_spelling", &rec).is_empty());
    }

    #[test]
    fn merged_words_are_split_once_per_token() {
        let rec = record(&[
            ("id", "1"),
            ("title", "Warm waterproofjacket for winter waterproofjacket"),
        ]);
        let findings = run_rule("title_merged_words", &rec);
        assert_eq!(findings.len(), 1);
        assert_eq!(
            findings[0].details,
            "'waterproofjacket' looks like merged words: 'waterproof jacket'"
        );
        let rec = record(&[("id", "1"), ("title", "Warm waterproof jacket")]);
        assert!(run_rule("title_merged_words", &rec).is_empty());
    }
}
