use super::RuleContext;
use crate::constants::categories as cat;
use crate::constants::rules::{PLACEHOLDER_VALUES, PROHIBITED_TERMS};
use crate::data::{Finding, Record};
use crate::fields::{BRAND, DESCRIPTION, TITLE};
use crate::utils::contains_whole_phrase;

pub(super) fn prohibited_terms(record: &Record, _ctx: &RuleContext<'_>, out: &mut Vec<Finding>) {
    for field in [TITLE, DESCRIPTION] {
        let Some(value) = record.value(field) else {
            continue;
        };
        let found: Vec<&str> = PROHIBITED_TERMS
            .iter()
            .copied()
            .filter(|term| contains_whole_phrase(value, term))
            .collect();
        if found.is_empty() {
            continue;
        }
        out.push(Finding::new(
            record,
            cat::PROHIBITED_TERM,
            field,
            format!("'{field}' contains prohibited terms: {}", found.join(", ")),
            value,
        ));
    }
}

/// Multi-word placeholders match anywhere; single tokens only as the whole value.
fn is_placeholder(value: &str) -> bool {
    let lower = value.trim().to_lowercase();
    PLACEHOLDER_VALUES.iter().any(|placeholder| {
        lower == *placeholder
            || (placeholder.contains(' ') && contains_whole_phrase(&lower, placeholder))
    })
}

pub(super) fn placeholder_text(record: &Record, _ctx: &RuleContext<'_>, out: &mut Vec<Finding>) {
    for field in [TITLE, DESCRIPTION, BRAND] {
        let Some(value) = record.value(field) else {
            continue;
        };
        if is_placeholder(value) {
            out.push(Finding::new(
                record,
                cat::PLACEHOLDER_TEXT,
                field,
                format!("'{field}' contains placeholder text"),
                value,
            ));
        }
    }
}
