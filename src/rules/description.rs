use once_cell::sync::Lazy;
use regex::Regex;

use super::RuleContext;
use super::title::{HTML_PATTERN, whitespace_problem};
use crate::constants::categories as cat;
use crate::constants::rules::{MAX_DESCRIPTION_CHARS, MIN_DESCRIPTION_CHARS};
use crate::data::{Finding, Record};
use crate::fields::{DESCRIPTION, TITLE};
use crate::utils::{char_len, normalize_inline_whitespace};

static REPEATED_PUNCTUATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"!{2,}|\?{2,}|,{2,}|;{2,}|\.{4,}").expect("Invalid punctuation regex")
});
static URL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bhttps?://\S+|\bwww\.[a-z0-9-]+\.\S+").expect("Invalid URL regex")
});

/// Returns `true` when a comma is followed by a non-space character,
/// except between two digits (`6,886,187`).
pub(super) fn has_missing_space_after_comma(text: &str) -> bool {
    let chars: Vec<char> = text.chars().collect();
    chars.iter().enumerate().any(|(idx, &ch)| {
        if ch != ',' {
            return false;
        }
        let Some(&next) = chars.get(idx + 1) else {
            return false;
        };
        if next.is_whitespace() {
            return false;
        }
        let prev_digit = idx > 0 && chars[idx - 1].is_ascii_digit();
        !(prev_digit && next.is_ascii_digit())
    })
}

pub(super) fn missing_space_after_comma(
    record: &Record,
    _ctx: &RuleContext<'_>,
    out: &mut Vec<Finding>,
) {
    let Some(description) = record.value(DESCRIPTION) else {
        return;
    };
    if has_missing_space_after_comma(description) {
        out.push(Finding::new(
            record,
            cat::MISSING_SPACE_AFTER_COMMA,
            DESCRIPTION,
            "Description has a comma not followed by a space",
            description,
        ));
    }
}

pub(super) fn length(record: &Record, _ctx: &RuleContext<'_>, out: &mut Vec<Finding>) {
    let Some(description) = record.value(DESCRIPTION) else {
        return;
    };
    let chars = char_len(description);
    if chars < MIN_DESCRIPTION_CHARS {
        out.push(Finding::new(
            record,
            cat::DESCRIPTION_TOO_SHORT,
            DESCRIPTION,
            format!("Description has {chars} characters (min {MIN_DESCRIPTION_CHARS})"),
            description,
        ));
    } else if chars > MAX_DESCRIPTION_CHARS {
        out.push(Finding::new(
            record,
            cat::DESCRIPTION_TOO_LONG,
            DESCRIPTION,
            format!("Description has {chars} characters (max {MAX_DESCRIPTION_CHARS})"),
            description,
        ));
    }
}

pub(super) fn html(record: &Record, _ctx: &RuleContext<'_>, out: &mut Vec<Finding>) {
    let Some(description) = record.value(DESCRIPTION) else {
        return;
    };
    if let Some(found) = HTML_PATTERN.find(description) {
        out.push(Finding::new(
            record,
            cat::DESCRIPTION_HTML,
            DESCRIPTION,
            format!("Description contains HTML markup '{}'", found.as_str()),
            description,
        ));
    }
}

pub(super) fn repeated_punctuation(
    record: &Record,
    _ctx: &RuleContext<'_>,
    out: &mut Vec<Finding>,
) {
    let Some(description) = record.value(DESCRIPTION) else {
        return;
    };
    if let Some(found) = REPEATED_PUNCTUATION.find(description) {
        out.push(Finding::new(
            record,
            cat::DESCRIPTION_REPEATED_PUNCTUATION,
            DESCRIPTION,
            format!("Description repeats punctuation '{}'", found.as_str()),
            description,
        ));
    }
}

pub(super) fn same_as_title(record: &Record, _ctx: &RuleContext<'_>, out: &mut Vec<Finding>) {
    let (Some(title), Some(description)) = (record.value(TITLE), record.value(DESCRIPTION)) else {
        return;
    };
    if normalize_inline_whitespace(title).to_lowercase()
        == normalize_inline_whitespace(description).to_lowercase()
    {
        out.push(Finding::new(
            record,
            cat::DESCRIPTION_SAME_AS_TITLE,
            DESCRIPTION,
            "Description repeats the title verbatim",
            description,
        ));
    }
}

pub(super) fn url(record: &Record, _ctx: &RuleContext<'_>, out: &mut Vec<Finding>) {
    let Some(description) = record.value(DESCRIPTION) else {
        return;
    };
    if let Some(found) = URL_PATTERN.find(description) {
        out.push(Finding::new(
            record,
            cat::DESCRIPTION_URL,
            DESCRIPTION,
            format!("Description contains a URL '{}'", found.as_str()),
            description,
        ));
    }
}

pub(super) fn whitespace(record: &Record, _ctx: &RuleContext<'_>, out: &mut Vec<Finding>) {
    let Some(raw) = record.raw(DESCRIPTION) else {
        return;
    };
    // line breaks are legitimate in descriptions
    let problem = match whitespace_problem(raw) {
        Some("tab or line break") | None => return,
        Some(problem) => problem,
    };
    out.push(Finding::new(
        record,
        cat::DESCRIPTION_WHITESPACE,
        DESCRIPTION,
        format!("Description contains {problem}"),
        raw,
    ));
}
