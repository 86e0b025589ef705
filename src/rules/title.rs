use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use super::RuleContext;
use crate::constants::categories as cat;
use crate::constants::rules::{
    MAX_TITLE_CHARS, MIN_ALL_CAPS_LETTERS, MIN_TITLE_CHARS, MIN_WORD_CHARS, PROMOTIONAL_PHRASES,
    STOPWORDS, TITLE_SPECIAL_CHARACTERS,
};
use crate::data::{Finding, Record};
use crate::fields::{BRAND, COLOR, FieldKey, MATERIAL, SIZE, TITLE};
use crate::utils::{char_len, contains_whole_phrase, is_measurement_token, word_tokens};

pub(super) static HTML_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)</?[a-z][a-z0-9]*(\s[^<>]*)?/?>|&(?:[a-z]+|#\d+);")
        .expect("Invalid HTML regex")
});

/// A `/`-separated value passes when the whole value or every part appears.
fn attribute_in_title(title: &str, value: &str) -> bool {
    if contains_whole_phrase(title, value) {
        return true;
    }
    if !value.contains('/') {
        return false;
    }
    let mut parts = value
        .split('/')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .peekable();
    parts.peek().is_some() && parts.all(|part| contains_whole_phrase(title, part))
}

fn attribute_check(
    record: &Record,
    attribute: FieldKey,
    label: &str,
    category: &str,
    out: &mut Vec<Finding>,
) {
    let (Some(title), Some(value)) = (record.value(TITLE), record.value(attribute)) else {
        return;
    };
    if !attribute_in_title(title, value) {
        out.push(Finding::new(
            record,
            category,
            TITLE,
            format!("{label} '{value}' does not appear in the title"),
            title,
        ));
    }
}

pub(super) fn size_in_title(record: &Record, _ctx: &RuleContext<'_>, out: &mut Vec<Finding>) {
    attribute_check(record, SIZE, "Size", cat::SIZE_NOT_IN_TITLE, out);
}

pub(super) fn color_in_title(record: &Record, _ctx: &RuleContext<'_>, out: &mut Vec<Finding>) {
    attribute_check(record, COLOR, "Color", cat::COLOR_NOT_IN_TITLE, out);
}

pub(super) fn brand_in_title(record: &Record, _ctx: &RuleContext<'_>, out: &mut Vec<Finding>) {
    attribute_check(record, BRAND, "Brand", cat::BRAND_NOT_IN_TITLE, out);
}

pub(super) fn material_in_title(record: &Record, _ctx: &RuleContext<'_>, out: &mut Vec<Finding>) {
    attribute_check(record, MATERIAL, "Material", cat::MATERIAL_NOT_IN_TITLE, out);
}

pub(super) fn duplicate_words(record: &Record, _ctx: &RuleContext<'_>, out: &mut Vec<Finding>) {
    let Some(title) = record.value(TITLE) else {
        return;
    };
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut order = Vec::new();
    for token in word_tokens(title) {
        let token = token.to_lowercase();
        if char_len(&token) < MIN_WORD_CHARS
            || is_measurement_token(&token)
            || STOPWORDS.contains(&token.as_str())
        {
            continue;
        }
        let count = counts.entry(token.clone()).or_insert(0);
        *count += 1;
        if *count == 2 {
            order.push(token);
        }
    }
    if order.is_empty() {
        return;
    }
    out.push(Finding::new(
        record,
        cat::DUPLICATE_TITLE_WORDS,
        TITLE,
        format!("Title repeats: {}", order.join(", ")),
        title,
    ));
}

pub(super) fn length(record: &Record, _ctx: &RuleContext<'_>, out: &mut Vec<Finding>) {
    let Some(title) = record.value(TITLE) else {
        return;
    };
    let chars = char_len(title);
    if chars > MAX_TITLE_CHARS {
        out.push(Finding::new(
            record,
            cat::TITLE_TOO_LONG,
            TITLE,
            format!("Title has {chars} characters (max {MAX_TITLE_CHARS})"),
            title,
        ));
    } else if chars < MIN_TITLE_CHARS {
        out.push(Finding::new(
            record,
            cat::TITLE_TOO_SHORT,
            TITLE,
            format!("Title has {chars} characters (min {MIN_TITLE_CHARS})"),
            title,
        ));
    }
}

/// Leading/trailing whitespace, runs of spaces, or embedded tabs/newlines.
pub(super) fn whitespace_problem(raw: &str) -> Option<&'static str> {
    if raw.trim().is_empty() {
        return None;
    }
    if raw.trim() != raw {
        return Some("leading or trailing whitespace");
    }
    if raw.contains("  ") {
        return Some("repeated spaces");
    }
    if raw.contains(['\t', '\n', '\r']) {
        return Some("tab or line break");
    }
    None
}

pub(super) fn whitespace(record: &Record, _ctx: &RuleContext<'_>, out: &mut Vec<Finding>) {
    let Some(raw) = record.raw(TITLE) else {
        return;
    };
    if let Some(problem) = whitespace_problem(raw) {
        out.push(Finding::new(
            record,
            cat::TITLE_WHITESPACE,
            TITLE,
            format!("Title contains {problem}"),
            raw,
        ));
    }
}

pub(super) fn special_characters(record: &Record, _ctx: &RuleContext<'_>, out: &mut Vec<Finding>) {
    let Some(title) = record.value(TITLE) else {
        return;
    };
    let mut found: Vec<char> = Vec::new();
    for ch in title.chars() {
        if TITLE_SPECIAL_CHARACTERS.contains(&ch) && !found.contains(&ch) {
            found.push(ch);
        }
    }
    if found.is_empty() {
        return;
    }
    let listed: Vec<String> = found.iter().map(|ch| ch.to_string()).collect();
    out.push(Finding::new(
        record,
        cat::TITLE_SPECIAL_CHARACTERS,
        TITLE,
        format!("Title contains special characters: {}", listed.join(" ")),
        title,
    ));
}

pub(super) fn all_caps(record: &Record, _ctx: &RuleContext<'_>, out: &mut Vec<Finding>) {
    let Some(title) = record.value(TITLE) else {
        return;
    };
    let letters: Vec<char> = title.chars().filter(|ch| ch.is_alphabetic()).collect();
    if letters.len() < MIN_ALL_CAPS_LETTERS
        || !letters.iter().any(|ch| ch.is_uppercase())
        || letters.iter().any(|ch| ch.is_lowercase())
    {
        return;
    }
    out.push(Finding::new(
        record,
        cat::TITLE_ALL_CAPS,
        TITLE,
        "Title is written entirely in capital letters",
        title,
    ));
}

pub(super) fn promotional_text(record: &Record, _ctx: &RuleContext<'_>, out: &mut Vec<Finding>) {
    let Some(title) = record.value(TITLE) else {
        return;
    };
    let found: Vec<&str> = PROMOTIONAL_PHRASES
        .iter()
        .copied()
        .filter(|phrase| contains_whole_phrase(title, phrase))
        .collect();
    if found.is_empty() {
        return;
    }
    out.push(Finding::new(
        record,
        cat::TITLE_PROMOTIONAL,
        TITLE,
        format!("Title contains promotional text: {}", found.join(", ")),
        title,
    ));
}

pub(super) fn html(record: &Record, _ctx: &RuleContext<'_>, out: &mut Vec<Finding>) {
    let Some(title) = record.value(TITLE) else {
        return;
    };
    if let Some(found) = HTML_PATTERN.find(title) {
        out.push(Finding::new(
            record,
            cat::TITLE_HTML,
            TITLE,
            format!("Title contains HTML markup '{}'", found.as_str()),
            title,
        ));
    }
}
