//! Text normalization helpers shared by ingestion and rule implementations.

use crate::constants::ingestion::{HEADER_WORD_SEPARATOR, UTF8_BOM};
use crate::constants::rules::{EXCERPT_CHARS, EXCERPT_ELLIPSIS, UNIT_TOKENS};

/// Collapse runs of whitespace into single spaces and trim.
pub fn normalize_inline_whitespace<T: AsRef<str>>(text: T) -> String {
    let mut normalized = String::new();
    let mut seen_space = false;
    for ch in text.as_ref().chars() {
        if ch.is_whitespace() {
            if !seen_space {
                normalized.push(' ');
                seen_space = true;
            }
        } else {
            normalized.push(ch);
            seen_space = false;
        }
    }
    normalized.trim().to_string()
}

/// Canonical column name: BOM stripped, whitespace collapsed, lower-cased,
/// internal spaces replaced with `_`.
pub fn normalize_field_name(header: &str) -> String {
    let without_bom = header.trim_start_matches(UTF8_BOM);
    normalize_inline_whitespace(without_bom)
        .to_lowercase()
        .replace(' ', &HEADER_WORD_SEPARATOR.to_string())
}

/// Truncate `value` to the excerpt length, appending an ellipsis when cut.
pub fn excerpt(value: &str) -> String {
    if value.chars().count() <= EXCERPT_CHARS {
        return value.to_string();
    }
    let mut out: String = value.chars().take(EXCERPT_CHARS).collect();
    out.push_str(EXCERPT_ELLIPSIS);
    out
}

/// Case-insensitive phrase search with word boundaries.
///
/// A boundary is only required on a side where the needle starts or ends with
/// an alphanumeric character, so `"% off"` still matches `"20% off"`.
pub fn contains_whole_phrase(haystack: &str, needle: &str) -> bool {
    let needle = needle.trim().to_lowercase();
    if needle.is_empty() {
        return false;
    }
    let haystack = haystack.to_lowercase();
    let needs_left = needle.chars().next().is_some_and(char::is_alphanumeric);
    let needs_right = needle.chars().last().is_some_and(char::is_alphanumeric);
    let mut from = 0;
    while let Some(pos) = haystack[from..].find(&needle) {
        let start = from + pos;
        let end = start + needle.len();
        let left_ok = !needs_left
            || haystack[..start]
                .chars()
                .next_back()
                .is_none_or(|ch| !ch.is_alphanumeric());
        let right_ok = !needs_right
            || haystack[end..]
                .chars()
                .next()
                .is_none_or(|ch| !ch.is_alphanumeric());
        if left_ok && right_ok {
            return true;
        }
        from = start + haystack[start..].chars().next().map_or(1, char::len_utf8);
    }
    false
}

/// Split text into word tokens, keeping inner apostrophes (`men's`).
pub fn word_tokens(text: &str) -> Vec<&str> {
    text.split(|ch: char| !(ch.is_alphanumeric() || ch == '\''))
        .map(|token| token.trim_matches('\''))
        .filter(|token| !token.is_empty())
        .collect()
}

/// True for numbers, measurements (`10cm`, `2.5kg`, `4x6`) and bare unit tokens.
pub fn is_measurement_token(token: &str) -> bool {
    let lower = token.to_lowercase();
    if UNIT_TOKENS.contains(&lower.as_str()) {
        return true;
    }
    let mut chars = lower.chars().peekable();
    let mut saw_digit = false;
    while let Some(&ch) = chars.peek() {
        if ch.is_ascii_digit() || ch == '.' || ch == ',' {
            saw_digit |= ch.is_ascii_digit();
            chars.next();
        } else {
            break;
        }
    }
    if !saw_digit {
        return false;
    }
    let rest: String = chars.collect();
    if rest.is_empty() || UNIT_TOKENS.contains(&rest.as_str()) {
        return true;
    }
    // dimension pairs such as 4x6 or 10x20cm
    if let Some(tail) = rest.strip_prefix('x') {
        return is_measurement_token(tail);
    }
    rest.chars().all(|ch| ch.is_ascii_digit())
}

/// Number of characters (not bytes) in `text`.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}
