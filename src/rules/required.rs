use once_cell::sync::Lazy;
use regex::Regex;

use super::RuleContext;
use crate::constants::categories as cat;
use crate::constants::rules::{
    AVAILABILITY_VALUES, CONDITION_VALUES, GTIN_LENGTHS, MAX_ID_CHARS,
};
use crate::data::{Finding, Record};
use crate::fields::{
    AVAILABILITY, CONDITION, FieldKey, GTIN, ID, IMAGE_LINK, LINK, PRICE, REQUIRED,
};
use crate::utils::char_len;

static SCIENTIFIC_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\+?(\d+)(?:\.(\d*))?[eE]\+?(-?\d+)$").expect("Invalid scientific regex")
});
pub(super) static PRICE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[A-Z]{3}\s?)?(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d{1,2})?(?:\s?[A-Z]{3})?$")
        .expect("Invalid price regex")
});
static URL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://[^\s/$.?#][^\s]*$").expect("Invalid link regex"));

pub(super) fn required_fields(record: &Record, _ctx: &RuleContext<'_>, out: &mut Vec<Finding>) {
    for field in REQUIRED {
        if !record.has(field) {
            out.push(Finding::new(
                record,
                cat::MISSING_REQUIRED_FIELD,
                field,
                format!("Required field '{field}' is missing or empty"),
                "",
            ));
        }
    }
}

/// Count the digits of a GTIN cell once scientific notation is expanded.
///
/// Spreadsheets write long GTINs as `1.2345e7`; the expansion is exact and
/// drops the leading zeros it produces. The expanded digits are never built,
/// so huge exponents are counted rather than allocated; counts past `u64`
/// saturate. Returns `None` when the cell is not a non-negative integer.
pub(super) fn gtin_digit_count(raw: &str) -> Option<u64> {
    let value = raw.trim();
    let Some(caps) = SCIENTIFIC_PATTERN.captures(value) else {
        let numeric = !value.is_empty() && value.bytes().all(|byte| byte.is_ascii_digit());
        return numeric.then_some(value.len() as u64);
    };
    let int_part = caps.get(1).map_or("", |m| m.as_str());
    let frac_part = caps.get(2).map_or("", |m| m.as_str());
    let exponent = caps.get(3)?.as_str();
    let exponent = match exponent.parse::<i64>() {
        Ok(exponent) => i128::from(exponent),
        Err(_) if exponent.starts_with('-') => return None,
        Err(_) => return Some(u64::MAX),
    };
    let digits = format!("{int_part}{frac_part}");
    let point = int_part.len() as i128 + exponent;
    if point <= 0 {
        return None;
    }
    if point < digits.len() as i128 {
        let (whole, fraction) = digits.split_at(point as usize);
        if fraction.bytes().any(|byte| byte != b'0') {
            return None;
        }
        return Some(whole.trim_start_matches('0').len().max(1) as u64);
    }
    match digits.find(|ch| ch != '0') {
        Some(lead) => Some(u64::try_from(point - lead as i128).unwrap_or(u64::MAX)),
        None => Some(1),
    }
}

pub(super) fn gtin_length(record: &Record, _ctx: &RuleContext<'_>, out: &mut Vec<Finding>) {
    let Some(raw) = record.value(GTIN) else {
        return;
    };
    let Some(count) = gtin_digit_count(raw) else {
        return;
    };
    if !GTIN_LENGTHS.iter().any(|&len| len as u64 == count) {
        out.push(Finding::new(
            record,
            cat::GTIN_LENGTH,
            GTIN,
            format!("GTIN has {count} digits; expected 8, 12, 13 or 14"),
            raw,
        ));
    }
}

pub(super) fn price_format(record: &Record, _ctx: &RuleContext<'_>, out: &mut Vec<Finding>) {
    let Some(price) = record.value(PRICE) else {
        return;
    };
    if !PRICE_PATTERN.is_match(price) {
        out.push(Finding::new(
            record,
            cat::INVALID_PRICE,
            PRICE,
            "Price should look like '19.99 USD'",
            price,
        ));
    }
}

fn allowed_value(
    record: &Record,
    field: FieldKey,
    allowed: &[&str],
    category: &str,
    out: &mut Vec<Finding>,
) {
    let Some(value) = record.value(field) else {
        return;
    };
    let lower = value.to_lowercase();
    if !allowed.contains(&lower.as_str()) {
        out.push(Finding::new(
            record,
            category,
            field,
            format!("'{value}' is not one of: {}", allowed.join(", ")),
            value,
        ));
    }
}

pub(super) fn availability_value(
    record: &Record,
    _ctx: &RuleContext<'_>,
    out: &mut Vec<Finding>,
) {
    allowed_value(
        record,
        AVAILABILITY,
        AVAILABILITY_VALUES,
        cat::INVALID_AVAILABILITY,
        out,
    );
}

pub(super) fn condition_value(record: &Record, _ctx: &RuleContext<'_>, out: &mut Vec<Finding>) {
    allowed_value(record, CONDITION, CONDITION_VALUES, cat::INVALID_CONDITION, out);
}

fn url_check(record: &Record, field: FieldKey, category: &str, out: &mut Vec<Finding>) {
    let Some(url) = record.value(field) else {
        return;
    };
    if !URL_PATTERN.is_match(url) {
        out.push(Finding::new(
            record,
            category,
            field,
            format!("'{field}' must be an absolute http(s) URL"),
            url,
        ));
    }
}

pub(super) fn link_format(record: &Record, _ctx: &RuleContext<'_>, out: &mut Vec<Finding>) {
    url_check(record, LINK, cat::INVALID_LINK, out);
}

pub(super) fn image_link_format(record: &Record, _ctx: &RuleContext<'_>, out: &mut Vec<Finding>) {
    url_check(record, IMAGE_LINK, cat::INVALID_IMAGE_LINK, out);
}

pub(super) fn id_format(record: &Record, _ctx: &RuleContext<'_>, out: &mut Vec<Finding>) {
    let id = record.id();
    if id.is_empty() {
        return;
    }
    let problem = if char_len(id) > MAX_ID_CHARS {
        Some(format!("ID is longer than {MAX_ID_CHARS} characters"))
    } else if id.chars().any(|ch| ch.is_whitespace() || ch.is_control()) {
        Some("ID contains whitespace or control characters".to_string())
    } else {
        None
    };
    if let Some(problem) = problem {
        out.push(Finding::new(record, cat::INVALID_ID, ID, problem, id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::{record, run_rule};

    #[test]
    fn gtin_scientific_notation_is_expanded_exactly() {
        assert_eq!(gtin_digit_count("1.2345e7"), Some(8));
        assert_eq!(gtin_digit_count("4.006381333931E+12"), Some(13));
        assert_eq!(gtin_digit_count("1.23456789e3"), None);
        assert_eq!(gtin_digit_count("12345678"), Some(8));
        assert_eq!(gtin_digit_count("0.5e1"), Some(1));
        assert_eq!(gtin_digit_count("ABC-123"), None);
        assert_eq!(gtin_digit_count("5e-3"), None);
    }

    #[test]
    fn huge_exponents_are_counted_without_expanding() {
        assert_eq!(gtin_digit_count("1e99999999999"), Some(100_000_000_000));
        assert_eq!(
            gtin_digit_count("1e9223372036854775807"),
            Some(9_223_372_036_854_775_808)
        );
        assert_eq!(gtin_digit_count("1e99999999999999999999"), Some(u64::MAX));
        assert_eq!(gtin_digit_count("1e-9223372036854775808"), None);
        assert_eq!(gtin_digit_count("1e-99999999999999999999"), None);

        let rec = record(&[("id", "1"), ("gtin", "1e9223372036854775807")]);
        let findings = run_rule("gtin_length", &rec);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].value, "1e9223372036854775807");
    }

    #[test]
    fn gtin_length_flags_wrong_lengths_only() {
        let rec = record(&[("id", "1"), ("gtin", "1.2345e7")]);
        assert!(run_rule("gtin_length", &rec).is_empty());
        let rec = record(&[("id", "1"), ("gtin", "1234567")]);
        let findings = run_rule("gtin_length", &rec);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].error_type, cat::GTIN_LENGTH);
        assert_eq!(findings[0].value, "1234567");
        let rec = record(&[("id", "1"), ("gtin", "not-a-number")]);
        assert!(run_rule("gtin_length", &rec).is_empty());
        let rec = record(&[("id", "1"), ("gtin", "00012345678905")]);
        assert!(run_rule("gtin_length", &rec).is_empty());
    }

    #[test]
    fn required_fields_reports_each_missing_field() {
        let rec = record(&[
            ("id", "1"),
            ("title", "Tee"),
            ("description", ""),
            ("link", "https://shop.example/tee"),
            ("price", "9.99 USD"),
        ]);
        let findings = run_rule("required_fields", &rec);
        let missing: Vec<&str> = findings.iter().map(|f| f.affected_field.as_str()).collect();
        assert_eq!(missing, vec!["description", "image_link", "availability"]);
    }

    #[test]
    fn price_availability_condition_formats() {
        for price in ["19.99 USD", "USD 19.99", "1,299.00 EUR", "15 GBP"] {
            let rec = record(&[("id", "1"), ("price", price)]);
            assert!(run_rule("price_format", &rec).is_empty(), "{price}");
        }
        let rec = record(&[("id", "1"), ("price", "$19.99")]);
        assert_eq!(run_rule("price_format", &rec).len(), 1);

        let rec = record(&[("id", "1"), ("availability", "In Stock")]);
        assert!(run_rule("availability_value", &rec).is_empty());
        let rec = record(&[("id", "1"), ("availability", "maybe")]);
        assert_eq!(run_rule("availability_value", &rec).len(), 1);

        let rec = record(&[("id", "1"), ("condition", "mint")]);
        assert_eq!(
            run_rule("condition_value", &rec)[0].error_type,
            cat::INVALID_CONDITION
        );
    }

    #[test]
    fn links_and_ids_are_validated() {
        let rec = record(&[("id", "1"), ("link", "shop.example/tee")]);
        assert_eq!(run_rule("link_format", &rec).len(), 1);
        let rec = record(&[("id", "1"), ("image_link", "https://cdn.example/tee.jpg")]);
        assert!(run_rule("image_link_format", &rec).is_empty());

        let rec = record(&[("id", "sku 1")]);
        assert_eq!(run_rule("id_format", &rec).len(), 1);
        let long = "x".repeat(MAX_ID_CHARS + 1);
        let rec = record(&[("id", long.as_str())]);
        assert_eq!(run_rule("id_format", &rec).len(), 1);
        let rec = record(&[("id", "sku-1")]);
        assert!(run_rule("id_format", &rec).is_empty());
    }
}
