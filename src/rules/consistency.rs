use super::RuleContext;
use crate::constants::categories as cat;
use crate::constants::rules::{AGE_GROUP_VALUES, APPAREL_CATEGORY_MARKER, GENDER_VALUES};
use crate::data::{Finding, Record};
use crate::fields::{
    AGE_GROUP, BRAND, COLOR, FieldKey, GENDER, GOOGLE_PRODUCT_CATEGORY, GTIN, IDENTIFIER_EXISTS,
    MPN, PRICE, SALE_PRICE, SIZE,
};

/// Numeric amount and optional currency code of a price cell.
fn parse_amount(value: &str) -> Option<(f64, Option<String>)> {
    let mut number = String::new();
    let mut currency = String::new();
    for ch in value.chars() {
        if ch.is_ascii_digit() || ch == '.' {
            number.push(ch);
        } else if ch.is_ascii_alphabetic() {
            currency.push(ch.to_ascii_uppercase());
        } else if ch != ',' && !ch.is_whitespace() {
            return None;
        }
    }
    let amount = number.parse::<f64>().ok()?;
    Some((amount, (!currency.is_empty()).then_some(currency)))
}

pub(super) fn sale_price(record: &Record, _ctx: &RuleContext<'_>, out: &mut Vec<Finding>) {
    let (Some(price), Some(sale)) = (record.value(PRICE), record.value(SALE_PRICE)) else {
        return;
    };
    let (Some((regular, regular_currency)), Some((discounted, sale_currency))) =
        (parse_amount(price), parse_amount(sale))
    else {
        return;
    };
    if regular_currency.is_some() && sale_currency.is_some() && regular_currency != sale_currency {
        return;
    }
    if discounted >= regular {
        out.push(Finding::new(
            record,
            cat::SALE_PRICE_NOT_LOWER,
            SALE_PRICE,
            format!("Sale price {sale} is not lower than price {price}"),
            sale,
        ));
    }
}

fn enumerated(
    record: &Record,
    field: FieldKey,
    allowed: &[&str],
    category: &str,
    out: &mut Vec<Finding>,
) {
    let Some(value) = record.value(field) else {
        return;
    };
    if !allowed.contains(&value.to_lowercase().as_str()) {
        out.push(Finding::new(
            record,
            category,
            field,
            format!("'{value}' is not one of: {}", allowed.join(", ")),
            value,
        ));
    }
}

pub(super) fn gender_value(record: &Record, _ctx: &RuleContext<'_>, out: &mut Vec<Finding>) {
    enumerated(record, GENDER, GENDER_VALUES, cat::INVALID_GENDER, out);
}

pub(super) fn age_group_value(record: &Record, _ctx: &RuleContext<'_>, out: &mut Vec<Finding>) {
    enumerated(record, AGE_GROUP, AGE_GROUP_VALUES, cat::INVALID_AGE_GROUP, out);
}

pub(super) fn apparel_attributes(record: &Record, _ctx: &RuleContext<'_>, out: &mut Vec<Finding>) {
    let Some(category) = record.value(GOOGLE_PRODUCT_CATEGORY) else {
        return;
    };
    if !category.to_lowercase().contains(APPAREL_CATEGORY_MARKER) {
        return;
    }
    let missing: Vec<&str> = [COLOR, SIZE, GENDER, AGE_GROUP]
        .into_iter()
        .filter(|field| !record.has(*field))
        .map(|field| field.as_str())
        .collect();
    if missing.is_empty() {
        return;
    }
    out.push(Finding::new(
        record,
        cat::MISSING_APPAREL_ATTRIBUTES,
        GOOGLE_PRODUCT_CATEGORY,
        format!("Apparel product is missing: {}", missing.join(", ")),
        category,
    ));
}

pub(super) fn product_identifiers(
    record: &Record,
    _ctx: &RuleContext<'_>,
    out: &mut Vec<Finding>,
) {
    let declared_absent = record
        .value(IDENTIFIER_EXISTS)
        .is_some_and(|value| matches!(value.to_lowercase().as_str(), "no" | "false" | "n"));
    if declared_absent || record.has(GTIN) || (record.has(BRAND) && record.has(MPN)) {
        return;
    }
    out.push(Finding::new(
        record,
        cat::MISSING_PRODUCT_IDENTIFIERS,
        GTIN,
        "Provide a GTIN, or both brand and MPN, or set identifier_exists to 'no'",
        "",
    ));
}
