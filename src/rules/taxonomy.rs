use super::RuleContext;
use crate::constants::categories as cat;
use crate::constants::rules::{CATEGORY_SEPARATOR, MIN_CATEGORY_DEPTH};
use crate::data::{Finding, Record};
use crate::fields::{FieldKey, GOOGLE_PRODUCT_CATEGORY, PRODUCT_TYPE};

/// Why a category path is rejected.
#[derive(Debug, PartialEq, Eq)]
enum PathProblem {
    NotSet,
    Numeric,
    TooShallow(usize),
}

fn path_problem(value: Option<&str>) -> Option<PathProblem> {
    let Some(value) = value else {
        return Some(PathProblem::NotSet);
    };
    if value.chars().all(|ch| ch.is_ascii_digit()) {
        return Some(PathProblem::Numeric);
    }
    let depth = value
        .split(CATEGORY_SEPARATOR)
        .filter(|segment| !segment.trim().is_empty())
        .count();
    (depth < MIN_CATEGORY_DEPTH).then_some(PathProblem::TooShallow(depth))
}

fn check_path(
    record: &Record,
    field: FieldKey,
    label: &str,
    not_set: &str,
    not_specific: &str,
    out: &mut Vec<Finding>,
) {
    let value = record.value(field);
    let Some(problem) = path_problem(value) else {
        return;
    };
    let value = value.unwrap_or_default();
    let finding = match problem {
        PathProblem::NotSet => Finding::new(
            record,
            not_set,
            field,
            format!("{label} is empty"),
            value,
        ),
        PathProblem::Numeric => Finding::new(
            record,
            not_specific,
            field,
            format!("{label} is a numeric id; use the full '>'-separated path"),
            value,
        ),
        PathProblem::TooShallow(depth) => Finding::new(
            record,
            not_specific,
            field,
            format!("{label} has {depth} level(s); at least {MIN_CATEGORY_DEPTH} expected"),
            value,
        ),
    };
    out.push(finding);
}

pub(super) fn google_product_category(
    record: &Record,
    _ctx: &RuleContext<'_>,
    out: &mut Vec<Finding>,
) {
    check_path(
        record,
        GOOGLE_PRODUCT_CATEGORY,
        "Google product category",
        cat::CATEGORY_NOT_SET,
        cat::CATEGORY_NOT_SPECIFIC,
        out,
    );
}

pub(super) fn product_type(record: &Record, _ctx: &RuleContext<'_>, out: &mut Vec<Finding>) {
    check_path(
        record,
        PRODUCT_TYPE,
        "Product type",
        cat::PRODUCT_TYPE_NOT_SET,
        cat::PRODUCT_TYPE_NOT_SPECIFIC,
        out,
    );
}
