//! Static rule registry and per-run rule selection.
//!
//! Every rule is a plain function over one [`Record`] registered under a
//! stable symbolic name. Callers enable rules by name; [`RuleSet::resolve`]
//! validates the names once per run and keeps registry order.

mod consistency;
mod description;
mod prohibited;
mod required;
mod spelling;
mod taxonomy;
mod title;

use std::collections::HashSet;
use std::fmt;

use tracing::warn;

use crate::constants::categories as cat;
use crate::correction::CorrectionCache;
use crate::data::{Finding, Record};
use crate::types::RuleName;

/// Name of the run-scoped duplicate-identifier rule.
pub const DUPLICATE_IDS: &str = "duplicate_ids";

/// Concern a rule belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RuleGroup {
    /// Title hygiene.
    Title,
    /// Description hygiene.
    Description,
    /// Category and product-type structure.
    Category,
    /// Required-field presence and format.
    Required,
    /// Cross-attribute consistency.
    Consistency,
    /// Prohibited or placeholder content.
    Prohibited,
    /// Dictionary-backed checks.
    Spelling,
    /// Evaluated by the coordinator over the whole run.
    RunScoped,
}

impl fmt::Display for RuleGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RuleGroup::Title => "title",
            RuleGroup::Description => "description",
            RuleGroup::Category => "category",
            RuleGroup::Required => "required",
            RuleGroup::Consistency => "consistency",
            RuleGroup::Prohibited => "prohibited",
            RuleGroup::Spelling => "spelling",
            RuleGroup::RunScoped => "run-scoped",
        };
        f.write_str(label)
    }
}

/// Per-record cost class; drives batch sizing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RuleCost {
    /// Plain string comparisons.
    Cheap,
    /// Regex scans or phrase lists.
    Moderate,
    /// Dictionary lookups through the correction cache.
    Spelling,
}

/// Shared state borrowed by rule functions.
#[derive(Clone, Copy)]
pub struct RuleContext<'a> {
    /// Correction cache used by spelling-class rules.
    pub cache: &'a CorrectionCache,
}

/// Signature of a record-scoped rule.
pub type RecordCheck = fn(&Record, &RuleContext<'_>, &mut Vec<Finding>);

/// How a rule is executed.
#[derive(Clone, Copy)]
pub enum RuleKind {
    /// Applied by workers to each record.
    Record(RecordCheck),
    /// Applied by the coordinator across the run.
    RunScoped,
}

/// One registry entry.
pub struct RuleSpec {
    /// Stable symbolic name used to enable the rule.
    pub name: &'static str,
    /// Concern the rule belongs to.
    pub group: RuleGroup,
    /// Cost class.
    pub cost: RuleCost,
    /// Finding categories the rule can emit.
    pub categories: &'static [&'static str],
    /// Execution strategy.
    pub kind: RuleKind,
}

impl fmt::Debug for RuleSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleSpec")
            .field("name", &self.name)
            .field("group", &self.group)
            .field("cost", &self.cost)
            .field("categories", &self.categories)
            .finish()
    }
}

macro_rules! rule {
    ($name:literal, $group:ident, $cost:ident, [$($category:expr),+ $(,)?], $check:path) => {
        RuleSpec {
            name: $name,
            group: RuleGroup::$group,
            cost: RuleCost::$cost,
            categories: &[$($category),+],
            kind: RuleKind::Record($check),
        }
    };
}

static REGISTRY: &[RuleSpec] = &[
    rule!("title_size", Title, Cheap, [cat::SIZE_NOT_IN_TITLE], title::size_in_title),
    rule!("title_color", Title, Cheap, [cat::COLOR_NOT_IN_TITLE], title::color_in_title),
    rule!("title_brand", Title, Cheap, [cat::BRAND_NOT_IN_TITLE], title::brand_in_title),
    rule!("title_material", Title, Cheap, [cat::MATERIAL_NOT_IN_TITLE], title::material_in_title),
    rule!(
        "title_duplicate_words",
        Title,
        Moderate,
        [cat::DUPLICATE_TITLE_WORDS],
        title::duplicate_words
    ),
    rule!("title_length", Title, Cheap, [cat::TITLE_TOO_LONG, cat::TITLE_TOO_SHORT], title::length),
    rule!("title_whitespace", Title, Cheap, [cat::TITLE_WHITESPACE], title::whitespace),
    rule!(
        "title_special_characters",
        Title,
        Cheap,
        [cat::TITLE_SPECIAL_CHARACTERS],
        title::special_characters
    ),
    rule!("title_all_caps", Title, Cheap, [cat::TITLE_ALL_CAPS], title::all_caps),
    rule!(
        "title_promotional_text",
        Title,
        Moderate,
        [cat::TITLE_PROMOTIONAL],
        title::promotional_text
    ),
    rule!("title_html", Title, Cheap, [cat::TITLE_HTML], title::html),
    rule!(
        "description_missing_space_after_comma",
        Description,
        Cheap,
        [cat::MISSING_SPACE_AFTER_COMMA],
        description::missing_space_after_comma
    ),
    rule!(
        "description_length",
        Description,
        Cheap,
        [cat::DESCRIPTION_TOO_SHORT, cat::DESCRIPTION_TOO_LONG],
        description::length
    ),
    rule!("description_html", Description, Cheap, [cat::DESCRIPTION_HTML], description::html),
    rule!(
        "description_repeated_punctuation",
        Description,
        Cheap,
        [cat::DESCRIPTION_REPEATED_PUNCTUATION],
        description::repeated_punctuation
    ),
    rule!(
        "description_same_as_title",
        Description,
        Cheap,
        [cat::DESCRIPTION_SAME_AS_TITLE],
        description::same_as_title
    ),
    rule!("description_url", Description, Moderate, [cat::DESCRIPTION_URL], description::url),
    rule!(
        "description_whitespace",
        Description,
        Cheap,
        [cat::DESCRIPTION_WHITESPACE],
        description::whitespace
    ),
    rule!(
        "google_product_category",
        Category,
        Cheap,
        [cat::CATEGORY_NOT_SET, cat::CATEGORY_NOT_SPECIFIC],
        taxonomy::google_product_category
    ),
    rule!(
        "product_type",
        Category,
        Cheap,
        [cat::PRODUCT_TYPE_NOT_SET, cat::PRODUCT_TYPE_NOT_SPECIFIC],
        taxonomy::product_type
    ),
    rule!(
        "required_fields",
        Required,
        Cheap,
        [cat::MISSING_REQUIRED_FIELD],
        required::required_fields
    ),
    rule!("gtin_length", Required, Cheap, [cat::GTIN_LENGTH], required::gtin_length),
    rule!("price_format", Required, Cheap, [cat::INVALID_PRICE], required::price_format),
    rule!(
        "availability_value",
        Required,
        Cheap,
        [cat::INVALID_AVAILABILITY],
        required::availability_value
    ),
    rule!("condition_value", Required, Cheap, [cat::INVALID_CONDITION], required::condition_value),
    rule!("link_format", Required, Cheap, [cat::INVALID_LINK], required::link_format),
    rule!(
        "image_link_format",
        Required,
        Cheap,
        [cat::INVALID_IMAGE_LINK],
        required::image_link_format
    ),
    rule!("id_format", Required, Cheap, [cat::INVALID_ID], required::id_format),
    rule!("sale_price", Consistency, Cheap, [cat::SALE_PRICE_NOT_LOWER], consistency::sale_price),
    rule!("gender_value", Consistency, Cheap, [cat::INVALID_GENDER], consistency::gender_value),
    rule!(
        "age_group_value",
        Consistency,
        Cheap,
        [cat::INVALID_AGE_GROUP],
        consistency::age_group_value
    ),
    rule!(
        "apparel_attributes",
        Consistency,
        Cheap,
        [cat::MISSING_APPAREL_ATTRIBUTES],
        consistency::apparel_attributes
    ),
    rule!(
        "product_identifiers",
        Consistency,
        Cheap,
        [cat::MISSING_PRODUCT_IDENTIFIERS],
        consistency::product_identifiers
    ),
    rule!(
        "prohibited_terms",
        Prohibited,
        Moderate,
        [cat::PROHIBITED_TERM],
        prohibited::prohibited_terms
    ),
    rule!(
        "placeholder_text",
        Prohibited,
        Cheap,
        [cat::PLACEHOLDER_TEXT],
        prohibited::placeholder_text
    ),
    rule!("title_spelling", Spelling, Spelling, [cat::TITLE_SPELLING], spelling::title_spelling),
    rule!(
        "description_spelling",
        Spelling,
        Spelling,
        [cat::DESCRIPTION_SPELLING],
        spelling::description_spelling
    ),
    rule!(
        "title_merged_words",
        Spelling,
        Spelling,
        [cat::MERGED_TITLE_WORDS],
        spelling::merged_words
    ),
    RuleSpec {
        name: DUPLICATE_IDS,
        group: RuleGroup::RunScoped,
        cost: RuleCost::Cheap,
        categories: &[cat::DUPLICATE_ID],
        kind: RuleKind::RunScoped,
    },
];

/// Every registered rule, in registry order.
pub fn registry() -> &'static [RuleSpec] {
    REGISTRY
}

/// Look up a rule by symbolic name.
pub fn lookup(name: &str) -> Option<&'static RuleSpec> {
    REGISTRY.iter().find(|spec| spec.name == name)
}

/// Rules enabled for one run, in registry order.
#[derive(Clone, Debug, Default)]
pub struct RuleSet {
    rules: Vec<&'static RuleSpec>,
    unknown: Vec<RuleName>,
}

impl RuleSet {
    /// Resolve symbolic names against the registry.
    ///
    /// Unknown names are dropped with one warning each; duplicates collapse.
    pub fn resolve<S: AsRef<str>>(names: &[S]) -> Self {
        let mut wanted = HashSet::new();
        let mut unknown = Vec::new();
        for name in names {
            let name = name.as_ref().trim();
            if lookup(name).is_some() {
                wanted.insert(name.to_string());
            } else if !unknown.iter().any(|seen| seen == name) {
                warn!(rule = name, "ignoring unknown rule name");
                unknown.push(name.to_string());
            }
        }
        Self {
            rules: REGISTRY
                .iter()
                .filter(|spec| wanted.contains(spec.name))
                .collect(),
            unknown,
        }
    }

    /// Every registered rule.
    pub fn all() -> Self {
        Self {
            rules: REGISTRY.iter().collect(),
            unknown: Vec::new(),
        }
    }

    /// Enabled rule names in registry order.
    pub fn names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|spec| spec.name).collect()
    }

    /// Names that did not match any rule.
    pub fn unknown(&self) -> &[RuleName] {
        &self.unknown
    }

    /// Cost classes of the enabled rules.
    pub fn costs(&self) -> impl Iterator<Item = RuleCost> + '_ {
        self.rules.iter().map(|spec| spec.cost)
    }

    /// Returns `true` when `name` is enabled.
    pub fn contains(&self, name: &str) -> bool {
        self.rules.iter().any(|spec| spec.name == name)
    }

    /// Returns `true` when coordinator-side duplicate tracking is enabled.
    pub fn tracks_duplicate_ids(&self) -> bool {
        self.contains(DUPLICATE_IDS)
    }

    /// Returns `true` when any spelling-class rule is enabled.
    pub fn uses_spelling(&self) -> bool {
        self.costs().any(|cost| cost == RuleCost::Spelling)
    }

    /// Copy of this set with every spelling-class rule removed.
    pub fn without_spelling(&self) -> Self {
        Self {
            rules: self
                .rules
                .iter()
                .copied()
                .filter(|spec| spec.cost != RuleCost::Spelling)
                .collect(),
            unknown: self.unknown.clone(),
        }
    }

    /// Number of enabled rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` when no rule is enabled.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Apply the record-scoped rules to `record`, in registry order.
    pub fn apply(&self, record: &Record, ctx: &RuleContext<'_>) -> Vec<Finding> {
        let mut findings = Vec::new();
        for spec in &self.rules {
            if let RuleKind::Record(check) = spec.kind {
                check(record, ctx, &mut findings);
            }
        }
        findings
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::correction::{CorrectionCache, WordListDictionary};
    use crate::data::{Finding, Record};

    use super::{RuleContext, RuleKind, lookup};

    pub fn record(pairs: &[(&str, &str)]) -> Record {
        Record::from_pairs(pairs.iter().map(|(key, value)| (*key, *value)))
    }

    pub fn cache() -> CorrectionCache {
        CorrectionCache::in_memory(Box::new(WordListDictionary::from_words([
            "cotton", "shirt", "jacket", "waterproof", "leather", "classic", "soft", "mens",
            "comfortable", "blue", "red", "with", "pockets", "and", "the", "for", "made",
            "from", "wool", "warm", "winter", "coat",
        ])))
    }

    /// Run one registered rule against `record`.
    pub fn run_rule(name: &str, record: &Record) -> Vec<Finding> {
        let cache = cache();
        let ctx = RuleContext { cache: &cache };
        let mut out = Vec::new();
        if let Some(spec) = lookup(name)
            && let RuleKind::Record(check) = spec.kind
        {
            check(record, &ctx, &mut out);
        }
        out
    }
}
