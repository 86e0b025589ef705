use std::fmt;

pub use crate::constants::fields::*;

/// Canonical identifier for a normalized feed column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FieldKey {
    name: &'static str,
}

impl FieldKey {
    /// Create a field key with a canonical static name.
    pub const fn new(name: &'static str) -> Self {
        Self { name }
    }

    /// Return the raw (normalized) column name.
    pub const fn as_str(&self) -> &'static str {
        self.name
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl AsRef<str> for FieldKey {
    fn as_ref(&self) -> &str {
        self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_key_new_and_as_str_work() {
        const CUSTOM: FieldKey = FieldKey::new("custom_label_0");
        assert_eq!(CUSTOM.as_str(), "custom_label_0");
        assert_eq!(CUSTOM.to_string(), "custom_label_0");
        assert_eq!(GOOGLE_PRODUCT_CATEGORY.as_str(), "google_product_category");
    }

    #[test]
    fn required_fields_start_with_identifier() {
        assert_eq!(REQUIRED[0], ID);
        assert!(REQUIRED.contains(&TITLE));
        assert!(!REQUIRED.contains(&GTIN));
    }
}
