use ahash::AHashMap;

use crate::error::{RegionError, Result};

/// A string-keyed attribute bag carried by locations and populations.
///
/// Values are stored as text; the typed getters parse on access. Absent
/// attributes read as `false` / `0` rather than erroring, since datasets
/// commonly set flags only where they apply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    values: AHashMap<String, String>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// True iff the attribute is present and reads as "true" (any case).
    pub fn get_bool(&self, name: &str) -> bool {
        self.values
            .get(name)
            .is_some_and(|v| v.eq_ignore_ascii_case("true"))
    }

    /// Numeric value of the attribute, `0.0` when absent.
    pub fn get_number(&self, name: &str) -> Result<f64> {
        match self.values.get(name) {
            None => Ok(0.0),
            Some(value) => value.parse().map_err(|_| RegionError::InvalidAttribute {
                name: name.to_string(),
                value: value.clone(),
            }),
        }
    }

    /// Integer value of the attribute (numeric text truncated), `0` when
    /// absent.
    pub fn get_integer(&self, name: &str) -> Result<i64> {
        Ok(self.get_number(name)? as i64)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_defaults_to_false() {
        let mut attrs = Attributes::new();
        attrs.set("IsHighSchool", "true");
        attrs.set("SupportsFarms", "false");

        assert!(attrs.get_bool("IsHighSchool"));
        assert!(!attrs.get_bool("SupportsFarms"));
        assert!(!attrs.get_bool("NeverSet"));
    }

    #[test]
    fn numbers_parse_and_truncate() {
        let mut attrs = Attributes::new();
        attrs.set("Number of Partnered Men", "450");
        attrs.set("Mean Household Size", "2.6");

        assert_eq!(attrs.get_number("Number of Partnered Men").unwrap(), 450.0);
        assert_eq!(attrs.get_integer("Mean Household Size").unwrap(), 2);
        assert_eq!(attrs.get_number("NeverSet").unwrap(), 0.0);
    }

    #[test]
    fn non_numeric_value_is_an_error() {
        let mut attrs = Attributes::new();
        attrs.set("Population", "lots");

        assert!(matches!(
            attrs.get_number("Population"),
            Err(RegionError::InvalidAttribute { .. })
        ));
    }

    #[test]
    fn set_overwrites() {
        let mut attrs = Attributes::new();
        attrs.set("Zone", "rural");
        attrs.set("Zone", "urban");

        assert_eq!(attrs.get("Zone"), Some("urban"));
        assert_eq!(attrs.len(), 1);
    }
}
