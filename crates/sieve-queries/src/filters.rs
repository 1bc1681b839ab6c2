//! Filters
//!
//! A filter maps a request key (`filter[name]`) to a named predicate. Filters
//! flagged multi-valued accept a list; each entry is ORed.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::params::QueryValue;

/// Value of an active filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// Single value (any filter)
    Single(String),
    /// Non-empty list of non-blank values (multi-valued filters only)
    Multiple(Vec<String>),
}

impl FilterValue {
    /// Get as list of strings
    pub fn as_strings(&self) -> Vec<&str> {
        match self {
            Self::Single(s) => vec![s.as_str()],
            Self::Multiple(values) => values.iter().map(String::as_str).collect(),
        }
    }

    /// Number of individual values
    pub fn count(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Multiple(values) => values.len(),
        }
    }

    /// Check whether `value` is one of the active values
    pub fn contains(&self, value: &str) -> bool {
        match self {
            Self::Single(s) => s == value,
            Self::Multiple(values) => values.iter().any(|v| v == value),
        }
    }

    pub fn is_multiple(&self) -> bool {
        matches!(self, Self::Multiple(_))
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        Self::Single(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        Self::Single(s)
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(values: Vec<String>) -> Self {
        Self::Multiple(values)
    }
}

impl From<Vec<&str>> for FilterValue {
    fn from(values: Vec<&str>) -> Self {
        Self::Multiple(values.into_iter().map(str::to_string).collect())
    }
}

impl From<&FilterValue> for QueryValue {
    fn from(value: &FilterValue) -> Self {
        match value {
            FilterValue::Single(s) => QueryValue::String(s.clone()),
            FilterValue::Multiple(values) => QueryValue::from(values.clone()),
        }
    }
}

impl From<FilterValue> for QueryValue {
    fn from(value: FilterValue) -> Self {
        QueryValue::from(&value)
    }
}

/// Declared filters for one model
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSchema {
    predicates: BTreeMap<String, String>,
    multi_valued: BTreeSet<String>,
}

impl FilterSchema {
    pub(crate) fn new(predicates: BTreeMap<String, String>, multi_valued: BTreeSet<String>) -> Self {
        Self {
            predicates,
            multi_valued,
        }
    }

    /// A model without declared filters ignores the whole `filter` parameter
    pub fn is_filterable(&self) -> bool {
        !self.predicates.is_empty()
    }

    /// Predicate id for a filter name
    pub fn predicate_for(&self, name: &str) -> Option<&str> {
        self.predicates.get(name).map(String::as_str)
    }

    pub fn is_multi_valued(&self, name: &str) -> bool {
        self.multi_valued.contains(name)
    }

    /// All `(filter name, predicate id)` pairs
    pub fn predicates(&self) -> impl Iterator<Item = (&str, &str)> {
        self.predicates.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn multi_valued(&self) -> impl Iterator<Item = &str> {
        self.multi_valued.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_value_strings() {
        let single = FilterValue::from("test");
        assert_eq!(single.as_strings(), vec!["test"]);
        assert_eq!(single.count(), 1);
        assert!(!single.is_multiple());

        let multiple = FilterValue::from(vec!["1", "2"]);
        assert_eq!(multiple.as_strings(), vec!["1", "2"]);
        assert_eq!(multiple.count(), 2);
        assert!(multiple.contains("2"));
        assert!(!multiple.contains("3"));
    }

    #[test]
    fn test_filter_schema_lookup() {
        let mut predicates = BTreeMap::new();
        predicates.insert("name".to_string(), "filter_by_name".to_string());
        let schema = FilterSchema::new(predicates, BTreeSet::new());

        assert!(schema.is_filterable());
        assert_eq!(schema.predicate_for("name"), Some("filter_by_name"));
        assert_eq!(schema.predicate_for("bogus"), None);
        assert!(!schema.is_multi_valued("name"));
    }

    #[test]
    fn test_empty_schema_is_not_filterable() {
        assert!(!FilterSchema::default().is_filterable());
    }
}
