//! Sort orders
//!
//! A sort maps a request key (`sort=name`) to a named ordering, optionally
//! paired with an explicit reverse ordering used instead of flipping.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use sieve_core::SchemaError;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending order (A-Z, 1-9, oldest first)
    #[default]
    Asc,
    /// Descending order (Z-A, 9-1, newest first)
    Desc,
}

impl SortDirection {
    /// Parse from the exact request spelling (`asc` or `desc`)
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }

    /// Convert to string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    /// Get the opposite direction
    pub fn reverse(&self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    pub fn is_desc(&self) -> bool {
        matches!(self, Self::Desc)
    }
}

impl std::fmt::Display for SortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Default sort declaration: a sort name, or a sort name with a direction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefaultSort {
    Name(String),
    Pair(String, SortDirection),
}

impl DefaultSort {
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) | Self::Pair(name, _) => name,
        }
    }

    pub fn direction(&self) -> SortDirection {
        match self {
            Self::Name(_) => SortDirection::Asc,
            Self::Pair(_, direction) => *direction,
        }
    }

    /// Interpret a dynamically supplied default sort.
    ///
    /// Accepts `"name"` or `["name", "asc" | "desc"]`; anything else is a
    /// configuration error.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, SchemaError> {
        use serde_json::Value;

        let invalid = || SchemaError::InvalidDefaultSort(value.to_string());

        match value {
            Value::String(name) if !name.is_empty() => Ok(Self::Name(name.clone())),
            Value::Array(items) => match items.as_slice() {
                [Value::String(name), Value::String(direction)] if !name.is_empty() => {
                    let direction = SortDirection::from_str(direction).ok_or_else(invalid)?;
                    Ok(Self::Pair(name.clone(), direction))
                }
                _ => Err(invalid()),
            },
            _ => Err(invalid()),
        }
    }
}

impl From<&str> for DefaultSort {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<(&str, SortDirection)> for DefaultSort {
    fn from((name, direction): (&str, SortDirection)) -> Self {
        Self::Pair(name.to_string(), direction)
    }
}

/// Declared sorts for one model
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortSchema {
    orderings: BTreeMap<String, String>,
    explicit_reverse: BTreeMap<String, String>,
    default_sort: Option<DefaultSort>,
}

impl SortSchema {
    pub(crate) fn new(
        orderings: BTreeMap<String, String>,
        explicit_reverse: BTreeMap<String, String>,
        default_sort: Option<DefaultSort>,
    ) -> Self {
        Self {
            orderings,
            explicit_reverse,
            default_sort,
        }
    }

    pub fn is_sortable(&self) -> bool {
        !self.orderings.is_empty()
    }

    pub fn has_sort(&self, name: &str) -> bool {
        self.orderings.contains_key(name)
    }

    /// Ordering id for a sort name
    pub fn ordering_for(&self, name: &str) -> Option<&str> {
        self.orderings.get(name).map(String::as_str)
    }

    /// Explicit reverse ordering id for a sort name, if declared
    pub fn reverse_ordering_for(&self, name: &str) -> Option<&str> {
        self.explicit_reverse.get(name).map(String::as_str)
    }

    pub fn default_sort(&self) -> Option<&DefaultSort> {
        self.default_sort.as_ref()
    }

    /// All `(sort name, ordering id)` pairs
    pub fn orderings(&self) -> impl Iterator<Item = (&str, &str)> {
        self.orderings.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
