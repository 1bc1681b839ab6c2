//! Filter chips
//!
//! Derives the removable "chips" a filter bar shows for the active filters,
//! from a catalogue of known filter options. Values not in the catalogue
//! produce no chip.

use serde::{Deserialize, Serialize};

use crate::state::QueryState;
use crate::url;

/// One selectable value of a filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOption {
    pub name: String,
    pub value: String,
}

/// A filter and the options it offers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterGroup {
    pub filter_name: String,
    #[serde(default)]
    pub options: Vec<FilterOption>,
}

impl FilterGroup {
    pub fn new(filter_name: impl Into<String>) -> Self {
        Self {
            filter_name: filter_name.into(),
            options: Vec::new(),
        }
    }

    pub fn option(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.push(FilterOption {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    fn find(&self, value: &str) -> Option<&FilterOption> {
        self.options.iter().find(|o| o.value == value)
    }
}

/// An active filter value with its display name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chip {
    /// Filter the value belongs to
    pub parent: String,
    pub name: String,
    pub value: String,
    /// True when the value is one entry of a list filter
    pub multi: bool,
}

impl Chip {
    /// URL with only this chip's value removed
    pub fn remove_url(&self, state: &QueryState, base_url: &str) -> String {
        if self.multi {
            url::remove_sub_filter(state, base_url, &self.parent, &self.value)
        } else {
            url::remove_filter(state, base_url, &self.parent)
        }
    }
}

/// Chips for every catalogued active value, in filter key order
pub fn active_chips(state: &QueryState, groups: &[FilterGroup]) -> Vec<Chip> {
    let mut chips = Vec::new();

    for (key, value) in state.filters() {
        let Some(group) = groups.iter().find(|g| &g.filter_name == key) else {
            continue;
        };

        let multi = value.is_multiple();
        for v in value.as_strings() {
            if let Some(option) = group.find(v) {
                chips.push(Chip {
                    parent: key.clone(),
                    name: option.name.clone(),
                    value: v.to_string(),
                    multi,
                });
            }
        }
    }

    chips
}

/// Active values across catalogued filters; `None` when there are none
pub fn active_filter_count(state: &QueryState, groups: &[FilterGroup]) -> Option<usize> {
    let count: usize = state
        .filters()
        .iter()
        .filter(|(key, _)| groups.iter().any(|g| &g.filter_name == *key))
        .map(|(_, value)| value.count())
        .sum();

    (count > 0).then_some(count)
}
