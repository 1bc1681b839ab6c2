//! Schema declaration
//!
//! Each filterable model declares which filters and sorts it accepts. The
//! schema is fixed at startup and shared read-only between requests.

use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};

use sieve_core::{SchemaError, SchemaResult};

use crate::filters::FilterSchema;
use crate::sorts::{DefaultSort, SortSchema};

/// Validated schema for one model
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    pub filters: FilterSchema,
    pub sorts: SortSchema,
    /// Per-model override of the configured maximum page size
    pub max_per_page: Option<u32>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Schema accepting no filters and no sorts
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Builder for [`Schema`]
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    predicates: BTreeMap<String, String>,
    multi_valued: BTreeSet<String>,
    orderings: BTreeMap<String, String>,
    explicit_reverse: BTreeMap<String, String>,
    default_sort: Option<DefaultSort>,
    max_per_page: Option<u32>,
}

impl SchemaBuilder {
    /// Declare a filter backed by a predicate id
    pub fn filter(mut self, name: impl Into<String>, predicate: impl Into<String>) -> Self {
        self.predicates.insert(name.into(), predicate.into());
        self
    }

    /// Allow a declared filter to take several ORed values
    pub fn multi_valued(mut self, name: impl Into<String>) -> Self {
        self.multi_valued.insert(name.into());
        self
    }

    /// Declare a sort backed by an ordering id
    pub fn sort(mut self, name: impl Into<String>, ordering: impl Into<String>) -> Self {
        self.orderings.insert(name.into(), ordering.into());
        self
    }

    /// Declare the ordering used for a descending sort instead of flipping
    pub fn reverse_sort(mut self, name: impl Into<String>, ordering: impl Into<String>) -> Self {
        self.explicit_reverse.insert(name.into(), ordering.into());
        self
    }

    pub fn default_sort(mut self, default_sort: impl Into<DefaultSort>) -> Self {
        self.default_sort = Some(default_sort.into());
        self
    }

    pub fn max_per_page(mut self, max_per_page: u32) -> Self {
        self.max_per_page = Some(max_per_page);
        self
    }

    /// Validate cross references and build the schema
    pub fn build(self) -> SchemaResult<Schema> {
        if let Some(name) = self
            .multi_valued
            .iter()
            .find(|name| !self.predicates.contains_key(*name))
        {
            return Err(SchemaError::UnknownMultiValuedFilter(name.clone()));
        }

        if let Some(name) = self
            .explicit_reverse
            .keys()
            .find(|name| !self.orderings.contains_key(*name))
        {
            return Err(SchemaError::UnknownReverseSort(name.clone()));
        }

        if let Some(default_sort) = &self.default_sort {
            if !self.orderings.contains_key(default_sort.name()) {
                return Err(SchemaError::UnknownDefaultSort(default_sort.name().to_string()));
            }
        }

        if self.max_per_page == Some(0) {
            return Err(SchemaError::InvalidMaxPerPage);
        }

        tracing::debug!(
            filters = self.predicates.len(),
            multi_valued = self.multi_valued.len(),
            sorts = self.orderings.len(),
            "Built filter schema"
        );

        Ok(Schema {
            filters: FilterSchema::new(self.predicates, self.multi_valued),
            sorts: SortSchema::new(self.orderings, self.explicit_reverse, self.default_sort),
            max_per_page: self.max_per_page,
        })
    }
}

/// Serializable schema declaration (e.g. loaded from YAML)
///
/// ```yaml
/// filters:
///   name: filter_by_name
///   favorite_number: filter_by_favorite_number
/// multi_valued: [favorite_number]
/// sorts:
///   name: sort_by_name
/// reverse_sorts:
///   name: sort_by_name_reversed
/// default_sort: [name, desc]
/// max_per_page: 50
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchemaDefinition {
    pub filters: BTreeMap<String, String>,
    pub multi_valued: Vec<String>,
    pub sorts: BTreeMap<String, String>,
    pub reverse_sorts: BTreeMap<String, String>,
    pub default_sort: Option<DefaultSort>,
    pub max_per_page: Option<u32>,
}

impl TryFrom<SchemaDefinition> for Schema {
    type Error = SchemaError;

    fn try_from(def: SchemaDefinition) -> SchemaResult<Self> {
        let mut builder = Schema::builder();
        for (name, predicate) in def.filters {
            builder = builder.filter(name, predicate);
        }
        for name in def.multi_valued {
            builder = builder.multi_valued(name);
        }
        for (name, ordering) in def.sorts {
            builder = builder.sort(name, ordering);
        }
        for (name, ordering) in def.reverse_sorts {
            builder = builder.reverse_sort(name, ordering);
        }
        if let Some(default_sort) = def.default_sort {
            builder = builder.default_sort(default_sort);
        }
        if let Some(max) = def.max_per_page {
            builder = builder.max_per_page(max);
        }
        builder.build()
    }
}
