//! Model files
//!
//! A YAML file describing one filterable table: its schema, the SQL behind
//! each predicate and ordering, and an optional chip catalogue.
//!
//! ```yaml
//! table: people
//! schema:
//!   filters:
//!     name: filter_by_name
//!   sorts:
//!     name: sort_by_name
//!   default_sort: name
//! predicates:
//!   filter_by_name: "people.name = ?"
//!   filter_by_age: { clause: "people.age = ?", type: int }
//! orderings:
//!   sort_by_name: people.name
//! chips:
//!   - filter_name: name
//!     options:
//!       - { name: Alice, value: alice }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use sieve_core::PaginationConfig;
use sieve_db::{sql_registry, OrderingTemplate, PredicateTemplate, SqlRelation, SqlTemplates};
use sieve_queries::{FilterGroup, Filterable, RawParams, Schema, SchemaDefinition};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelFile {
    pub table: String,
    #[serde(default)]
    pub select: Option<String>,
    #[serde(default)]
    pub schema: SchemaDefinition,
    #[serde(default)]
    pub predicates: BTreeMap<String, PredicateTemplate>,
    #[serde(default)]
    pub orderings: BTreeMap<String, OrderingTemplate>,
    #[serde(default)]
    pub chips: Vec<FilterGroup>,
}

impl ModelFile {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading model file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing model file {}", path.display()))
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn templates(&self) -> SqlTemplates {
        SqlTemplates {
            predicates: self.predicates.clone(),
            orderings: self.orderings.clone(),
        }
    }

    /// Schema bound to the SQL templates
    pub fn filterable(&self, pagination: PaginationConfig) -> anyhow::Result<Filterable<SqlRelation>> {
        let schema = Schema::try_from(self.schema.clone())?;
        let filterable = Filterable::new(schema, &sql_registry(&self.templates()), pagination)?;
        Ok(filterable)
    }

    pub fn base_relation(&self) -> SqlRelation {
        let relation = SqlRelation::new(&self.table);
        match &self.select {
            Some(select) => relation.select(select),
            None => relation,
        }
    }
}

/// Request parameters from the query part of `url`
pub fn params_from_url(url: &str) -> RawParams {
    let without_fragment = url.split_once('#').map_or(url, |(rest, _)| rest);
    let query = without_fragment.split_once('?').map_or("", |(_, query)| query);
    RawParams::from_query(query)
}

/// Default sort given on the command line: JSON (`["name","desc"]`) or a bare name
pub fn parse_default_sort(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()))
}
