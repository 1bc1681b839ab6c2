//! Registry built from SQL templates
//!
//! Lets a schema be wired to a table without writing closures:
//!
//! ```yaml
//! predicates:
//!   filter_by_name: "people.name = ?"
//!   filter_by_age: { clause: "people.age = ?", type: int }
//!   filter_by_search: { contains: people.name }
//! orderings:
//!   sort_by_name: people.name
//!   sort_by_name_reversed: people.created_at DESC
//!   sort_by_distance: { expr: "abs(people.age - ?)", type: int }
//! ```
//!
//! Every `?` in a predicate binds the filter value. A `?` in an ordering
//! binds the request's `scope` (NULL when absent). Values bind as text
//! unless the template names a `type`; a value that does not parse as that
//! type binds NULL.

use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::{debug, trace};

use sieve_queries::Registry;

use crate::relation::{placeholder_count, OrderTerm, SqlParam, SqlRelation};

/// PostgreSQL type a template value is bound as
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    #[default]
    Text,
    Int,
    Float,
    Bool,
}

impl ParamType {
    /// Convert a raw request value
    pub fn bind(self, raw: &str) -> SqlParam {
        let trimmed = raw.trim();
        let param = match self {
            ParamType::Text => return SqlParam::from(raw),
            ParamType::Int => trimmed.parse::<i64>().ok().map(SqlParam::Int),
            ParamType::Float => trimmed.parse::<f64>().ok().map(SqlParam::Float),
            ParamType::Bool => match trimmed.to_ascii_lowercase().as_str() {
                "true" | "t" | "1" => Some(SqlParam::Bool(true)),
                "false" | "f" | "0" => Some(SqlParam::Bool(false)),
                _ => None,
            },
        };
        param.unwrap_or_else(|| {
            debug!(value = %raw, param_type = ?self, "Unparsable template value bound as NULL");
            SqlParam::Null
        })
    }
}

/// How a predicate turns a filter value into a condition
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PredicateTemplate {
    /// Clause with `?` placeholders, bound as text
    Clause(String),
    /// Clause whose placeholders bind as `type`
    Typed {
        clause: String,
        #[serde(rename = "type", default)]
        param_type: ParamType,
    },
    /// Case-insensitive substring match on a column
    Contains { contains: String },
}

/// ORDER BY expression, optionally with `?` bound to the scope
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OrderingTemplate {
    Expr(String),
    Typed {
        expr: String,
        #[serde(rename = "type", default)]
        param_type: ParamType,
    },
}

impl OrderingTemplate {
    fn parts(&self) -> (&str, ParamType) {
        match self {
            OrderingTemplate::Expr(expr) => (expr, ParamType::Text),
            OrderingTemplate::Typed { expr, param_type } => (expr, *param_type),
        }
    }
}

impl From<&str> for OrderingTemplate {
    fn from(expr: &str) -> Self {
        OrderingTemplate::Expr(expr.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SqlTemplates {
    pub predicates: BTreeMap<String, PredicateTemplate>,
    pub orderings: BTreeMap<String, OrderingTemplate>,
}

/// Build a registry of SQL predicates and orderings
pub fn sql_registry(templates: &SqlTemplates) -> Registry<SqlRelation> {
    let mut registry = Registry::new();

    for (id, template) in &templates.predicates {
        let template = template.clone();
        let label = id.clone();
        registry = registry.predicate(id.clone(), move |relation: SqlRelation, value: &str| {
            trace!(predicate = %label, value = %value, "Applying SQL predicate");
            match &template {
                PredicateTemplate::Clause(sql) => {
                    let params = vec![SqlParam::from(value); placeholder_count(sql)];
                    relation.where_clause(sql.clone(), params)
                }
                PredicateTemplate::Typed { clause, param_type } => {
                    let params = vec![param_type.bind(value); placeholder_count(clause)];
                    relation.where_clause(clause.clone(), params)
                }
                PredicateTemplate::Contains { contains } => relation.where_contains(contains, value),
            }
        });
    }

    for (id, template) in &templates.orderings {
        let template = template.clone();
        registry = registry.ordering(id.clone(), move |relation: SqlRelation, scope: Option<&str>| {
            let (expr, param_type) = template.parts();
            let param = scope.map_or(SqlParam::Null, |scope| param_type.bind(scope));
            let params = vec![param; placeholder_count(expr)];
            relation.order_term(OrderTerm::parse(expr, params))
        });
    }

    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use sieve_core::PaginationConfig;
    use sieve_queries::{Compiler, RawParams, Relation, Schema};

    fn templates() -> SqlTemplates {
        serde_yaml::from_str(
            r#"
predicates:
  filter_by_name: "name = ?"
  filter_by_favorite_number: { clause: "favorite_number = ?", type: int }
  filter_by_active: { clause: "active = ?", type: bool }
  filter_by_note: "note = ? OR note = 'n/a?'"
  filter_by_search: { contains: "people.name" }
orderings:
  sort_by_name: people.name
  sort_by_favorite_number: people.favorite_number
  sort_by_name_reversed: people.created_at DESC
  sort_by_distance: { expr: "abs(people.favorite_number - ?)", type: int }
  sort_by_label: "coalesce(people.nickname, ?)"
"#,
        )
        .unwrap()
    }

    fn schema() -> Schema {
        Schema::builder()
            .filter("name", "filter_by_name")
            .filter("favorite_number", "filter_by_favorite_number")
            .filter("search", "filter_by_search")
            .filter("active", "filter_by_active")
            .filter("note", "filter_by_note")
            .multi_valued("favorite_number")
            .sort("name", "sort_by_name")
            .sort("favorite_number", "sort_by_favorite_number")
            .sort("distance", "sort_by_distance")
            .sort("label", "sort_by_label")
            .build()
            .unwrap()
    }

    fn compile(query: &str) -> (String, Vec<SqlParam>) {
        let schema = schema();
        let config = PaginationConfig::default();
        let compiler = Compiler::new(&schema, &sql_registry(&templates()), config).unwrap();
        let state = sieve_queries::resolve(&RawParams::from_query(query), &schema, &config, None).unwrap();
        compiler
            .compile(&state, SqlRelation::new("people"), false)
            .relation
            .to_sql()
    }

    #[test]
    fn test_multi_valued_or_scalar_and() {
        let (sql, params) = compile(
            "filter[name]=X&filter[favorite_number][]=1&filter[favorite_number][]=2",
        );
        assert_eq!(
            sql,
            "SELECT people.* FROM people WHERE (favorite_number = $1 OR favorite_number = $2) AND name = $3"
        );
        assert_eq!(
            params,
            vec![SqlParam::Int(1), SqlParam::Int(2), SqlParam::from("X")]
        );
    }

    #[test]
    fn test_contains_template() {
        let (sql, params) = compile("filter[search]=+Bob");
        assert_eq!(sql, "SELECT people.* FROM people WHERE strpos(LOWER(people.name), $1) > 0");
        assert_eq!(params, vec![SqlParam::from("bob")]);
    }

    #[test]
    fn test_generic_reverse_ordering() {
        let (sql, _) = compile("sort=favorite_number&order=desc");
        assert_eq!(sql, "SELECT people.* FROM people ORDER BY people.favorite_number DESC");
    }

    #[test]
    fn test_reversed_template_replaces_generic_reverse() {
        let (sql, _) = compile("sort=name&order=desc");
        assert_eq!(sql, "SELECT people.* FROM people ORDER BY people.created_at DESC");

        let (sql, _) = compile("sort=name");
        assert_eq!(sql, "SELECT people.* FROM people ORDER BY people.name ASC");
    }

    #[test]
    fn test_scope_binds_into_ordering() {
        let (sql, params) = compile("sort=distance&scope=7");
        assert_eq!(
            sql,
            "SELECT people.* FROM people ORDER BY abs(people.favorite_number - $1) ASC"
        );
        assert_eq!(params, vec![SqlParam::Int(7)]);

        let (_, params) = compile("sort=distance");
        assert_eq!(params, vec![SqlParam::Null]);
    }

    #[test]
    fn test_registry_contents() {
        let registry = sql_registry(&templates());
        assert!(registry.has_predicate("filter_by_search"));
        assert!(registry.has_ordering("sort_by_name_reversed"));
        let predicate = registry.get_predicate("filter_by_name").unwrap();
        let relation = predicate(SqlRelation::new("people").all(), "a");
        assert_eq!(relation.to_sql().1, vec![SqlParam::from("a")]);
    }

    #[test]
    fn test_typed_values_bind_as_their_type() {
        let (sql, params) = compile("filter[active]=true&filter[favorite_number]=abc");
        assert_eq!(
            sql,
            "SELECT people.* FROM people WHERE active = $1 AND favorite_number = $2"
        );
        assert_eq!(params, vec![SqlParam::Bool(true), SqlParam::Null]);

        let (_, params) = compile("sort=distance&scope=x");
        assert_eq!(params, vec![SqlParam::Null]);
    }

    #[test]
    fn test_untyped_ordering_binds_scope_as_text() {
        let (sql, params) = compile("sort=label&scope=7");
        assert_eq!(sql, "SELECT people.* FROM people ORDER BY coalesce(people.nickname, $1) ASC");
        assert_eq!(params, vec![SqlParam::from("7")]);
    }

    #[test]
    fn test_quoted_question_mark_binds_nothing() {
        let (sql, params) = compile("filter[note]=x&filter[name]=y");
        assert_eq!(
            sql,
            "SELECT people.* FROM people WHERE name = $1 AND (note = $2 OR note = 'n/a?')"
        );
        assert_eq!(params, vec![SqlParam::from("y"), SqlParam::from("x")]);
    }

    #[test]
    fn test_param_type_bind() {
        assert_eq!(ParamType::Int.bind(" 42 "), SqlParam::Int(42));
        assert_eq!(ParamType::Float.bind("1.5"), SqlParam::Float(1.5));
        assert_eq!(ParamType::Bool.bind("F"), SqlParam::Bool(false));
        assert_eq!(ParamType::Text.bind(" a "), SqlParam::from(" a "));
        assert_eq!(ParamType::Int.bind("1.5"), SqlParam::Null);
    }
}
