//! SQL helpers for predicates and orderings
//!
//! Case-insensitive substring matching and polymorphic association joins,
//! with PostgreSQL quoting.

use crate::relation::{SqlParam, SqlRelation};

/// Quote a table or column name; dotted names are quoted per segment
pub fn quote_identifier(name: &str) -> String {
    name.split('.')
        .map(|part| format!("\"{}\"", part.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(".")
}

/// Quote a string literal
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Case-insensitive "column contains value" clause.
///
/// The value is trimmed and lower-cased before binding.
pub fn contains(column: &str, value: &str) -> (String, Vec<SqlParam>) {
    (
        format!("strpos(LOWER({}), ?) > 0", column),
        vec![SqlParam::String(value.trim().to_lowercase())],
    )
}

/// A table reachable through a polymorphic association
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolymorphicTarget {
    pub table: String,
    /// Value stored in the `<association>_type` column
    pub type_name: String,
}

impl PolymorphicTarget {
    pub fn new(table: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            type_name: type_name.into(),
        }
    }
}

/// LEFT OUTER JOIN each target on `<association>_id` / `<association>_type`
pub fn polymorphic_joins(relation: SqlRelation, association: &str, targets: &[PolymorphicTarget]) -> SqlRelation {
    let table = quote_identifier(relation.table());
    let id_column = quote_identifier(&format!("{}_id", association));
    let type_column = quote_identifier(&format!("{}_type", association));

    targets.iter().fold(relation, |relation, target| {
        let associated = quote_identifier(&target.table);
        relation.join(format!(
            "LEFT OUTER JOIN {associated} ON {associated}.\"id\" = {table}.{id_column} \
             AND {table}.{type_column} = {}",
            quote_literal(&target.type_name)
        ))
    })
}

/// `coalesce(...)` of `column` across the joined targets
pub fn coalesce(targets: &[PolymorphicTarget], column: &str) -> String {
    let column = quote_identifier(column);
    let columns: Vec<String> = targets
        .iter()
        .map(|target| format!("{}.{}", quote_identifier(&target.table), column))
        .collect();
    format!("coalesce({})", columns.join(", "))
}

impl SqlRelation {
    /// AND a case-insensitive substring match on `column`
    pub fn where_contains(self, column: &str, value: &str) -> Self {
        let (sql, params) = contains(column, value);
        self.where_clause(sql, params)
    }
}
