//! # sieve-db
//!
//! PostgreSQL side of Sieve.
//!
//! - `relation` - `SqlRelation`, a `Relation` that renders parameterized SQL
//! - `helpers` - `contains` matching, polymorphic joins, identifier quoting
//! - `templates` - A `Registry<SqlRelation>` built from SQL templates
//! - `executor` - Runs relations on a pool
//! - `pool` - Connection pool management
//!
//! ## Example
//!
//! ```ignore
//! use sieve_db::{sql_registry, Database, DatabaseConfig, QueryExecutor, SqlRelation};
//!
//! let registry = sql_registry(&templates);
//! let people = Filterable::new(schema, &registry, PaginationConfig::default())?;
//! let filtered = people.filter(&params, SqlRelation::new("people"), FilterOptions::new())?;
//!
//! let db = Database::connect(&DatabaseConfig::from_env()).await?;
//! let rows = QueryExecutor::new(db.pool()).fetch_json(&filtered.items).await?;
//! ```

pub mod executor;
pub mod helpers;
pub mod pool;
pub mod relation;
pub mod templates;

// Re-exports
pub use executor::{ExecutorError, ExecutorResult, PageResult, QueryExecutor};
pub use helpers::{coalesce, contains, polymorphic_joins, quote_identifier, quote_literal, PolymorphicTarget};
pub use pool::{Database, DatabaseConfig};
pub use relation::{Condition, OrderTerm, SqlParam, SqlRelation};
pub use templates::{sql_registry, OrderingTemplate, ParamType, PredicateTemplate, SqlTemplates};
