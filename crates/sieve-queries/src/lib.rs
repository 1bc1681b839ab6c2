//! # sieve-queries
//!
//! Query state for list pages: filters, sorting and pagination taken from
//! untrusted URL parameters, validated against a declared schema, composed
//! onto a data-source relation, and turned back into navigable URLs.
//!
//! ## Structure
//!
//! - `params` - Nested (`a[b][]=1`) query-string parsing and building
//! - `filters` / `sorts` / `schema` - Declarative filter and sort schema
//! - `registry` - The `Relation` seam and named predicates/orderings
//! - `state` - The normalized, immutable Query State
//! - `resolver` - Raw parameters to Query State
//! - `compiler` - Query State to a composed relation
//! - `url` - Pure URL transforms over a Query State
//! - `filtered` - `Filterable`/`Filtered` facade tying the above together
//! - `memory` - In-memory `Relation` over a `Vec`
//! - `chips` - Active-filter chips for a filter bar
//!
//! ## Example
//!
//! ```
//! use sieve_core::PaginationConfig;
//! use sieve_queries::{FilterOptions, Filterable, MemoryRelation, RawParams, Registry, Schema};
//!
//! let schema = Schema::builder()
//!     .filter("name", "filter_by_name")
//!     .sort("name", "sort_by_name")
//!     .build()
//!     .unwrap();
//!
//! let registry = Registry::new()
//!     .predicate("filter_by_name", |r: MemoryRelation<&'static str>, v: &str| {
//!         let v = v.to_string();
//!         r.where_(move |name| *name == v)
//!     })
//!     .ordering("sort_by_name", |r: MemoryRelation<&'static str>, _: Option<&str>| {
//!         r.order_by(|name| *name)
//!     });
//!
//! let people = Filterable::new(schema, &registry, PaginationConfig::default()).unwrap();
//! let params = RawParams::from_query("sort=name&filter[bogus]=1");
//! let filtered = people
//!     .filter(&params, MemoryRelation::new(vec!["carol", "alice", "bob"]), FilterOptions::new())
//!     .unwrap();
//!
//! assert_eq!(filtered.items.to_vec(), vec!["alice", "bob", "carol"]);
//! assert_eq!(
//!     filtered.sort_url("/people", "name", None, None).0,
//!     "/people?sort=name&order=desc"
//! );
//! ```

pub mod chips;
pub mod compiler;
pub mod filtered;
pub mod filters;
pub mod memory;
pub mod params;
pub mod registry;
pub mod resolver;
pub mod schema;
pub mod sorts;
pub mod state;
pub mod url;

// Re-exports for convenience
pub use chips::{active_chips, active_filter_count, Chip, FilterGroup, FilterOption};
pub use compiler::{Compiler, Resolved};
pub use filtered::{FilterOptions, Filterable, Filtered};
pub use filters::{FilterSchema, FilterValue};
pub use memory::MemoryRelation;
pub use params::{build_nested_query, parse_nested_query, QueryMap, QueryValue, RawParams};
pub use registry::{Ordering, OrderingFn, PredicateFn, Registry, Relation};
pub use resolver::resolve;
pub use schema::{Schema, SchemaBuilder, SchemaDefinition};
pub use sorts::{DefaultSort, SortDirection, SortSchema};
pub use state::QueryState;
