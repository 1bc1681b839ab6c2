//! Query Compiler
//!
//! Turns a [`QueryState`] into a composed relation: filters first, then the
//! sort, then pagination. Every schema reference is checked against the
//! registry when the compiler is built, so compiling itself cannot fail.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, trace};

use sieve_core::{PageRequest, PaginationConfig, SchemaError, SchemaResult};

use crate::filters::FilterValue;
use crate::registry::{Ordering, PredicateFn, Registry, Relation};
use crate::schema::Schema;
use crate::sorts::SortDirection;
use crate::state::QueryState;

/// Suffix of the ordering used in place of a generic reverse when no explicit
/// reverse ordering is declared
pub const REVERSED_SUFFIX: &str = "_reversed";

/// Compiled relation plus the sort it was ordered by
#[derive(Debug, Clone)]
pub struct Resolved<R> {
    pub relation: R,
    pub sort_name: Option<String>,
    pub direction: SortDirection,
    /// Page applied, when pagination ran
    pub page: Option<PageRequest>,
}

pub struct Compiler<R> {
    predicates: BTreeMap<String, PredicateFn<R>>,
    orderings: BTreeMap<String, Ordering<R>>,
    pagination: PaginationConfig,
}

impl<R: Relation> Compiler<R> {
    /// Bind `schema` to `registry`, failing on any unregistered identifier
    pub fn new(schema: &Schema, registry: &Registry<R>, pagination: PaginationConfig) -> SchemaResult<Self> {
        let mut predicates = BTreeMap::new();
        for (filter, id) in schema.filters.predicates() {
            let predicate = registry
                .get_predicate(id)
                .ok_or_else(|| SchemaError::UnknownPredicate {
                    filter: filter.to_string(),
                    predicate: id.to_string(),
                })?;
            predicates.insert(filter.to_string(), Arc::clone(predicate));
        }

        let mut orderings = BTreeMap::new();
        for (sort, id) in schema.sorts.orderings() {
            let forward = registry
                .get_ordering(id)
                .ok_or_else(|| SchemaError::UnknownOrdering {
                    sort: sort.to_string(),
                    ordering: id.to_string(),
                })?;

            let reverse = match schema.sorts.reverse_ordering_for(sort) {
                Some(reverse_id) => Some(registry.get_ordering(reverse_id).ok_or_else(|| {
                    SchemaError::UnknownOrdering {
                        sort: sort.to_string(),
                        ordering: reverse_id.to_string(),
                    }
                })?),
                None => registry.get_ordering(&format!("{}{}", id, REVERSED_SUFFIX)),
            };

            let ordering = match reverse {
                Some(reverse) => Ordering::WithExplicitReverse {
                    forward: Arc::clone(forward),
                    reverse: Arc::clone(reverse),
                },
                None => Ordering::Generic(Arc::clone(forward)),
            };
            orderings.insert(sort.to_string(), ordering);
        }

        let pagination = match schema.max_per_page {
            Some(max) => pagination.with_max_per_page(max),
            None => pagination,
        };

        debug!(
            predicates = predicates.len(),
            orderings = orderings.len(),
            "Compiler bound to registry"
        );

        Ok(Self {
            predicates,
            orderings,
            pagination,
        })
    }

    /// Compose `state` onto `base`. `paginate = false` returns every match.
    pub fn compile(&self, state: &QueryState, base: R, paginate: bool) -> Resolved<R> {
        let mut relation = base;

        for (key, value) in state.filters() {
            let Some(predicate) = self.predicates.get(key) else {
                debug!(filter = %key, "No predicate bound for filter, skipping");
                continue;
            };
            relation = apply_filter(relation, predicate, key, value);
        }

        let mut sort_name = None;
        if let Some(name) = state.sort_name() {
            match self.orderings.get(name) {
                Some(ordering) => {
                    trace!(sort = %name, direction = %state.direction(), "Applying ordering");
                    relation = ordering.apply(relation, state.direction().is_desc(), state.scope());
                    sort_name = Some(name.to_string());
                }
                None => debug!(sort = %name, "No ordering bound for sort, skipping"),
            }
        }

        let page = paginate.then(|| state.page_request(&self.pagination));
        if let Some(page) = &page {
            relation = relation.paginate(page.offset(), page.limit());
        }

        Resolved {
            relation,
            direction: if sort_name.is_some() {
                state.direction()
            } else {
                SortDirection::Asc
            },
            sort_name,
            page,
        }
    }

    pub fn pagination(&self) -> &PaginationConfig {
        &self.pagination
    }

    pub fn ordering_for(&self, sort: &str) -> Option<&Ordering<R>> {
        self.orderings.get(sort)
    }
}

impl<R> Clone for Compiler<R> {
    fn clone(&self) -> Self {
        Self {
            predicates: self.predicates.clone(),
            orderings: self.orderings.clone(),
            pagination: self.pagination,
        }
    }
}

impl<R> std::fmt::Debug for Compiler<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compiler")
            .field("predicates", &self.predicates.keys().collect::<Vec<_>>())
            .field("orderings", &self.orderings)
            .field("pagination", &self.pagination)
            .finish()
    }
}

/// AND a scalar predicate, or an OR group over list values
fn apply_filter<R: Relation>(relation: R, predicate: &PredicateFn<R>, key: &str, value: &FilterValue) -> R {
    match value {
        FilterValue::Single(v) => {
            trace!(filter = %key, value = %v, "Applying predicate");
            let narrowed = predicate(relation.all(), v);
            relation.and(narrowed)
        }
        FilterValue::Multiple(values) => {
            let group = values
                .iter()
                .filter(|v| !v.trim().is_empty())
                .map(|v| {
                    trace!(filter = %key, value = %v, "Applying predicate to OR group");
                    predicate(relation.all(), v)
                })
                .reduce(R::or);
            match group {
                Some(group) => relation.and(group),
                None => relation,
            }
        }
    }
}
