//! Schema Resolver
//!
//! Whitelists raw request parameters against a [`Schema`] and produces a
//! [`QueryState`]. Anything the schema does not accept is dropped silently;
//! the only failure is a default sort override naming an undeclared sort.

use std::collections::BTreeMap;

use tracing::debug;

use sieve_core::{PaginationConfig, SchemaError, SchemaResult};

use crate::filters::{FilterSchema, FilterValue};
use crate::params::{QueryValue, RawParams};
use crate::schema::Schema;
use crate::sorts::{DefaultSort, SortDirection};
use crate::state::QueryState;

/// Resolve raw parameters into a normalized state.
///
/// `default_sort` takes precedence over the schema's own default when the
/// request carries no valid sort.
pub fn resolve(
    params: &RawParams,
    schema: &Schema,
    config: &PaginationConfig,
    default_sort: Option<&DefaultSort>,
) -> SchemaResult<QueryState> {
    let mut state = QueryState {
        filters: resolve_filters(params, &schema.filters),
        ..QueryState::default()
    };

    resolve_sort(params, schema, default_sort, &mut state)?;

    let max_per_page = schema.max_per_page.unwrap_or(config.max_per_page);
    if let Some((page, per_page)) = resolve_pagination(params, max_per_page) {
        state.page = page;
        state.per_page = per_page;
    }

    Ok(state)
}

fn resolve_filters(params: &RawParams, schema: &FilterSchema) -> BTreeMap<String, FilterValue> {
    let mut filters = BTreeMap::new();

    if !schema.is_filterable() {
        return filters;
    }

    let Some(raw) = params.get("filter").and_then(QueryValue::as_map) else {
        return filters;
    };

    for (key, value) in raw.iter() {
        if schema.predicate_for(key).is_none() {
            debug!(filter = %key, "Dropping unknown filter");
            continue;
        }

        let resolved = match value {
            QueryValue::String(s) if s.trim().is_empty() => None,
            QueryValue::String(s) => Some(FilterValue::Single(s.clone())),
            QueryValue::Array(items) if schema.is_multi_valued(key) => {
                let values: Vec<String> = items
                    .iter()
                    .filter_map(QueryValue::as_str)
                    .filter(|s| !s.trim().is_empty())
                    .map(str::to_string)
                    .collect();
                (!values.is_empty()).then_some(FilterValue::Multiple(values))
            }
            QueryValue::Array(_) => {
                debug!(filter = %key, "Dropping list value for single-valued filter");
                None
            }
            QueryValue::Map(_) => None,
        };

        if let Some(resolved) = resolved {
            filters.insert(key.to_string(), resolved);
        }
    }

    filters
}

fn resolve_sort(
    params: &RawParams,
    schema: &Schema,
    default_sort: Option<&DefaultSort>,
    state: &mut QueryState,
) -> SchemaResult<()> {
    let requested = params
        .get_str("sort")
        .filter(|name| schema.sorts.has_sort(name));

    // blank order is fine, anything else must be exactly asc/desc
    let order = match params.get_str("order") {
        None => Some(None),
        Some(raw) => SortDirection::from_str(raw).map(Some),
    };

    if let (Some(name), Some(order)) = (requested, order) {
        state.sort_name = Some(name.to_string());
        state.direction = order.unwrap_or_default();
        state.scope = params.get_str("scope").map(str::to_string);
        state.sort_param = Some(name.to_string());
        state.order_param = order;
        return Ok(());
    }

    if params.get_str("sort").is_some() || params.get_str("order").is_some() {
        debug!(
            sort = ?params.get_str("sort"),
            order = ?params.get_str("order"),
            "Dropping invalid sort parameters"
        );
    }

    let Some(default_sort) = default_sort.or(schema.sorts.default_sort()) else {
        return Ok(());
    };

    if !schema.sorts.has_sort(default_sort.name()) {
        return Err(SchemaError::UnknownDefaultSort(default_sort.name().to_string()));
    }

    state.sort_name = Some(default_sort.name().to_string());
    state.direction = default_sort.direction();
    Ok(())
}

/// Returns `None` when `per` is out of range, dropping `page` with it
fn resolve_pagination(params: &RawParams, max_per_page: u32) -> Option<(Option<u32>, Option<u32>)> {
    let per_page = match params.get_str("per") {
        None => None,
        Some(raw) => match raw.trim().parse::<u32>() {
            Ok(per) if (1..=max_per_page).contains(&per) => Some(per),
            _ => {
                debug!(per = %raw, max_per_page, "Dropping out-of-range pagination");
                return None;
            }
        },
    };

    let page = params
        .get_str("page")
        .and_then(|raw| raw.trim().parse::<u32>().ok())
        .filter(|page| *page >= 1);

    Some((page, per_page))
}
