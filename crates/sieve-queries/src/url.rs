//! URL Query Algebra
//!
//! Pure transforms from `(url, state)` to a new URL. The URL's own query is
//! parsed, the state's parameters are merged over it, the edit is applied to
//! the merged map and the query is rebuilt. Parameters outside the
//! `filter`/`sort`/`order`/`page`/`per` namespace pass through untouched.

use crate::filters::FilterValue;
use crate::params::{build_nested_query, parse_nested_query, QueryMap, QueryValue};
use crate::sorts::SortDirection;
use crate::state::QueryState;

/// A URL split around its query string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct UrlParts<'a> {
    base: &'a str,
    query: &'a str,
    fragment: Option<&'a str>,
}

impl<'a> UrlParts<'a> {
    fn split(url: &'a str) -> Self {
        let (rest, fragment) = match url.split_once('#') {
            Some((rest, fragment)) => (rest, Some(fragment)),
            None => (url, None),
        };
        let (base, query) = rest.split_once('?').unwrap_or((rest, ""));
        Self { base, query, fragment }
    }

    /// Reassemble with `query`; an empty query leaves no trailing `?`
    fn join(&self, query: &str) -> String {
        let mut out = String::with_capacity(self.base.len() + query.len() + 2);
        out.push_str(self.base);
        if !query.is_empty() {
            out.push('?');
            out.push_str(query);
        }
        if let Some(fragment) = self.fragment {
            out.push('#');
            out.push_str(fragment);
        }
        out
    }
}

/// The query map a transform starts from: the URL's parameters, extra params
/// filling keys the URL lacks, and the state's own parameters on top
pub fn merged_queries(state: &QueryState, query: &str) -> QueryMap {
    let mut base = parse_nested_query(query);
    for (key, value) in state.extra_queries().iter() {
        if !base.contains_key(key) {
            base.insert(key, value.clone());
        }
    }
    base.deep_merge(&state.url_queries())
}

/// Parse `url`, merge `state` into its query, apply `patch` and rebuild
pub fn merge_query<F>(state: &QueryState, url: &str, patch: F) -> String
where
    F: FnOnce(QueryMap) -> QueryMap,
{
    let parts = UrlParts::split(url);
    let queries = patch(merged_queries(state, parts.query));
    parts.join(&build_nested_query(&queries))
}

/// Only `key` is active afterwards
pub fn set_filter(state: &QueryState, url: &str, key: &str, value: impl Into<FilterValue>) -> String {
    let value = QueryValue::from(value.into());
    merge_query(state, url, |mut queries| {
        let mut filter = QueryMap::new();
        filter.insert(key, value);
        queries.insert("filter", filter);
        queries
    })
}

/// Set `key`, keeping every other filter
pub fn add_filter(state: &QueryState, url: &str, key: &str, value: impl Into<FilterValue>) -> String {
    let value = QueryValue::from(value.into());
    merge_query(state, url, |mut queries| {
        queries.map_entry("filter").insert(key, value);
        queries
    })
}

pub fn remove_filter(state: &QueryState, url: &str, key: &str) -> String {
    merge_query(state, url, |mut queries| {
        queries.map_entry("filter").remove(key);
        queries
    })
}

/// Drop `value` from the list under `key`; scalar filters are left alone
pub fn remove_sub_filter(state: &QueryState, url: &str, key: &str, value: &str) -> String {
    merge_query(state, url, |mut queries| {
        if let Some(QueryValue::Array(items)) = queries.map_entry("filter").get_mut(key) {
            items.retain(|item| item.as_str() != Some(value));
        }
        queries
    })
}

pub fn clear_filters(state: &QueryState, url: &str) -> String {
    clear(state, url, true, false)
}

/// Drop `sort` and `order`, keeping filters
pub fn clear_sort(state: &QueryState, url: &str) -> String {
    clear(state, url, false, true)
}

pub fn clear_all(state: &QueryState, url: &str) -> String {
    clear(state, url, true, true)
}

fn clear(state: &QueryState, url: &str, filters: bool, sort: bool) -> String {
    merge_query(state, url, |mut queries| {
        if filters {
            queries.remove("filter");
        }
        if sort {
            queries.remove("sort");
            queries.remove("order");
        }
        queries
    })
}

/// URL for a sortable column header, and the column's current direction.
///
/// Clicking the active sort flips its direction; any other column starts
/// without an `order`. An explicit `order` wins over the toggle, and `scope`
/// is written verbatim when given.
pub fn sort_url(
    state: &QueryState,
    url: &str,
    key: &str,
    order: Option<SortDirection>,
    scope: Option<&str>,
) -> (String, Option<SortDirection>) {
    let current = state.sort_state_for(key);

    let url = merge_query(state, url, |mut queries| {
        queries.insert("sort", key);

        match current {
            Some(direction) => queries.insert("order", direction.reverse().as_str()),
            None => {
                queries.remove("order");
            }
        }

        if let Some(order) = order {
            queries.insert("order", order.as_str());
        }
        if let Some(scope) = scope {
            queries.insert("scope", scope);
        }
        queries
    });

    (url, current)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_url() {
        let parts = UrlParts::split("https://example.com/people?a=1#top");
        assert_eq!(parts.base, "https://example.com/people");
        assert_eq!(parts.query, "a=1");
        assert_eq!(parts.fragment, Some("top"));

        let parts = UrlParts::split("/people");
        assert_eq!(parts.query, "");
        assert_eq!(parts.fragment, None);
    }

    #[test]
    fn test_join_strips_empty_query() {
        assert_eq!(UrlParts::split("/?").join(""), "/");
        assert_eq!(UrlParts::split("/?#frag").join(""), "/#frag");
        assert_eq!(UrlParts::split("/x?a=1").join("b=2"), "/x?b=2");
    }

    #[test]
    fn test_merge_keeps_url_params() {
        let state = QueryState::new();
        let url = merge_query(&state, "/?a=1&b[]=2", |q| q);
        assert_eq!(url, "/?a=1&b%5B%5D=2");
    }

    #[test]
    fn test_extra_params_are_lowest_layer() {
        let state = QueryState::new().with_extra_params([("tab", "active"), ("view", "list")]);
        let url = merge_query(&state, "/?tab=archived", |q| q);
        assert_eq!(url, "/?tab=archived&view=list");
    }

    #[test]
    fn test_remove_sub_filter_leaves_scalars() {
        let state = QueryState::new();
        assert_eq!(
            remove_sub_filter(&state, "/?filter%5Bname%5D=123", "name", "123"),
            "/?filter%5Bname%5D=123"
        );
    }

    #[test]
    fn test_remove_sub_filter_removes_every_match() {
        let state = QueryState::new();
        assert_eq!(
            remove_sub_filter(
                &state,
                "/?filter[n][]=1&filter[n][]=2&filter[n][]=1",
                "n",
                "1"
            ),
            "/?filter%5Bn%5D%5B%5D=2"
        );
    }

    #[test]
    fn test_add_filter_over_scalar_filter_param() {
        let state = QueryState::new();
        assert_eq!(
            add_filter(&state, "/?filter=oops", "name", "x"),
            "/?filter%5Bname%5D=x"
        );
    }

    #[test]
    fn test_sort_url_with_scope_and_explicit_order() {
        let state = QueryState::new();
        let (url, current) = sort_url(&state, "/", "name", Some(SortDirection::Desc), Some("42"));
        assert_eq!(url, "/?sort=name&order=desc&scope=42");
        assert_eq!(current, None);
    }
}
