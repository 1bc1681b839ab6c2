//! Query State
//!
//! The normalized, immutable view of one request's filters, sort, pagination
//! and pass-through parameters. Only the resolver builds it from raw input;
//! every transform returns a new value.

use serde::Serialize;
use std::collections::BTreeMap;

use sieve_core::{PageRequest, PaginationConfig};

use crate::filters::FilterValue;
use crate::params::{QueryMap, QueryValue};
use crate::sorts::SortDirection;

/// Normalized request state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueryState {
    pub(crate) filters: BTreeMap<String, FilterValue>,
    pub(crate) sort_name: Option<String>,
    pub(crate) direction: SortDirection,
    pub(crate) scope: Option<String>,
    /// `sort` as accepted from the request (absent when a default applies)
    pub(crate) sort_param: Option<String>,
    /// `order` as accepted from the request
    pub(crate) order_param: Option<SortDirection>,
    pub(crate) page: Option<u32>,
    pub(crate) per_page: Option<u32>,
    pub(crate) extra_params: BTreeMap<String, String>,
}

impl QueryState {
    /// Empty state: no filters, unsorted, default pagination
    pub fn new() -> Self {
        Self::default()
    }

    // Filters

    pub fn filters(&self) -> &BTreeMap<String, FilterValue> {
        &self.filters
    }

    pub fn filter(&self, key: &str) -> Option<&FilterValue> {
        self.filters.get(key)
    }

    /// Returns true if at least one filter is active
    pub fn has_active_filters(&self) -> bool {
        !self.filters.is_empty()
    }

    pub fn is_filter_active(&self, key: &str) -> bool {
        self.filters.contains_key(key)
    }

    /// Check whether `value` is active for `key` (single value or list entry)
    pub fn is_filter_value_active(&self, key: &str, value: &str) -> bool {
        self.filters.get(key).is_some_and(|v| v.contains(value))
    }

    /// Number of active values; list entries count individually
    pub fn active_filter_count(&self) -> usize {
        self.filters.values().map(FilterValue::count).sum()
    }

    // Sorting

    /// Sort in effect, whether requested or defaulted
    pub fn sort_name(&self) -> Option<&str> {
        self.sort_name.as_deref()
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    pub fn is_sorted_by(&self, name: &str) -> bool {
        self.sort_name.as_deref() == Some(name)
    }

    /// Current direction of `name` when it is the active sort
    pub fn sort_state_for(&self, name: &str) -> Option<SortDirection> {
        self.is_sorted_by(name).then_some(self.direction)
    }

    // Pagination

    pub fn page(&self) -> Option<u32> {
        self.page
    }

    pub fn per_page(&self) -> Option<u32> {
        self.per_page
    }

    /// Concrete page to fetch under `config`
    pub fn page_request(&self, config: &PaginationConfig) -> PageRequest {
        PageRequest::new(self.page, self.per_page, config)
    }

    // Pass-through

    pub fn extra_params(&self) -> &BTreeMap<String, String> {
        &self.extra_params
    }

    /// Return a copy carrying `extra` in addition to the existing extra params
    pub fn with_extra_params<I, K, V>(&self, extra: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut next = self.clone();
        next.extra_params
            .extend(extra.into_iter().map(|(k, v)| (k.into(), v.into())));
        next
    }

    /// The state's own URL parameters: `filter`, `sort`, `order`, `page`, `per`.
    ///
    /// A defaulted sort is not written; `filter` is always present (possibly
    /// empty) so merging it over a URL keeps that URL's filter map a map.
    pub fn url_queries(&self) -> QueryMap {
        let mut queries = QueryMap::new();

        let filter: QueryMap = self
            .filters
            .iter()
            .map(|(k, v)| (k.clone(), QueryValue::from(v)))
            .collect();
        queries.insert("filter", filter);

        if let Some(sort) = &self.sort_param {
            queries.insert("sort", sort.as_str());
        }
        if let Some(order) = self.order_param {
            queries.insert("order", order.as_str());
        }
        if let Some(page) = self.page {
            queries.insert("page", page.to_string());
        }
        if let Some(per) = self.per_page {
            queries.insert("per", per.to_string());
        }

        queries
    }

    /// Extra params as a query map
    pub fn extra_queries(&self) -> QueryMap {
        self.extra_params
            .iter()
            .map(|(k, v)| (k.clone(), QueryValue::String(v.clone())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::build_nested_query;

    fn sample_state() -> QueryState {
        let mut filters = BTreeMap::new();
        filters.insert("name".to_string(), FilterValue::from("test"));
        filters.insert("favorite_number".to_string(), FilterValue::from(vec!["1", "2"]));
        QueryState {
            filters,
            sort_name: Some("name".into()),
            direction: SortDirection::Desc,
            sort_param: Some("name".into()),
            order_param: Some(SortDirection::Desc),
            page: Some(2),
            per_page: Some(20),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_state() {
        let state = QueryState::new();
        assert!(!state.has_active_filters());
        assert_eq!(state.sort_name(), None);
        assert_eq!(state.direction(), SortDirection::Asc);
        assert_eq!(build_nested_query(&state.url_queries()), "");
    }

    #[test]
    fn test_filter_queries() {
        let state = sample_state();
        assert!(state.has_active_filters());
        assert!(state.is_filter_active("name"));
        assert!(state.is_filter_value_active("favorite_number", "2"));
        assert!(!state.is_filter_value_active("favorite_number", "3"));
        assert_eq!(state.active_filter_count(), 3);
    }

    #[test]
    fn test_sort_state_for() {
        let state = sample_state();
        assert_eq!(state.sort_state_for("name"), Some(SortDirection::Desc));
        assert_eq!(state.sort_state_for("favorite_number"), None);
    }

    #[test]
    fn test_url_queries() {
        let state = sample_state();
        assert_eq!(
            build_nested_query(&state.url_queries()),
            "filter%5Bfavorite_number%5D%5B%5D=1&filter%5Bfavorite_number%5D%5B%5D=2\
             &filter%5Bname%5D=test&sort=name&order=desc&page=2&per=20"
        );
    }

    #[test]
    fn test_defaulted_sort_not_serialized() {
        let state = QueryState {
            sort_name: Some("name".into()),
            direction: SortDirection::Desc,
            ..Default::default()
        };
        let queries = state.url_queries();
        assert!(!queries.contains_key("sort"));
        assert!(!queries.contains_key("order"));
    }

    #[test]
    fn test_with_extra_params_returns_new_value() {
        let state = QueryState::new();
        let extended = state.with_extra_params([("tab", "active")]);
        assert!(state.extra_params().is_empty());
        assert_eq!(extended.extra_params().get("tab").map(String::as_str), Some("active"));
        assert_eq!(build_nested_query(&extended.extra_queries()), "tab=active");
    }
}
