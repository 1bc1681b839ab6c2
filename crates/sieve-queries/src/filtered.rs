//! Filterable / Filtered facade
//!
//! [`Filterable`] bundles a schema, a validated compiler and pagination
//! defaults for one kind of record. [`Filterable::filter`] resolves raw
//! parameters and compiles them onto a base relation, returning a
//! [`Filtered`] that carries the items together with the URL algebra bound
//! to the request's state.

use std::collections::BTreeMap;

use tracing::debug;

use sieve_core::{PageRequest, PaginationConfig, SchemaResult};

use crate::compiler::{Compiler, Resolved};
use crate::filters::FilterValue;
use crate::params::RawParams;
use crate::registry::{Registry, Relation};
use crate::resolver;
use crate::schema::Schema;
use crate::sorts::{DefaultSort, SortDirection};
use crate::state::QueryState;
use crate::url;

/// Per-call options for [`Filterable::filter`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOptions {
    /// Overrides the schema's default sort
    pub default_sort: Option<DefaultSort>,
    /// When false, every matching row is returned
    pub pagination_enabled: bool,
    /// Pass-through parameters written into every generated URL
    pub extra_params: BTreeMap<String, String>,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            default_sort: None,
            pagination_enabled: true,
            extra_params: BTreeMap::new(),
        }
    }
}

impl FilterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn default_sort(mut self, default_sort: impl Into<DefaultSort>) -> Self {
        self.default_sort = Some(default_sort.into());
        self
    }

    /// Default sort given as loosely typed data (a name or `[name, direction]`)
    pub fn with_default_sort_value(mut self, value: &serde_json::Value) -> SchemaResult<Self> {
        self.default_sort = Some(DefaultSort::from_value(value)?);
        Ok(self)
    }

    pub fn without_pagination(mut self) -> Self {
        self.pagination_enabled = false;
        self
    }

    pub fn extra_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_params.insert(key.into(), value.into());
        self
    }
}

/// Schema bound to a registry for relation type `R`
#[derive(Debug, Clone)]
pub struct Filterable<R> {
    schema: Schema,
    compiler: Compiler<R>,
    pagination: PaginationConfig,
}

impl<R: Relation> Filterable<R> {
    /// Validate every schema reference against `registry`
    pub fn new(schema: Schema, registry: &Registry<R>, pagination: PaginationConfig) -> SchemaResult<Self> {
        let compiler = Compiler::new(&schema, registry, pagination)?;
        Ok(Self {
            schema,
            compiler,
            pagination,
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn pagination(&self) -> &PaginationConfig {
        self.compiler.pagination()
    }

    /// Resolve raw parameters into a state
    pub fn resolve(&self, params: &RawParams, default_sort: Option<&DefaultSort>) -> SchemaResult<QueryState> {
        resolver::resolve(params, &self.schema, &self.pagination, default_sort)
    }

    pub fn compile(&self, state: &QueryState, base: R, paginate: bool) -> Resolved<R> {
        self.compiler.compile(state, base, paginate)
    }

    /// Resolve and compile in one step
    pub fn filter(&self, params: &RawParams, base: R, options: FilterOptions) -> SchemaResult<Filtered<R>> {
        let state = self
            .resolve(params, options.default_sort.as_ref())?
            .with_extra_params(options.extra_params);

        let resolved = self.compile(&state, base, options.pagination_enabled);

        debug!(
            filters = state.filters().len(),
            sort = ?resolved.sort_name,
            direction = %resolved.direction,
            paginated = options.pagination_enabled,
            "Filtered relation compiled"
        );

        Ok(Filtered {
            items: resolved.relation,
            sort_name: resolved.sort_name,
            direction: resolved.direction,
            page: resolved.page,
            state,
        })
    }
}

/// Filtered items plus URL generation for the request they came from
#[derive(Debug, Clone)]
pub struct Filtered<R> {
    pub items: R,
    state: QueryState,
    sort_name: Option<String>,
    direction: SortDirection,
    page: Option<PageRequest>,
}

impl<R> Filtered<R> {
    pub fn state(&self) -> &QueryState {
        &self.state
    }

    pub fn sort_name(&self) -> Option<&str> {
        self.sort_name.as_deref()
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    /// Page window applied to `items`, `None` when pagination was disabled
    pub fn page(&self) -> Option<PageRequest> {
        self.page
    }

    pub fn into_items(self) -> R {
        self.items
    }

    /// Returns true if at least one filter is active
    pub fn active_filters(&self) -> bool {
        self.state.has_active_filters()
    }

    /// Copy with more pass-through parameters
    pub fn with_extra_params<I, K, V>(&self, extra: I) -> Self
    where
        R: Clone,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            items: self.items.clone(),
            state: self.state.with_extra_params(extra),
            sort_name: self.sort_name.clone(),
            direction: self.direction,
            page: self.page,
        }
    }

    pub fn set_filter_url(&self, url: &str, key: &str, value: impl Into<FilterValue>) -> String {
        url::set_filter(&self.state, url, key, value)
    }

    pub fn add_filter_url(&self, url: &str, key: &str, value: impl Into<FilterValue>) -> String {
        url::add_filter(&self.state, url, key, value)
    }

    pub fn remove_filter_url(&self, url: &str, key: &str) -> String {
        url::remove_filter(&self.state, url, key)
    }

    pub fn remove_sub_filter_url(&self, url: &str, key: &str, value: &str) -> String {
        url::remove_sub_filter(&self.state, url, key, value)
    }

    pub fn clear_filter_url(&self, url: &str) -> String {
        url::clear_filters(&self.state, url)
    }

    pub fn clear_sort_url(&self, url: &str) -> String {
        url::clear_sort(&self.state, url)
    }

    pub fn clear_all_url(&self, url: &str) -> String {
        url::clear_all(&self.state, url)
    }

    /// See [`url::sort_url`]
    pub fn sort_url(
        &self,
        url: &str,
        key: &str,
        order: Option<SortDirection>,
        scope: Option<&str>,
    ) -> (String, Option<SortDirection>) {
        url::sort_url(&self.state, url, key, order, scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryRelation;

    fn filterable() -> Filterable<MemoryRelation<(&'static str, u32)>> {
        let schema = Schema::builder()
            .filter("name", "by_name")
            .sort("name", "sort_by_name")
            .sort("age", "sort_by_age")
            .default_sort("age")
            .build()
            .unwrap();
        let registry = Registry::new()
            .predicate("by_name", |r: MemoryRelation<(&'static str, u32)>, v: &str| {
                let v = v.to_string();
                r.where_(move |row| row.0 == v)
            })
            .ordering("sort_by_name", |r: MemoryRelation<(&'static str, u32)>, _: Option<&str>| {
                r.order_by(|row| row.0)
            })
            .ordering("sort_by_age", |r: MemoryRelation<(&'static str, u32)>, _: Option<&str>| {
                r.order_by(|row| row.1)
            });
        Filterable::new(schema, &registry, PaginationConfig::default()).unwrap()
    }

    fn rows() -> MemoryRelation<(&'static str, u32)> {
        MemoryRelation::new(vec![("b", 30), ("a", 40), ("c", 20)])
    }

    #[test]
    fn test_filter_uses_schema_default_sort() {
        let filtered = filterable()
            .filter(&RawParams::default(), rows(), FilterOptions::new())
            .unwrap();
        assert_eq!(filtered.sort_name(), Some("age"));
        assert_eq!(filtered.items.to_vec(), vec![("c", 20), ("b", 30), ("a", 40)]);
        assert!(!filtered.active_filters());
    }

    #[test]
    fn test_default_sort_override_from_value() {
        let options = FilterOptions::new()
            .with_default_sort_value(&serde_json::json!(["name", "desc"]))
            .unwrap();
        let filtered = filterable().filter(&RawParams::default(), rows(), options).unwrap();
        assert_eq!(filtered.sort_name(), Some("name"));
        assert_eq!(filtered.direction(), SortDirection::Desc);
        assert_eq!(filtered.items.to_vec()[0], ("c", 20));
    }

    #[test]
    fn test_malformed_default_sort_value() {
        let err = FilterOptions::new()
            .with_default_sort_value(&serde_json::json!({"name": "desc"}))
            .unwrap_err();
        assert_eq!(err.error_code(), "invalid_default_sort");
    }

    #[test]
    fn test_default_sort_drives_toggle_but_not_urls() {
        let filtered = filterable()
            .filter(&RawParams::default(), rows(), FilterOptions::new())
            .unwrap();
        assert_eq!(
            filtered.sort_url("/", "age", None, None),
            ("/?sort=age&order=desc".to_string(), Some(SortDirection::Asc))
        );
        assert_eq!(filtered.set_filter_url("/", "name", "a"), "/?filter%5Bname%5D=a");
    }

    #[test]
    fn test_pagination_can_be_disabled() {
        let params = RawParams::from_query("per=1");
        let filtered = filterable()
            .filter(&params, rows(), FilterOptions::new().without_pagination())
            .unwrap();
        assert_eq!(filtered.items.len(), 3);

        let filtered = filterable().filter(&params, rows(), FilterOptions::new()).unwrap();
        assert_eq!(filtered.items.len(), 1);
    }

    #[test]
    fn test_extra_params_in_urls() {
        let filtered = filterable()
            .filter(
                &RawParams::from_query("filter[name]=a"),
                rows(),
                FilterOptions::new().extra_param("tab", "active"),
            )
            .unwrap();
        assert!(filtered.active_filters());
        assert_eq!(filtered.clear_filter_url("/"), "/?tab=active");

        let more = filtered.with_extra_params([("view", "list")]);
        assert_eq!(more.clear_all_url("/"), "/?tab=active&view=list");
        assert_eq!(filtered.clear_all_url("/"), "/?tab=active");
    }

    #[test]
    fn test_page_follows_schema_max_per_page() {
        let schema = Schema::builder().max_per_page(5).build().unwrap();
        let config = PaginationConfig::default();
        assert_eq!(config.default_per_page, 10);
        let filterable = Filterable::new(schema, &Registry::new(), config).unwrap();
        let many = MemoryRelation::new((0..12u32).map(|n| ("x", n)).collect::<Vec<_>>());

        let filtered = filterable
            .filter(&RawParams::from_query("page=2"), many.clone(), FilterOptions::new())
            .unwrap();
        assert_eq!(filtered.page(), Some(PageRequest { page: 2, per_page: 5 }));
        assert_eq!(filtered.items.len(), 5);
        assert_eq!(filtered.page().map(|page| page.total_pages(12)), Some(3));

        let unpaged = filterable
            .filter(&RawParams::default(), many, FilterOptions::new().without_pagination())
            .unwrap();
        assert_eq!(unpaged.page(), None);
    }
}
