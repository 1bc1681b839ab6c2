//! URL generation through the `Filtered` facade

use sieve_core::PaginationConfig;
use sieve_queries::{
    FilterOptions, Filterable, Filtered, MemoryRelation, RawParams, Registry, Schema, SortDirection,
};

#[derive(Debug, Clone, PartialEq)]
struct Person {
    name: &'static str,
    favorite_number: u32,
}

type People = MemoryRelation<Person>;

fn people() -> People {
    MemoryRelation::new(vec![
        Person { name: "test", favorite_number: 1 },
        Person { name: "other", favorite_number: 2 },
        Person { name: "test", favorite_number: 3 },
    ])
}

fn filterable() -> Filterable<People> {
    let schema = Schema::builder()
        .filter("name", "filter_by_name")
        .filter("favorite_number", "filter_by_favorite_number")
        .multi_valued("favorite_number")
        .sort("name", "sort_by_name")
        .build()
        .unwrap();

    let registry = Registry::new()
        .predicate("filter_by_name", |r: People, v: &str| {
            let v = v.to_string();
            r.where_(move |p| p.name == v)
        })
        .predicate("filter_by_favorite_number", |r: People, v: &str| {
            let n = v.parse::<u32>().ok();
            r.where_(move |p| Some(p.favorite_number) == n)
        })
        .ordering("sort_by_name", |r: People, _: Option<&str>| r.order_by(|p| p.name));

    Filterable::new(schema, &registry, PaginationConfig::default()).unwrap()
}

fn filtered(query: &str) -> Filtered<People> {
    filterable()
        .filter(&RawParams::from_query(query), people(), FilterOptions::new())
        .unwrap()
}

#[test]
fn test_set_filter_url() {
    assert_eq!(filtered("").set_filter_url("/", "name", "test"), "/?filter%5Bname%5D=test");
}

#[test]
fn test_set_filter_replaces_other_filters() {
    let f = filtered("filter[favorite_number]=2");
    assert_eq!(f.set_filter_url("/", "name", "test"), "/?filter%5Bname%5D=test");
}

#[test]
fn test_set_filter_is_idempotent() {
    let f = filtered("");
    let once = f.set_filter_url("/?a=1", "name", "test");
    assert_eq!(f.set_filter_url(&once, "name", "test"), once);
}

#[test]
fn test_add_filter_keeps_other_keys() {
    let f = filtered("filter[name]=test");
    assert_eq!(
        f.add_filter_url("/?filter%5Bcreated_at%5D=today", "favorite_number", vec!["1", "2"]),
        "/?filter%5Bcreated_at%5D=today&filter%5Bname%5D=test\
         &filter%5Bfavorite_number%5D%5B%5D=1&filter%5Bfavorite_number%5D%5B%5D=2"
    );
}

#[test]
fn test_remove_filter_url() {
    let f = filtered("");
    assert_eq!(f.remove_filter_url("/?filter%5Bname%5D=123", "name"), "/");
    assert_eq!(f.remove_filter_url("/?a=1&filter[name]=x", "name"), "/?a=1");
}

#[test]
fn test_remove_filter_from_state() {
    let f = filtered("filter[name]=test&filter[favorite_number]=1");
    assert_eq!(
        f.remove_filter_url("/", "name"),
        "/?filter%5Bfavorite_number%5D=1"
    );
}

#[test]
fn test_remove_sub_filter_url() {
    let f = filtered("");
    assert_eq!(
        f.remove_sub_filter_url("/?filter%5Bname%5D%5B%5D=123", "name", "123"),
        "/"
    );

    let f = filtered("filter[favorite_number][]=1&filter[favorite_number][]=2");
    assert_eq!(
        f.remove_sub_filter_url("/", "favorite_number", "1"),
        "/?filter%5Bfavorite_number%5D%5B%5D=2"
    );
}

#[test]
fn test_clear_urls() {
    let f = filtered("");
    let url = "/?filter%5Bname%5D=test&sort=name&order=desc";
    assert_eq!(f.clear_filter_url(url), "/?sort=name&order=desc");
    assert_eq!(f.clear_sort_url(url), "/?filter%5Bname%5D=test");
    assert_eq!(f.clear_all_url(url), "/");
}

#[test]
fn test_clear_all_from_state() {
    let f = filtered("filter[name]=test&sort=name&order=desc&page=2");
    assert_eq!(f.clear_all_url("/list?keep=1"), "/list?keep=1&page=2");
}

#[test]
fn test_sort_url_when_sorted_ascending() {
    let f = filtered("sort=name");
    assert_eq!(
        f.sort_url("/", "name", None, None),
        ("/?sort=name&order=desc".to_string(), Some(SortDirection::Asc))
    );
}

#[test]
fn test_sort_url_when_unsorted() {
    let f = filtered("");
    assert_eq!(
        f.sort_url("/", "name", None, None),
        ("/?sort=name".to_string(), None)
    );
}

#[test]
fn test_sort_url_when_sorted_descending() {
    let f = filtered("sort=name&order=desc");
    assert_eq!(
        f.sort_url("/", "name", None, None),
        ("/?sort=name&order=asc".to_string(), Some(SortDirection::Desc))
    );
}

#[test]
fn test_sort_url_other_column_drops_order() {
    let f = filtered("sort=name&order=desc");
    assert_eq!(
        f.sort_url("/", "favorite_number", None, None),
        ("/?sort=favorite_number".to_string(), None)
    );
}

#[test]
fn test_sort_url_includes_extra_params() {
    let f = filterable()
        .filter(
            &RawParams::from_query("sort=name"),
            people(),
            FilterOptions::new().extra_param("tab", "active").extra_param("view", "list"),
        )
        .unwrap();

    let (url, state) = f.sort_url("/", "name", None, None);
    assert_eq!(state, Some(SortDirection::Asc));
    assert!(url.contains("sort=name"));
    assert!(url.contains("order=desc"));
    assert!(url.contains("tab=active"));
    assert!(url.contains("view=list"));
}

#[test]
fn test_sort_url_merges_extra_params_with_existing() {
    let f = filterable()
        .filter(
            &RawParams::from_query("sort=name"),
            people(),
            FilterOptions::new().extra_param("tab", "active"),
        )
        .unwrap();

    let (url, _) = f.sort_url("/?existing=param", "name", None, None);
    assert_eq!(url, "/?existing=param&tab=active&sort=name&order=desc");
}

#[test]
fn test_urls_keep_host_and_fragment() {
    let f = filtered("");
    assert_eq!(
        f.add_filter_url("https://example.com/people?x=1#results", "name", "a b"),
        "https://example.com/people?x=1&filter%5Bname%5D=a+b#results"
    );
}

#[test]
fn test_filtered_items() {
    let f = filtered("filter[name]=test&filter[favorite_number][]=1&filter[favorite_number][]=2");
    assert_eq!(
        f.items.to_vec(),
        vec![Person { name: "test", favorite_number: 1 }]
    );
}
