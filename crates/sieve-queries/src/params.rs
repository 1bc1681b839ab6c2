//! Nested query parameters
//!
//! Decoded URL query strings using the conventional bracket nesting:
//! `filter[name]=test`, `filter[favorite_number][]=1&filter[favorite_number][]=2`.
//! Parsing never fails; pairs whose shape conflicts with an earlier pair are
//! skipped.

use serde::ser::{Serialize, SerializeMap, Serializer};
use url::form_urlencoded;

/// A decoded parameter value
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(untagged)]
pub enum QueryValue {
    String(String),
    Array(Vec<QueryValue>),
    Map(QueryMap),
}

impl QueryValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[QueryValue]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&QueryMap> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Whether the value would emit nothing when serialized
    pub fn is_empty(&self) -> bool {
        match self {
            Self::String(_) => false,
            Self::Array(items) => items.iter().all(QueryValue::is_empty),
            Self::Map(map) => map.iter().all(|(_, v)| v.is_empty()),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Vec<String>> for QueryValue {
    fn from(items: Vec<String>) -> Self {
        Self::Array(items.into_iter().map(QueryValue::String).collect())
    }
}

impl From<QueryMap> for QueryValue {
    fn from(map: QueryMap) -> Self {
        Self::Map(map)
    }
}

/// Insertion-ordered parameter map.
///
/// Order is kept so rebuilt URLs list parameters the way they arrived.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryMap {
    entries: Vec<(String, QueryValue)>,
}

impl QueryMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&QueryValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut QueryValue> {
        self.entries.iter_mut().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// String value under `key`, if it is a plain string
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(QueryValue::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Insert or replace; a replaced key keeps its position
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<QueryValue>) {
        let key = key.into();
        let value = value.into();
        match self.get_mut(&key) {
            Some(slot) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<QueryValue> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &QueryValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Map under `key`, created (or replacing a non-map value) when needed
    pub fn map_entry(&mut self, key: &str) -> &mut QueryMap {
        if !matches!(self.get(key), Some(QueryValue::Map(_))) {
            self.insert(key, QueryMap::new());
        }
        match self.get_mut(key) {
            Some(QueryValue::Map(map)) => map,
            _ => unreachable!("map entry was just inserted"),
        }
    }

    /// Recursive merge returning a new map.
    ///
    /// Keys present on both sides merge recursively when both values are maps;
    /// otherwise the value from `other` wins. Arrays are replaced, not
    /// concatenated.
    pub fn deep_merge(&self, other: &QueryMap) -> QueryMap {
        let mut merged = self.clone();
        for (key, value) in other.iter() {
            let next = match (merged.get(key), value) {
                (Some(QueryValue::Map(left)), QueryValue::Map(right)) => {
                    QueryValue::Map(left.deep_merge(right))
                }
                _ => value.clone(),
            };
            merged.insert(key, next);
        }
        merged
    }
}

impl FromIterator<(String, QueryValue)> for QueryMap {
    fn from_iter<I: IntoIterator<Item = (String, QueryValue)>>(iter: I) -> Self {
        let mut map = QueryMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl Serialize for QueryMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Push,
}

/// Split `a[b][]` into `("a", [Key("b"), Push])`.
///
/// Keys without well-formed brackets are taken literally.
fn split_key(key: &str) -> (String, Vec<Segment>) {
    let Some(open) = key.find('[') else {
        return (key.to_string(), Vec::new());
    };
    if open == 0 {
        return (key.to_string(), Vec::new());
    }

    let name = &key[..open];
    let mut rest = &key[open..];
    let mut segments = Vec::new();

    while let Some(stripped) = rest.strip_prefix('[') {
        let Some(close) = stripped.find(']') else {
            return (key.to_string(), Vec::new());
        };
        let inner = &stripped[..close];
        segments.push(if inner.is_empty() {
            Segment::Push
        } else {
            Segment::Key(inner.to_string())
        });
        rest = &stripped[close + 1..];
    }

    if !rest.is_empty() {
        return (key.to_string(), Vec::new());
    }

    (name.to_string(), segments)
}

/// Place `value` at `key` followed by `path`. Returns false on a shape conflict.
fn insert_path(target: &mut QueryMap, key: &str, path: &[Segment], value: String) -> bool {
    let Some((first, rest)) = path.split_first() else {
        target.insert(key, value);
        return true;
    };

    match first {
        Segment::Push => {
            if !target.contains_key(key) {
                target.insert(key, QueryValue::Array(Vec::new()));
            }
            let Some(QueryValue::Array(items)) = target.get_mut(key) else {
                return false;
            };
            match rest.split_first() {
                None => {
                    items.push(QueryValue::String(value));
                    true
                }
                Some((Segment::Key(child), tail)) => {
                    let reuse = matches!(
                        items.last(),
                        Some(QueryValue::Map(m)) if !m.contains_key(child)
                    );
                    if !reuse {
                        items.push(QueryValue::Map(QueryMap::new()));
                    }
                    match items.last_mut() {
                        Some(QueryValue::Map(m)) => insert_path(m, child, tail, value),
                        _ => false,
                    }
                }
                Some((Segment::Push, _)) => false,
            }
        }
        Segment::Key(child) => {
            if !target.contains_key(key) {
                target.insert(key, QueryMap::new());
            }
            match target.get_mut(key) {
                Some(QueryValue::Map(m)) => insert_path(m, child, rest, value),
                _ => false,
            }
        }
    }
}

/// Parse a raw query string (without the leading `?`)
pub fn parse_nested_query(query: &str) -> QueryMap {
    let mut map = QueryMap::new();

    for (raw_key, value) in form_urlencoded::parse(query.as_bytes()) {
        if raw_key.is_empty() {
            continue;
        }
        let (name, path) = split_key(&raw_key);
        if !insert_path(&mut map, &name, &path, value.into_owned()) {
            tracing::trace!(key = %raw_key, "Skipping conflicting query parameter");
        }
    }

    map
}

fn escape(s: &str) -> String {
    form_urlencoded::byte_serialize(s.as_bytes()).collect()
}

fn build_value(value: &QueryValue, prefix: &str, out: &mut Vec<String>) {
    match value {
        QueryValue::String(s) => out.push(format!("{}={}", escape(prefix), escape(s))),
        QueryValue::Array(items) => {
            let child = format!("{}[]", prefix);
            for item in items {
                build_value(item, &child, out);
            }
        }
        QueryValue::Map(map) => {
            for (k, v) in map.iter() {
                build_value(v, &format!("{}[{}]", prefix, k), out);
            }
        }
    }
}

/// Serialize a map back into a query string (without the leading `?`)
pub fn build_nested_query(map: &QueryMap) -> String {
    let mut pairs = Vec::new();
    for (key, value) in map.iter() {
        build_value(value, key, &mut pairs);
    }
    pairs.join("&")
}

/// Untrusted request parameters, as handed to the resolver
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawParams {
    map: QueryMap,
}

impl RawParams {
    pub fn from_query(query: &str) -> Self {
        Self {
            map: parse_nested_query(query.trim_start_matches('?')),
        }
    }

    pub fn from_map(map: QueryMap) -> Self {
        Self { map }
    }

    pub fn get(&self, key: &str) -> Option<&QueryValue> {
        self.map.get(key)
    }

    /// Non-blank string parameter
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.map.get_str(key).filter(|s| !s.trim().is_empty())
    }

    pub fn as_map(&self) -> &QueryMap {
        &self.map
    }
}
