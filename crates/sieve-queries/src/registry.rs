//! Relation seam and predicate/ordering registry
//!
//! The compiler never touches a data source directly. It composes values of
//! a [`Relation`] using functions looked up by identifier in a [`Registry`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A composable, lazily evaluated query over some data source
pub trait Relation: Clone {
    /// Unrestricted relation over the same source
    fn all(&self) -> Self;

    /// Rows matching both relations
    fn and(self, other: Self) -> Self;

    /// Rows matching either relation
    fn or(self, other: Self) -> Self;

    /// Invert the current ordering
    fn reverse_order(self) -> Self;

    fn paginate(self, offset: u64, limit: u64) -> Self;
}

/// Narrows a relation by one filter value
pub type PredicateFn<R> = Arc<dyn Fn(R, &str) -> R + Send + Sync>;

/// Orders a relation, receiving the request's `scope` argument
pub type OrderingFn<R> = Arc<dyn Fn(R, Option<&str>) -> R + Send + Sync>;

/// Named predicates and orderings for one relation type
pub struct Registry<R> {
    predicates: HashMap<String, PredicateFn<R>>,
    orderings: HashMap<String, OrderingFn<R>>,
}

impl<R> Registry<R> {
    pub fn new() -> Self {
        Self {
            predicates: HashMap::new(),
            orderings: HashMap::new(),
        }
    }

    /// Register a filter predicate
    pub fn predicate<F>(mut self, id: impl Into<String>, f: F) -> Self
    where
        F: Fn(R, &str) -> R + Send + Sync + 'static,
    {
        self.predicates.insert(id.into(), Arc::new(f));
        self
    }

    /// Register an ordering
    pub fn ordering<F>(mut self, id: impl Into<String>, f: F) -> Self
    where
        F: Fn(R, Option<&str>) -> R + Send + Sync + 'static,
    {
        self.orderings.insert(id.into(), Arc::new(f));
        self
    }

    pub fn get_predicate(&self, id: &str) -> Option<&PredicateFn<R>> {
        self.predicates.get(id)
    }

    pub fn get_ordering(&self, id: &str) -> Option<&OrderingFn<R>> {
        self.orderings.get(id)
    }

    pub fn has_predicate(&self, id: &str) -> bool {
        self.predicates.contains_key(id)
    }

    pub fn has_ordering(&self, id: &str) -> bool {
        self.orderings.contains_key(id)
    }
}

impl<R> Default for Registry<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> Clone for Registry<R> {
    fn clone(&self) -> Self {
        Self {
            predicates: self.predicates.clone(),
            orderings: self.orderings.clone(),
        }
    }
}

impl<R> fmt::Debug for Registry<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut predicates: Vec<_> = self.predicates.keys().collect();
        let mut orderings: Vec<_> = self.orderings.keys().collect();
        predicates.sort();
        orderings.sort();
        f.debug_struct("Registry")
            .field("predicates", &predicates)
            .field("orderings", &orderings)
            .finish()
    }
}

/// An ordering as resolved for one sort
pub enum Ordering<R> {
    /// Descending requests reverse the forward ordering
    Generic(OrderingFn<R>),
    /// Descending requests call a dedicated ordering
    WithExplicitReverse {
        forward: OrderingFn<R>,
        reverse: OrderingFn<R>,
    },
}

impl<R: Relation> Ordering<R> {
    /// Apply in `direction`
    pub fn apply(&self, relation: R, descending: bool, scope: Option<&str>) -> R {
        match self {
            Ordering::Generic(f) if descending => f(relation, scope).reverse_order(),
            Ordering::Generic(f) => f(relation, scope),
            Ordering::WithExplicitReverse { reverse, .. } if descending => reverse(relation, scope),
            Ordering::WithExplicitReverse { forward, .. } => forward(relation, scope),
        }
    }
}

impl<R> Clone for Ordering<R> {
    fn clone(&self) -> Self {
        match self {
            Ordering::Generic(f) => Ordering::Generic(Arc::clone(f)),
            Ordering::WithExplicitReverse { forward, reverse } => Ordering::WithExplicitReverse {
                forward: Arc::clone(forward),
                reverse: Arc::clone(reverse),
            },
        }
    }
}

impl<R> fmt::Debug for Ordering<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ordering::Generic(_) => f.write_str("Ordering::Generic"),
            Ordering::WithExplicitReverse { .. } => f.write_str("Ordering::WithExplicitReverse"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Trace(Vec<String>);

    impl Relation for Trace {
        fn all(&self) -> Self {
            Trace(Vec::new())
        }
        fn and(mut self, other: Self) -> Self {
            self.0.extend(other.0);
            self
        }
        fn or(self, other: Self) -> Self {
            Trace(vec![format!("({}) OR ({})", self.0.join(","), other.0.join(","))])
        }
        fn reverse_order(mut self) -> Self {
            self.0.push("reverse".into());
            self
        }
        fn paginate(mut self, offset: u64, limit: u64) -> Self {
            self.0.push(format!("page {} {}", offset, limit));
            self
        }
    }

    fn push(label: &'static str) -> impl Fn(Trace, Option<&str>) -> Trace {
        move |mut t: Trace, _: Option<&str>| {
            t.0.push(label.into());
            t
        }
    }

    #[test]
    fn test_registry_lookup() {
        let registry: Registry<Trace> = Registry::new()
            .predicate("by_name", |mut t: Trace, v: &str| {
                t.0.push(format!("name={}", v));
                t
            })
            .ordering("by_name", push("order name"));

        assert!(registry.has_predicate("by_name"));
        assert!(registry.has_ordering("by_name"));
        assert!(!registry.has_predicate("by_age"));

        let pred = registry.get_predicate("by_name").unwrap();
        assert_eq!(pred(Trace(vec![]), "x").0, vec!["name=x"]);
    }

    #[test]
    fn test_generic_ordering_reverses() {
        let ordering: Ordering<Trace> = Ordering::Generic(Arc::new(push("order name")));
        assert_eq!(ordering.apply(Trace(vec![]), false, None).0, vec!["order name"]);
        assert_eq!(
            ordering.apply(Trace(vec![]), true, None).0,
            vec!["order name", "reverse"]
        );
    }

    #[test]
    fn test_explicit_reverse_is_not_reversed() {
        let ordering: Ordering<Trace> = Ordering::WithExplicitReverse {
            forward: Arc::new(push("order name")),
            reverse: Arc::new(push("order name_reversed")),
        };
        assert_eq!(
            ordering.apply(Trace(vec![]), true, None).0,
            vec!["order name_reversed"]
        );
    }

    #[test]
    fn test_ordering_receives_scope() {
        let ordering: Ordering<Trace> = Ordering::Generic(Arc::new(|mut t: Trace, scope: Option<&str>| {
            t.0.push(format!("scope {:?}", scope));
            t
        }));
        assert_eq!(
            ordering.apply(Trace(vec![]), false, Some("7")).0,
            vec!["scope Some(\"7\")"]
        );
    }
}
