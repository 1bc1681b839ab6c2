//! In-memory relation
//!
//! A [`Relation`] over a shared `Vec<T>`. Selections are index lists into the
//! source, so composing relations never clones rows.

use std::cmp::Ordering as CmpOrdering;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::registry::Relation;

pub struct MemoryRelation<T> {
    source: Arc<Vec<T>>,
    /// Indices into `source`, in output order
    selected: Vec<usize>,
}

impl<T> MemoryRelation<T> {
    pub fn new(rows: Vec<T>) -> Self {
        let selected = (0..rows.len()).collect();
        Self {
            source: Arc::new(rows),
            selected,
        }
    }

    /// Keep rows matching `predicate`
    pub fn where_<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&T) -> bool,
    {
        let source = Arc::clone(&self.source);
        self.selected.retain(|&i| predicate(&source[i]));
        self
    }

    /// Stable sort by `key`, ascending
    pub fn order_by<K, F>(self, key: F) -> Self
    where
        K: Ord,
        F: Fn(&T) -> K,
    {
        self.order_by_cmp(|a, b| key(a).cmp(&key(b)))
    }

    pub fn order_by_cmp<F>(mut self, compare: F) -> Self
    where
        F: Fn(&T, &T) -> CmpOrdering,
    {
        let source = Arc::clone(&self.source);
        self.selected
            .sort_by(|&a, &b| compare(&source[a], &source[b]));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.selected.iter().map(|&i| &self.source[i])
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.iter().cloned().collect()
    }
}

impl<T> Clone for MemoryRelation<T> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            selected: self.selected.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for MemoryRelation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T> Relation for MemoryRelation<T> {
    fn all(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            selected: (0..self.source.len()).collect(),
        }
    }

    fn and(mut self, other: Self) -> Self {
        let keep: BTreeSet<usize> = other.selected.into_iter().collect();
        self.selected.retain(|i| keep.contains(i));
        self
    }

    fn or(self, other: Self) -> Self {
        let union: BTreeSet<usize> = self.selected.into_iter().chain(other.selected).collect();
        Self {
            source: self.source,
            selected: union.into_iter().collect(),
        }
    }

    fn reverse_order(mut self) -> Self {
        self.selected.reverse();
        self
    }

    fn paginate(self, offset: u64, limit: u64) -> Self {
        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Self {
            selected: self.selected.into_iter().skip(offset).take(limit).collect(),
            source: self.source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers() -> MemoryRelation<u32> {
        MemoryRelation::new(vec![5, 3, 8, 1, 9, 2])
    }

    #[test]
    fn test_where_and_order() {
        let rel = numbers().where_(|n| *n > 2).order_by(|n| *n);
        assert_eq!(rel.to_vec(), vec![3, 5, 8, 9]);
    }

    #[test]
    fn test_and_keeps_left_order() {
        let rel = numbers().order_by(|n| *n);
        let odd = rel.all().where_(|n| n % 2 == 1);
        assert_eq!(rel.and(odd).to_vec(), vec![1, 3, 5, 9]);
    }

    #[test]
    fn test_or_unions_in_source_order() {
        let rel = numbers();
        let small = rel.all().where_(|n| *n < 3);
        let big = rel.all().where_(|n| *n > 7);
        assert_eq!(small.or(big).to_vec(), vec![8, 1, 9, 2]);
    }

    #[test]
    fn test_reverse_and_paginate() {
        let rel = numbers().order_by(|n| *n).reverse_order().paginate(1, 2);
        assert_eq!(rel.to_vec(), vec![8, 5]);
        assert_eq!(numbers().paginate(10, 5).len(), 0);
    }

    #[test]
    fn test_rows_are_shared() {
        let rel = MemoryRelation::new(vec![String::from("a"), String::from("b")]);
        let other = rel.all().where_(|s| s == "b");
        assert!(Arc::ptr_eq(&rel.source, &other.source));
        assert_eq!(other.iter().collect::<Vec<_>>(), vec!["b"]);
    }
}
