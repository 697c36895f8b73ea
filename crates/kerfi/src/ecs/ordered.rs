//! # Ordered Insertion — Sequences Built From Before/After Constraints
//!
//! [`OrderedList`] is the one ordering algorithm in the crate. It sequences
//! the phases of a [`PhaseGraph`](super::phase::PhaseGraph) and the systems
//! inside each phase. Order is resolved once, at insertion, and never
//! re-resolved per tick.
//!
//! ```text
//! items:   [a, b, c, d]
//! add(x, after: [b], before: [d])
//!   min = 1 + index(b) = 2
//!   max =     index(d) = 3
//!   insert at max ──► [a, b, c, x, d]
//! ```
//!
//! An item goes as late as its `before` constraints allow, so independent
//! insertions keep registration order. Constraint items that aren't present
//! are ignored. If `min > max` no position satisfies both sides and the add
//! fails with [`EcsError::OrderConflict`], naming the conflicting items and
//! the current sequence.

use std::fmt;

use crate::error::EcsError;

/// A sequence with constraint-driven insertion.
#[derive(Clone, Debug)]
pub struct OrderedList<T> {
    items: Vec<T>,
}

impl<T> Default for OrderedList<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: PartialEq + Clone + fmt::Display> OrderedList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `item` after every present `after` item and before every
    /// present `before` item.
    ///
    /// Returns `Ok(false)` without changes if `item` is already in the list.
    pub fn add(&mut self, item: T, before: &[T], after: &[T]) -> Result<bool, EcsError> {
        if self.contains(&item) {
            return Ok(false);
        }

        let latest_after = after
            .iter()
            .filter_map(|a| self.position(a).map(|i| (i, a)))
            .max_by_key(|&(i, _)| i);
        let earliest_before = before
            .iter()
            .filter_map(|b| self.position(b).map(|i| (i, b)))
            .min_by_key(|&(i, _)| i);

        let min = latest_after.map_or(0, |(i, _)| i + 1);
        let max = earliest_before.map_or(self.items.len(), |(i, _)| i);

        if min > max {
            return Err(EcsError::OrderConflict {
                item: item.to_string(),
                after: latest_after.map(|(_, a)| a.to_string()).unwrap_or_default(),
                before: earliest_before.map(|(_, b)| b.to_string()).unwrap_or_default(),
                sequence: self.items.iter().map(ToString::to_string).collect(),
            });
        }

        self.items.insert(max, item);
        Ok(true)
    }

    /// Appends `item` unless it is already present.
    pub fn push(&mut self, item: T) -> bool {
        if self.contains(&item) {
            return false;
        }
        self.items.push(item);
        true
    }

    pub fn position(&self, item: &T) -> Option<usize> {
        self.items.iter().position(|i| i == item)
    }

    pub fn contains(&self, item: &T) -> bool {
        self.position(item).is_some()
    }
}

impl<T> OrderedList<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }
}

impl<'a, T> IntoIterator for &'a OrderedList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: &[&'static str]) -> OrderedList<&'static str> {
        let mut list = OrderedList::new();
        for &item in items {
            list.push(item);
        }
        list
    }

    #[test]
    fn unconstrained_items_append() {
        let mut l = OrderedList::new();
        assert_eq!(l.add("a", &[], &[]), Ok(true));
        assert_eq!(l.add("b", &[], &[]), Ok(true));
        assert_eq!(l.as_slice(), ["a", "b"]);
    }

    #[test]
    fn inserts_as_late_as_before_allows() {
        let mut l = list(&["a", "b", "c", "d"]);
        l.add("x", &["d"], &["b"]).unwrap();
        assert_eq!(l.as_slice(), ["a", "b", "c", "x", "d"]);
    }

    #[test]
    fn before_only_goes_directly_in_front() {
        let mut l = list(&["a", "b", "c"]);
        l.add("x", &["c", "b"], &[]).unwrap();
        assert_eq!(l.as_slice(), ["a", "x", "b", "c"]);
    }

    #[test]
    fn after_only_appends() {
        let mut l = list(&["a", "b", "c"]);
        l.add("x", &[], &["a"]).unwrap();
        assert_eq!(l.as_slice(), ["a", "b", "c", "x"]);
    }

    #[test]
    fn missing_constraint_items_are_ignored() {
        let mut l = list(&["a"]);
        l.add("x", &["ghost"], &["phantom"]).unwrap();
        assert_eq!(l.as_slice(), ["a", "x"]);
    }

    #[test]
    fn readding_is_noop() {
        let mut l = list(&["a", "b"]);
        assert_eq!(l.add("a", &[], &["b"]), Ok(false));
        assert_eq!(l.as_slice(), ["a", "b"]);
    }

    #[test]
    fn after_and_before_same_item_conflicts() {
        let mut l = list(&["a", "b"]);
        let err = l.add("x", &["a"], &["a"]).unwrap_err();
        assert_eq!(
            err,
            EcsError::OrderConflict {
                item: "x".into(),
                after: "a".into(),
                before: "a".into(),
                sequence: vec!["a".into(), "b".into()],
            }
        );
        assert_eq!(l.len(), 2);
    }

    #[test]
    fn reports_tightest_conflicting_pair() {
        let mut l = list(&["a", "b", "c", "d"]);
        let err = l.add("x", &["b", "d"], &["a", "c"]).unwrap_err();
        match err {
            EcsError::OrderConflict { after, before, .. } => {
                assert_eq!(after, "c");
                assert_eq!(before, "b");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn same_constraints_give_same_order() {
        let build = || {
            let mut l = OrderedList::new();
            l.add("physics", &[], &[]).unwrap();
            l.add("input", &["physics"], &[]).unwrap();
            l.add("camera", &[], &["physics"]).unwrap();
            l.add("ai", &["physics"], &["input"]).unwrap();
            l.as_slice().to_vec()
        };
        let first = build();
        assert_eq!(first, ["input", "ai", "physics", "camera"]);
        for _ in 0..5 {
            assert_eq!(build(), first);
        }
    }
}
