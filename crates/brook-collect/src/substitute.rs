//! Empty-collection substitution
//!
//! `replacing_if_empty` presents a fixed substitution array whenever the
//! underlying observable array is empty. The exposed change stream is
//! rewritten per incoming change so that count bookkeeping and index
//! validity stay consistent with the exposed value.

use std::ops::Range;

use brook_core::{AnySource, SourceExt};

use crate::change::{ArrayChange, ArrayModification};
use crate::observable::ObservableArray;

/// Rewrite one change from the underlying array into the change the
/// substituted view exposes. `None` means nothing is emitted.
///
/// Stateless on purpose: the rewrite depends only on the change's
/// endpoint counts and the substitution, so it can be tested without a
/// live subscription.
pub fn substitute_change<E: Clone>(
    change: ArrayChange<E>,
    substitution: &[E],
) -> Option<ArrayChange<E>> {
    if change.is_empty() {
        return None;
    }
    if change.final_count() == 0 {
        if change.initial_count() == 0 {
            // Vacuous empty-to-empty churn; the exposed value never moved
            // off the substitution.
            return None;
        }
        // Non-empty to empty: the view swaps the whole content for the
        // substitution.
        Some(ArrayChange::replacing(
            change.initial_count(),
            0..change.initial_count(),
            substitution.to_vec(),
        ))
    } else if change.initial_count() == 0 {
        // Empty to non-empty: first undo the substitution, then lay the
        // real elements on top.
        let mut undo = ArrayChange::new(substitution.len());
        undo.add(ArrayModification::replace(0..substitution.len(), vec![]));
        Some(undo.merge(change))
    } else {
        Some(change)
    }
}

/// Observable-array view substituting a constant array while the inner
/// array is empty. Built by
/// [`ObservableArrayExt::replacing_if_empty`](crate::ObservableArrayExt::replacing_if_empty).
pub struct EmptySubstituted<A: ObservableArray> {
    inner: A,
    substitution: Vec<A::Element>,
    changes: AnySource<ArrayChange<A::Element>>,
}

impl<A: ObservableArray + 'static> EmptySubstituted<A> {
    pub fn new(inner: A, substitution: Vec<A::Element>) -> Self {
        let for_rewrite = substitution.clone();
        let changes = inner
            .changes()
            .filter_map(move |change| substitute_change(change, &for_rewrite));
        EmptySubstituted {
            inner,
            substitution,
            changes,
        }
    }
}

impl<A: ObservableArray + 'static> ObservableArray for EmptySubstituted<A> {
    type Element = A::Element;

    fn value(&self) -> Vec<A::Element> {
        if self.inner.is_empty() {
            self.substitution.clone()
        } else {
            self.inner.value()
        }
    }

    fn count(&self) -> usize {
        if self.inner.is_empty() {
            self.substitution.len()
        } else {
            self.inner.count()
        }
    }

    fn get(&self, index: usize) -> Option<A::Element> {
        if self.inner.is_empty() {
            self.substitution.get(index).cloned()
        } else {
            self.inner.get(index)
        }
    }

    fn slice(&self, range: Range<usize>) -> Vec<A::Element> {
        if self.inner.is_empty() {
            self.substitution[range].to_vec()
        } else {
            self.inner.slice(range)
        }
    }

    fn changes(&self) -> AnySource<ArrayChange<A::Element>> {
        self.changes.clone()
    }
}
