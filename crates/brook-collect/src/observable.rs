//! Observable arrays
//!
//! An observable array pairs a current value with a source of future
//! `ArrayChange`s. Replaying a received change against the previously
//! observed value always reproduces the newly reported value.

use std::ops::Range;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use brook_core::{AnySource, Signal, SourceExt};

use crate::change::{ArrayChange, ArrayModification};
use crate::substitute::EmptySubstituted;

/// An array value paired with a stream of its future changes.
pub trait ObservableArray: Send + Sync {
    type Element: Clone + Send + Sync + 'static;

    /// The current array value.
    fn value(&self) -> Vec<Self::Element>;

    /// Number of elements in the current value.
    fn count(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// The element at `index`, if in bounds.
    fn get(&self, index: usize) -> Option<Self::Element>;

    /// The elements in `range`. The range must be in bounds.
    fn slice(&self, range: Range<usize>) -> Vec<Self::Element>;

    /// The stream of future changes.
    ///
    /// Attach and detach through the same returned handle; distinct calls
    /// may return distinct adapter instances.
    fn changes(&self) -> AnySource<ArrayChange<Self::Element>>;
}

/// Derived-view constructors shared by every observable array.
pub trait ObservableArrayExt: ObservableArray + Sized {
    /// A view that presents `substitution` whenever `self` is empty.
    ///
    /// The exposed change stream is rewritten so that it stays consistent
    /// with the exposed value at every step.
    fn replacing_if_empty(self, substitution: Vec<Self::Element>) -> EmptySubstituted<Self>
    where
        Self: 'static,
    {
        EmptySubstituted::new(self, substitution)
    }
}

impl<A: ObservableArray + Sized> ObservableArrayExt for A {}

struct VariableCore<E> {
    value: Mutex<Vec<E>>,
    changes: Signal<ArrayChange<E>>,
}

/// The canonical mutable observable array.
///
/// Mutations are expressed as `ArrayChange`s: the backing value is updated
/// first, then the change is broadcast, so a sink that consults `value()`
/// during delivery sees the post-change state.
pub struct ArrayVariable<E> {
    core: Arc<VariableCore<E>>,
}

impl<E: Clone + Send + Sync + 'static> ArrayVariable<E> {
    pub fn new(initial: Vec<E>) -> Self {
        ArrayVariable {
            core: Arc::new(VariableCore {
                value: Mutex::new(initial),
                changes: Signal::new(),
            }),
        }
    }

    /// Apply `change` to the backing value and broadcast it.
    ///
    /// Empty changes are dropped without broadcasting.
    pub fn apply(&self, change: ArrayChange<E>) {
        self.apply_locked(self.core.value.lock(), change);
    }

    // Build a change against the current value and apply it in one
    // critical section, so racing mutators never compose against a
    // stale count. The lock is released before the broadcast.
    fn mutate(&self, build: impl FnOnce(&Vec<E>) -> ArrayChange<E>) {
        let value = self.core.value.lock();
        let change = build(&value);
        self.apply_locked(value, change);
    }

    fn apply_locked(&self, mut value: MutexGuard<'_, Vec<E>>, change: ArrayChange<E>) {
        if change.is_empty() {
            return;
        }
        change.apply_to(&mut value);
        drop(value);
        self.core.changes.send(change);
    }

    /// Replace the whole value.
    pub fn set_value(&self, new: Vec<E>) {
        self.mutate(|value| ArrayChange::replacing(value.len(), 0..value.len(), new));
    }

    /// Append an element.
    pub fn push(&self, element: E) {
        self.mutate(|value| {
            let count = value.len();
            ArrayChange::replacing(count, count..count, vec![element])
        });
    }

    /// Remove and return the element at `index`.
    pub fn remove_at(&self, index: usize) -> E {
        let value = self.core.value.lock();
        let element = value[index].clone();
        let change = ArrayChange::replacing(value.len(), index..index + 1, vec![]);
        self.apply_locked(value, change);
        element
    }

    /// Replace `range` with `elements`.
    pub fn replace_range(&self, range: Range<usize>, elements: Vec<E>) {
        self.mutate(|value| {
            let mut change = ArrayChange::new(value.len());
            change.add(ArrayModification::replace(range, elements));
            change
        });
    }
}

impl<E: Clone + Send + Sync + 'static> ObservableArray for ArrayVariable<E> {
    type Element = E;

    fn value(&self) -> Vec<E> {
        self.core.value.lock().clone()
    }

    fn count(&self) -> usize {
        self.core.value.lock().len()
    }

    fn get(&self, index: usize) -> Option<E> {
        self.core.value.lock().get(index).cloned()
    }

    fn slice(&self, range: Range<usize>) -> Vec<E> {
        self.core.value.lock()[range].to_vec()
    }

    fn changes(&self) -> AnySource<ArrayChange<E>> {
        self.core.changes.clone().any_source()
    }
}

impl<E> Clone for ArrayVariable<E> {
    fn clone(&self) -> Self {
        ArrayVariable {
            core: Arc::clone(&self.core),
        }
    }
}
