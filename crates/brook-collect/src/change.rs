//! Incremental array-change descriptions
//!
//! An `ArrayChange` takes an array of `initial_count` elements to one of
//! `final_count` elements via an ordered sequence of range replacements.
//! Modifications compose sequentially: each range refers to the array
//! state produced by the modifications before it, not to the original
//! array.

use std::ops::Range;

/// A single modification step. Range replacement is the only shape the
/// algebra needs: insertions and deletions are replacements with an empty
/// range or an empty element list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArrayModification<E> {
    ReplaceRange {
        range: Range<usize>,
        elements: Vec<E>,
    },
}

impl<E> ArrayModification<E> {
    /// Replace `range` with `elements`.
    pub fn replace(range: Range<usize>, elements: Vec<E>) -> Self {
        ArrayModification::ReplaceRange { range, elements }
    }

    /// Net element-count effect of this step.
    pub fn delta(&self) -> isize {
        match self {
            ArrayModification::ReplaceRange { range, elements } => {
                elements.len() as isize - range.len() as isize
            }
        }
    }

    /// Structurally empty: replaces nothing with nothing.
    pub fn is_noop(&self) -> bool {
        match self {
            ArrayModification::ReplaceRange { range, elements } => {
                range.is_empty() && elements.is_empty()
            }
        }
    }
}

/// A structured diff from an array of `initial_count` elements to one of
/// `final_count` elements.
///
/// Invariant: applying all modifications in order to an array of
/// `initial_count` elements yields exactly `final_count` elements.
/// `final_count` is maintained by construction as modifications are added.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArrayChange<E> {
    initial_count: usize,
    final_count: usize,
    modifications: Vec<ArrayModification<E>>,
}

impl<E> ArrayChange<E> {
    /// An empty change on an array of `initial_count` elements.
    pub fn new(initial_count: usize) -> Self {
        ArrayChange {
            initial_count,
            final_count: initial_count,
            modifications: Vec::new(),
        }
    }

    /// A change consisting of a single range replacement.
    pub fn replacing(initial_count: usize, range: Range<usize>, elements: Vec<E>) -> Self {
        let mut change = Self::new(initial_count);
        change.add(ArrayModification::replace(range, elements));
        change
    }

    /// Append a modification. Structurally empty steps are dropped.
    ///
    /// The range must be valid for the array state produced by the
    /// modifications already recorded.
    pub fn add(&mut self, modification: ArrayModification<E>) {
        if modification.is_noop() {
            return;
        }
        match &modification {
            ArrayModification::ReplaceRange { range, .. } => {
                debug_assert!(range.end <= self.final_count, "range past end of array state");
            }
        }
        self.final_count = (self.final_count as isize + modification.delta()) as usize;
        self.modifications.push(modification);
    }

    #[inline]
    pub fn initial_count(&self) -> usize {
        self.initial_count
    }

    #[inline]
    pub fn final_count(&self) -> usize {
        self.final_count
    }

    pub fn modifications(&self) -> &[ArrayModification<E>] {
        &self.modifications
    }

    /// True iff the change has no recorded modifications (no net effect).
    pub fn is_empty(&self) -> bool {
        self.modifications.is_empty()
    }

    /// Sequential composition: a change equivalent to `self` then `other`.
    ///
    /// `other` must start where `self` ends (`self.final_count ==
    /// other.initial_count`); anything else is a programmer error.
    pub fn merge(mut self, other: ArrayChange<E>) -> ArrayChange<E> {
        assert_eq!(
            self.final_count, other.initial_count,
            "merged changes must compose sequentially"
        );
        self.modifications.extend(other.modifications);
        self.final_count = other.final_count;
        self
    }

    /// Apply this change to `array` in place.
    ///
    /// `array` must hold exactly `initial_count` elements; afterwards it
    /// holds exactly `final_count`.
    pub fn apply_to(&self, array: &mut Vec<E>)
    where
        E: Clone,
    {
        assert_eq!(
            array.len(),
            self.initial_count,
            "change applied to array of the wrong length"
        );
        for modification in &self.modifications {
            match modification {
                ArrayModification::ReplaceRange { range, elements } => {
                    array.splice(range.clone(), elements.iter().cloned());
                }
            }
        }
        debug_assert_eq!(array.len(), self.final_count);
    }
}
