//! brook collect - observable arrays and the array-change algebra
//!
//! This crate provides:
//! - `ArrayChange` / `ArrayModification` - structured diffs describing an
//!   array's transition between two states
//! - `ObservableArray` - an array value paired with a stream of its
//!   future changes
//! - `ArrayVariable` - the canonical mutable observable array
//! - `replacing_if_empty` - transparent substitution of a constant array
//!   whenever the observed array is empty

pub mod change;
pub mod observable;
pub mod substitute;

pub use change::*;
pub use observable::*;
pub use substitute::*;
