//! brook core - reactive event propagation primitives
//!
//! This crate defines the capabilities the rest of brook is built from:
//! - Sinks (value receivers with subscription identity)
//! - Sources (value producers with lazy connect/disconnect reporting)
//! - Signal (the canonical broadcast hub with start/stop lifecycle hooks)
//! - MergedSource (flattening fan-in composition)
//! - Trivial sources (`never`, `just`)

pub mod merged;
pub mod signal;
pub mod simple;
pub mod sink;
pub mod source;
pub mod transform;

pub use merged::*;
pub use signal::*;
pub use simple::*;
pub use sink::*;
pub use source::*;
pub use transform::*;
