//! Source capability - producers of value streams
//!
//! A source hands values to registered sinks. Registration reports lifecycle
//! edges: `add` returns true iff it caused the first connection, `remove`
//! returns true iff it caused the last disconnection. Producers use those
//! edges to stay dormant until someone is listening.

use std::fmt;
use std::sync::Arc;

use crate::merged::MergedSource;
use crate::sink::AnySink;
use crate::transform::FilterMapSource;

/// A producer of values over time.
///
/// Contract: `add` immediately followed by `remove` of the same sink leaves
/// the subscriber count as it was before the `add`.
pub trait Source: Send + Sync {
    type Value;

    /// Register `sink`; returns true iff this was the first connection.
    fn add(&self, sink: AnySink<Self::Value>) -> bool;

    /// Unregister `sink`; returns true iff this was the last disconnection.
    ///
    /// Removing a sink that was never added is a harmless no-op returning
    /// false.
    fn remove(&self, sink: &AnySink<Self::Value>) -> bool;
}

/// Type-erased, cheaply cloneable source handle.
pub struct AnySource<V> {
    inner: Arc<dyn Source<Value = V>>,
}

impl<V: 'static> AnySource<V> {
    pub fn new(source: impl Source<Value = V> + 'static) -> Self {
        AnySource {
            inner: Arc::new(source),
        }
    }
}

impl<V> Source for AnySource<V> {
    type Value = V;

    fn add(&self, sink: AnySink<V>) -> bool {
        self.inner.add(sink)
    }

    fn remove(&self, sink: &AnySink<V>) -> bool {
        self.inner.remove(sink)
    }
}

impl<V> Clone for AnySource<V> {
    fn clone(&self) -> Self {
        AnySource {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> fmt::Debug for AnySource<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AnySource")
    }
}

/// Convenience surface shared by every source.
pub trait SourceExt: Source + Sized + 'static {
    /// Erase the concrete source type.
    fn any_source(self) -> AnySource<Self::Value> {
        AnySource::new(self)
    }

    /// Merge this source with another one producing the same value type.
    ///
    /// The result forwards every value from either input to its own sinks.
    /// Chaining merges is fine: [`MergedSource::merge`] collapses chains
    /// into a single flat composite.
    fn merged<S>(self, other: S) -> MergedSource<Self::Value>
    where
        S: Source<Value = Self::Value> + 'static,
        Self::Value: Clone + 'static,
    {
        MergedSource::new(vec![self.any_source(), other.any_source()])
    }

    /// Derive a source that forwards `f(value)` whenever it is `Some`.
    ///
    /// This is internal plumbing for derived streams (change rewriting,
    /// deduplication); it is not a general combinator family.
    fn filter_map<W, F>(self, f: F) -> AnySource<W>
    where
        W: Clone + 'static,
        Self::Value: 'static,
        F: Fn(Self::Value) -> Option<W> + Send + Sync + 'static,
    {
        FilterMapSource::new(self.any_source(), f).any_source()
    }

    /// Attach a closure sink and return its handle for later removal.
    fn observe<F>(&self, f: F) -> AnySink<Self::Value>
    where
        F: Fn(Self::Value) + Send + Sync + 'static,
        Self::Value: 'static,
    {
        let sink = AnySink::from_fn(f);
        self.add(sink.clone());
        sink
    }
}

impl<S: Source + Sized + 'static> SourceExt for S {}
