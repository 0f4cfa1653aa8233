//! MergedSource - fan-in composition over multiple inputs
//!
//! A merged source forwards every value from any of its inputs to all of
//! its own sinks. It only subscribes to its inputs while it has at least
//! one sink of its own, and merging merges flattens: the composite is
//! always rebuilt over the flat input list, never wrapped, so fan-out
//! depth stays constant no matter how many merges are chained.

use std::sync::Arc;

use crate::signal::Signal;
use crate::sink::{AnySink, OwnerId, SinkId};
use crate::source::{AnySource, Source, SourceExt};

struct MergedCore<V> {
    id: OwnerId,
    inputs: Vec<AnySource<V>>,
    signal: Signal<V>,
}

/// Fan-in composite source over an ordered, construction-fixed input list.
pub struct MergedSource<V> {
    core: Arc<MergedCore<V>>,
}

impl<V: Clone + 'static> MergedSource<V> {
    /// A merged source over `inputs`, in order.
    pub fn new(inputs: Vec<AnySource<V>>) -> Self {
        MergedSource {
            core: Arc::new(MergedCore {
                id: OwnerId::fresh(),
                inputs,
                signal: Signal::new(),
            }),
        }
    }

    /// Merge every source yielded by `sources`.
    pub fn merge_all<I>(sources: I) -> Self
    where
        I: IntoIterator,
        I::Item: Source<Value = V> + 'static,
    {
        Self::new(sources.into_iter().map(SourceExt::any_source).collect())
    }

    /// The inputs this composite fans in, in order.
    pub fn inputs(&self) -> &[AnySource<V>] {
        &self.core.inputs
    }

    /// A new merged source over `self`'s inputs plus `other`.
    ///
    /// This rebuilds from the flat input list instead of wrapping `self`,
    /// so `a.merged(b).merge(c).merge(d)` fans in `[a, b, c, d]` directly.
    pub fn merge<S>(&self, other: S) -> MergedSource<V>
    where
        S: Source<Value = V> + 'static,
    {
        let mut inputs = self.core.inputs.clone();
        inputs.push(other.any_source());
        Self::new(inputs)
    }

    // The per-input forwarding sink. Identity is (own id, input index), so
    // separately constructed handles for the same input compare equal and
    // removal finds the registration made by add.
    fn forward_sink(&self, index: usize) -> AnySink<V> {
        let signal = self.core.signal.clone();
        AnySink::from_fn_with_id(SinkId::new(self.core.id, index), move |value: V| {
            signal.send(value)
        })
    }
}

impl<V: Clone + 'static> Source for MergedSource<V> {
    type Value = V;

    /// Attach `sink`; on the first attach, subscribe to every input.
    fn add(&self, sink: AnySink<V>) -> bool {
        let first = self.core.signal.add(sink);
        if first {
            for (index, input) in self.core.inputs.iter().enumerate() {
                input.add(self.forward_sink(index));
            }
        }
        first
    }

    /// Detach `sink`; on the last detach, unsubscribe from every input.
    fn remove(&self, sink: &AnySink<V>) -> bool {
        let last = self.core.signal.remove(sink);
        if last {
            for (index, input) in self.core.inputs.iter().enumerate() {
                input.remove(&self.forward_sink(index));
            }
        }
        last
    }
}

impl<V> Clone for MergedSource<V> {
    fn clone(&self) -> Self {
        MergedSource {
            core: Arc::clone(&self.core),
        }
    }
}
