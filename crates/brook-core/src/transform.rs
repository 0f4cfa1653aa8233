//! Filter-map source adapter
//!
//! Wraps an input source and forwards `f(value)` to downstream sinks
//! whenever it is `Some`. The adapter fans out through one internal
//! signal and holds exactly one registration on the input while it has
//! any sinks of its own, so the transform runs once per upstream value
//! no matter how many sinks are attached. Stateful transforms (such as
//! deduplication) rely on that.

use std::sync::Arc;

use crate::signal::Signal;
use crate::sink::{AnySink, OwnerId, SinkId};
use crate::source::{AnySource, Source};

struct FilterMapCore<V, W> {
    id: OwnerId,
    input: AnySource<V>,
    transform: Arc<dyn Fn(V) -> Option<W> + Send + Sync>,
    signal: Signal<W>,
}

pub struct FilterMapSource<V, W> {
    core: Arc<FilterMapCore<V, W>>,
}

impl<V: 'static, W: Clone + 'static> FilterMapSource<V, W> {
    pub fn new(input: AnySource<V>, f: impl Fn(V) -> Option<W> + Send + Sync + 'static) -> Self {
        FilterMapSource {
            core: Arc::new(FilterMapCore {
                id: OwnerId::fresh(),
                input,
                transform: Arc::new(f),
                signal: Signal::new(),
            }),
        }
    }

    // The single upstream forwarding sink. Identity is (own id, 0), so
    // separately constructed handles compare equal and removal finds the
    // registration made by add.
    fn forward_sink(&self) -> AnySink<V> {
        let f = Arc::clone(&self.core.transform);
        let signal = self.core.signal.clone();
        AnySink::from_fn_with_id(SinkId::new(self.core.id, 0), move |value: V| {
            if let Some(mapped) = f(value) {
                signal.send(mapped);
            }
        })
    }
}

impl<V: 'static, W: Clone + 'static> Source for FilterMapSource<V, W> {
    type Value = W;

    /// Attach `sink`; on the first attach, subscribe to the input.
    fn add(&self, sink: AnySink<W>) -> bool {
        let first = self.core.signal.add(sink);
        if first {
            self.core.input.add(self.forward_sink());
        }
        first
    }

    /// Detach `sink`; on the last detach, unsubscribe from the input.
    fn remove(&self, sink: &AnySink<W>) -> bool {
        let last = self.core.signal.remove(sink);
        if last {
            self.core.input.remove(&self.forward_sink());
        }
        last
    }
}

impl<V, W> Clone for FilterMapSource<V, W> {
    fn clone(&self) -> Self {
        FilterMapSource {
            core: Arc::clone(&self.core),
        }
    }
}
