//! brook test harness - shared helpers for integration and property tests
//!
//! The suites themselves live in `tests/`; benchmarks in `benches/`.

use std::sync::Arc;

use parking_lot::Mutex;

use brook_core::{AnySink, Source};

/// A sink that records every value it receives, in order.
pub struct Recorder<V> {
    sink: AnySink<V>,
    seen: Arc<Mutex<Vec<V>>>,
}

impl<V: Clone + Send + Sync + 'static> Recorder<V> {
    pub fn new() -> Self {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        Recorder {
            sink: AnySink::from_fn(move |v: V| s.lock().push(v)),
            seen,
        }
    }

    /// A recorder already attached to `source`.
    pub fn attached(source: &impl Source<Value = V>) -> Self {
        let recorder = Self::new();
        source.add(recorder.sink.clone());
        recorder
    }

    /// The recording sink handle, for attach/detach.
    pub fn sink(&self) -> AnySink<V> {
        self.sink.clone()
    }

    /// Everything received so far.
    pub fn values(&self) -> Vec<V> {
        self.seen.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.seen.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.lock().is_empty()
    }
}

impl<V: Clone + Send + Sync + 'static> Default for Recorder<V> {
    fn default() -> Self {
        Self::new()
    }
}
