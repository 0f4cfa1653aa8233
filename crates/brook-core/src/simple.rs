//! Trivial sources: `never` and `just`

use std::marker::PhantomData;

use crate::sink::{AnySink, Sink};
use crate::source::{AnySource, Source, SourceExt};

struct NeverSource<V> {
    _marker: PhantomData<fn() -> V>,
}

impl<V> Source for NeverSource<V> {
    type Value = V;

    fn add(&self, _sink: AnySink<V>) -> bool {
        false
    }

    fn remove(&self, _sink: &AnySink<V>) -> bool {
        false
    }
}

/// A source that never fires. Registration is a no-op.
pub fn never<V: 'static>() -> AnySource<V> {
    NeverSource {
        _marker: PhantomData,
    }
    .any_source()
}

struct JustSource<V> {
    value: V,
}

impl<V: Clone + Send + Sync> Source for JustSource<V> {
    type Value = V;

    // Delivers synchronously to the sink being added and retains nothing;
    // there is never a first-connection transition.
    fn add(&self, sink: AnySink<V>) -> bool {
        sink.receive(self.value.clone());
        false
    }

    fn remove(&self, _sink: &AnySink<V>) -> bool {
        false
    }
}

/// A source that fires exactly once with `value` for each newly added
/// sink, then behaves as inert.
pub fn just<V: Clone + Send + Sync + 'static>(value: V) -> AnySource<V> {
    JustSource { value }.any_source()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use parking_lot::Mutex;

    #[test]
    fn test_never_registers_nothing() {
        let source = never::<u32>();
        let seen = Arc::new(Mutex::new(Vec::<u32>::new()));
        let s = Arc::clone(&seen);
        let sink = AnySink::from_fn(move |v| s.lock().push(v));

        assert!(!source.add(sink.clone()));
        assert!(!source.remove(&sink));
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn test_just_delivers_synchronously_during_add() {
        let source = just(5u32);
        let seen = Arc::new(Mutex::new(Vec::<u32>::new()));
        let s = Arc::clone(&seen);
        let sink = AnySink::from_fn(move |v| s.lock().push(v));

        assert!(!source.add(sink.clone()));
        assert_eq!(*seen.lock(), vec![5]);

        // Nothing was retained: remove is a no-op and no further values
        // ever arrive.
        assert!(!source.remove(&sink));
        assert_eq!(*seen.lock(), vec![5]);
    }

    #[test]
    fn test_just_fires_once_per_added_sink() {
        let source = just(9u32);
        let seen = Arc::new(Mutex::new(Vec::<u32>::new()));
        let s1 = Arc::clone(&seen);
        let s2 = Arc::clone(&seen);
        source.add(AnySink::from_fn(move |v| s1.lock().push(v)));
        source.add(AnySink::from_fn(move |v| s2.lock().push(v)));
        assert_eq!(*seen.lock(), vec![9, 9]);
    }
}
