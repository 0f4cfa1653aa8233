//! Signal - the canonical broadcast hub
//!
//! A signal owns the set of attached sinks and delivers each sent value to
//! every one of them, synchronously, on the sending thread. Optional start
//! and stop hooks fire exactly on the first-attach and last-detach edges,
//! which is what lets producers acquire external resources lazily and
//! release them when the last consumer leaves.

use std::cell::RefCell;
use std::sync::{Arc, Weak};

use parking_lot::ReentrantMutex;

use crate::sink::{AnySink, Sink};
use crate::source::Source;

type Hook<V> = Box<dyn Fn(&Signal<V>) + Send + Sync>;

struct Hooks<V> {
    start: Hook<V>,
    stop: Hook<V>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Lifecycle {
    Inactive,
    Active,
}

struct SignalState<V> {
    sinks: Vec<AnySink<V>>,
    lifecycle: Lifecycle,
    hooks: Option<Hooks<V>>,
}

struct SignalCore<V> {
    // Reentrant lock so sinks may call back into the signal during
    // delivery; the RefCell borrow is held across lifecycle transitions,
    // so a hook re-entering add/remove fails fast instead of corrupting
    // the transition.
    state: ReentrantMutex<RefCell<SignalState<V>>>,
}

/// Broadcast hub with lazy start/stop lifecycle.
///
/// `Signal` is a cheap handle; clones share the same subscriber set.
pub struct Signal<V> {
    core: Arc<SignalCore<V>>,
}

/// Non-owning signal handle, for callbacks that must not keep the signal
/// alive (observer registrations held by an external facility).
pub struct WeakSignal<V> {
    core: Weak<SignalCore<V>>,
}

impl<V> Signal<V> {
    /// A signal with no lifecycle hooks.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// A signal whose `start` hook runs exactly once when the first sink
    /// attaches and whose `stop` hook runs exactly once when the last sink
    /// detaches. The cycle may repeat: a drained signal re-runs `start` on
    /// the next attach.
    ///
    /// Hooks run inside the attach/detach critical section and must not
    /// call back into this signal; they may register callbacks that send
    /// into it later (via [`Signal::downgrade`]).
    pub fn with_hooks(
        start: impl Fn(&Signal<V>) + Send + Sync + 'static,
        stop: impl Fn(&Signal<V>) + Send + Sync + 'static,
    ) -> Self {
        Self::build(Some(Hooks {
            start: Box::new(start),
            stop: Box::new(stop),
        }))
    }

    fn build(hooks: Option<Hooks<V>>) -> Self {
        Signal {
            core: Arc::new(SignalCore {
                state: ReentrantMutex::new(RefCell::new(SignalState {
                    sinks: Vec::new(),
                    lifecycle: Lifecycle::Inactive,
                    hooks,
                })),
            }),
        }
    }

    /// Attach `sink`; returns true iff this was the first subscriber.
    ///
    /// On a first attach the `start` hook has completed before this
    /// returns. Adding a sink equal to one already attached replaces the
    /// stored handle and is never a transition.
    pub fn add(&self, sink: AnySink<V>) -> bool {
        let guard = self.core.state.lock();
        let mut state = guard.borrow_mut();
        if let Some(existing) = state.sinks.iter_mut().find(|s| **s == sink) {
            *existing = sink;
            return false;
        }
        state.sinks.push(sink);
        if state.sinks.len() > 1 {
            return false;
        }
        debug_assert_eq!(state.lifecycle, Lifecycle::Inactive);
        state.lifecycle = Lifecycle::Active;
        tracing::trace!("signal activated");
        if let Some(hooks) = &state.hooks {
            (hooks.start)(self);
        }
        true
    }

    /// Detach `sink`; returns true iff this emptied the subscriber set.
    ///
    /// On a last detach the `stop` hook has completed before this returns.
    /// Removing a sink that is not attached is a harmless no-op.
    pub fn remove(&self, sink: &AnySink<V>) -> bool {
        let guard = self.core.state.lock();
        let mut state = guard.borrow_mut();
        let Some(pos) = state.sinks.iter().position(|s| s == sink) else {
            tracing::trace!(id = ?sink.id(), "remove of unattached sink ignored");
            return false;
        };
        state.sinks.swap_remove(pos);
        if !state.sinks.is_empty() {
            return false;
        }
        debug_assert_eq!(state.lifecycle, Lifecycle::Active);
        state.lifecycle = Lifecycle::Inactive;
        tracing::trace!("signal deactivated");
        if let Some(hooks) = &state.hooks {
            (hooks.stop)(self);
        }
        true
    }

    /// Deliver `value` to every attached sink, synchronously.
    ///
    /// Delivery policy: the subscriber set is snapshotted when `send`
    /// starts. A sink attached during delivery does not receive the
    /// in-flight value; a sink removed during delivery still does. Two
    /// sends in program order reach each sink in that order.
    pub fn send(&self, value: V)
    where
        V: Clone,
    {
        let guard = self.core.state.lock();
        let snapshot: Vec<AnySink<V>> = guard.borrow().sinks.clone();
        for sink in &snapshot {
            sink.receive(value.clone());
        }
        drop(guard);
    }

    /// Whether at least one sink is attached.
    pub fn is_active(&self) -> bool {
        let guard = self.core.state.lock();
        let state = guard.borrow();
        state.lifecycle == Lifecycle::Active
    }

    /// Number of currently attached sinks.
    pub fn subscriber_count(&self) -> usize {
        let guard = self.core.state.lock();
        let count = guard.borrow().sinks.len();
        count
    }

    /// A non-owning handle to this signal.
    pub fn downgrade(&self) -> WeakSignal<V> {
        WeakSignal {
            core: Arc::downgrade(&self.core),
        }
    }
}

impl<V> Default for Signal<V> {
    fn default() -> Self {
        Signal::new()
    }
}

impl<V> Clone for Signal<V> {
    fn clone(&self) -> Self {
        Signal {
            core: Arc::clone(&self.core),
        }
    }
}

impl<V> WeakSignal<V> {
    pub fn upgrade(&self) -> Option<Signal<V>> {
        self.core.upgrade().map(|core| Signal { core })
    }
}

impl<V> Clone for WeakSignal<V> {
    fn clone(&self) -> Self {
        WeakSignal {
            core: Weak::clone(&self.core),
        }
    }
}

impl<V: Clone> Source for Signal<V> {
    type Value = V;

    fn add(&self, sink: AnySink<V>) -> bool {
        Signal::add(self, sink)
    }

    fn remove(&self, sink: &AnySink<V>) -> bool {
        Signal::remove(self, sink)
    }
}
