//! Notification-broadcast bridge
//!
//! Exposes a broadcast facility (named channels, optional sender filter,
//! optional delivery queue) as a `Source<Notification>`. The source only
//! holds a live observer registration while at least one sink is
//! attached: the backing signal's `start` hook registers, `stop`
//! unregisters. Registering twice or unregistering while unregistered is
//! a precondition violation and aborts.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use brook_core::{AnySource, Signal, SourceExt};

/// Opaque identity of a notification sender, for observer filtering.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SenderId(pub u64);

impl fmt::Debug for SenderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sender({:x})", self.0)
    }
}

/// A value posted on a broadcast channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub name: String,
    pub sender: Option<SenderId>,
    pub payload: HashMap<String, String>,
}

impl Notification {
    pub fn new(name: impl Into<String>, sender: Option<SenderId>) -> Self {
        Notification {
            name: name.into(),
            sender,
            payload: HashMap::new(),
        }
    }

    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }
}

/// Where observer callbacks run. `dispatch` may run the task inline or
/// hand it to another execution context; the bridge itself never defers.
pub trait DeliveryQueue: Send + Sync {
    fn dispatch(&self, task: Box<dyn FnOnce() + Send>);
}

/// Handle for a registered observer.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ObserverToken(pub u64);

/// The platform broadcast facility, at its interface boundary.
pub trait BroadcastCenter: Send + Sync {
    /// Register an observer for notifications named `name`. A `sender`
    /// filter restricts delivery to notifications from that sender; a
    /// queue routes the handler invocation.
    fn add_observer(
        &self,
        name: &str,
        sender: Option<SenderId>,
        queue: Option<Arc<dyn DeliveryQueue>>,
        handler: Arc<dyn Fn(Notification) + Send + Sync>,
    ) -> ObserverToken;

    fn remove_observer(&self, token: ObserverToken);
}

/// A `Source<Notification>` over `center` for the named channel.
///
/// The observer is registered when the first sink attaches and removed
/// when the last sink detaches; while no sink is attached the center sees
/// no registration at all.
pub fn notification_source(
    center: Arc<dyn BroadcastCenter>,
    name: impl Into<String>,
    sender: Option<SenderId>,
    queue: Option<Arc<dyn DeliveryQueue>>,
) -> AnySource<Notification> {
    let name = name.into();
    let registration: Arc<Mutex<Option<ObserverToken>>> = Arc::new(Mutex::new(None));

    let start_center = Arc::clone(&center);
    let start_registration = Arc::clone(&registration);
    let stop_registration = Arc::clone(&registration);

    Signal::with_hooks(
        move |signal: &Signal<Notification>| {
            let mut token = start_registration.lock();
            assert!(token.is_none(), "broadcast observer already registered");
            let weak = signal.downgrade();
            *token = Some(start_center.add_observer(
                &name,
                sender,
                queue.clone(),
                Arc::new(move |notification| {
                    if let Some(signal) = weak.upgrade() {
                        signal.send(notification);
                    }
                }),
            ));
        },
        move |_signal| {
            let token = stop_registration.lock().take();
            let Some(token) = token else {
                panic!("broadcast observer not registered");
            };
            center.remove_observer(token);
        },
    )
    .any_source()
}

struct Registration {
    name: String,
    sender: Option<SenderId>,
    queue: Option<Arc<dyn DeliveryQueue>>,
    handler: Arc<dyn Fn(Notification) + Send + Sync>,
}

/// In-memory broadcast center for tests and embedding.
#[derive(Default)]
pub struct MemoryBroadcastCenter {
    observers: Mutex<HashMap<ObserverToken, Registration>>,
    next_token: AtomicU64,
}

impl MemoryBroadcastCenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `notification` to every matching observer, synchronously
    /// unless the observer asked for a queue.
    pub fn post(&self, notification: Notification) {
        let matching: Vec<(Option<Arc<dyn DeliveryQueue>>, Arc<dyn Fn(Notification) + Send + Sync>)> = {
            let observers = self.observers.lock();
            observers
                .values()
                .filter(|r| r.name == notification.name)
                .filter(|r| r.sender.is_none() || r.sender == notification.sender)
                .map(|r| (r.queue.clone(), Arc::clone(&r.handler)))
                .collect()
        };
        for (queue, handler) in matching {
            let n = notification.clone();
            match queue {
                None => handler(n),
                Some(queue) => queue.dispatch(Box::new(move || handler(n))),
            }
        }
    }

    /// Number of live observer registrations (all channels).
    pub fn observer_count(&self) -> usize {
        self.observers.lock().len()
    }
}

impl BroadcastCenter for MemoryBroadcastCenter {
    fn add_observer(
        &self,
        name: &str,
        sender: Option<SenderId>,
        queue: Option<Arc<dyn DeliveryQueue>>,
        handler: Arc<dyn Fn(Notification) + Send + Sync>,
    ) -> ObserverToken {
        let token = ObserverToken(self.next_token.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(name, ?token, "broadcast observer registered");
        self.observers.lock().insert(
            token,
            Registration {
                name: name.to_owned(),
                sender,
                queue,
                handler,
            },
        );
        token
    }

    fn remove_observer(&self, token: ObserverToken) {
        if self.observers.lock().remove(&token).is_none() {
            tracing::warn!(?token, "remove of unknown broadcast observer");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brook_core::{AnySink, Source};

    fn recorder() -> (AnySink<Notification>, Arc<Mutex<Vec<Notification>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        (AnySink::from_fn(move |n| s.lock().push(n)), seen)
    }

    #[test]
    fn test_observer_registered_only_while_sinks_attached() {
        let center = Arc::new(MemoryBroadcastCenter::new());
        let source = notification_source(
            Arc::clone(&center) as Arc<dyn BroadcastCenter>,
            "changed",
            None,
            None,
        );
        assert_eq!(center.observer_count(), 0);

        let (a, _) = recorder();
        let (b, _) = recorder();
        source.add(a.clone());
        source.add(b.clone());
        assert_eq!(center.observer_count(), 1);

        source.remove(&a);
        assert_eq!(center.observer_count(), 1);
        source.remove(&b);
        assert_eq!(center.observer_count(), 0);

        // The cycle restarts cleanly.
        source.add(a.clone());
        assert_eq!(center.observer_count(), 1);
        source.remove(&a);
    }

    #[test]
    fn test_notifications_flow_to_attached_sinks() {
        let center = Arc::new(MemoryBroadcastCenter::new());
        let source = notification_source(
            Arc::clone(&center) as Arc<dyn BroadcastCenter>,
            "changed",
            None,
            None,
        );

        let (sink, seen) = recorder();
        source.add(sink.clone());

        center.post(Notification::new("changed", None).with_entry("k", "v"));
        center.post(Notification::new("other", None));

        let got = seen.lock();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].payload.get("k").map(String::as_str), Some("v"));
    }

    #[test]
    fn test_sender_filter_restricts_delivery() {
        let center = Arc::new(MemoryBroadcastCenter::new());
        let source = notification_source(
            Arc::clone(&center) as Arc<dyn BroadcastCenter>,
            "changed",
            Some(SenderId(7)),
            None,
        );

        let (sink, seen) = recorder();
        source.add(sink);

        center.post(Notification::new("changed", Some(SenderId(7))));
        center.post(Notification::new("changed", Some(SenderId(8))));
        center.post(Notification::new("changed", None));

        assert_eq!(seen.lock().len(), 1);
    }

    #[test]
    fn test_queue_routes_handler_invocation() {
        struct CollectingQueue {
            tasks: Mutex<Vec<Box<dyn FnOnce() + Send>>>,
        }
        impl DeliveryQueue for CollectingQueue {
            fn dispatch(&self, task: Box<dyn FnOnce() + Send>) {
                self.tasks.lock().push(task);
            }
        }

        let queue = Arc::new(CollectingQueue {
            tasks: Mutex::new(Vec::new()),
        });
        let center = Arc::new(MemoryBroadcastCenter::new());
        let source = notification_source(
            Arc::clone(&center) as Arc<dyn BroadcastCenter>,
            "changed",
            None,
            Some(Arc::clone(&queue) as Arc<dyn DeliveryQueue>),
        );

        let (sink, seen) = recorder();
        source.add(sink);
        center.post(Notification::new("changed", None));

        // Nothing delivered until the queue runs its tasks.
        assert!(seen.lock().is_empty());
        let tasks: Vec<_> = std::mem::take(&mut *queue.tasks.lock());
        for task in tasks {
            task();
        }
        assert_eq!(seen.lock().len(), 1);
    }

    #[test]
    fn test_dropped_source_does_not_deliver_through_stale_observer() {
        let center = Arc::new(MemoryBroadcastCenter::new());
        let seen;
        {
            let source = notification_source(
                Arc::clone(&center) as Arc<dyn BroadcastCenter>,
                "changed",
                None,
                None,
            );
            let (sink, s) = recorder();
            seen = s;
            source.add(sink);
        }
        // The source handle is gone but the observer is still registered;
        // the weak signal handle refuses delivery. (Detaching the sink
        // would have unregistered the observer.)
        center.post(Notification::new("changed", None));
        assert!(seen.lock().is_empty());
    }
}
