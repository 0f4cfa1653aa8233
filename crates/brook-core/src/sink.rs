//! Sink capability - receivers of pushed values
//!
//! A sink is anything that can receive a value from a source. Sinks carry
//! subscription identity: two handles for the same logical subscription
//! compare equal, which is what lets a source find the matching entry on
//! removal.

use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Owner identity backing sink equality.
///
/// Synthetic sinks generated by a composite (one per input index) share the
/// composite's owner id; standalone subscriptions get a fresh one.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnerId(pub u64);

static NEXT_OWNER: AtomicU64 = AtomicU64::new(1);

impl OwnerId {
    /// Allocate a process-unique owner id.
    pub fn fresh() -> Self {
        OwnerId(NEXT_OWNER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Debug for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Owner({:x})", self.0)
    }
}

/// Subscription identity: owning object plus an integer discriminator.
///
/// Two sink handles are the same logical subscription iff their ids are
/// equal.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SinkId {
    pub owner: OwnerId,
    pub index: usize,
}

impl SinkId {
    #[inline]
    pub fn new(owner: OwnerId, index: usize) -> Self {
        SinkId { owner, index }
    }

    /// Id for a standalone subscription (fresh owner, discriminator 0).
    pub fn fresh() -> Self {
        SinkId::new(OwnerId::fresh(), 0)
    }
}

impl fmt::Debug for SinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sink({:x}.{})", self.owner.0, self.index)
    }
}

/// A receiver of values pushed by a source.
pub trait Sink: Send + Sync {
    type Value;

    fn receive(&self, value: Self::Value);
}

struct FnSink<V, F> {
    f: F,
    _marker: PhantomData<fn(V)>,
}

impl<V, F: Fn(V) + Send + Sync> Sink for FnSink<V, F> {
    type Value = V;

    fn receive(&self, value: V) {
        (self.f)(value)
    }
}

/// Type-erased, identity-bearing sink handle.
///
/// Cloning preserves identity: a clone is the same logical subscription as
/// the original. Equality and hashing are entirely by [`SinkId`].
pub struct AnySink<V> {
    id: SinkId,
    inner: Arc<dyn Sink<Value = V>>,
}

impl<V: 'static> AnySink<V> {
    /// Wrap a sink under a fresh subscription identity.
    pub fn new(sink: impl Sink<Value = V> + 'static) -> Self {
        Self::with_id(SinkId::fresh(), sink)
    }

    /// Wrap a sink under an explicit identity.
    ///
    /// Used by composites whose synthetic sinks must compare equal across
    /// separately constructed handles (same owner, same index).
    pub fn with_id(id: SinkId, sink: impl Sink<Value = V> + 'static) -> Self {
        AnySink {
            id,
            inner: Arc::new(sink),
        }
    }

    /// Sink from a closure, under a fresh subscription identity.
    pub fn from_fn(f: impl Fn(V) + Send + Sync + 'static) -> Self {
        Self::new(FnSink {
            f,
            _marker: PhantomData,
        })
    }

    /// Sink from a closure, under an explicit identity.
    pub fn from_fn_with_id(id: SinkId, f: impl Fn(V) + Send + Sync + 'static) -> Self {
        Self::with_id(
            id,
            FnSink {
                f,
                _marker: PhantomData,
            },
        )
    }
}

impl<V> AnySink<V> {
    #[inline]
    pub fn id(&self) -> SinkId {
        self.id
    }
}

impl<V> Sink for AnySink<V> {
    type Value = V;

    fn receive(&self, value: V) {
        self.inner.receive(value)
    }
}

impl<V> Clone for AnySink<V> {
    fn clone(&self) -> Self {
        AnySink {
            id: self.id,
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> PartialEq for AnySink<V> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<V> Eq for AnySink<V> {}

impl<V> std::hash::Hash for AnySink<V> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state)
    }
}

impl<V> fmt::Debug for AnySink<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AnySink({:?})", self.id)
    }
}
