//! Key-value settings bridge
//!
//! Exposes a persistent key-value store as read-write observables. The
//! raw accessor deduplicates repeated stores of the same value; the typed
//! accessors decode the stored shape and fall back to a default when the
//! key is absent or holds a value of the wrong shape.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;

use brook_core::{AnySource, Signal, SourceExt};

/// A value a settings store can hold.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SettingsValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

/// Settings bridge errors.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to persist key {key}: {reason}")]
    WriteFailed { key: String, reason: String },
}

/// The persistent key-value store, at its interface boundary.
pub trait SettingsStore: Send + Sync {
    /// Current stored value for `key`, if any.
    fn get(&self, key: &str) -> Option<SettingsValue>;

    /// Store `value` under `key`; `None` removes the key.
    fn set(&self, key: &str, value: Option<SettingsValue>) -> Result<(), SettingsError>;

    /// A source firing with the newly stored value on every write to
    /// `key` (including removals, as `None`).
    fn changes(&self, key: &str) -> AnySource<Option<SettingsValue>>;
}

/// A read-write observable: current value, setter, and change stream.
pub struct Updatable<T> {
    getter: Arc<dyn Fn() -> T + Send + Sync>,
    setter: Arc<dyn Fn(T) -> Result<(), SettingsError> + Send + Sync>,
    changes: AnySource<T>,
}

impl<T> Updatable<T> {
    pub fn new(
        getter: impl Fn() -> T + Send + Sync + 'static,
        setter: impl Fn(T) -> Result<(), SettingsError> + Send + Sync + 'static,
        changes: AnySource<T>,
    ) -> Self {
        Updatable {
            getter: Arc::new(getter),
            setter: Arc::new(setter),
            changes,
        }
    }

    pub fn get(&self) -> T {
        (self.getter)()
    }

    pub fn set(&self, value: T) -> Result<(), SettingsError> {
        (self.setter)(value)
    }

    pub fn changes(&self) -> AnySource<T> {
        self.changes.clone()
    }
}

impl<T> Clone for Updatable<T> {
    fn clone(&self) -> Self {
        Updatable {
            getter: Arc::clone(&self.getter),
            setter: Arc::clone(&self.setter),
            changes: self.changes.clone(),
        }
    }
}

// Distinct-until-changed over a change source, seeded with the current
// value so the first event only fires on a real transition.
fn distinct_by<T: Clone + Send + Sync + 'static>(
    source: AnySource<T>,
    initial: T,
    eq: impl Fn(&T, &T) -> bool + Send + Sync + 'static,
) -> AnySource<T> {
    let last = Arc::new(Mutex::new(initial));
    source.filter_map(move |value| {
        let mut last = last.lock();
        if eq(&last, &value) {
            None
        } else {
            *last = value.clone();
            Some(value)
        }
    })
}

/// Raw read-write observable over `key`, deduplicated by equality.
pub fn updatable(store: Arc<dyn SettingsStore>, key: impl Into<String>) -> Updatable<Option<SettingsValue>> {
    let key = key.into();
    let initial = store.get(&key);
    let changes = distinct_by(store.changes(&key), initial, |a, b| a == b);

    let get_store = Arc::clone(&store);
    let get_key = key.clone();
    Updatable::new(
        move || get_store.get(&get_key),
        move |value| store.set(&key, value),
        changes,
    )
}

fn decode_bool(key: &str, value: Option<SettingsValue>, default: bool) -> bool {
    match value {
        Some(SettingsValue::Bool(b)) => b,
        None => default,
        Some(other) => {
            tracing::warn!(key, ?other, "stored value has wrong shape, using default");
            default
        }
    }
}

fn decode_int(key: &str, value: Option<SettingsValue>, default: i64) -> i64 {
    match value {
        Some(SettingsValue::Int(i)) => i,
        None => default,
        Some(other) => {
            tracing::warn!(key, ?other, "stored value has wrong shape, using default");
            default
        }
    }
}

fn decode_string(key: &str, value: Option<SettingsValue>, default: &Option<String>) -> Option<String> {
    match value {
        Some(SettingsValue::Text(s)) => Some(s),
        None => default.clone(),
        Some(other) => {
            tracing::warn!(key, ?other, "stored value has wrong shape, using default");
            default.clone()
        }
    }
}

/// Boolean observable over `key`; absent or wrong-shape values read as
/// `default`.
pub fn updatable_bool(
    store: Arc<dyn SettingsStore>,
    key: impl Into<String>,
    default: bool,
) -> Updatable<bool> {
    let key = key.into();
    let decode_key = key.clone();
    let changes = store
        .changes(&key)
        .filter_map(move |value| Some(decode_bool(&decode_key, value, default)));

    let get_store = Arc::clone(&store);
    let get_key = key.clone();
    Updatable::new(
        move || decode_bool(&get_key, get_store.get(&get_key), default),
        move |value| store.set(&key, Some(SettingsValue::Bool(value))),
        changes,
    )
}

/// Integer observable over `key`; absent or wrong-shape values read as
/// `default`.
pub fn updatable_int(
    store: Arc<dyn SettingsStore>,
    key: impl Into<String>,
    default: i64,
) -> Updatable<i64> {
    let key = key.into();
    let decode_key = key.clone();
    let changes = store
        .changes(&key)
        .filter_map(move |value| Some(decode_int(&decode_key, value, default)));

    let get_store = Arc::clone(&store);
    let get_key = key.clone();
    Updatable::new(
        move || decode_int(&get_key, get_store.get(&get_key), default),
        move |value| store.set(&key, Some(SettingsValue::Int(value))),
        changes,
    )
}

/// Optional-string observable over `key`; absent or wrong-shape values
/// read as `default`. Setting `None` removes the key.
pub fn updatable_string(
    store: Arc<dyn SettingsStore>,
    key: impl Into<String>,
    default: Option<String>,
) -> Updatable<Option<String>> {
    let key = key.into();
    let decode_key = key.clone();
    let decode_default = default.clone();
    let changes = store
        .changes(&key)
        .filter_map(move |value| Some(decode_string(&decode_key, value, &decode_default)));

    let get_store = Arc::clone(&store);
    let get_key = key.clone();
    Updatable::new(
        move || decode_string(&get_key, get_store.get(&get_key), &default),
        move |value| store.set(&key, value.map(SettingsValue::Text)),
        changes,
    )
}

struct MemoryStoreInner {
    values: HashMap<String, SettingsValue>,
    signals: HashMap<String, Signal<Option<SettingsValue>>>,
}

/// In-memory settings store for tests and embedding. Writes never fail.
pub struct MemorySettingsStore {
    inner: Mutex<MemoryStoreInner>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        MemorySettingsStore {
            inner: Mutex::new(MemoryStoreInner {
                values: HashMap::new(),
                signals: HashMap::new(),
            }),
        }
    }
}

impl Default for MemorySettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn get(&self, key: &str) -> Option<SettingsValue> {
        self.inner.lock().values.get(key).cloned()
    }

    fn set(&self, key: &str, value: Option<SettingsValue>) -> Result<(), SettingsError> {
        let signal = {
            let mut inner = self.inner.lock();
            match &value {
                Some(v) => {
                    inner.values.insert(key.to_owned(), v.clone());
                }
                None => {
                    inner.values.remove(key);
                }
            }
            inner.signals.get(key).cloned()
        };
        if let Some(signal) = signal {
            signal.send(value);
        }
        Ok(())
    }

    fn changes(&self, key: &str) -> AnySource<Option<SettingsValue>> {
        let mut inner = self.inner.lock();
        inner
            .signals
            .entry(key.to_owned())
            .or_default()
            .clone()
            .any_source()
    }
}
