//! Dynamic<T> - A versioned state cell with change notifications
//!
//! [`Dynamic<T>`] wraps a value and bumps a version counter on every `set`.
//! Consumers either poll a [`Subscription`] (pull) or register a callback in a
//! [`Listeners`] registry (push).
//!
//! # Runtime Agnostic Design
//!
//! Only lock and atomic primitives are used, so the cell works under any
//! async runtime or in sync-only code.

use parking_lot::{Mutex, ReentrantMutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Inner state of a Dynamic value.
struct DynamicInner<T> {
    value: RwLock<T>,
    version: AtomicU64,
}

/// A shared value that can be observed for changes.
///
/// Clones share the same underlying value.
///
/// # Example
///
/// ```rust
/// use bulletin_core::Dynamic;
///
/// let counter = Dynamic::new(0);
/// let mut sub = counter.subscribe();
///
/// counter.set(1);
/// assert_eq!(counter.get(), 1);
/// assert_eq!(sub.poll(), Some(1));
/// assert_eq!(sub.poll(), None);
/// ```
#[derive(Clone)]
pub struct Dynamic<T> {
    inner: Arc<DynamicInner<T>>,
}

impl<T: Clone + Send + Sync + 'static> Dynamic<T> {
    /// Create a new Dynamic with the given initial value.
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(DynamicInner {
                value: RwLock::new(value),
                version: AtomicU64::new(0),
            }),
        }
    }

    /// Get a clone of the current value.
    pub fn get(&self) -> T {
        self.inner.value.read().clone()
    }

    /// Current version; incremented by every `set`.
    pub fn version(&self) -> u64 {
        self.inner.version.load(Ordering::Acquire)
    }

    /// Replace the value and bump the version.
    pub fn set(&self, value: T) {
        {
            let mut guard = self.inner.value.write();
            *guard = value;
        }
        self.inner.version.fetch_add(1, Ordering::Release);
    }

    /// Replace the value with `f(current)`.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(T) -> T,
    {
        let mut guard = self.inner.value.write();
        *guard = f(guard.clone());
        drop(guard);
        self.inner.version.fetch_add(1, Ordering::Release);
    }

    /// Subscribe to changes from the current version onwards.
    pub fn subscribe(&self) -> Subscription<T> {
        Subscription {
            source: Arc::clone(&self.inner),
            last_version: self.inner.version.load(Ordering::Acquire),
        }
    }
}

impl<T: Clone + Send + Sync + Default + 'static> Default for Dynamic<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + Send + Sync + std::fmt::Debug + 'static> std::fmt::Debug for Dynamic<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dynamic")
            .field("value", &self.get())
            .field("version", &self.version())
            .finish()
    }
}

/// Poll-based subscription to a [`Dynamic`].
///
/// Updates coalesce: several `set`s between two polls yield only the latest value.
pub struct Subscription<T> {
    source: Arc<DynamicInner<T>>,
    last_version: u64,
}

impl<T: Clone + Send + Sync + 'static> Subscription<T> {
    /// Whether the source changed since the last poll.
    pub fn has_changed(&self) -> bool {
        self.source.version.load(Ordering::Acquire) > self.last_version
    }

    /// Return the new value if the source changed since the last poll.
    pub fn poll(&mut self) -> Option<T> {
        let current_version = self.source.version.load(Ordering::Acquire);
        if current_version > self.last_version {
            self.last_version = current_version;
            Some(self.source.value.read().clone())
        } else {
            None
        }
    }

    /// Current value regardless of whether it changed.
    pub fn get(&self) -> T {
        self.source.value.read().clone()
    }

    /// Last version this subscription observed.
    pub fn last_observed_version(&self) -> u64 {
        self.last_version
    }
}

/// Handle identifying a registered listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Push-notification registry.
///
/// Each round of [`notify_latest`](Self::notify_latest) holds a reentrant
/// order lock and calls every listener with the value current *at that
/// call*. A listener may add or remove listeners, or trigger a nested round
/// on the same thread. Rounds from different threads do not interleave, so
/// the last value a listener receives is the latest one published.
pub struct Listeners<T> {
    next_id: AtomicU64,
    entries: Mutex<Vec<(ListenerId, Listener<T>)>>,
    order: ReentrantMutex<()>,
}

impl<T> Listeners<T> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            entries: Mutex::new(Vec::new()),
            order: ReentrantMutex::new(()),
        }
    }

    /// Register a listener.
    pub fn add(&self, listener: impl Fn(&T) + Send + Sync + 'static) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries.lock().push((id, Arc::new(listener)));
        id
    }

    /// Unregister a listener. Returns `false` if it was not registered.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        entries.len() != before
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Call every registered listener with the value returned by `latest`.
    ///
    /// `latest` is read once per listener, so a listener that runs after a
    /// nested round never sees a value older than the one that round
    /// delivered.
    pub fn notify_latest(&self, latest: impl Fn() -> T) {
        let _order = self.order.lock();
        let snapshot: Vec<Listener<T>> = self
            .entries
            .lock()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in snapshot {
            listener(&latest());
        }
    }
}

impl<T> Default for Listeners<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for Listeners<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.entries.lock().len())
            .finish()
    }
}
