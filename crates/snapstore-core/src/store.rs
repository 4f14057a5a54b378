#![forbid(unsafe_code)]

//! External state store with copy-on-write commits and change notification.
//!
//! # Design
//!
//! [`Store<T>`] keeps one canonical value in shared, reference-counted
//! storage (`Rc<RefCell<..>>`). The value itself is held as `Rc<T>` and is
//! replaced wholesale on every commit: a reader holding an earlier
//! [`snapshot`](Store::snapshot) never observes a later value, and change
//! detection downstream is an O(1) `Rc::ptr_eq`. After each commit the store
//! synchronously notifies every listener that was registered when the batch
//! started.
//!
//! # Performance
//!
//! | Operation     | Complexity                 |
//! |---------------|----------------------------|
//! | `snapshot()`  | O(1)                       |
//! | `set()`       | O(S) where S = listeners   |
//! | `subscribe()` | O(1) amortized             |
//! | Memory        | ~64 bytes + sizeof(T)      |
//!
//! # Batch semantics
//!
//! The listener set is snapshotted at commit time. A listener removed by an
//! earlier callback in the same batch still receives that batch's value; a
//! listener added during a batch first hears about the next commit. A commit
//! issued from inside a callback runs its whole batch before the outer batch
//! resumes, and every callback receives the value committed by its own
//! batch.
//!
//! # Failure Modes
//!
//! - **Panicking closure**: [`update`](Store::update) and
//!   [`patch`](Store::patch) compute the replacement before committing. If
//!   the closure panics, the canonical value and version are untouched and
//!   no listener fires.
//! - **Subscriber leak**: [`Subscription`] guards stored indefinitely keep
//!   their callbacks registered. Dead entries (dropped guards) are pruned
//!   lazily at the start of each notification batch.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::trace;

use crate::subscription::Subscription;

/// A listener callback, stored as a strong `Rc` inside the returned
/// [`Subscription`] and as `Weak` in the store's registry.
type ListenerRc<T> = Rc<dyn Fn(&T)>;
type ListenerWeak<T> = Weak<dyn Fn(&T)>;

/// Shared interior for [`Store<T>`].
struct StoreInner<T> {
    /// Canonical value. Replaced wholesale on every commit, never mutated
    /// in place.
    value: Rc<T>,
    /// Increments by exactly 1 on every commit.
    version: u64,
    /// Listeners stored as weak references. Dead entries are pruned at
    /// batch start.
    listeners: Vec<ListenerWeak<T>>,
}

/// A shared handle to one canonical value with commit notification.
///
/// Cloning a `Store` creates a new handle to the **same** inner state —
/// both handles see the same value and share the listener registry.
///
/// # Invariants
///
/// 1. `version` increments by exactly 1 on every commit.
/// 2. Every commit notifies each listener present at batch start exactly
///    once, with the value that commit produced.
/// 3. Two `snapshot()` calls with no intervening commit return pointers for
///    which `Rc::ptr_eq` holds.
/// 4. A closure handed to `update`/`patch` that panics commits nothing.
pub struct Store<T> {
    inner: Rc<RefCell<StoreInner<T>>>,
}

// Manual Clone: shares the same Rc.
impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Store<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Store")
            .field("value", &inner.value)
            .field("version", &inner.version)
            .field("listener_count", &inner.listeners.len())
            .finish()
    }
}

impl<T> Store<T> {
    /// Create a store owning the given initial value.
    ///
    /// The initial version is 0 and no listeners are registered.
    #[must_use]
    pub fn new(initial: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(StoreInner {
                value: Rc::new(initial),
                version: 0,
                listeners: Vec::new(),
            })),
        }
    }

    /// The current canonical value as a shared pointer.
    ///
    /// No side effects. The returned `Rc` stays valid across later commits
    /// and compares unequal (`Rc::ptr_eq`) to any snapshot taken after one.
    #[must_use]
    pub fn snapshot(&self) -> Rc<T> {
        Rc::clone(&self.inner.borrow().value)
    }

    /// Access the current value by reference without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow().value)
    }

    /// Current version number. Increments by 1 on every commit. Useful for
    /// O(1) staleness checks in read caches.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Number of registry entries, including dead ones not yet pruned.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }
}

impl<T: 'static> Store<T> {
    /// Replace the canonical value and notify listeners.
    ///
    /// Always commits: one `set` call is one version bump and one
    /// notification batch, even if the new value compares equal to the old
    /// one. Use [`set_if_changed`](Store::set_if_changed) for deduplicating
    /// writes.
    pub fn set(&self, value: T) {
        self.commit(value);
    }

    /// Replace the canonical value with `f` applied to the current one.
    ///
    /// The replacement is computed before anything is committed: if `f`
    /// panics, the store is unchanged and no listener fires.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let current = self.snapshot();
        let next = f(&current);
        self.commit(next);
    }

    /// Register a listener for future commits.
    ///
    /// The callback is invoked with the committed value once per commit,
    /// starting with the next one — registration never fires the callback
    /// with the current value. Dropping the returned [`Subscription`] (or
    /// calling its `unsubscribe()`) detaches the listener.
    pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> Subscription {
        let strong: ListenerRc<T> = Rc::new(f);
        self.inner.borrow_mut().listeners.push(Rc::downgrade(&strong));
        Subscription::new(strong)
    }

    /// Register a zero-argument listener for future commits.
    ///
    /// Same contract as [`subscribe`](Store::subscribe) for callbacks that
    /// re-read the store themselves instead of taking the committed value.
    pub fn listen(&self, f: impl Fn() + 'static) -> Subscription {
        self.subscribe(move |_| f())
    }

    /// Commit `next` as the new canonical value and run one notification
    /// batch.
    fn commit(&self, next: T) {
        let (value, version, batch) = {
            let mut inner = self.inner.borrow_mut();
            inner.value = Rc::new(next);
            inner.version += 1;
            // Prune dead registrations, then pin the batch with strong refs
            // so mid-batch unsubscribes cannot skip or corrupt iteration.
            inner.listeners.retain(|w| w.strong_count() > 0);
            let batch: Vec<ListenerRc<T>> =
                inner.listeners.iter().filter_map(Weak::upgrade).collect();
            (Rc::clone(&inner.value), inner.version, batch)
        };
        trace!(version, listeners = batch.len(), "store commit");
        // All interior borrows are released here, so callbacks are free to
        // subscribe, unsubscribe, or commit again.
        for callback in &batch {
            callback(&value);
        }
    }
}

impl<T: Clone + 'static> Store<T> {
    /// Get a clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.with(T::clone)
    }

    /// Clone the current value, mutate the clone in place, commit it.
    ///
    /// This is the auditable replacement for write-through field access:
    /// every write goes through the store and one `patch` call produces
    /// exactly one notification batch. If `f` panics, nothing is committed.
    pub fn patch(&self, f: impl FnOnce(&mut T)) {
        let mut next = self.get();
        f(&mut next);
        self.commit(next);
    }
}

impl<T: PartialEq + 'static> Store<T> {
    /// Replace the canonical value only if it differs from the current one.
    ///
    /// Returns whether a commit happened. An equal value bumps no version
    /// and fires no listeners.
    pub fn set_if_changed(&self, value: T) -> bool {
        let same = {
            let inner = self.inner.borrow();
            *inner.value == value
        };
        if same {
            return false;
        }
        self.commit(value);
        true
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
