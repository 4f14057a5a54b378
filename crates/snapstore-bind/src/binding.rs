#![forbid(unsafe_code)]

//! Selector-based read adapters over a [`Store`].
//!
//! # Design
//!
//! [`Binding<T, R>`] pairs a store handle with a selector and an equality
//! rule, plus a memoization cell in shared, reference-counted storage. A
//! [`read`](Binding::read) recomputes the selected slice at most once per
//! store version; when the recompute yields a value equal to the cached one
//! under the binding's rule, the cached instance is retained, so repeated
//! reads across slice-preserving commits hand back the same instance.
//!
//! Three equality rules, one per constructor:
//!
//! | Constructor   | Slice     | Changed when                         |
//! |---------------|-----------|--------------------------------------|
//! | `new`         | `Rc<T>`   | canonical value identity (`ptr_eq`)  |
//! | `select`      | `R`       | `PartialEq` says the values differ   |
//! | `select_with` | `R`       | the caller's predicate says so       |
//!
//! # Invariants
//!
//! 1. The selector runs at most once per store version per read path.
//! 2. A commit that leaves the selected slice unchanged under the binding's
//!    rule produces no change signal and no cache replacement.
//! 3. Clones share the memoization cell: a read through one handle warms
//!    the cache for all of them.
//!
//! # Failure Modes
//!
//! - **Panicking selector**: the cache keeps the last successfully selected
//!   value and the store is untouched; the next read retries.
//! - **Store outliving the binding, or vice versa**: handles are `Rc`-backed
//!   in both directions; dropping either side is safe, and subscriptions
//!   degrade to no-ops per the core crate's contract.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::trace;

use snapstore_core::{Store, Subscription};

use crate::source::SnapshotSource;

type SelectFn<T, R> = Rc<dyn Fn(&Rc<T>) -> R>;
type EqFn<R> = Rc<dyn Fn(&R, &R) -> bool>;

/// Memoized slice, shared by all clones of one binding.
struct ReadCache<R> {
    /// Last selected value (`None` only before the first read).
    cached: Option<R>,
    /// Store version the cache was refreshed against.
    seen_version: Option<u64>,
}

/// A read adapter that narrows a store to one slice and signals change
/// exactly when that slice changed.
///
/// Cloning a `Binding` creates a new handle to the **same** memoization
/// cell; the store handle is shared the same way.
pub struct Binding<T, R> {
    store: Store<T>,
    select: SelectFn<T, R>,
    eq: EqFn<R>,
    cache: Rc<RefCell<ReadCache<R>>>,
}

// Manual Clone: shares the cache cell, no bounds on T or R.
impl<T, R> Clone for Binding<T, R> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            select: Rc::clone(&self.select),
            eq: Rc::clone(&self.eq),
            cache: Rc::clone(&self.cache),
        }
    }
}

impl<T, R: std::fmt::Debug> std::fmt::Debug for Binding<T, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cache = self.cache.borrow();
        f.debug_struct("Binding")
            .field("cached", &cache.cached)
            .field("seen_version", &cache.seen_version)
            .finish()
    }
}

impl<T: 'static> Binding<T, Rc<T>> {
    /// Whole-state binding.
    ///
    /// The slice is the canonical value itself and the change rule is
    /// pointer identity (`Rc::ptr_eq`): every commit replaces the canonical
    /// `Rc`, so every commit signals.
    #[must_use]
    pub fn new(store: &Store<T>) -> Self {
        Self::select_with(store, Rc::clone, |a, b| Rc::ptr_eq(a, b))
    }
}

impl<T: 'static, R: 'static> Binding<T, R> {
    /// Selector binding with `PartialEq` as the change rule.
    ///
    /// The selector receives the canonical value and must be pure: same
    /// value in, equal slice out.
    #[must_use]
    pub fn select(store: &Store<T>, select: impl Fn(&Rc<T>) -> R + 'static) -> Self
    where
        R: PartialEq,
    {
        Self::select_with(store, select, |a, b| a == b)
    }

    /// Selector binding with a caller-supplied equality predicate.
    ///
    /// The predicate decides re-render sensitivity: `eq(prev, fresh)`
    /// returning `true` suppresses the change signal and keeps the cached
    /// instance.
    #[must_use]
    pub fn select_with(
        store: &Store<T>,
        select: impl Fn(&Rc<T>) -> R + 'static,
        eq: impl Fn(&R, &R) -> bool + 'static,
    ) -> Self {
        Self {
            store: store.clone(),
            select: Rc::new(select),
            eq: Rc::new(eq),
            cache: Rc::new(RefCell::new(ReadCache {
                cached: None,
                seen_version: None,
            })),
        }
    }

    /// The underlying store handle, for issuing commits through the binding.
    #[must_use]
    pub fn store(&self) -> &Store<T> {
        &self.store
    }

    /// Refresh the cache against the current store version.
    ///
    /// Returns whether the selected slice changed. The selector runs outside
    /// the cache borrow, so a selector (or an equality predicate) reading
    /// through another clone of this binding cannot deadlock the cell.
    fn refresh(&self) -> bool {
        let version = self.store.version();
        if self.cache.borrow().seen_version == Some(version) {
            return false;
        }
        let fresh = (self.select)(&self.store.snapshot());

        let mut cache = self.cache.borrow_mut();
        let changed = match cache.cached.as_ref() {
            Some(prev) => !(self.eq)(prev, &fresh),
            None => true,
        };
        if changed {
            trace!(version, "binding slice changed");
            cache.cached = Some(fresh);
        }
        cache.seen_version = Some(version);
        changed
    }
}

impl<T: 'static, R: Clone + 'static> Binding<T, R> {
    /// The currently selected value, recomputed at most once per store
    /// version.
    ///
    /// Across commits that leave the slice unchanged under the binding's
    /// rule, the cached instance is retained and handed back again.
    #[must_use]
    pub fn read(&self) -> R {
        self.refresh();
        let cache = self.cache.borrow();
        cache
            .cached
            .as_ref()
            .expect("cache is filled by refresh")
            .clone()
    }
}

impl<T: 'static, R: Clone + 'static> SnapshotSource for Binding<T, R> {
    type Snap = R;

    /// Arm a change trigger on the store.
    ///
    /// Each subscription tracks the slice it last delivered independently,
    /// so two hosts wired to the same binding cannot suppress each other's
    /// signals. `on_change` fires after the commit, with the new slice
    /// already recorded, so a re-entrant `snapshot()` reads fresh.
    fn subscribe(&self, on_change: Box<dyn Fn()>) -> Subscription {
        let select = Rc::clone(&self.select);
        let eq = Rc::clone(&self.eq);
        let store = self.store.clone();
        let prev = RefCell::new((select)(&store.snapshot()));
        self.store.listen(move || {
            let fresh = (select)(&store.snapshot());
            let changed = !(eq)(&prev.borrow(), &fresh);
            if changed {
                trace!("binding change signal");
                *prev.borrow_mut() = fresh;
                on_change();
            }
        })
    }

    fn snapshot(&self) -> R {
        self.read()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
