#![forbid(unsafe_code)]

//! RAII handles for listener registrations.

use std::any::Any;

/// Handle to one listener registration.
///
/// The handle owns the only strong reference to its callback; the store's
/// registry holds a weak one. Dropping the handle — or calling
/// [`unsubscribe`](Subscription::unsubscribe) — releases the callback, so
/// the registry entry fails to upgrade at the next batch start and is
/// pruned. A listener removed while a batch is in flight still receives
/// that batch's value: the batch pinned its own strong reference when it
/// started.
///
/// `unsubscribe()` is idempotent and remains a no-op after the owning store
/// has been dropped.
pub struct Subscription {
    /// Type-erased strong reference keeping the callback alive. `None`
    /// once explicitly unsubscribed.
    guard: Option<Box<dyn Any>>,
}

impl Subscription {
    pub(crate) fn new(guard: impl Any) -> Self {
        Self {
            guard: Some(Box::new(guard)),
        }
    }

    /// Detach the listener now instead of at drop time.
    ///
    /// Safe to call repeatedly; later calls do nothing.
    pub fn unsubscribe(&mut self) {
        self.guard = None;
    }

    /// Whether the listener is still registered through this handle.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.guard.is_some()
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
