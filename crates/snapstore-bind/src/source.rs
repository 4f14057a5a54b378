#![forbid(unsafe_code)]

//! The external-store synchronization contract a render host consumes.

use snapstore_core::Subscription;

/// A source of change-tracked snapshots.
///
/// This is the seam a host rendering framework synchronizes against. The
/// host arms [`subscribe`](SnapshotSource::subscribe) with a re-render
/// trigger, reads [`snapshot`](SnapshotSource::snapshot) on every paint, and
/// repeats until it drops the returned [`Subscription`].
///
/// # Contract
///
/// 1. `on_change` fires exactly when a fresh snapshot would differ from the
///    previously observed one under the implementor's documented equality
///    rule — never for a commit that left the observed slice unchanged.
/// 2. `snapshot()` returns equal results (same rule) as long as the
///    underlying state is unchanged, so the host schedules no redundant
///    re-render.
/// 3. `fallback_snapshot()` is the environment-split getter for hosts that
///    read through a different path during initial or detached rendering.
///    It defaults to `snapshot()`; implementors with no environment split
///    leave the default in place.
pub trait SnapshotSource {
    /// The value a read produces.
    type Snap;

    /// Register a change trigger; fires after every commit that changed the
    /// observed slice. Dropping the handle disarms the trigger.
    fn subscribe(&self, on_change: Box<dyn Fn()>) -> Subscription;

    /// The currently observed value.
    fn snapshot(&self) -> Self::Snap;

    /// Snapshot getter for hosts with a split read environment.
    fn fallback_snapshot(&self) -> Self::Snap {
        self.snapshot()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use crate::binding::Binding;
    use crate::source::SnapshotSource;
    use snapstore_core::Store;

    #[test]
    fn fallback_snapshot_defaults_to_snapshot() {
        let store = Store::new(7);
        let binding = Binding::select(&store, |v| **v);

        assert_eq!(binding.snapshot(), binding.fallback_snapshot());

        store.set(8);
        assert_eq!(binding.snapshot(), 8);
        assert_eq!(binding.fallback_snapshot(), 8);
    }
}
