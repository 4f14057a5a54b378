#![forbid(unsafe_code)]

//! Bindings: selector-based read adapters and the render-host seam.
//!
//! # Role in snapstore
//! `snapstore-bind` sits between a [`Store`] and a rendering host. It owns
//! the re-render decision: a host wired through this crate re-draws exactly
//! when the slice it reads actually changed, and never in between.
//!
//! # Primary responsibilities
//! - **Binding**: a read adapter over a store, whole-state or narrowed by a
//!   selector, with version-gated memoization so repeated reads across
//!   slice-preserving commits hand back the same instance.
//! - **SnapshotSource**: the three-function contract a host's external-store
//!   synchronization primitive consumes — subscribe, snapshot, and the
//!   fallback snapshot getter.
//!
//! # How it fits in the system
//! The store commits and notifies; a binding listens, re-derives its slice,
//! and signals the host only when the slice changed under the binding's
//! documented equality rule. The host then re-reads a fresh snapshot on its
//! next paint.

pub mod binding;
pub mod source;

pub use binding::Binding;
pub use source::SnapshotSource;

pub use snapstore_core::{Store, Subscription};
