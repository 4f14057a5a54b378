#![forbid(unsafe_code)]

//! Core: the external state store, its commit/notify loop, and subscriptions.
//!
//! # Role in snapstore
//! `snapstore-core` owns the canonical application value. Everything else —
//! selector bindings, render-host adapters — consumes this crate's two types.
//!
//! # Primary responsibilities
//! - **Store**: one canonical value per instance, held as `Rc<T>` and
//!   replaced wholesale on every commit, with a monotonic version counter.
//! - **Notification**: every commit synchronously notifies the listeners
//!   that were registered when the batch started.
//! - **Subscription**: RAII handles that detach a listener on drop, with an
//!   explicit idempotent `unsubscribe()`.
//!
//! # How it fits in the system
//! The binding layer (`snapstore-bind`) holds a `Store` handle, listens for
//! commits, and re-derives selected slices for a render host. The store
//! itself knows nothing about rendering; it only commits and notifies.

pub mod store;
pub mod subscription;

pub use store::Store;
pub use subscription::Subscription;
