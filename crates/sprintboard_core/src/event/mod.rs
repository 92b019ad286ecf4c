//! Synchronous change notification for stores.
//!
//! # Responsibility
//! - Register subscribers and hand back removable tokens.
//! - Deliver change events in subscription order.
//!
//! # Invariants
//! - Delivery happens on the caller's thread before the mutating call returns.
//! - A panicking subscriber is logged and skipped; later subscribers still run.

pub mod notifier;

pub use notifier::{ChangeNotifier, SubscriptionId};
