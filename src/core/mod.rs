//! Core product-data logic, independent of where the slots are persisted.

/// Page-level change bus carrying native and synthetic storage events
pub mod bus;
/// Baseline (seed) catalog
pub mod catalog;
/// Product identifier generation
pub mod id;
/// Last-update stamping and same-page change events
pub mod notify;
/// Union-by-id reconciliation of the local list with seed sources
pub mod reconcile;
/// Remote product service over the `products` table
pub mod remote;
/// `hasVisited` / `isAdmin` flags
pub mod session;
/// Local product store over a key-value slot
pub mod store;
/// Poll/listen subscriptions
pub mod subscribe;
