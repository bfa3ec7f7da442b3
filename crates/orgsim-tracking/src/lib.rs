//! `orgsim-tracking` — the authoritative history of a simulation.
//!
//! # Crate layout
//!
//! | Module      | Contents                                              |
//! |-------------|-------------------------------------------------------|
//! | [`store`]   | `TrackingStore`, `WorkforceSnapshot`                  |
//! | [`events`]  | `SimulationEvent`, `EventLog` ring buffer             |
//! | [`metrics`] | `OrganizationalMetrics`, `DepartmentMetrics`          |
//!
//! The store is append-only and is the single source of truth for what
//! happened: communications, deliveries, responses, workforce snapshots.
//! All other components consult it; none bypass it to mutate history.  The
//! kernel wraps it in a reader-writer lock; this crate stays lock-free.

pub mod events;
pub mod metrics;
pub mod store;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use events::{DEFAULT_EVENT_CAPACITY, EventLog, SimulationEvent};
pub use metrics::{DepartmentMetrics, OrganizationalMetrics};
pub use store::{TrackingStore, WorkforceSnapshot};
