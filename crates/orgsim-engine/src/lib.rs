//! `orgsim-engine` — the simulation kernel.
//!
//! # Per-instant pump
//!
//! ```text
//! for each due simulated instant (strict time, then enqueue order):
//!   ① Cadences — minute tick, 09:00 maintenance, 17:00 end-of-day,
//!                hourly chatter (recurring events fire before queued work).
//!   ② Collect  — read-only prompt inputs for every due Deliver/Reprompt.
//!   ③ Decide   — behavior engine for all prompts, in parallel, grouped by
//!                agent (feature `parallel`, on by default).
//!   ④ Apply    — sequentially, in enqueue order:
//!                  FanOut       → draw delays, create pending deliveries
//!                  Deliver      → mark delivered, schedule ResponseDue + TTL
//!                  Reprompt     → schedule ResponseDue
//!                  ResponseDue  → persist response, side effects,
//!                                 escalation actions, wisdom ingest
//!                  TtlCheck     → unanswered past TTL counts as ignored
//! ```
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                   |
//! |------------|----------------------------------------------------------|
//! | `parallel` | Decision phase on a per-kernel Rayon pool (default on).  |
//! | `serde`    | Serde derives on status types, propagated downwards.     |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use orgsim_engine::{CommunicationDraft, KernelBuilder};
//!
//! let kernel = KernelBuilder::new("acme").params(params).agents(agents).build()?;
//! kernel.start()?;
//! let comm_id = kernel.send_communication(CommunicationDraft::new(
//!     "ceo", recipients, CommunicationKind::Nudge, "Q3 focus", "Please prioritise…",
//! ))?;
//! let wisdom = kernel.get_wisdom(comm_id.as_str())?;
//! kernel.stop()?;
//! ```

mod cadence;
mod queue;

pub mod kernel;
pub mod observer;
pub mod status;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use kernel::{Kernel, KernelBuilder};
pub use observer::{NoopObserver, SimObserver};
pub use status::{CommunicationDraft, SimulationStatus};

// The kernel's public error type lives in orgsim-core; re-exported here so
// embedders need only this crate.
pub use orgsim_core::{SimError, SimResult};
