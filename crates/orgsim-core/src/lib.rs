//! `orgsim-core` — foundational types for the orgsim organizational twin.
//!
//! This crate is a dependency of every other `orgsim-*` crate.  It
//! intentionally has no `orgsim-*` dependencies and a minimal external
//! surface (`rand`, `rustc-hash`, `thiserror`, `parking_lot`, `serde`).
//!
//! # What lives here
//!
//! | Module     | Contents                                                  |
//! |------------|-----------------------------------------------------------|
//! | [`ids`]    | `AgentId`, `CommId`, `ResponseId`, `ThreadId`, `IdSequence` |
//! | [`time`]   | `SimTime`, `SimDuration`, `SimClock`, `Acceleration`      |
//! | [`rng`]    | `AgentRng` (per-agent), `SimRng` (per-component)          |
//! | [`params`] | `SimulationParameters`                                    |
//! | [`error`]  | `SimError`, `SimResult`                                   |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                      |
//! |---------|-------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to ID and time types.        |
//!           | (`SimulationParameters` is always serde — it is part of the |
//!           | control-protocol contract.)                                 |

pub mod error;
pub mod ids;
pub mod params;
pub mod rng;
pub mod time;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{SimError, SimResult};
pub use ids::{AgentId, CommId, IdSequence, ResponseId, ThreadId};
pub use params::SimulationParameters;
pub use rng::{AgentRng, SimRng, stream_seed};
pub use time::{Acceleration, SimClock, SimDuration, SimTime, WaitOutcome};
