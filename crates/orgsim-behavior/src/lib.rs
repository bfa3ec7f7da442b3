//! `orgsim-behavior` — the agent behavior engine.
//!
//! # Crate layout
//!
//! | Module        | Contents                                               |
//! |---------------|--------------------------------------------------------|
//! | [`engine`]    | `BehaviorEngine` trait, `RuleBehavior` default backend |
//! | [`generator`] | `ResponseGenerator` capability + deadline fallback     |
//! | [`context`]   | `BehaviorContext` — read-only per-prompt facts         |
//! | [`decision`]  | `ResponseDecision`                                     |
//! | [`templates`] | Response content templates                             |
//! | [`error`]     | `BehaviorError`, `BehaviorResult`                      |
//!
//! # Design notes
//!
//! The engine is pure given its inputs and RNG stream: the decision phase
//! may run for many agents in parallel, each worker holding a read-only
//! snapshot and an exclusive per-agent stream.  All mutation — tracking
//! appends, stress and workload deltas, affinity nudges — happens later, in
//! the engine's sequential apply phase, driven by the fields of the returned
//! [`ResponseDecision`].  Delivery-level retries are not this crate's
//! business; the only failure mode here is a generator timeout, which falls
//! back to the rule tables.

pub mod context;
pub mod decision;
pub mod engine;
pub mod error;
pub mod generator;
pub mod templates;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use context::BehaviorContext;
pub use decision::ResponseDecision;
pub use engine::{BehaviorEngine, RuleBehavior};
pub use error::{BehaviorError, BehaviorResult};
pub use generator::{GeneratedDraft, GeneratorBehavior, ResponseGenerator};
