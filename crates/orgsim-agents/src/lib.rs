//! `orgsim-agents` — agent profiles, mutable state, and the registry.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                 |
//! |--------------|----------------------------------------------------------|
//! | [`profile`]  | `Personality`, `ProfessionalProfile`, `AgentSpec`        |
//! | [`state`]    | `AgentDynamics`, `InteractionRecord`                     |
//! | [`registry`] | `AgentRegistry`, `AgentRecord`, `AgentSnapshot`          |
//! | [`rngs`]     | `AgentRngs` — per-agent deterministic streams            |
//! | [`builder`]  | `RegistryBuilder`                                        |
//! | [`error`]    | `AgentsError`, `AgentsResult`                            |
//!
//! # Mutation discipline
//!
//! The registry is read-only after [`RegistryBuilder::build`]; each agent's
//! mutable state sits behind its own lock and is touched only through
//! `AgentRegistry::with_dynamics`.  Nothing outside the kernel holds a
//! long-lived mutable reference into agent state.

pub mod builder;
pub mod error;
pub mod profile;
pub mod registry;
pub mod rngs;
pub mod state;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use builder::RegistryBuilder;
pub use error::{AgentsError, AgentsResult};
pub use profile::{AgentSpec, Personality, PersonalitySpec, ProfessionalProfile};
pub use registry::{AgentRecord, AgentRegistry, AgentSnapshot, SNAPSHOT_MEMORY_EXCERPT};
pub use rngs::AgentRngs;
pub use state::{AgentDynamics, InteractionRecord};
