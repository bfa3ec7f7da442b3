//! The public kernel error type.
//!
//! Sub-crates may define their own error enums and convert them into
//! `SimError` via `From` impls, or keep them separate and wrap `SimError` as
//! one variant.  Errors raised inside delivery tasks or scheduler ticks never
//! cross this boundary — they are attached to the affected response or to the
//! simulation event log; `SimError` is what *public operations* return.

use thiserror::Error;

use crate::{AgentId, CommId};

/// Typed errors surfaced by kernel operations.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("unknown agent {0}")]
    UnknownAgent(AgentId),

    #[error("unknown communication {0}")]
    UnknownCommunication(CommId),

    #[error("unknown topic or communication {0:?}")]
    UnknownTopic(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("simulation already running")]
    AlreadyRunning,

    #[error("simulation is not running")]
    NotRunning,

    /// The delivery queue stayed saturated for the whole request deadline.
    /// Retryable.
    #[error("delivery queue saturated")]
    Overloaded,

    /// Invariant violation.  The kernel logs an event and isolates the
    /// offending task; this only reaches callers from public operations.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Shorthand result type for all orgsim crates.
pub type SimResult<T> = Result<T, SimError>;
