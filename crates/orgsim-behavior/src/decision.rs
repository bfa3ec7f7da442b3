//! The decision record produced for every prompt.

use orgsim_core::SimDuration;
use orgsim_comms::{ActionStatus, HesitationMarker, ResponseKind};

/// Everything the engine needs to turn one prompt into a response plus its
/// side effects.  Produced by a [`BehaviorEngine`][crate::BehaviorEngine],
/// consumed sequentially by the apply phase — the decision itself never
/// touches shared state.
#[derive(Clone, Debug)]
pub struct ResponseDecision {
    pub kind:               ResponseKind,
    /// Simulated delay between the prompt and the response being written.
    pub reply_latency:      SimDuration,
    pub content:            String,
    pub confidence:         f64,
    pub hesitation_markers: Vec<HesitationMarker>,
    pub action_status:      ActionStatus,

    // ── Side effects on the responding agent ──────────────────────────────
    /// Applied to stress, clamped downstream.
    pub stress_delta:       f64,
    /// Applied to workload; non-zero only for take_action / delegate.
    pub workload_delta:     f64,
    /// Applied to the agent's affinity toward the sender.
    pub affinity_delta:     f64,

    /// Set when the generator backend failed and the rule-based path
    /// produced this decision instead.
    pub fallback_used:      bool,
}
