//! Responses: what an agent does with a communication.

use orgsim_core::{AgentId, CommId, ResponseId, SimTime};

// ── ResponseKind ──────────────────────────────────────────────────────────────

/// What the agent decided to do.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ResponseKind {
    Ignore,
    TakeAction,
    SeekClarification,
    ProvideFeedback,
    Escalate,
    Delegate,
}

impl ResponseKind {
    /// Every kind, in a stable order.  Used wherever a distribution over
    /// kinds is tallied (behavior scoring, consensus entropy).
    pub const ALL: [ResponseKind; 6] = [
        ResponseKind::Ignore,
        ResponseKind::TakeAction,
        ResponseKind::SeekClarification,
        ResponseKind::ProvideFeedback,
        ResponseKind::Escalate,
        ResponseKind::Delegate,
    ];

    /// `true` for every kind except `Ignore`.
    pub fn is_engaged(self) -> bool {
        !matches!(self, ResponseKind::Ignore)
    }

    /// Stable wire label, identical to the serde encoding.
    pub fn label(self) -> &'static str {
        match self {
            ResponseKind::Ignore => "ignore",
            ResponseKind::TakeAction => "take_action",
            ResponseKind::SeekClarification => "seek_clarification",
            ResponseKind::ProvideFeedback => "provide_feedback",
            ResponseKind::Escalate => "escalate",
            ResponseKind::Delegate => "delegate",
        }
    }
}

// ── HesitationMarker ──────────────────────────────────────────────────────────

/// An enumerated flag indicating a specific organisational concern attached
/// to a response.  Markers are determined independently of the response kind
/// — a `take_action` response can still carry `capacity_saturation`.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum HesitationMarker {
    Uncertainty,
    PriorityConflict,
    ResourceConstraint,
    StrategicMisalignment,
    NeedsConsensus,
    CapacitySaturation,
}

impl HesitationMarker {
    pub const ALL: [HesitationMarker; 6] = [
        HesitationMarker::Uncertainty,
        HesitationMarker::PriorityConflict,
        HesitationMarker::ResourceConstraint,
        HesitationMarker::StrategicMisalignment,
        HesitationMarker::NeedsConsensus,
        HesitationMarker::CapacitySaturation,
    ];

    pub fn label(self) -> &'static str {
        match self {
            HesitationMarker::Uncertainty => "uncertainty",
            HesitationMarker::PriorityConflict => "priority_conflict",
            HesitationMarker::ResourceConstraint => "resource_constraint",
            HesitationMarker::StrategicMisalignment => "strategic_misalignment",
            HesitationMarker::NeedsConsensus => "needs_consensus",
            HesitationMarker::CapacitySaturation => "capacity_saturation",
        }
    }
}

// ── ActionStatus ──────────────────────────────────────────────────────────────

/// Progress of the work a response committed to.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ActionStatus {
    #[default]
    None,
    Committed,
    InProgress,
    Completed,
    Blocked,
}

// ── Response ──────────────────────────────────────────────────────────────────

/// One agent's response to one communication.  Immutable once written.
///
/// A communication may accumulate several responses from the same recipient:
/// an ignored nudge is re-prompted on its TTL cadence, and each prompt yields
/// a fresh response.  Responses per (sender, thread, recipient) are appended
/// in generation order.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Response {
    pub id:                 ResponseId,
    pub communication_id:   CommId,
    pub agent_id:           AgentId,
    pub kind:               ResponseKind,
    pub content:            String,
    pub confidence:         f64,
    pub hesitation_markers: Vec<HesitationMarker>,
    pub action_status:      ActionStatus,
    /// Set when the generator backend timed out or failed and the rule-based
    /// path produced this response instead.
    pub fallback_used:      bool,
    pub created_at:         SimTime,
}

impl Response {
    /// `true` if the response carries `marker`.
    pub fn has_marker(&self, marker: HesitationMarker) -> bool {
        self.hesitation_markers.contains(&marker)
    }
}
