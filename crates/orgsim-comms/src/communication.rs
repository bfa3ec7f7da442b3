//! Communications: the messages that flow down (and across) the organization.

use orgsim_core::{AgentId, CommId, SimDuration, SimTime, ThreadId};

// ── CommunicationKind ─────────────────────────────────────────────────────────

/// The kind of a strategic communication.
///
/// `Nudge`, `Recommendation`, and `DirectOrder` are the three rungs of the
/// escalation ladder, ordered by increasing authority.  `Consultation` and
/// `Catchball` sit outside the ladder: they ask for input rather than
/// compliance and are never escalated.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CommunicationKind {
    Nudge,
    Recommendation,
    DirectOrder,
    Consultation,
    Catchball,
}

impl CommunicationKind {
    /// `true` for the three rungs of the escalation ladder.
    pub fn is_escalatable(self) -> bool {
        matches!(
            self,
            CommunicationKind::Nudge
                | CommunicationKind::Recommendation
                | CommunicationKind::DirectOrder
        )
    }

    /// How much positional authority the kind itself carries, in [0, 1].
    /// Feeds the behavior engine's pressure computation.
    pub fn authority_weight(self) -> f64 {
        match self {
            CommunicationKind::Nudge => 0.3,
            CommunicationKind::Recommendation => 0.6,
            CommunicationKind::DirectOrder => 1.0,
            CommunicationKind::Consultation => 0.2,
            CommunicationKind::Catchball => 0.25,
        }
    }

    /// Reply-latency widening factor.  Consultations invite deliberation and
    /// get a 4× wider latency window.
    pub fn latency_widening(self) -> u64 {
        match self {
            CommunicationKind::Consultation => 4,
            _ => 1,
        }
    }

    /// Stable wire label, identical to the serde encoding.
    pub fn label(self) -> &'static str {
        match self {
            CommunicationKind::Nudge => "nudge",
            CommunicationKind::Recommendation => "recommendation",
            CommunicationKind::DirectOrder => "direct_order",
            CommunicationKind::Consultation => "consultation",
            CommunicationKind::Catchball => "catchball",
        }
    }
}

// ── Priority ──────────────────────────────────────────────────────────────────

/// Communication priority on the 1 (background) to 5 (critical) scale.
///
/// Constructors clamp, so a `Priority` is in-range everywhere downstream.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Priority(u8);

impl Priority {
    pub const MIN: Priority = Priority(1);
    pub const MAX: Priority = Priority(5);

    pub fn new(level: u8) -> Self {
        Priority(level.clamp(1, 5))
    }

    #[inline]
    pub fn get(self) -> u8 {
        self.0
    }

    /// Urgency in (0, 1]: priority normalised to the scale maximum.
    #[inline]
    pub fn urgency(self) -> f64 {
        self.0 as f64 / 5.0
    }
}

impl Default for Priority {
    /// Routine business: priority 3.
    fn default() -> Self {
        Priority(3)
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "P{}", self.0)
    }
}

// ── Communication ─────────────────────────────────────────────────────────────

/// One communication from a sender to an ordered set of recipients.
///
/// Recipients have set semantics but insertion order is preserved for
/// traceability — deliveries are issued in this order.  `thread_id` is
/// identical across a communication's escalated descendants.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Communication {
    pub id:             CommId,
    pub thread_id:      ThreadId,
    pub sender:         AgentId,
    pub recipients:     Vec<AgentId>,
    pub kind:           CommunicationKind,
    pub priority:       Priority,
    pub subject:        String,
    pub body:           String,
    pub strategic_goal: Option<String>,
    pub created_at:     SimTime,
    /// Simulated duration after which a non-response counts as ignored.
    pub ttl:            SimDuration,
}

impl Communication {
    /// Drop duplicate recipients while preserving first-seen order.
    pub fn dedup_recipients(recipients: Vec<AgentId>) -> Vec<AgentId> {
        let mut seen = Vec::with_capacity(recipients.len());
        for r in recipients {
            if !seen.contains(&r) {
                seen.push(r);
            }
        }
        seen
    }

    /// The instant at which this communication's TTL elapses.
    #[inline]
    pub fn expires_at(&self) -> SimTime {
        self.created_at + self.ttl
    }
}
