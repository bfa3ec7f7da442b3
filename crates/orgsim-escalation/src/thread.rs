//! Escalation levels and per-(thread, recipient) state.

use orgsim_comms::CommunicationKind;

// ── EscalationLevel ───────────────────────────────────────────────────────────

/// Current rung of one recipient's escalation ladder.
///
/// Levels only ever advance (variant order is the ladder order); `Terminal`
/// is absorbing.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum EscalationLevel {
    Nudge,
    Recommendation,
    DirectOrder,
    Terminal,
}

impl EscalationLevel {
    /// The communication kind delivered at this level, `None` for terminal.
    pub fn comm_kind(self) -> Option<CommunicationKind> {
        match self {
            EscalationLevel::Nudge => Some(CommunicationKind::Nudge),
            EscalationLevel::Recommendation => Some(CommunicationKind::Recommendation),
            EscalationLevel::DirectOrder => Some(CommunicationKind::DirectOrder),
            EscalationLevel::Terminal => None,
        }
    }

    /// Starting level for a root communication of `kind`; `None` for kinds
    /// outside the ladder.
    pub fn from_kind(kind: CommunicationKind) -> Option<EscalationLevel> {
        match kind {
            CommunicationKind::Nudge => Some(EscalationLevel::Nudge),
            CommunicationKind::Recommendation => Some(EscalationLevel::Recommendation),
            CommunicationKind::DirectOrder => Some(EscalationLevel::DirectOrder),
            CommunicationKind::Consultation | CommunicationKind::Catchball => None,
        }
    }
}

// ── ThreadState ───────────────────────────────────────────────────────────────

/// One recipient's position in one thread's ladder.
#[derive(Clone, Debug)]
pub struct ThreadState {
    level:                   EscalationLevel,
    nudges_ignored:          u32,
    recommendations_ignored: u32,
    /// Set while a promotion's synthesized communication is being injected;
    /// guarantees at most one promotion in flight per (thread, recipient).
    promotion_in_flight:     bool,
}

impl ThreadState {
    pub fn new(level: EscalationLevel) -> Self {
        Self {
            level,
            nudges_ignored: 0,
            recommendations_ignored: 0,
            promotion_in_flight: false,
        }
    }

    #[inline]
    pub fn level(&self) -> EscalationLevel {
        self.level
    }

    #[inline]
    pub fn nudges_ignored(&self) -> u32 {
        self.nudges_ignored
    }

    #[inline]
    pub fn recommendations_ignored(&self) -> u32 {
        self.recommendations_ignored
    }

    #[inline]
    pub fn promotion_in_flight(&self) -> bool {
        self.promotion_in_flight
    }

    pub(crate) fn note_nudge_ignored(&mut self) -> u32 {
        self.nudges_ignored += 1;
        self.nudges_ignored
    }

    pub(crate) fn note_recommendation_ignored(&mut self) -> u32 {
        self.recommendations_ignored += 1;
        self.recommendations_ignored
    }

    pub(crate) fn begin_promotion(&mut self, to: EscalationLevel) {
        self.advance(to);
        self.promotion_in_flight = true;
    }

    pub(crate) fn finish_promotion(&mut self) {
        self.promotion_in_flight = false;
    }

    /// Advance the level.  Levels never move backwards.
    pub(crate) fn advance(&mut self, to: EscalationLevel) {
        debug_assert!(to > self.level, "escalation level must only move forward");
        self.level = to;
    }
}
