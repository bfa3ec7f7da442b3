//! The escalation manager.
//!
//! The manager is a pure state machine: it consumes "response persisted" and
//! "TTL expired" facts and emits [`EscalationAction`]s for the engine to
//! apply — schedule a re-prompt, inject a synthesized communication, log a
//! compliance failure.  Producing actions instead of acting keeps this crate
//! free of queue and tracking dependencies, and the engine's sequential
//! apply phase keeps promotions serialized per thread.

use orgsim_core::{AgentId, CommId, SimDuration, ThreadId};
use orgsim_comms::{Communication, ResponseKind};
use rustc_hash::FxHashMap;

use crate::thread::{EscalationLevel, ThreadState};

// ── Thresholds ────────────────────────────────────────────────────────────────

/// Promotion thresholds (N₁, N₂).
#[derive(Copy, Clone, Debug)]
pub struct EscalationThresholds {
    /// Ignored nudges before promotion to a recommendation.
    pub nudges_before_recommendation: u32,
    /// Ignored recommendations before promotion to a direct order.
    pub recommendations_before_order: u32,
}

impl Default for EscalationThresholds {
    fn default() -> Self {
        Self {
            nudges_before_recommendation: 5,
            recommendations_before_order: 3,
        }
    }
}

// ── Actions ───────────────────────────────────────────────────────────────────

/// What the engine must do in reaction to an escalation event.
#[derive(Clone, Debug, PartialEq)]
pub enum EscalationAction {
    /// Below threshold: prompt the same communication to this recipient
    /// again after `delay`.
    Reprompt {
        comm_id:   CommId,
        recipient: AgentId,
        delay:     SimDuration,
    },

    /// Threshold reached: synthesize a communication of the kind matching
    /// `level` in the same thread, addressed to this recipient, and inject
    /// it through the distribution engine.
    Promote {
        thread_id:   ThreadId,
        recipient:   AgentId,
        level:       EscalationLevel,
        /// The communication whose ignores triggered the promotion.
        source_comm: CommId,
    },

    /// A direct order was ignored: count it against the recipient's
    /// compliance record.  Never escalates further.
    ComplianceFailure {
        thread_id: ThreadId,
        recipient: AgentId,
        comm_id:   CommId,
    },

    /// The ladder reached terminal for this recipient.
    Closed {
        thread_id: ThreadId,
        recipient: AgentId,
    },
}

// ── Manager ───────────────────────────────────────────────────────────────────

/// State machine per (thread, recipient).
pub struct EscalationManager {
    thresholds: EscalationThresholds,
    threads:    FxHashMap<(ThreadId, AgentId), ThreadState>,
}

impl EscalationManager {
    pub fn new(thresholds: EscalationThresholds) -> Self {
        Self {
            thresholds,
            threads: FxHashMap::default(),
        }
    }

    /// Register a communication's recipients when it is sent.
    ///
    /// Root communications open a ladder at the level matching their kind;
    /// synthesized escalations find their state already advanced and only
    /// clear the in-flight promotion flag.  Non-ladder kinds are ignored.
    pub fn register_send(&mut self, comm: &Communication) {
        let Some(level) = EscalationLevel::from_kind(comm.kind) else {
            return;
        };
        for recipient in &comm.recipients {
            let key = (comm.thread_id.clone(), recipient.clone());
            match self.threads.get_mut(&key) {
                None => {
                    self.threads.insert(key, ThreadState::new(level));
                }
                Some(state) => {
                    if state.promotion_in_flight() && state.level() == level {
                        state.finish_promotion();
                    }
                }
            }
        }
    }

    /// React to a persisted response.  At most one promotion per call.
    ///
    /// Responses to rungs the ladder has already moved past are stale and
    /// produce no actions.
    pub fn on_response(
        &mut self,
        comm:           &Communication,
        recipient:      &AgentId,
        kind:           ResponseKind,
        reprompt_delay: SimDuration,
    ) -> Vec<EscalationAction> {
        if kind.is_engaged() {
            return self.note_engaged(comm, recipient);
        }
        self.note_ignored(comm, recipient, reprompt_delay)
    }

    /// React to a TTL expiry with no response — counts as ignored.
    pub fn on_ttl_expired(
        &mut self,
        comm:           &Communication,
        recipient:      &AgentId,
        reprompt_delay: SimDuration,
    ) -> Vec<EscalationAction> {
        self.note_ignored(comm, recipient, reprompt_delay)
    }

    /// Current level for a (thread, recipient), if a ladder exists.
    pub fn current_level(&self, thread: &ThreadId, recipient: &AgentId) -> Option<EscalationLevel> {
        self.threads
            .get(&(thread.clone(), recipient.clone()))
            .map(|s| s.level())
    }

    /// Ignore counters for a (thread, recipient): (nudges, recommendations).
    pub fn ignore_counts(&self, thread: &ThreadId, recipient: &AgentId) -> Option<(u32, u32)> {
        self.threads
            .get(&(thread.clone(), recipient.clone()))
            .map(|s| (s.nudges_ignored(), s.recommendations_ignored()))
    }

    pub fn thread_count(&self) -> usize {
        self.threads.len()
    }

    // ── Transitions ───────────────────────────────────────────────────────

    fn note_engaged(&mut self, comm: &Communication, recipient: &AgentId) -> Vec<EscalationAction> {
        let key = (comm.thread_id.clone(), recipient.clone());
        let Some(state) = self.threads.get_mut(&key) else {
            return vec![];
        };
        if state.level() == EscalationLevel::Terminal
            || Some(comm.kind) != state.level().comm_kind()
        {
            return vec![];
        }
        state.advance(EscalationLevel::Terminal);
        vec![EscalationAction::Closed {
            thread_id: comm.thread_id.clone(),
            recipient: recipient.clone(),
        }]
    }

    fn note_ignored(
        &mut self,
        comm:           &Communication,
        recipient:      &AgentId,
        reprompt_delay: SimDuration,
    ) -> Vec<EscalationAction> {
        let key = (comm.thread_id.clone(), recipient.clone());
        let Some(state) = self.threads.get_mut(&key) else {
            return vec![];
        };
        if state.level() == EscalationLevel::Terminal
            || Some(comm.kind) != state.level().comm_kind()
        {
            return vec![];
        }

        match state.level() {
            EscalationLevel::Nudge => {
                let ignored = state.note_nudge_ignored();
                if ignored >= self.thresholds.nudges_before_recommendation
                    && !state.promotion_in_flight()
                {
                    state.begin_promotion(EscalationLevel::Recommendation);
                    vec![EscalationAction::Promote {
                        thread_id:   comm.thread_id.clone(),
                        recipient:   recipient.clone(),
                        level:       EscalationLevel::Recommendation,
                        source_comm: comm.id.clone(),
                    }]
                } else {
                    vec![EscalationAction::Reprompt {
                        comm_id:   comm.id.clone(),
                        recipient: recipient.clone(),
                        delay:     reprompt_delay,
                    }]
                }
            }

            EscalationLevel::Recommendation => {
                let ignored = state.note_recommendation_ignored();
                if ignored >= self.thresholds.recommendations_before_order
                    && !state.promotion_in_flight()
                {
                    state.begin_promotion(EscalationLevel::DirectOrder);
                    vec![EscalationAction::Promote {
                        thread_id:   comm.thread_id.clone(),
                        recipient:   recipient.clone(),
                        level:       EscalationLevel::DirectOrder,
                        source_comm: comm.id.clone(),
                    }]
                } else {
                    vec![EscalationAction::Reprompt {
                        comm_id:   comm.id.clone(),
                        recipient: recipient.clone(),
                        delay:     reprompt_delay,
                    }]
                }
            }

            // Ignored direct orders never escalate further: log the
            // compliance failure and close the ladder.
            EscalationLevel::DirectOrder => {
                state.advance(EscalationLevel::Terminal);
                vec![
                    EscalationAction::ComplianceFailure {
                        thread_id: comm.thread_id.clone(),
                        recipient: recipient.clone(),
                        comm_id:   comm.id.clone(),
                    },
                    EscalationAction::Closed {
                        thread_id: comm.thread_id.clone(),
                        recipient: recipient.clone(),
                    },
                ]
            }

            EscalationLevel::Terminal => unreachable!("checked above"),
        }
    }
}
