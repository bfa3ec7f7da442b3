//! Mutable per-agent state: stress, workload, memory, relationships.
//!
//! Every write path clamps, so `stress`, `workload`, and `satisfaction` are
//! in [0, 1] at every observation and affinities stay in [−1, 1].  The
//! interaction memory is a bounded deque, newest first; relationships are an
//! ID → affinity map — never agent-to-agent pointers.

use std::collections::VecDeque;

use orgsim_core::{AgentId, SimTime};
use orgsim_comms::{CommunicationKind, ResponseKind};
use rustc_hash::FxHashMap;

// ── InteractionRecord ─────────────────────────────────────────────────────────

/// One remembered interaction: a communication this agent handled and how it
/// responded.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InteractionRecord {
    pub at:            SimTime,
    /// The other party (sender of the handled communication).
    pub counterpart:   AgentId,
    pub comm_kind:     CommunicationKind,
    pub response_kind: ResponseKind,
    pub subject:       String,
}

// ── AgentDynamics ─────────────────────────────────────────────────────────────

/// The mutable half of an agent.  Guarded by a per-agent lock inside the
/// registry; all mutation goes through the clamping methods below.
#[derive(Clone, Debug)]
pub struct AgentDynamics {
    stress:        f64,
    workload:      f64,
    satisfaction:  f64,
    memory:        VecDeque<InteractionRecord>,
    memory_limit:  usize,
    relationships: FxHashMap<AgentId, f64>,
}

impl AgentDynamics {
    pub fn new(initial_workload: f64, memory_limit: usize) -> Self {
        Self {
            stress:        0.0,
            workload:      initial_workload.clamp(0.0, 1.0),
            satisfaction:  0.7,
            memory:        VecDeque::with_capacity(memory_limit.min(64)),
            memory_limit,
            relationships: FxHashMap::default(),
        }
    }

    // ── Scalar state ──────────────────────────────────────────────────────

    #[inline]
    pub fn stress(&self) -> f64 {
        self.stress
    }

    #[inline]
    pub fn workload(&self) -> f64 {
        self.workload
    }

    #[inline]
    pub fn satisfaction(&self) -> f64 {
        self.satisfaction
    }

    /// Add `delta` (may be negative) to stress, clamped to [0, 1].
    pub fn add_stress(&mut self, delta: f64) {
        self.stress = (self.stress + delta).clamp(0.0, 1.0);
    }

    /// Add `delta` (may be negative) to workload, clamped to [0, 1].
    pub fn add_workload(&mut self, delta: f64) {
        self.workload = (self.workload + delta).clamp(0.0, 1.0);
    }

    /// Pull stress toward zero by `factor` of its current value.
    /// Called from the daily maintenance event.
    pub fn decay_stress(&mut self, factor: f64) {
        self.stress = (self.stress * (1.0 - factor.clamp(0.0, 1.0))).clamp(0.0, 1.0);
    }

    pub fn set_satisfaction(&mut self, value: f64) {
        self.satisfaction = value.clamp(0.0, 1.0);
    }

    // ── Relationships ─────────────────────────────────────────────────────

    /// Affinity toward `other` in [−1, 1]; unknown agents read as 0.
    pub fn affinity(&self, other: &AgentId) -> f64 {
        self.relationships.get(other).copied().unwrap_or(0.0)
    }

    /// Nudge the affinity toward `other` by `delta`, clamped to [−1, 1].
    pub fn adjust_affinity(&mut self, other: &AgentId, delta: f64) {
        let entry = self.relationships.entry(other.clone()).or_insert(0.0);
        *entry = (*entry + delta).clamp(-1.0, 1.0);
    }

    /// Pre-seed an affinity (used at build time for org charts that declare
    /// working relationships).
    pub fn set_affinity(&mut self, other: AgentId, value: f64) {
        self.relationships.insert(other, value.clamp(-1.0, 1.0));
    }

    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    // ── Memory ────────────────────────────────────────────────────────────

    /// Remember an interaction, newest first, evicting beyond the bound.
    pub fn remember(&mut self, record: InteractionRecord) {
        self.memory.push_front(record);
        self.memory.truncate(self.memory_limit);
    }

    /// The `k` most recent interactions, newest first.
    pub fn recent_memory(&self, k: usize) -> Vec<InteractionRecord> {
        self.memory.iter().take(k).cloned().collect()
    }

    pub fn memory_len(&self) -> usize {
        self.memory.len()
    }

    /// Drop remembered interactions older than `horizon`.  Called from the
    /// daily maintenance event.
    pub fn forget_before(&mut self, horizon: SimTime) {
        while let Some(back) = self.memory.back() {
            if back.at < horizon {
                self.memory.pop_back();
            } else {
                break;
            }
        }
    }
}
