//! The wisdom engine: per-communication and per-goal aggregates.

use orgsim_core::{CommId, SimDuration};
use orgsim_comms::{Communication, Response};
use rustc_hash::FxHashMap;

use crate::aggregate::{Aggregate, WisdomOfTheCrowd};

/// Key for a wisdom query: one communication, or every communication that
/// shares a strategic-goal tag.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum TopicKey {
    Communication(CommId),
    Goal(String),
}

/// Consumes the response stream and keeps streaming aggregates, one per
/// communication and one per strategic goal.
///
/// The engine holds no references into tracking or the registry — ingestion
/// hands it exactly the facts it tallies.  The kernel wraps it in a
/// reader-writer lock: ingestion takes the write side on the pump, wisdom
/// queries only ever read.
pub struct WisdomEngine {
    per_comm: FxHashMap<CommId, Aggregate>,
    per_goal: FxHashMap<String, Aggregate>,
}

impl WisdomEngine {
    pub fn new() -> Self {
        Self {
            per_comm: FxHashMap::default(),
            per_goal: FxHashMap::default(),
        }
    }

    /// Open aggregates for a communication when it is sent.
    ///
    /// The communication's TTL becomes the declared deadline for its
    /// timeline-conflict detection; a goal aggregate keeps the deadline of
    /// the first communication that opened it.
    pub fn register_communication(&mut self, comm: &Communication) {
        self.per_comm
            .entry(comm.id.clone())
            .or_insert_with(|| Aggregate::new(comm.ttl));
        if let Some(goal) = &comm.strategic_goal {
            self.per_goal
                .entry(goal.clone())
                .or_insert_with(|| Aggregate::new(comm.ttl));
        }
    }

    /// Fold one persisted response into the affected aggregates.
    pub fn ingest(
        &mut self,
        comm:       &Communication,
        response:   &Response,
        department: &str,
        latency:    SimDuration,
    ) {
        self.per_comm
            .entry(comm.id.clone())
            .or_insert_with(|| Aggregate::new(comm.ttl))
            .ingest(response, department, latency);
        if let Some(goal) = &comm.strategic_goal {
            self.per_goal
                .entry(goal.clone())
                .or_insert_with(|| Aggregate::new(comm.ttl))
                .ingest(response, department, latency);
        }
    }

    /// Snapshot for a key, `None` if the key was never seen.
    pub fn wisdom(&self, key: &TopicKey) -> Option<WisdomOfTheCrowd> {
        match key {
            TopicKey::Communication(id) => self.per_comm.get(id).map(Aggregate::snapshot),
            TopicKey::Goal(goal) => self.per_goal.get(goal).map(Aggregate::snapshot),
        }
    }

    pub fn wisdom_for_comm(&self, id: &CommId) -> Option<WisdomOfTheCrowd> {
        self.per_comm.get(id).map(Aggregate::snapshot)
    }

    pub fn wisdom_for_goal(&self, goal: &str) -> Option<WisdomOfTheCrowd> {
        self.per_goal.get(goal).map(Aggregate::snapshot)
    }

    pub fn tracked_communications(&self) -> usize {
        self.per_comm.len()
    }

    pub fn tracked_goals(&self) -> usize {
        self.per_goal.len()
    }
}

impl Default for WisdomEngine {
    fn default() -> Self {
        Self::new()
    }
}
