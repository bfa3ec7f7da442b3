//! The delivery event queue.
//!
//! # Why this shape
//!
//! Most simulated instants carry no work.  A `BTreeMap<SimTime, Vec<Task>>`
//! keyed by due time lets the pump jump from one due instant to the next —
//! O(due work) per step instead of O(all time).  Tasks at the same instant
//! keep their global enqueue sequence, so draining an instant processes them
//! in a deterministic order.
//!
//! # Bounding
//!
//! The queue is bounded for *admission*: `send_communication` enqueues one
//! fan-out task per communication and is rejected when the queue is full, so
//! an overloaded send leaves no partial state.  Internal follow-up tasks
//! (deliveries, replies, TTL checks) always enqueue — work already admitted
//! is never lost to the bound.

use std::collections::BTreeMap;

use orgsim_behavior::ResponseDecision;
use orgsim_core::{AgentId, CommId, SimTime};

// ── Tasks ─────────────────────────────────────────────────────────────────────

/// One unit of scheduled work.
#[derive(Debug)]
pub(crate) enum TaskKind {
    /// Expand a communication into per-recipient deliveries.
    FanOut { comm_id: CommId },

    /// Hand a communication to a recipient and compute its decision.
    Deliver { comm_id: CommId, recipient: AgentId },

    /// Prompt the same communication again after an ignore / TTL expiry.
    Reprompt {
        comm_id:   CommId,
        recipient: AgentId,
        round:     u32,
    },

    /// A computed decision whose reply latency has elapsed: persist it.
    ResponseDue {
        comm_id:   CommId,
        recipient: AgentId,
        decision:  Box<ResponseDecision>,
    },

    /// Check whether the communication went unanswered past its TTL.
    TtlCheck { comm_id: CommId, recipient: AgentId },
}

#[derive(Debug)]
pub(crate) struct Task {
    pub seq:  u64,
    pub kind: TaskKind,
}

// ── EventQueue ────────────────────────────────────────────────────────────────

pub(crate) struct EventQueue {
    inner:    BTreeMap<SimTime, Vec<Task>>,
    next_seq: u64,
    len:      usize,
    capacity: usize,
}

impl EventQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: BTreeMap::new(),
            next_seq: 0,
            len: 0,
            capacity,
        }
    }

    /// `true` while admission-gated pushes may proceed.
    pub fn has_capacity(&self) -> bool {
        self.len < self.capacity
    }

    /// Enqueue internal work due at `at`.  Never bounded.
    pub fn push(&mut self, at: SimTime, kind: TaskKind) {
        let task = Task { seq: self.next_seq, kind };
        self.next_seq += 1;
        self.inner.entry(at).or_default().push(task);
        self.len += 1;
    }

    /// Admission-gated enqueue of a communication fan-out.  Returns `false`
    /// (and enqueues nothing) when the queue is full.
    pub fn push_fanout(&mut self, at: SimTime, comm_id: CommId) -> bool {
        if !self.has_capacity() {
            return false;
        }
        self.push(at, TaskKind::FanOut { comm_id });
        true
    }

    /// The earliest due instant, if any work is queued.
    pub fn next_time(&self) -> Option<SimTime> {
        self.inner.keys().next().copied()
    }

    /// Remove and return the earliest instant's tasks if due by `upto`,
    /// in enqueue order.
    pub fn pop_due(&mut self, upto: SimTime) -> Option<(SimTime, Vec<Task>)> {
        let (&at, _) = self.inner.first_key_value()?;
        if at > upto {
            return None;
        }
        let tasks = self.inner.remove(&at)?;
        self.len -= tasks.len();
        Some((at, tasks))
    }

    /// Remove everything.  Used by `stop()` to cancel outstanding work.
    pub fn drain_all(&mut self) -> Vec<Task> {
        let mut all = Vec::with_capacity(self.len);
        while let Some((_, mut tasks)) = self.inner.pop_first() {
            all.append(&mut tasks);
        }
        self.len = 0;
        all
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
