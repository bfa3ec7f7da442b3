//! The simulation event log: a bounded, append-only ring buffer.
//!
//! Failures inside delivery tasks or scheduler ticks never crash the kernel;
//! they land here (or on the affected response) and the simulation carries
//! on.  The buffer is bounded so a chatty simulation cannot grow without
//! limit — the oldest events are evicted first.

use std::collections::VecDeque;

use orgsim_core::{AgentId, CommId, SimTime, ThreadId};
use orgsim_comms::CommunicationKind;

/// Default ring-buffer capacity.
pub const DEFAULT_EVENT_CAPACITY: usize = 4_096;

/// Noteworthy things that happened inside the simulation.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "event", rename_all = "snake_case"))]
pub enum SimulationEvent {
    SimulationStarted {
        at:     SimTime,
        org_id: String,
    },
    SimulationStopped {
        at: SimTime,
    },
    CommunicationSent {
        at:         SimTime,
        comm_id:    CommId,
        kind:       CommunicationKind,
        sender:     AgentId,
        recipients: usize,
    },
    DeliveryFailed {
        at:        SimTime,
        comm_id:   CommId,
        recipient: AgentId,
    },
    DeliveryCancelled {
        at:        SimTime,
        comm_id:   CommId,
        recipient: AgentId,
    },
    EscalationPromoted {
        at:        SimTime,
        thread_id: ThreadId,
        recipient: AgentId,
        to:        CommunicationKind,
    },
    ComplianceFailure {
        at:        SimTime,
        thread_id: ThreadId,
        recipient: AgentId,
        comm_id:   CommId,
    },
    GeneratorFallback {
        at:        SimTime,
        comm_id:   CommId,
        recipient: AgentId,
    },
    /// An isolated task error: recorded, never propagated.
    TaskError {
        at:     SimTime,
        detail: String,
    },
    DayClosed {
        at:  SimTime,
        day: u64,
    },
}

/// Fixed-capacity append-only event ring.
pub struct EventLog {
    buf:      VecDeque<SimulationEvent>,
    capacity: usize,
    /// Total events ever recorded, including evicted ones.
    total:    u64,
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: VecDeque::with_capacity(capacity.min(DEFAULT_EVENT_CAPACITY)),
            capacity: capacity.max(1),
            total: 0,
        }
    }

    /// Append an event, evicting the oldest past capacity.
    pub fn push(&mut self, event: SimulationEvent) {
        if self.buf.len() == self.capacity {
            self.buf.pop_front();
        }
        self.buf.push_back(event);
        self.total += 1;
    }

    /// The `n` most recent events, oldest first.
    pub fn recent(&self, n: usize) -> Vec<SimulationEvent> {
        let skip = self.buf.len().saturating_sub(n);
        self.buf.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Total events recorded over the log's lifetime (evictions included).
    pub fn total_recorded(&self) -> u64 {
        self.total
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}
