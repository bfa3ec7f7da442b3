//! Public status and send-request types.

use orgsim_core::{AgentId, SimTime};
use orgsim_comms::{CommunicationKind, Priority};

/// A snapshot of the kernel's externally visible state.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimulationStatus {
    pub organization_id:      String,
    pub running:              bool,
    /// Current simulated instant (seconds since simulation start).
    pub sim_time:             SimTime,
    /// Wall-clock mapping of `sim_time`.
    pub sim_unix_time:        i64,
    /// `None` in on-demand (as-fast-as-possible) mode.
    pub acceleration_factor:  Option<f64>,
    pub agent_count:          usize,
    pub communications_total: usize,
    pub responses_total:      usize,
    /// Queued work items (fan-outs, deliveries, replies, TTL checks).
    pub pending_tasks:        usize,
    pub escalations_promoted: u64,
    pub compliance_failures:  u64,
}

/// Input to [`Kernel::send_communication`][crate::Kernel::send_communication].
#[derive(Clone, Debug)]
pub struct CommunicationDraft {
    pub sender:         AgentId,
    pub recipients:     Vec<AgentId>,
    pub kind:           CommunicationKind,
    pub subject:        String,
    pub body:           String,
    pub strategic_goal: Option<String>,
    /// Defaults to priority 3 when absent.
    pub priority:       Option<Priority>,
}

impl CommunicationDraft {
    pub fn new(
        sender: impl Into<AgentId>,
        recipients: Vec<AgentId>,
        kind: CommunicationKind,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            sender: sender.into(),
            recipients,
            kind,
            subject: subject.into(),
            body: body.into(),
            strategic_goal: None,
            priority: None,
        }
    }

    pub fn strategic_goal(mut self, goal: impl Into<String>) -> Self {
        self.strategic_goal = Some(goal.into());
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }
}
