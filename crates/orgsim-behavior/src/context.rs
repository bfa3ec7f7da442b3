//! Read-only context passed to every behavior decision.

use orgsim_core::{SimTime, SimulationParameters};

/// A read-only view of the simulation facts one decision needs, beyond the
/// agent snapshot and the communication itself.
///
/// Built by the engine immediately before the (potentially parallel)
/// decision phase; borrows live only for that phase and nothing here is
/// mutated while decisions run.
pub struct BehaviorContext<'a> {
    /// Current simulated instant (the prompt time, not the send time).
    pub now: SimTime,

    /// Per-simulation parameters (stress threshold, collaboration bonus, …).
    pub params: &'a SimulationParameters,

    /// How many distinct high-priority communications addressed to this
    /// agent are still unresolved.  Two or more triggers the
    /// `priority_conflict` hesitation marker.
    pub open_high_priority: u32,

    /// Zero for the first prompt of a communication; counts re-prompts of
    /// the same communication after ignores / TTL expiries.
    pub prompt_round: u32,
}

impl<'a> BehaviorContext<'a> {
    pub fn new(now: SimTime, params: &'a SimulationParameters) -> Self {
        Self {
            now,
            params,
            open_high_priority: 0,
            prompt_round: 0,
        }
    }

    pub fn with_open_high_priority(mut self, n: u32) -> Self {
        self.open_high_priority = n;
        self
    }

    pub fn with_prompt_round(mut self, round: u32) -> Self {
        self.prompt_round = round;
        self
    }
}
