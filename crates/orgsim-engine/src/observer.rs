//! Kernel observer hooks for progress reporting and data collection.

use orgsim_core::{AgentId, CommId, SimTime};
use orgsim_comms::{Communication, Response};
use orgsim_escalation::EscalationLevel;
use orgsim_tracking::WorkforceSnapshot;

/// Callbacks invoked by the kernel at key points of the simulation.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.  Hooks run on the pump (driver) thread
/// and must not block — store data, signal elsewhere, return.
///
/// # Example — response counter
///
/// ```rust,ignore
/// struct ResponseCounter(usize);
///
/// impl SimObserver for ResponseCounter {
///     fn on_response(&mut self, _comm: &Communication, _response: &Response) {
///         self.0 += 1;
///     }
/// }
/// ```
pub trait SimObserver: Send {
    /// The simulation started.
    fn on_start(&mut self, _at: SimTime, _org_id: &str) {}

    /// One simulated minute passed.
    fn on_tick(&mut self, _at: SimTime) {}

    /// A communication was recorded (external send, chatter, or a
    /// synthesized escalation).
    fn on_communication(&mut self, _comm: &Communication) {}

    /// A delivery reached its recipient.
    fn on_delivery(&mut self, _at: SimTime, _comm_id: &CommId, _recipient: &AgentId) {}

    /// A response was persisted.
    fn on_response(&mut self, _comm: &Communication, _response: &Response) {}

    /// A thread was promoted to `level` for `recipient`.
    fn on_escalation(&mut self, _at: SimTime, _recipient: &AgentId, _level: EscalationLevel) {}

    /// End-of-day closed with this workforce snapshot.
    fn on_day_end(&mut self, _snapshot: &WorkforceSnapshot) {}

    /// The simulation stopped (drain finished).
    fn on_stop(&mut self, _at: SimTime) {}
}

/// A [`SimObserver`] that does nothing.  The default when the builder is
/// given no observer.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}
