//! The optional generator backend.
//!
//! A [`ResponseGenerator`] is an opaque capability (typically an LLM client,
//! hosted elsewhere) with a single "classify and draft" method returning
//! structured fields.  The kernel must work identically with the capability
//! absent: [`GeneratorBehavior`] wraps the capability with a real-time
//! deadline and falls back to [`RuleBehavior`] on timeout or failure,
//! flagging `fallback_used` on the resulting decision.  Backend failure is
//! never surfaced to callers.

use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use orgsim_agents::AgentSnapshot;
use orgsim_core::AgentRng;
use orgsim_comms::{Communication, HesitationMarker, ResponseKind};

use crate::context::BehaviorContext;
use crate::decision::ResponseDecision;
use crate::engine::{BehaviorEngine, RuleBehavior};
use crate::error::BehaviorError;

// ── Capability ────────────────────────────────────────────────────────────────

/// The structured fields a generator must return.  Free-form text alone is
/// not enough — the simulation needs the classification, and parsing is the
/// generator's problem, not the kernel's.
#[derive(Clone, Debug)]
pub struct GeneratedDraft {
    pub kind:               ResponseKind,
    pub content:            String,
    pub confidence:         f64,
    pub hesitation_markers: Vec<HesitationMarker>,
}

/// Capability interface for text-generator backends.
///
/// Implementations may block (network calls); the kernel enforces the
/// deadline, not the generator.
pub trait ResponseGenerator: Send + Sync + 'static {
    fn classify_and_draft(
        &self,
        agent: &AgentSnapshot,
        comm:  &Communication,
    ) -> Result<GeneratedDraft, BehaviorError>;
}

// ── GeneratorBehavior ─────────────────────────────────────────────────────────

/// [`BehaviorEngine`] backend that delegates kind, content, and confidence
/// to a generator, while latency and agent side effects still come from the
/// rule tables (the generator knows language, not the simulation's
/// dynamics).
pub struct GeneratorBehavior {
    generator: Arc<dyn ResponseGenerator>,
    timeout:   Duration,
}

impl GeneratorBehavior {
    pub fn new(generator: Arc<dyn ResponseGenerator>, timeout: Duration) -> Self {
        Self { generator, timeout }
    }

    /// Run the generator on a helper thread and wait up to the deadline.
    ///
    /// A timed-out call keeps running in the background until it finishes on
    /// its own; its result is discarded.  The helper owns clones of its
    /// inputs, so nothing borrowed escapes.
    fn call_with_deadline(
        &self,
        agent: &AgentSnapshot,
        comm:  &Communication,
    ) -> Result<GeneratedDraft, BehaviorError> {
        let (tx, rx) = mpsc::channel();
        let generator = Arc::clone(&self.generator);
        let agent = agent.clone();
        let comm = comm.clone();
        thread::spawn(move || {
            let _ = tx.send(generator.classify_and_draft(&agent, &comm));
        });
        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(_) => Err(BehaviorError::GeneratorTimeout),
        }
    }
}

impl BehaviorEngine for GeneratorBehavior {
    fn decide(
        &self,
        agent: &AgentSnapshot,
        comm:  &Communication,
        ctx:   &BehaviorContext<'_>,
        rng:   &mut AgentRng,
    ) -> ResponseDecision {
        match self.call_with_deadline(agent, comm) {
            Ok(draft) => {
                // Deterministic triggers still apply; the generator's own
                // markers are merged in without duplicates.
                let mut markers =
                    RuleBehavior::markers_for(agent, comm, ctx, draft.confidence);
                for marker in draft.hesitation_markers {
                    if !markers.contains(&marker) {
                        markers.push(marker);
                    }
                }
                RuleBehavior::complete(
                    draft.kind,
                    draft.content,
                    draft.confidence.clamp(0.0, 1.0),
                    markers,
                    agent,
                    comm,
                    ctx,
                    rng,
                )
            }
            Err(_) => {
                let mut decision = RuleBehavior.decide(agent, comm, ctx, rng);
                decision.fallback_used = true;
                decision
            }
        }
    }
}
