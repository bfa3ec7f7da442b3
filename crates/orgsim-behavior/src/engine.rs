//! The `BehaviorEngine` trait and the rule-based default backend.

use orgsim_agents::AgentSnapshot;
use orgsim_core::{AgentRng, SimDuration};
use orgsim_comms::{
    ActionStatus, Communication, CommunicationKind, HesitationMarker, ResponseKind,
};
use rand_distr::{Distribution, LogNormal};

use crate::context::BehaviorContext;
use crate::decision::ResponseDecision;
use crate::templates;

/// Pluggable decision backend.
///
/// Implementations map (agent snapshot × communication × context) to a
/// [`ResponseDecision`], drawing all randomness from the supplied per-agent
/// stream so results are deterministic regardless of worker-thread ordering.
///
/// # Thread safety
///
/// The engine calls `decide` for many agents in parallel, so implementations
/// must be `Send + Sync` and hold no per-call mutable state of their own —
/// per-agent state arrives in the snapshot, randomness in `rng`.
pub trait BehaviorEngine: Send + Sync + 'static {
    fn decide(
        &self,
        agent: &AgentSnapshot,
        comm:  &Communication,
        ctx:   &BehaviorContext<'_>,
        rng:   &mut AgentRng,
    ) -> ResponseDecision;
}

// ── RuleBehavior ──────────────────────────────────────────────────────────────

/// The default backend: a weighted rule table over response kinds.
///
/// # Kind selection
///
/// Base weights per communication kind are modulated by *pressure* (how hard
/// the message pushes) and *compliance tendency* (how inclined this agent is
/// to go along), then drawn by multiplicative-noise argmax: each weight is
/// perturbed by a uniform factor in [0.9, 1.1] from the agent's stream and
/// the largest perturbed weight wins.  Near-tied kinds stay random; clearly
/// dominant kinds are stable under every seed.
pub struct RuleBehavior;

/// Base kind weights per communication kind, in [`ResponseKind::ALL`] order:
/// ignore, take_action, seek_clarification, provide_feedback, escalate,
/// delegate.
fn base_weights(kind: CommunicationKind) -> [f64; 6] {
    match kind {
        CommunicationKind::Nudge => [0.30, 0.25, 0.15, 0.15, 0.05, 0.10],
        CommunicationKind::Recommendation => [0.15, 0.35, 0.18, 0.15, 0.07, 0.10],
        CommunicationKind::DirectOrder => [0.03, 0.75, 0.08, 0.04, 0.05, 0.05],
        CommunicationKind::Consultation => [0.10, 0.10, 0.15, 0.50, 0.05, 0.10],
        CommunicationKind::Catchball => [0.08, 0.12, 0.20, 0.45, 0.05, 0.10],
    }
}

impl RuleBehavior {
    /// How hard the communication pushes on this agent, in [0, 1].
    ///
    /// Direct orders and high priorities raise pressure; a high
    /// authority-response trait amplifies the kind's positional authority.
    fn pressure(agent: &AgentSnapshot, comm: &Communication) -> f64 {
        let p = &agent.personality;
        (0.35 * comm.priority.urgency()
            + 0.40 * comm.kind.authority_weight() * (0.4 + 0.6 * p.authority_response())
            + 0.15 * agent.stress * p.workload_sensitivity()
            + 0.10 * agent.workload)
            .clamp(0.0, 1.0)
    }

    /// How inclined the agent is to go along with the sender, in [0, 1].
    fn compliance(agent: &AgentSnapshot) -> f64 {
        let p = &agent.personality;
        (0.70 * p.authority_response()
            + 0.15 * (agent.sender_affinity + 1.0) / 2.0
            + 0.15 * p.change_adaptability())
        .clamp(0.0, 1.0)
    }

    /// Weight table over [`ResponseKind::ALL`] for this prompt.
    fn kind_weights(
        agent: &AgentSnapshot,
        comm:  &Communication,
        ctx:   &BehaviorContext<'_>,
    ) -> [f64; 6] {
        let p = &agent.personality;
        let pressure = Self::pressure(agent, comm);
        let compliance = Self::compliance(agent);

        let mut w = base_weights(comm.kind);
        // Indexes follow ResponseKind::ALL.
        w[0] *= ((1.5 - 1.6 * compliance) * (1.2 - pressure)).max(0.05);
        w[1] *= 0.2 + 2.2 * compliance * compliance;
        w[2] *= 0.4 + 0.8 * compliance;
        w[3] *= (0.6 + 0.8 * p.communication_style()) * (0.3 + 0.9 * compliance);
        w[4] *= 0.4 + 1.2 * agent.stress + 0.4 * (1.0 - p.risk_tolerance());
        w[5] *= if agent.seniority >= 3 { 1.0 } else { 0.15 };

        // Over the stress threshold the whole distribution shifts toward
        // disengagement and escalation.
        if agent.stress >= ctx.params.stress_threshold {
            w[0] *= 2.2;
            w[1] *= 0.5;
            w[4] *= 2.5;
        }
        w
    }

    /// Multiplicative-noise argmax over the weight table.
    fn select_kind(weights: [f64; 6], rng: &mut AgentRng) -> ResponseKind {
        let mut best = ResponseKind::Ignore;
        let mut best_score = f64::MIN;
        for (kind, weight) in ResponseKind::ALL.into_iter().zip(weights) {
            let score = weight * rng.gen_range(0.9..1.1);
            if score > best_score {
                best_score = score;
                best = kind;
            }
        }
        best
    }

    fn confidence_for(
        kind:  ResponseKind,
        agent: &AgentSnapshot,
        rng:   &mut AgentRng,
    ) -> f64 {
        let compliance = Self::compliance(agent);
        let mut confidence = 0.35 + 0.40 * compliance + 0.15 * (1.0 - agent.stress)
            - 0.10 * agent.workload
            + rng.gen_range(-0.05..0.05);
        if kind == ResponseKind::Ignore {
            confidence *= 0.4;
        }
        confidence.clamp(0.0, 1.0)
    }

    /// Hesitation markers are determined independently of the chosen kind —
    /// each has its own trigger.
    pub(crate) fn markers_for(
        agent:      &AgentSnapshot,
        comm:       &Communication,
        ctx:        &BehaviorContext<'_>,
        confidence: f64,
    ) -> Vec<HesitationMarker> {
        let mut markers = Vec::new();
        if confidence < 0.4 {
            markers.push(HesitationMarker::Uncertainty);
        }
        if ctx.open_high_priority >= 2 {
            markers.push(HesitationMarker::PriorityConflict);
        }
        if agent.workload > 0.7 && comm.priority.urgency() >= 0.8 {
            markers.push(HesitationMarker::ResourceConstraint);
        }
        if let Some(goal) = &comm.strategic_goal {
            if !agent.expertise.iter().any(|tag| tag == goal) {
                markers.push(HesitationMarker::StrategicMisalignment);
            }
        }
        if agent.personality.collaboration_preference() > 0.7
            && matches!(
                comm.kind,
                CommunicationKind::Consultation
                    | CommunicationKind::Catchball
                    | CommunicationKind::Recommendation
            )
        {
            markers.push(HesitationMarker::NeedsConsensus);
        }
        if agent.workload > 0.85 {
            markers.push(HesitationMarker::CapacitySaturation);
        }
        markers
    }

    /// Reply latency: lognormal around a workload-shifted midpoint, clamped
    /// to [5, 120/priority] minutes (×4 for consultations).
    fn latency_for(
        kind:  CommunicationKind,
        comm:  &Communication,
        agent: &AgentSnapshot,
        rng:   &mut AgentRng,
    ) -> SimDuration {
        let min_m = 5.0_f64;
        let max_m = (120.0 / comm.priority.get() as f64) * kind.latency_widening() as f64;
        let max_m = max_m.max(min_m + 1.0);

        // Busier agents answer later; the midpoint slides up the window.
        let mid = min_m + (max_m - min_m) * (0.25 + 0.5 * agent.workload);
        let dist = LogNormal::new(mid.ln(), 0.5).expect("sigma is finite and positive");
        let minutes = dist.sample(rng.inner()).clamp(min_m, max_m);
        SimDuration::from_secs((minutes * 60.0) as u64)
    }

    /// Assemble the full decision for an already-chosen kind.  Shared by the
    /// rule path and the generator path (which supplies its own kind,
    /// content, and confidence but inherits latency and side effects).
    #[allow(clippy::too_many_arguments)]
    pub fn complete(
        kind:       ResponseKind,
        content:    String,
        confidence: f64,
        markers:    Vec<HesitationMarker>,
        agent:      &AgentSnapshot,
        comm:       &Communication,
        ctx:        &BehaviorContext<'_>,
        rng:        &mut AgentRng,
    ) -> ResponseDecision {
        let compliance = Self::compliance(agent);
        let urgency = comm.priority.urgency();
        let affinity = agent.sender_affinity;

        let stress_delta = (0.15
            * (urgency * compliance - ctx.params.collaboration_bonus * affinity.max(0.0)))
        .clamp(-0.2, 0.2);

        let workload_delta = match kind {
            ResponseKind::TakeAction => 0.08 + 0.08 * urgency,
            ResponseKind::Delegate => 0.02,
            _ => 0.0,
        };

        let affinity_delta = match kind {
            ResponseKind::TakeAction | ResponseKind::ProvideFeedback => 0.02,
            ResponseKind::SeekClarification => 0.01,
            ResponseKind::Delegate => 0.0,
            ResponseKind::Escalate => -0.01,
            ResponseKind::Ignore => -0.02,
        };

        let action_status = match kind {
            ResponseKind::TakeAction | ResponseKind::Delegate => ActionStatus::Committed,
            _ => ActionStatus::None,
        };

        ResponseDecision {
            kind,
            reply_latency: Self::latency_for(comm.kind, comm, agent, rng),
            content,
            confidence,
            hesitation_markers: markers,
            action_status,
            stress_delta,
            workload_delta,
            affinity_delta,
            fallback_used: false,
        }
    }
}

impl BehaviorEngine for RuleBehavior {
    fn decide(
        &self,
        agent: &AgentSnapshot,
        comm:  &Communication,
        ctx:   &BehaviorContext<'_>,
        rng:   &mut AgentRng,
    ) -> ResponseDecision {
        let weights = Self::kind_weights(agent, comm, ctx);
        let kind = Self::select_kind(weights, rng);
        let confidence = Self::confidence_for(kind, agent, rng);
        let markers = Self::markers_for(agent, comm, ctx, confidence);
        let content = templates::content_for(kind, comm, rng);
        Self::complete(kind, content, confidence, markers, agent, comm, ctx, rng)
    }
}
