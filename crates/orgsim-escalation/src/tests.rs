//! Unit tests for orgsim-escalation.

use orgsim_core::{AgentId, CommId, SimDuration, SimTime, ThreadId};
use orgsim_comms::{Communication, CommunicationKind, Priority, ResponseKind};

use crate::{EscalationAction, EscalationLevel, EscalationManager, EscalationThresholds};

// ── Helpers ───────────────────────────────────────────────────────────────────

const DELAY: SimDuration = SimDuration(3_600);

fn comm(id: &str, thread: &str, kind: CommunicationKind) -> Communication {
    Communication {
        id:             CommId::new(id),
        thread_id:      ThreadId::new(thread),
        sender:         AgentId::new("ceo"),
        recipients:     vec![AgentId::new("vp")],
        kind,
        priority:       Priority::default(),
        subject:        "subject".into(),
        body:           "body".into(),
        strategic_goal: None,
        created_at:     SimTime::ZERO,
        ttl:            SimDuration::from_hours(24),
    }
}

fn manager(n1: u32, n2: u32) -> EscalationManager {
    EscalationManager::new(EscalationThresholds {
        nudges_before_recommendation: n1,
        recommendations_before_order: n2,
    })
}

fn vp() -> AgentId {
    AgentId::new("vp")
}

// ── Ladder progression ────────────────────────────────────────────────────────

#[test]
fn ignores_below_threshold_reprompt() {
    let mut m = manager(3, 2);
    let nudge = comm("comm-1", "thread-1", CommunicationKind::Nudge);
    m.register_send(&nudge);

    for round in 1..3 {
        let actions = m.on_response(&nudge, &vp(), ResponseKind::Ignore, DELAY);
        assert_eq!(
            actions,
            vec![EscalationAction::Reprompt {
                comm_id:   nudge.id.clone(),
                recipient: vp(),
                delay:     DELAY,
            }],
            "round {round}"
        );
    }
    assert_eq!(m.ignore_counts(&nudge.thread_id, &vp()), Some((2, 0)));
    assert_eq!(m.current_level(&nudge.thread_id, &vp()), Some(EscalationLevel::Nudge));
}

#[test]
fn threshold_promotes_to_recommendation_then_order() {
    let mut m = manager(3, 2);
    let nudge = comm("comm-1", "thread-1", CommunicationKind::Nudge);
    m.register_send(&nudge);

    // Two reprompts, third ignore promotes.
    m.on_response(&nudge, &vp(), ResponseKind::Ignore, DELAY);
    m.on_response(&nudge, &vp(), ResponseKind::Ignore, DELAY);
    let actions = m.on_response(&nudge, &vp(), ResponseKind::Ignore, DELAY);
    assert_eq!(
        actions,
        vec![EscalationAction::Promote {
            thread_id:   nudge.thread_id.clone(),
            recipient:   vp(),
            level:       EscalationLevel::Recommendation,
            source_comm: nudge.id.clone(),
        }]
    );
    assert_eq!(
        m.current_level(&nudge.thread_id, &vp()),
        Some(EscalationLevel::Recommendation)
    );

    // The engine injects the synthesized recommendation in the same thread.
    let rec = comm("comm-2", "thread-1", CommunicationKind::Recommendation);
    m.register_send(&rec);

    m.on_response(&rec, &vp(), ResponseKind::Ignore, DELAY);
    let actions = m.on_response(&rec, &vp(), ResponseKind::Ignore, DELAY);
    assert!(matches!(
        actions.as_slice(),
        [EscalationAction::Promote { level: EscalationLevel::DirectOrder, .. }]
    ));
}

#[test]
fn single_ignore_promotes_with_unit_thresholds() {
    // Boundary: N₁ = N₂ = 1.
    let mut m = manager(1, 1);
    let nudge = comm("comm-1", "thread-1", CommunicationKind::Nudge);
    m.register_send(&nudge);
    let actions = m.on_response(&nudge, &vp(), ResponseKind::Ignore, DELAY);
    assert!(matches!(
        actions.as_slice(),
        [EscalationAction::Promote { level: EscalationLevel::Recommendation, .. }]
    ));
}

#[test]
fn engaged_response_closes_the_ladder() {
    let mut m = manager(3, 2);
    let nudge = comm("comm-1", "thread-1", CommunicationKind::Nudge);
    m.register_send(&nudge);
    let actions = m.on_response(&nudge, &vp(), ResponseKind::TakeAction, DELAY);
    assert_eq!(
        actions,
        vec![EscalationAction::Closed {
            thread_id: nudge.thread_id.clone(),
            recipient: vp(),
        }]
    );
    assert_eq!(
        m.current_level(&nudge.thread_id, &vp()),
        Some(EscalationLevel::Terminal)
    );
    // Terminal is absorbing: further events produce nothing.
    assert!(m.on_response(&nudge, &vp(), ResponseKind::Ignore, DELAY).is_empty());
}

#[test]
fn ignored_direct_order_is_a_compliance_failure_not_an_escalation() {
    let mut m = manager(1, 1);
    let order = comm("comm-1", "thread-1", CommunicationKind::DirectOrder);
    m.register_send(&order);
    let actions = m.on_response(&order, &vp(), ResponseKind::Ignore, DELAY);
    assert_eq!(actions.len(), 2);
    assert!(matches!(actions[0], EscalationAction::ComplianceFailure { .. }));
    assert!(matches!(actions[1], EscalationAction::Closed { .. }));
    assert_eq!(
        m.current_level(&order.thread_id, &vp()),
        Some(EscalationLevel::Terminal)
    );
}

#[test]
fn ttl_expiry_counts_as_ignored() {
    let mut m = manager(2, 1);
    let nudge = comm("comm-1", "thread-1", CommunicationKind::Nudge);
    m.register_send(&nudge);
    assert!(matches!(
        m.on_ttl_expired(&nudge, &vp(), DELAY).as_slice(),
        [EscalationAction::Reprompt { .. }]
    ));
    assert!(matches!(
        m.on_ttl_expired(&nudge, &vp(), DELAY).as_slice(),
        [EscalationAction::Promote { .. }]
    ));
}

// ── Stale and non-ladder events ───────────────────────────────────────────────

#[test]
fn stale_responses_to_an_outgrown_rung_are_inert() {
    let mut m = manager(1, 1);
    let nudge = comm("comm-1", "thread-1", CommunicationKind::Nudge);
    m.register_send(&nudge);
    m.on_response(&nudge, &vp(), ResponseKind::Ignore, DELAY); // promotes

    // A late response to the old nudge neither counts nor closes.
    assert!(m.on_response(&nudge, &vp(), ResponseKind::Ignore, DELAY).is_empty());
    assert!(m.on_response(&nudge, &vp(), ResponseKind::TakeAction, DELAY).is_empty());
    assert_eq!(
        m.current_level(&nudge.thread_id, &vp()),
        Some(EscalationLevel::Recommendation)
    );
}

#[test]
fn consultations_never_open_a_ladder() {
    let mut m = manager(1, 1);
    let consult = comm("comm-1", "thread-1", CommunicationKind::Consultation);
    m.register_send(&consult);
    assert_eq!(m.thread_count(), 0);
    assert!(m.on_response(&consult, &vp(), ResponseKind::Ignore, DELAY).is_empty());
}

#[test]
fn recommendation_root_starts_midway_up_the_ladder() {
    let mut m = manager(1, 1);
    let rec = comm("comm-1", "thread-1", CommunicationKind::Recommendation);
    m.register_send(&rec);
    assert_eq!(
        m.current_level(&rec.thread_id, &vp()),
        Some(EscalationLevel::Recommendation)
    );
    let actions = m.on_response(&rec, &vp(), ResponseKind::Ignore, DELAY);
    assert!(matches!(
        actions.as_slice(),
        [EscalationAction::Promote { level: EscalationLevel::DirectOrder, .. }]
    ));
}
