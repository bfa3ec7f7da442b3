//! Unit tests for orgsim-tracking.

use orgsim_agents::{AgentSpec, PersonalitySpec, RegistryBuilder};
use orgsim_core::{AgentId, CommId, SimDuration, SimTime, ThreadId};
use orgsim_comms::{
    ActionStatus, Communication, CommunicationKind, DeliveryRecord, DeliveryStatus, Priority,
    Response, ResponseKind,
};

use crate::{EventLog, OrganizationalMetrics, SimulationEvent, TrackingStore, WorkforceSnapshot};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn comm(store: &mut TrackingStore, sender: &str, recipients: &[&str], priority: u8) -> CommId {
    let id = store.mint_comm_id();
    let thread_id = store.mint_thread_id();
    let c = Communication {
        id:             id.clone(),
        thread_id,
        sender:         AgentId::new(sender),
        recipients:     recipients.iter().map(|r| AgentId::new(*r)).collect(),
        kind:           CommunicationKind::Nudge,
        priority:       Priority::new(priority),
        subject:        "subject".into(),
        body:           "body".into(),
        strategic_goal: None,
        created_at:     SimTime::ZERO,
        ttl:            SimDuration::from_hours(24),
    };
    store.record_communication(c);
    for r in recipients {
        store.record_delivery(DeliveryRecord::pending(id.clone(), AgentId::new(*r), SimTime(60)));
    }
    id
}

fn response(
    store: &mut TrackingStore,
    comm_id: &CommId,
    agent: &str,
    kind: ResponseKind,
    confidence: f64,
    at: u64,
) {
    let id = store.mint_response_id();
    store.record_response(Response {
        id,
        communication_id:   comm_id.clone(),
        agent_id:           AgentId::new(agent),
        kind,
        content:            "content".into(),
        confidence,
        hesitation_markers: vec![],
        action_status:      ActionStatus::None,
        fallback_used:      false,
        created_at:         SimTime(at),
    });
}

// ── Store ─────────────────────────────────────────────────────────────────────

mod store_tests {
    use super::*;

    #[test]
    fn minting_is_sequential() {
        let mut store = TrackingStore::new();
        assert_eq!(store.mint_comm_id(), CommId::new("comm-1"));
        assert_eq!(store.mint_comm_id(), CommId::new("comm-2"));
        assert_eq!(store.mint_thread_id(), ThreadId::new("thread-1"));
    }

    #[test]
    fn communication_lookup_and_thread_order() {
        let mut store = TrackingStore::new();
        let a = comm(&mut store, "ceo", &["vp"], 3);
        let b = comm(&mut store, "ceo", &["vp"], 3);
        assert!(store.communication(&a).is_some());
        assert_eq!(store.communications_len(), 2);

        // Distinct sends get distinct threads.
        let thread_a = store.communication(&a).unwrap().thread_id.clone();
        let thread_b = store.communication(&b).unwrap().thread_id.clone();
        assert_ne!(thread_a, thread_b);
        assert_eq!(store.thread_communications(&thread_a).len(), 1);
    }

    #[test]
    fn exactly_one_delivery_record_per_pair() {
        let mut store = TrackingStore::new();
        let id = comm(&mut store, "ceo", &["vp", "dir"], 3);
        assert_eq!(store.deliveries_for(&id).len(), 2);
        assert!(store.delivery(&id, &AgentId::new("vp")).is_some());
        assert!(store.delivery(&id, &AgentId::new("ghost")).is_none());
    }

    #[test]
    fn delivery_status_transitions() {
        let mut store = TrackingStore::new();
        let id = comm(&mut store, "ceo", &["vp"], 3);
        assert_eq!(store.pending_deliveries().len(), 1);

        let ok = store.set_delivery_status(
            &id,
            &AgentId::new("vp"),
            DeliveryStatus::Delivered,
            Some(SimTime(120)),
        );
        assert!(ok);
        let record = store.delivery(&id, &AgentId::new("vp")).unwrap();
        assert_eq!(record.status, DeliveryStatus::Delivered);
        assert_eq!(record.actual_delivery_time, Some(SimTime(120)));
        assert!(store.pending_deliveries().is_empty());

        assert!(!store.set_delivery_status(
            &CommId::new("comm-999"),
            &AgentId::new("vp"),
            DeliveryStatus::Failed,
            None,
        ));
    }

    #[test]
    fn responses_are_indexed_in_generation_order() {
        let mut store = TrackingStore::new();
        let id = comm(&mut store, "ceo", &["vp"], 3);
        response(&mut store, &id, "vp", ResponseKind::Ignore, 0.2, 100);
        response(&mut store, &id, "vp", ResponseKind::TakeAction, 0.8, 200);

        let all = store.responses_for(&id);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].kind, ResponseKind::Ignore);
        assert_eq!(all[1].kind, ResponseKind::TakeAction);

        let latest = store.latest_response_by(&id, &AgentId::new("vp")).unwrap();
        assert_eq!(latest.kind, ResponseKind::TakeAction);
        assert_eq!(store.responses_by(&AgentId::new("vp")).len(), 2);
    }

    #[test]
    fn window_query_is_half_open() {
        let mut store = TrackingStore::new();
        let id = comm(&mut store, "ceo", &["vp"], 3);
        response(&mut store, &id, "vp", ResponseKind::Ignore, 0.2, 100);
        response(&mut store, &id, "vp", ResponseKind::Ignore, 0.2, 200);
        assert_eq!(store.responses_in_window(SimTime(100), SimTime(200)).len(), 1);
        assert_eq!(store.responses_in_window(SimTime(0), SimTime(1_000)).len(), 2);
    }

    #[test]
    fn open_high_priority_counts_unresolved_only() {
        let mut store = TrackingStore::new();
        let a = comm(&mut store, "ceo", &["vp"], 4);
        let _b = comm(&mut store, "cfo", &["vp"], 5);
        let _low = comm(&mut store, "peer", &["vp"], 2);
        assert_eq!(store.open_high_priority_for(&AgentId::new("vp"), 4), 2);

        // An ignore does not resolve the thread…
        response(&mut store, &a, "vp", ResponseKind::Ignore, 0.2, 100);
        assert_eq!(store.open_high_priority_for(&AgentId::new("vp"), 4), 2);

        // …an engaged response does.
        response(&mut store, &a, "vp", ResponseKind::TakeAction, 0.8, 200);
        assert_eq!(store.open_high_priority_for(&AgentId::new("vp"), 4), 1);
    }
}

// ── Event log ─────────────────────────────────────────────────────────────────

mod event_tests {
    use super::*;

    #[test]
    fn ring_buffer_evicts_oldest() {
        let mut log = EventLog::new(3);
        for day in 0..5 {
            log.push(SimulationEvent::DayClosed { at: SimTime(day * 86_400), day });
        }
        assert_eq!(log.len(), 3);
        assert_eq!(log.total_recorded(), 5);
        let recent = log.recent(10);
        assert!(matches!(recent[0], SimulationEvent::DayClosed { day: 2, .. }));
        assert!(matches!(recent[2], SimulationEvent::DayClosed { day: 4, .. }));
    }

    #[test]
    fn recent_returns_tail() {
        let mut log = EventLog::new(8);
        for day in 0..4 {
            log.push(SimulationEvent::DayClosed { at: SimTime(day * 86_400), day });
        }
        let last_two = log.recent(2);
        assert_eq!(last_two.len(), 2);
        assert!(matches!(last_two[0], SimulationEvent::DayClosed { day: 2, .. }));
    }
}

// ── Metrics ───────────────────────────────────────────────────────────────────

mod metrics_tests {
    use super::*;

    fn registry() -> orgsim_agents::AgentRegistry {
        let specs = [("vp", "engineering"), ("dir", "sales")]
            .into_iter()
            .map(|(id, dept)| AgentSpec {
                id:               id.into(),
                department:       dept.into(),
                role:             "lead".into(),
                seniority:        3,
                expertise:        vec![],
                direct_reports:   vec![],
                capacity:         1.0,
                initial_workload: 0.3,
                personality:      PersonalitySpec::default(),
            })
            .collect();
        let (registry, _) = RegistryBuilder::new(1).specs(specs).build().unwrap();
        registry
    }

    #[test]
    fn aggregates_reflect_the_store() {
        let registry = registry();
        let mut store = TrackingStore::new();
        let id = comm(&mut store, "vp", &["vp", "dir"], 3);
        store.set_delivery_status(
            &id,
            &AgentId::new("vp"),
            DeliveryStatus::Delivered,
            Some(SimTime(60)),
        );
        store.set_delivery_status(
            &id,
            &AgentId::new("dir"),
            DeliveryStatus::Delivered,
            Some(SimTime(60)),
        );
        response(&mut store, &id, "vp", ResponseKind::TakeAction, 0.8, 60 + 600);
        response(&mut store, &id, "dir", ResponseKind::Ignore, 0.2, 60 + 1_200);
        store.note_escalation_promoted();
        store.record_workforce_snapshot(WorkforceSnapshot {
            at:               SimTime(86_400),
            day:              0,
            avg_stress:       0.2,
            avg_workload:     0.4,
            avg_satisfaction: 0.7,
            agent_count:      2,
        });

        let m = OrganizationalMetrics::compute(&store, &registry);
        assert_eq!(m.agent_count, 2);
        assert_eq!(m.communications_total, 1);
        assert_eq!(m.responses_total, 2);
        assert_eq!(m.delivered_total, 2);
        assert!((m.response_rate - 0.5).abs() < 1e-9);
        assert!((m.ignore_rate - 0.5).abs() < 1e-9);
        assert_eq!(m.escalations_promoted, 1);
        assert!((m.avg_confidence - 0.5).abs() < 1e-9);
        // Latencies: 10 and 20 minutes → mean 15.
        assert!((m.avg_reply_latency_minutes - 15.0).abs() < 1e-9);
        assert_eq!(m.departments.len(), 2);
        let eng = m.departments.iter().find(|d| d.department == "engineering").unwrap();
        assert_eq!(eng.responses, 1);
        assert!((eng.engagement_rate - 1.0).abs() < 1e-9);
        assert!(m.workforce.is_some());
    }

    #[test]
    fn empty_store_yields_zeroes() {
        let registry = registry();
        let store = TrackingStore::new();
        let m = OrganizationalMetrics::compute(&store, &registry);
        assert_eq!(m.responses_total, 0);
        assert_eq!(m.response_rate, 0.0);
        assert_eq!(m.avg_reply_latency_minutes, 0.0);
        assert!(m.workforce.is_none());
    }
}
