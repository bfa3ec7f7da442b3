//! Unit tests for orgsim-api.

use std::sync::Arc;

use orgsim_agents::{AgentSpec, PersonalitySpec};
use orgsim_core::SimulationParameters;
use orgsim_comms::CommunicationKind;

use crate::{
    ApiAdapter, CommunicationRequest, PriorityLabel, StartRequest, StaticOrganizations,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn spec(id: &str, department: &str) -> AgentSpec {
    AgentSpec {
        id:               id.into(),
        department:       department.into(),
        role:             "contributor".into(),
        seniority:        2,
        expertise:        vec![],
        direct_reports:   vec![],
        capacity:         1.0,
        initial_workload: 0.3,
        personality:      PersonalitySpec { authority_response: 0.8, ..Default::default() },
    }
}

fn adapter() -> ApiAdapter {
    let source = StaticOrganizations::new().with("acme", vec![
        spec("ceo", "leadership"),
        spec("vp-eng", "engineering"),
        spec("vp-sales", "sales"),
    ]);
    ApiAdapter::new(Arc::new(source))
}

fn on_demand_params() -> SimulationParameters {
    SimulationParameters {
        acceleration_factor:     None,
        communication_frequency: 0.0,
        random_seed:             Some(1),
        ..Default::default()
    }
}

fn start(adapter: &ApiAdapter) {
    adapter
        .handle_start(StartRequest {
            organization_id: "acme".into(),
            parameters:      on_demand_params(),
        })
        .unwrap();
}

// ── Organizations ─────────────────────────────────────────────────────────────

#[test]
fn organizations_listing_and_info() {
    let adapter = adapter();
    assert_eq!(adapter.handle_organizations(), vec!["acme".to_owned()]);

    let info = adapter.handle_organization("acme").unwrap();
    assert_eq!(info.agent_count, 3);
    assert_eq!(info.departments, vec!["engineering", "leadership", "sales"]);

    let err = adapter.handle_organization("ghost-corp").unwrap_err();
    assert_eq!(err.code, "not_found");
    assert_eq!(err.http_status, 404);
}

#[test]
fn employees_views_with_and_without_a_simulation() {
    let adapter = adapter();
    // No simulation yet: static views from the source.
    let views = adapter.handle_organization_employees("acme").unwrap();
    assert_eq!(views.len(), 3);
    assert!(adapter.handle_employees().is_empty());

    start(&adapter);
    let live = adapter.handle_employees();
    assert_eq!(live.len(), 3);
    assert!(live.iter().any(|v| v.id == "vp-eng"));
}

// ── Lifecycle ─────────────────────────────────────────────────────────────────

#[test]
fn start_stop_and_conflict_codes() {
    let adapter = adapter();

    // Stop with nothing running: 409 not_running.
    let err = adapter.handle_stop().unwrap_err();
    assert_eq!(err.code, "not_running");
    assert_eq!(err.http_status, 409);

    let started = adapter
        .handle_start(StartRequest {
            organization_id: "acme".into(),
            parameters:      on_demand_params(),
        })
        .unwrap();
    assert_eq!(started.organization, "acme");

    // Start while running: 409 already_running.
    let err = adapter
        .handle_start(StartRequest {
            organization_id: "acme".into(),
            parameters:      on_demand_params(),
        })
        .unwrap_err();
    assert_eq!(err.code, "already_running");

    let status = adapter.handle_status().unwrap();
    assert!(status.running);
    assert_eq!(status.agent_count, 3);

    adapter.handle_stop().unwrap();
    assert!(!adapter.handle_status().unwrap().running);

    // A fresh start replaces the stopped kernel.
    start(&adapter);
    assert!(adapter.handle_status().unwrap().running);
}

#[test]
fn unknown_organization_cannot_start() {
    let adapter = adapter();
    let err = adapter
        .handle_start(StartRequest {
            organization_id: "ghost-corp".into(),
            parameters:      on_demand_params(),
        })
        .unwrap_err();
    assert_eq!(err.code, "not_found");
}

#[test]
fn invalid_parameters_map_to_400() {
    let adapter = adapter();
    let err = adapter
        .handle_start(StartRequest {
            organization_id: "acme".into(),
            parameters:      SimulationParameters {
                communication_frequency: 7.0,
                ..on_demand_params()
            },
        })
        .unwrap_err();
    assert_eq!(err.code, "invalid_params");
    assert_eq!(err.http_status, 400);
}

// ── Communications ────────────────────────────────────────────────────────────

fn send_request(recipient: &str) -> CommunicationRequest {
    CommunicationRequest {
        sender_id:          "ceo".into(),
        recipient_ids:      vec![recipient.into()],
        communication_type: CommunicationKind::Nudge,
        content:            "Please prioritise the Q3 initiative.\nDetails follow.".into(),
        subject:            None,
        priority:           Some(PriorityLabel::High),
        strategic_goal:     Some("q3-initiative".into()),
    }
}

#[test]
fn send_returns_the_recorded_communication() {
    let adapter = adapter();
    start(&adapter);
    let view = adapter.handle_send(send_request("vp-eng")).unwrap();
    assert!(view.id.starts_with("comm-"));
    assert_eq!(view.communication_type, CommunicationKind::Nudge);
    assert_eq!(view.priority, 4); // high → 4
    assert_eq!(view.subject, "Please prioritise the Q3 initiative.");
    assert_eq!(view.strategic_goal.as_deref(), Some("q3-initiative"));
}

#[test]
fn send_maps_kernel_errors_to_protocol_codes() {
    let adapter = adapter();
    // Not running.
    let err = adapter.handle_send(send_request("vp-eng")).unwrap_err();
    assert_eq!(err.code, "not_running");

    start(&adapter);
    let err = adapter.handle_send(send_request("ghost")).unwrap_err();
    assert_eq!(err.code, "unknown_agent");
    assert_eq!(err.http_status, 404);
}

#[test]
fn wisdom_is_queryable_after_the_crowd_responds() {
    let adapter = adapter();
    start(&adapter);
    let view = adapter.handle_send(send_request("vp-eng")).unwrap();

    let kernel = adapter.kernel().unwrap();
    kernel
        .run_until_idle(orgsim_core::SimDuration::from_hours(4))
        .unwrap();

    let wisdom = adapter.handle_wisdom(&view.id).unwrap();
    assert_eq!(wisdom.responses, 1);
    let by_goal = adapter.handle_wisdom("q3-initiative").unwrap();
    assert_eq!(by_goal.responses, 1);

    let err = adapter.handle_wisdom("no-such-topic").unwrap_err();
    assert_eq!(err.code, "not_found");
}

// ── Wire shapes ───────────────────────────────────────────────────────────────

#[test]
fn communication_request_parses_from_protocol_json() {
    let request: CommunicationRequest = serde_json::from_str(
        r#"{
            "sender_id": "ceo",
            "recipient_ids": ["vp-eng", "vp-sales"],
            "communication_type": "direct_order",
            "content": "Freeze non-critical spend.",
            "priority": "critical"
        }"#,
    )
    .unwrap();
    assert_eq!(request.communication_type, CommunicationKind::DirectOrder);
    assert_eq!(request.priority, Some(PriorityLabel::Critical));
    assert_eq!(request.subject_line(), "Freeze non-critical spend.");
}

#[test]
fn start_request_accepts_partial_parameters() {
    // Absent knobs fall back to their defaults.
    let request: StartRequest = serde_json::from_str(
        r#"{
            "organization_id": "acme",
            "parameters": { "acceleration_factor": 288.0, "random_seed": 7 }
        }"#,
    )
    .unwrap();
    assert_eq!(request.parameters.acceleration_factor, Some(288.0));
    assert_eq!(request.parameters.random_seed, Some(7));
    assert_eq!(request.parameters.queue_capacity, 10_000);

    // An empty object is entirely defaulted, and so is a missing one.
    let request: StartRequest =
        serde_json::from_str(r#"{ "organization_id": "acme", "parameters": {} }"#).unwrap();
    assert_eq!(request.parameters.nudges_before_recommendation, 5);
    let request: StartRequest =
        serde_json::from_str(r#"{ "organization_id": "acme" }"#).unwrap();
    assert_eq!(request.parameters.recommendations_before_order, 3);
}
