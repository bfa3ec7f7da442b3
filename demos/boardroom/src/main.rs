//! boardroom — smallest end-to-end example for the orgsim kernel.
//!
//! Builds a 12-person organization, runs two simulated weeks of strategy
//! roll-out in as-fast-as-possible mode, and prints the status, metrics,
//! and wisdom aggregates as JSON.  Response and day-summary CSVs land in
//! `./boardroom-output/`.

use std::fs;
use std::path::Path;

use anyhow::Result;

use orgsim_agents::{AgentSpec, PersonalitySpec};
use orgsim_core::{AgentId, SimDuration, SimulationParameters, params::DEFAULT_START_UNIX_SECS};
use orgsim_comms::{CommunicationKind, Priority};
use orgsim_engine::{CommunicationDraft, KernelBuilder};
use orgsim_output::{CsvWriter, KernelOutputObserver};

// ── Constants ─────────────────────────────────────────────────────────────────

const SEED: u64 = 42;
const OUTPUT_DIR: &str = "boardroom-output";

// ── Organization ──────────────────────────────────────────────────────────────

fn agent(
    id: &str,
    department: &str,
    role: &str,
    seniority: u8,
    authority: f64,
    workload: f64,
    expertise: &[&str],
    reports: &[&str],
) -> AgentSpec {
    AgentSpec {
        id:               id.into(),
        department:       department.into(),
        role:             role.into(),
        seniority,
        expertise:        expertise.iter().map(|s| s.to_string()).collect(),
        direct_reports:   reports.iter().map(|s| s.to_string()).collect(),
        capacity:         1.0,
        initial_workload: workload,
        personality:      PersonalitySpec {
            authority_response: authority,
            ..Default::default()
        },
    }
}

fn acme() -> Vec<AgentSpec> {
    vec![
        agent("ceo", "leadership", "chief executive", 5, 0.5, 0.4, &["strategy"], &["vp-eng", "vp-sales", "vp-ops"]),
        agent("vp-eng", "engineering", "vp engineering", 4, 0.8, 0.6, &["platform", "q3-initiative"], &["eng-1", "eng-2", "eng-3"]),
        agent("vp-sales", "sales", "vp sales", 4, 0.7, 0.5, &["enterprise-deals"], &["sales-1", "sales-2"]),
        agent("vp-ops", "operations", "vp operations", 4, 0.6, 0.7, &["logistics"], &["ops-1", "ops-2"]),
        agent("eng-1", "engineering", "staff engineer", 3, 0.6, 0.8, &["platform"], &[]),
        agent("eng-2", "engineering", "engineer", 2, 0.4, 0.9, &["mobile"], &[]),
        agent("eng-3", "engineering", "engineer", 2, 0.3, 0.5, &["platform"], &[]),
        agent("sales-1", "sales", "account executive", 2, 0.7, 0.6, &["enterprise-deals"], &[]),
        agent("sales-2", "sales", "account executive", 2, 0.2, 0.9, &["smb-deals"], &[]),
        agent("ops-1", "operations", "analyst", 2, 0.5, 0.7, &["logistics"], &[]),
        agent("ops-2", "operations", "analyst", 1, 0.4, 0.4, &["procurement"], &[]),
        agent("cfo", "leadership", "chief financial officer", 5, 0.6, 0.5, &["budget"], &[]),
    ]
}

// ── Main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let out_dir = Path::new(OUTPUT_DIR);
    fs::create_dir_all(out_dir)?;

    let params = SimulationParameters {
        acceleration_factor: None, // as-fast-as-possible
        communication_frequency: 0.3,
        random_seed: Some(SEED),
        ..Default::default()
    };

    let observer = KernelOutputObserver::new(CsvWriter::new(out_dir)?, DEFAULT_START_UNIX_SECS);
    let handle = observer.clone();
    let kernel = KernelBuilder::new("acme")
        .params(params)
        .agents(acme())
        .observer(Box::new(observer))
        .build()?;
    kernel.start()?;

    // ── Week 1: the CEO floats the Q3 initiative as a catchball ──────────
    let catchball = kernel.send_communication(
        CommunicationDraft::new(
            "ceo",
            ["vp-eng", "vp-sales", "vp-ops", "cfo"].into_iter().map(AgentId::new).collect(),
            CommunicationKind::Catchball,
            "Q3 initiative: pull launch forward",
            "Proposal: pull the Q3 initiative launch forward by six weeks. \
             What constraints do you see?",
        )
        .strategic_goal("q3-initiative")
        .priority(Priority::new(4)),
    )?;
    kernel.run_until_idle(SimDuration::from_days(7))?;

    // ── Week 2: a nudge to the engineers doing the work ──────────────────
    kernel.send_communication(
        CommunicationDraft::new(
            "vp-eng",
            ["eng-1", "eng-2", "eng-3"].into_iter().map(AgentId::new).collect(),
            CommunicationKind::Nudge,
            "Q3 initiative: scope freeze this week",
            "Please freeze scope for the Q3 initiative by Friday.",
        )
        .strategic_goal("q3-initiative")
        .priority(Priority::new(3)),
    )?;
    kernel.run_until_idle(SimDuration::from_days(7))?;

    // ── Report ────────────────────────────────────────────────────────────
    let status = kernel.get_status()?;
    println!("status:\n{}", serde_json::to_string_pretty(&status)?);

    let metrics = kernel.get_metrics()?;
    println!("metrics:\n{}", serde_json::to_string_pretty(&metrics)?);

    let wisdom = kernel.get_wisdom("q3-initiative")?;
    println!("wisdom(q3-initiative):\n{}", serde_json::to_string_pretty(&wisdom)?);
    let per_comm = kernel.get_wisdom(catchball.as_str())?;
    println!(
        "catchball consensus: {:.2} over {} responses",
        per_comm.consensus_level, per_comm.responses
    );

    kernel.stop()?;
    if let Some(err) = handle.take_error() {
        eprintln!("output error: {err}");
    }
    println!("wrote {OUTPUT_DIR}/responses.csv and {OUTPUT_DIR}/day_summaries.csv");
    Ok(())
}
