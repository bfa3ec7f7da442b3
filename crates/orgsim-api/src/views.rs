//! Response DTOs of the control protocol.

use orgsim_agents::{AgentRegistry, AgentSpec};
use orgsim_comms::{Communication, CommunicationKind};
use serde::{Deserialize, Serialize};

/// One employee as seen through the protocol.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AgentView {
    pub id:             String,
    pub department:     String,
    pub role:           String,
    pub seniority:      u8,
    pub expertise:      Vec<String>,
    pub direct_reports: Vec<String>,
    pub capacity:       f64,
    pub workload:       f64,
    pub stress:         f64,
    pub satisfaction:   f64,
}

impl AgentView {
    /// Live view of a registered agent (reads the agent's state briefly).
    pub fn from_registry(registry: &AgentRegistry, idx: usize) -> Self {
        let record = registry.get(idx);
        let (workload, stress, satisfaction) =
            registry.with_dynamics(idx, |d| (d.workload(), d.stress(), d.satisfaction()));
        Self {
            id:             record.id.as_str().to_owned(),
            department:     record.profile.department.clone(),
            role:           record.profile.role.clone(),
            seniority:      record.profile.seniority,
            expertise:      record.profile.expertise.clone(),
            direct_reports: record
                .profile
                .direct_reports
                .iter()
                .map(|r| r.as_str().to_owned())
                .collect(),
            capacity:       record.profile.capacity,
            workload,
            stress,
            satisfaction,
        }
    }

    /// Static view of an employee of an organization that is not running.
    pub fn from_spec(spec: &AgentSpec) -> Self {
        Self {
            id:             spec.id.clone(),
            department:     spec.department.clone(),
            role:           spec.role.clone(),
            seniority:      spec.seniority,
            expertise:      spec.expertise.clone(),
            direct_reports: spec.direct_reports.clone(),
            capacity:       spec.capacity,
            workload:       spec.initial_workload,
            stress:         0.0,
            satisfaction:   0.7,
        }
    }
}

/// `GET /organizations/{id}`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrganizationInfo {
    pub id:          String,
    pub agent_count: usize,
    pub departments: Vec<String>,
}

/// `POST /simulation/start`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StartResponse {
    pub organization: String,
    pub started_at:   i64,
}

/// `POST /simulation/stop`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StopResponse {
    pub stopped_at: i64,
}

/// `POST /communications`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CommunicationView {
    pub id:                  String,
    pub thread_id:           String,
    pub sender_id:           String,
    pub recipient_ids:       Vec<String>,
    pub communication_type:  CommunicationKind,
    pub priority:            u8,
    pub subject:             String,
    pub body:                String,
    pub strategic_goal:      Option<String>,
    /// Simulated seconds since simulation start.
    pub created_at_sim_secs: u64,
}

impl From<&Communication> for CommunicationView {
    fn from(comm: &Communication) -> Self {
        Self {
            id:                  comm.id.as_str().to_owned(),
            thread_id:           comm.thread_id.as_str().to_owned(),
            sender_id:           comm.sender.as_str().to_owned(),
            recipient_ids:       comm.recipients.iter().map(|r| r.as_str().to_owned()).collect(),
            communication_type:  comm.kind,
            priority:            comm.priority.get(),
            subject:             comm.subject.clone(),
            body:                comm.body.clone(),
            strategic_goal:      comm.strategic_goal.clone(),
            created_at_sim_secs: comm.created_at.0,
        }
    }
}
