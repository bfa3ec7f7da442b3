//! The protocol adapter: translates control-protocol requests into kernel
//! calls.
//!
//! The adapter carries no simulation state of its own — organizations come
//! from an [`OrganizationSource`] capability (file loading is the embedding
//! application's job) and the running simulation lives in a replaceable
//! kernel slot.  Every handler is a thin translation: parse → kernel call →
//! view, with [`ApiError`] codes mapped from the kernel's typed errors.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use orgsim_agents::AgentSpec;
use orgsim_core::AgentId;
use orgsim_engine::{CommunicationDraft, Kernel, KernelBuilder, SimulationStatus};
use orgsim_wisdom::WisdomOfTheCrowd;

use crate::error::{ApiError, ApiResult};
use crate::requests::{CommunicationRequest, StartRequest};
use crate::views::{AgentView, CommunicationView, OrganizationInfo, StartResponse, StopResponse};

// ── OrganizationSource ────────────────────────────────────────────────────────

/// Capability that resolves organization IDs to employee rosters.
pub trait OrganizationSource: Send + Sync {
    /// Known organization IDs, sorted.
    fn list(&self) -> Vec<String>;

    /// The employee roster for `org_id`, if known.
    fn agents(&self, org_id: &str) -> Option<Vec<AgentSpec>>;
}

/// An in-memory source, handy for demos and tests.
#[derive(Default)]
pub struct StaticOrganizations {
    orgs: FxHashMap<String, Vec<AgentSpec>>,
}

impl StaticOrganizations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, org_id: impl Into<String>, agents: Vec<AgentSpec>) -> Self {
        self.orgs.insert(org_id.into(), agents);
        self
    }
}

impl OrganizationSource for StaticOrganizations {
    fn list(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.orgs.keys().cloned().collect();
        ids.sort();
        ids
    }

    fn agents(&self, org_id: &str) -> Option<Vec<AgentSpec>> {
        self.orgs.get(org_id).cloned()
    }
}

// ── ApiAdapter ────────────────────────────────────────────────────────────────

pub struct ApiAdapter {
    source: Arc<dyn OrganizationSource>,
    kernel: RwLock<Option<Arc<Kernel>>>,
}

impl ApiAdapter {
    pub fn new(source: Arc<dyn OrganizationSource>) -> Self {
        Self {
            source,
            kernel: RwLock::new(None),
        }
    }

    /// The current kernel, if one was started (running or not).
    pub fn kernel(&self) -> Option<Arc<Kernel>> {
        self.kernel.read().clone()
    }

    fn running_kernel(&self) -> ApiResult<Arc<Kernel>> {
        self.kernel()
            .filter(|k| k.is_running())
            .ok_or_else(ApiError::not_running)
    }

    // ── GET /status ───────────────────────────────────────────────────────

    pub fn handle_status(&self) -> ApiResult<SimulationStatus> {
        match self.kernel() {
            Some(kernel) => Ok(kernel.get_status()?),
            None => Ok(idle_status()),
        }
    }

    // ── GET /organizations ────────────────────────────────────────────────

    pub fn handle_organizations(&self) -> Vec<String> {
        self.source.list()
    }

    // ── GET /organizations/{id} ───────────────────────────────────────────

    pub fn handle_organization(&self, org_id: &str) -> ApiResult<OrganizationInfo> {
        let agents = self
            .source
            .agents(org_id)
            .ok_or_else(|| ApiError::not_found(format!("unknown organization {org_id:?}")))?;
        let mut departments: Vec<String> = Vec::new();
        for spec in &agents {
            if !departments.contains(&spec.department) {
                departments.push(spec.department.clone());
            }
        }
        departments.sort();
        Ok(OrganizationInfo {
            id:          org_id.to_owned(),
            agent_count: agents.len(),
            departments,
        })
    }

    // ── GET /organizations/{id}/employees ─────────────────────────────────

    pub fn handle_organization_employees(&self, org_id: &str) -> ApiResult<Vec<AgentView>> {
        // Live views when this organization is the one simulating.
        if let Some(kernel) = self.kernel() {
            if kernel.organization_id() == org_id {
                return Ok(live_views(&kernel));
            }
        }
        let agents = self
            .source
            .agents(org_id)
            .ok_or_else(|| ApiError::not_found(format!("unknown organization {org_id:?}")))?;
        Ok(agents.iter().map(AgentView::from_spec).collect())
    }

    // ── GET /employees ────────────────────────────────────────────────────

    pub fn handle_employees(&self) -> Vec<AgentView> {
        match self.kernel() {
            Some(kernel) => live_views(&kernel),
            None => Vec::new(),
        }
    }

    // ── POST /simulation/start ────────────────────────────────────────────

    pub fn handle_start(&self, request: StartRequest) -> ApiResult<StartResponse> {
        let mut slot = self.kernel.write();
        if slot.as_ref().is_some_and(|k| k.is_running()) {
            return Err(ApiError::already_running());
        }
        let agents = self.source.agents(&request.organization_id).ok_or_else(|| {
            ApiError::not_found(format!("unknown organization {:?}", request.organization_id))
        })?;

        let kernel = KernelBuilder::new(request.organization_id.clone())
            .params(request.parameters)
            .agents(agents)
            .build()?;
        kernel.start()?;

        let started_at = kernel.get_status()?.sim_unix_time;
        *slot = Some(Arc::new(kernel));
        Ok(StartResponse {
            organization: request.organization_id,
            started_at,
        })
    }

    // ── POST /simulation/stop ─────────────────────────────────────────────

    pub fn handle_stop(&self) -> ApiResult<StopResponse> {
        let kernel = self.running_kernel()?;
        kernel.stop()?;
        let stopped_at = kernel.get_status()?.sim_unix_time;
        Ok(StopResponse { stopped_at })
    }

    // ── POST /communications ──────────────────────────────────────────────

    pub fn handle_send(&self, request: CommunicationRequest) -> ApiResult<CommunicationView> {
        let kernel = self.running_kernel()?;
        let subject = request.subject_line();
        let mut draft = CommunicationDraft::new(
            request.sender_id.as_str(),
            request.recipient_ids.iter().map(|r| AgentId::new(r.clone())).collect(),
            request.communication_type,
            subject,
            request.content,
        );
        if let Some(goal) = request.strategic_goal {
            draft = draft.strategic_goal(goal);
        }
        if let Some(label) = request.priority {
            draft = draft.priority(label.into());
        }
        let comm_id = kernel.send_communication(draft)?;
        let comm = kernel.communication(&comm_id)?;
        Ok(CommunicationView::from(&comm))
    }

    // ── GET /wisdom ───────────────────────────────────────────────────────

    pub fn handle_wisdom(&self, topic: &str) -> ApiResult<WisdomOfTheCrowd> {
        let kernel = self
            .kernel()
            .ok_or_else(|| ApiError::not_found("no simulation has run"))?;
        Ok(kernel.get_wisdom(topic)?)
    }
}

fn live_views(kernel: &Kernel) -> Vec<AgentView> {
    let registry = kernel.registry();
    (0..registry.len())
        .map(|idx| AgentView::from_registry(registry, idx))
        .collect()
}

fn idle_status() -> SimulationStatus {
    SimulationStatus {
        organization_id:      String::new(),
        running:              false,
        sim_time:             orgsim_core::SimTime::ZERO,
        sim_unix_time:        0,
        acceleration_factor:  None,
        agent_count:          0,
        communications_total: 0,
        responses_total:      0,
        pending_tasks:        0,
        escalations_promoted: 0,
        compliance_failures:  0,
    }
}
