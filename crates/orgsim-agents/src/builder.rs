//! Validate-then-build construction of the registry and its RNG streams.

use orgsim_core::AgentId;

use crate::error::{AgentsError, AgentsResult};
use crate::profile::{AgentSpec, Personality, ProfessionalProfile};
use crate::registry::{AgentRecord, AgentRegistry};
use crate::rngs::AgentRngs;
use crate::state::AgentDynamics;

/// Fluent builder for [`AgentRegistry`] + [`AgentRngs`].
///
/// # Example
///
/// ```rust,ignore
/// let (registry, rngs) = RegistryBuilder::new(seed)
///     .memory_limit(params.memory_limit)
///     .specs(org_agents)
///     .build()?;
/// ```
pub struct RegistryBuilder {
    seed:         u64,
    memory_limit: usize,
    specs:        Vec<AgentSpec>,
}

impl RegistryBuilder {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            memory_limit: 64,
            specs: Vec::new(),
        }
    }

    /// Bound on each agent's interaction memory.
    pub fn memory_limit(mut self, limit: usize) -> Self {
        self.memory_limit = limit.max(1);
        self
    }

    /// Supply all agent specs at once (registry order = spec order).
    pub fn specs(mut self, specs: Vec<AgentSpec>) -> Self {
        self.specs = specs;
        self
    }

    /// Append a single spec.
    pub fn push(mut self, spec: AgentSpec) -> Self {
        self.specs.push(spec);
        self
    }

    /// Validate every spec and construct the registry plus one RNG stream
    /// per agent.
    ///
    /// Checks: non-empty unique IDs, positive capacity, seniority in 1..=5,
    /// and that every `direct_reports` entry names a registered agent.
    pub fn build(self) -> AgentsResult<(AgentRegistry, AgentRngs)> {
        // ── Pass 1: identity checks ───────────────────────────────────────
        let mut ids: Vec<&str> = Vec::with_capacity(self.specs.len());
        for spec in &self.specs {
            if spec.id.is_empty() {
                return Err(AgentsError::EmptyId);
            }
            if ids.contains(&spec.id.as_str()) {
                return Err(AgentsError::DuplicateAgent(spec.id.clone()));
            }
            ids.push(&spec.id);
        }

        // ── Pass 2: per-spec validation ───────────────────────────────────
        for spec in &self.specs {
            if spec.capacity <= 0.0 {
                return Err(AgentsError::InvalidCapacity {
                    agent:    spec.id.clone(),
                    capacity: spec.capacity,
                });
            }
            if !(1..=5).contains(&spec.seniority) {
                return Err(AgentsError::InvalidSeniority {
                    agent:     spec.id.clone(),
                    seniority: spec.seniority,
                });
            }
            for report in &spec.direct_reports {
                if !ids.contains(&report.as_str()) {
                    return Err(AgentsError::UnknownDirectReport {
                        agent:  spec.id.clone(),
                        report: report.clone(),
                    });
                }
            }
        }

        // ── Build ─────────────────────────────────────────────────────────
        let records = self
            .specs
            .iter()
            .map(|spec| {
                let profile = ProfessionalProfile {
                    department:     spec.department.clone(),
                    role:           spec.role.clone(),
                    seniority:      spec.seniority,
                    expertise:      spec.expertise.clone(),
                    direct_reports: spec
                        .direct_reports
                        .iter()
                        .map(|r| AgentId::new(r.clone()))
                        .collect(),
                    capacity:       spec.capacity,
                };
                let personality = Personality::from(spec.personality.clone());
                let mut dynamics = AgentDynamics::new(spec.initial_workload, self.memory_limit);
                // Managers start with a mild positive affinity toward their
                // reports (the working relationship exists on day zero).
                for report in &profile.direct_reports {
                    dynamics.set_affinity(report.clone(), 0.2);
                }
                AgentRecord::new(
                    AgentId::new(spec.id.clone()),
                    profile,
                    personality,
                    dynamics,
                )
            })
            .collect::<Vec<_>>();

        let rngs = AgentRngs::new(self.seed, self.specs.iter().map(|s| s.id.as_str()));
        Ok((AgentRegistry::new(records), rngs))
    }
}
