//! Immutable per-agent data: personality and professional profile.

use orgsim_core::AgentId;
use serde::{Deserialize, Serialize};

// ── Personality ───────────────────────────────────────────────────────────────

/// Six-scalar personality vector, each value in [0, 1].
///
/// Immutable after creation — fields are private and the only constructor
/// clamps.  Simulation never mutates personality; behavioral drift is
/// expressed through `AgentDynamics` (stress, relationships), not here.
#[derive(Copy, Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Personality {
    risk_tolerance:           f64,
    authority_response:       f64,
    workload_sensitivity:     f64,
    communication_style:      f64,
    change_adaptability:      f64,
    collaboration_preference: f64,
}

impl Personality {
    pub fn new(
        risk_tolerance: f64,
        authority_response: f64,
        workload_sensitivity: f64,
        communication_style: f64,
        change_adaptability: f64,
        collaboration_preference: f64,
    ) -> Self {
        Self {
            risk_tolerance:           risk_tolerance.clamp(0.0, 1.0),
            authority_response:       authority_response.clamp(0.0, 1.0),
            workload_sensitivity:     workload_sensitivity.clamp(0.0, 1.0),
            communication_style:      communication_style.clamp(0.0, 1.0),
            change_adaptability:      change_adaptability.clamp(0.0, 1.0),
            collaboration_preference: collaboration_preference.clamp(0.0, 1.0),
        }
    }

    /// A midpoint personality: every trait at 0.5.
    pub fn balanced() -> Self {
        Self::new(0.5, 0.5, 0.5, 0.5, 0.5, 0.5)
    }

    #[inline]
    pub fn risk_tolerance(&self) -> f64 {
        self.risk_tolerance
    }

    #[inline]
    pub fn authority_response(&self) -> f64 {
        self.authority_response
    }

    #[inline]
    pub fn workload_sensitivity(&self) -> f64 {
        self.workload_sensitivity
    }

    #[inline]
    pub fn communication_style(&self) -> f64 {
        self.communication_style
    }

    #[inline]
    pub fn change_adaptability(&self) -> f64 {
        self.change_adaptability
    }

    #[inline]
    pub fn collaboration_preference(&self) -> f64 {
        self.collaboration_preference
    }
}

impl Default for Personality {
    fn default() -> Self {
        Self::balanced()
    }
}

// ── ProfessionalProfile ───────────────────────────────────────────────────────

/// Role-related facts about an agent.  Fixed for the lifetime of a
/// simulation; the registry only ever hands out shared references.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProfessionalProfile {
    pub department:     String,
    pub role:           String,
    /// Seniority rank, 1 (junior) to 5 (executive).
    pub seniority:      u8,
    pub expertise:      Vec<String>,
    pub direct_reports: Vec<AgentId>,
    /// Workload capacity in nominal full-time units; must be positive.
    pub capacity:       f64,
}

impl ProfessionalProfile {
    /// `true` if `goal` overlaps the agent's expertise tags.
    pub fn covers_goal(&self, goal: &str) -> bool {
        self.expertise.iter().any(|tag| tag == goal)
    }
}

// ── AgentSpec ─────────────────────────────────────────────────────────────────

/// Personality values as they arrive from organization files.  Absent traits
/// default to the 0.5 midpoint.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalitySpec {
    pub risk_tolerance:           f64,
    pub authority_response:       f64,
    pub workload_sensitivity:     f64,
    pub communication_style:      f64,
    pub change_adaptability:      f64,
    pub collaboration_preference: f64,
}

impl Default for PersonalitySpec {
    fn default() -> Self {
        Self {
            risk_tolerance:           0.5,
            authority_response:       0.5,
            workload_sensitivity:     0.5,
            communication_style:      0.5,
            change_adaptability:      0.5,
            collaboration_preference: 0.5,
        }
    }
}

impl From<PersonalitySpec> for Personality {
    fn from(s: PersonalitySpec) -> Self {
        Personality::new(
            s.risk_tolerance,
            s.authority_response,
            s.workload_sensitivity,
            s.communication_style,
            s.change_adaptability,
            s.collaboration_preference,
        )
    }
}

/// One employee row, as supplied by the caller at simulation start.
///
/// This is the input contract of `start(org_id, agents[], params)`.  The
/// registry builder validates it; the simulation works with the built
/// [`Personality`]/[`ProfessionalProfile`] types afterwards.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AgentSpec {
    pub id:               String,
    pub department:       String,
    pub role:             String,
    #[serde(default = "default_seniority")]
    pub seniority:        u8,
    #[serde(default)]
    pub expertise:        Vec<String>,
    #[serde(default)]
    pub direct_reports:   Vec<String>,
    #[serde(default = "default_capacity")]
    pub capacity:         f64,
    /// Starting workload in [0, 1]; clamped at build time.
    #[serde(default = "default_workload")]
    pub initial_workload: f64,
    #[serde(default)]
    pub personality:      PersonalitySpec,
}

fn default_seniority() -> u8 {
    2
}

fn default_capacity() -> f64 {
    1.0
}

fn default_workload() -> f64 {
    0.3
}
