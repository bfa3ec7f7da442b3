//! The agent registry: single-writer at construction, read-mostly after.
//!
//! # Locking discipline
//!
//! The registry itself (IDs, profiles, personalities, indexes) is immutable
//! once built.  Each agent's mutable state sits behind its own
//! `parking_lot::Mutex`, so two agents' updates never contend and no global
//! lock exists.  Cross-component code takes an agent lock only through
//! [`AgentRegistry::with_dynamics`] / [`snapshot`](AgentRegistry::snapshot),
//! keeping hold times short and bounded.

use orgsim_core::AgentId;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::state::{AgentDynamics, InteractionRecord};
use crate::profile::{Personality, ProfessionalProfile};

/// How many memory entries a behavior snapshot carries.
pub const SNAPSHOT_MEMORY_EXCERPT: usize = 8;

// ── AgentRecord ───────────────────────────────────────────────────────────────

/// One agent: immutable identity plus lock-guarded dynamics.
#[derive(Debug)]
pub struct AgentRecord {
    pub id:          AgentId,
    pub profile:     ProfessionalProfile,
    pub personality: Personality,
    dynamics:        Mutex<AgentDynamics>,
}

impl AgentRecord {
    pub(crate) fn new(
        id: AgentId,
        profile: ProfessionalProfile,
        personality: Personality,
        dynamics: AgentDynamics,
    ) -> Self {
        Self {
            id,
            profile,
            personality,
            dynamics: Mutex::new(dynamics),
        }
    }
}

// ── AgentSnapshot ─────────────────────────────────────────────────────────────

/// A point-in-time copy of everything the behavior engine needs about one
/// agent.  Taken under the agent's lock, then used lock-free in the parallel
/// decision phase.
#[derive(Clone, Debug)]
pub struct AgentSnapshot {
    pub id:              AgentId,
    pub department:      String,
    pub role:            String,
    pub seniority:       u8,
    pub expertise:       Vec<String>,
    pub capacity:        f64,
    pub personality:     Personality,
    pub stress:          f64,
    pub workload:        f64,
    pub satisfaction:    f64,
    /// Newest-first excerpt of the agent's interaction memory.
    pub memory_excerpt:  Vec<InteractionRecord>,
    /// Affinity toward the sender of the communication being handled.
    pub sender_affinity: f64,
}

// ── AgentRegistry ─────────────────────────────────────────────────────────────

/// Registry of all agents, keyed by stable ID and indexed by department.
///
/// Built once by [`RegistryBuilder`][crate::RegistryBuilder]; no agents are
/// added or removed while a simulation runs.
#[derive(Debug)]
pub struct AgentRegistry {
    records:       Vec<AgentRecord>,
    by_id:         FxHashMap<AgentId, usize>,
    by_department: FxHashMap<String, Vec<usize>>,
}

impl AgentRegistry {
    pub(crate) fn new(records: Vec<AgentRecord>) -> Self {
        let mut by_id = FxHashMap::default();
        let mut by_department: FxHashMap<String, Vec<usize>> = FxHashMap::default();
        for (idx, record) in records.iter().enumerate() {
            by_id.insert(record.id.clone(), idx);
            by_department
                .entry(record.profile.department.clone())
                .or_default()
                .push(idx);
        }
        Self { records, by_id, by_department }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Dense index for an agent ID, if registered.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Record at a dense index.
    ///
    /// # Panics
    /// Panics if `idx` is out of bounds; indexes come from `index_of`.
    pub fn get(&self, idx: usize) -> &AgentRecord {
        &self.records[idx]
    }

    pub fn by_id(&self, id: &str) -> Option<&AgentRecord> {
        self.index_of(id).map(|idx| &self.records[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &AgentRecord> + '_ {
        self.records.iter()
    }

    /// All registered department names, unordered.
    pub fn departments(&self) -> impl Iterator<Item = &str> + '_ {
        self.by_department.keys().map(|s| s.as_str())
    }

    /// Dense indexes of every agent in `department` (insertion order).
    pub fn department_members(&self, department: &str) -> &[usize] {
        self.by_department
            .get(department)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    // ── Dynamics access ───────────────────────────────────────────────────

    /// Run `f` with the agent's dynamics locked.
    pub fn with_dynamics<R>(&self, idx: usize, f: impl FnOnce(&mut AgentDynamics) -> R) -> R {
        let mut guard = self.records[idx].dynamics.lock();
        f(&mut guard)
    }

    /// Take a behavior snapshot of agent `idx`, recording its affinity
    /// toward `sender`.
    pub fn snapshot(&self, idx: usize, sender: &AgentId) -> AgentSnapshot {
        let record = &self.records[idx];
        let dynamics = record.dynamics.lock();
        AgentSnapshot {
            id:              record.id.clone(),
            department:      record.profile.department.clone(),
            role:            record.profile.role.clone(),
            seniority:       record.profile.seniority,
            expertise:       record.profile.expertise.clone(),
            capacity:        record.profile.capacity,
            personality:     record.personality,
            stress:          dynamics.stress(),
            workload:        dynamics.workload(),
            satisfaction:    dynamics.satisfaction(),
            memory_excerpt:  dynamics.recent_memory(SNAPSHOT_MEMORY_EXCERPT),
            sender_affinity: dynamics.affinity(sender),
        }
    }

    /// Averages of (stress, workload, satisfaction) across all agents.
    ///
    /// Takes each agent lock briefly, one at a time.  Used by the end-of-day
    /// snapshot, never by metrics queries.
    pub fn workforce_averages(&self) -> (f64, f64, f64) {
        if self.records.is_empty() {
            return (0.0, 0.0, 0.0);
        }
        let mut totals = (0.0, 0.0, 0.0);
        for record in &self.records {
            let d = record.dynamics.lock();
            totals.0 += d.stress();
            totals.1 += d.workload();
            totals.2 += d.satisfaction();
        }
        let n = self.records.len() as f64;
        (totals.0 / n, totals.1 / n, totals.2 / n)
    }
}
