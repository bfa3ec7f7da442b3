//! Per-agent deterministic RNG state, separated from the registry.
//!
//! # Why a separate struct?
//!
//! The parallel decision phase needs `&mut` access to each woken agent's RNG
//! and shared read access to the registry simultaneously.  Keeping the RNGs
//! outside the registry resolves the borrow cleanly, exactly as the rest of
//! the engine's split-borrow pattern expects.
//!
//! `AgentRngs` is `Send` (the inner `SmallRng` is `Send`) but intentionally
//! never shared — each parallel worker gets an exclusive `&mut` to one
//! agent's stream via [`get_many_mut`](AgentRngs::get_many_mut).

use orgsim_core::AgentRng;

/// Dense per-agent RNG streams, indexed like the registry.
#[derive(Debug)]
pub struct AgentRngs {
    inner: Vec<AgentRng>,
}

impl AgentRngs {
    /// Seed one stream per agent ID, in registry (dense-index) order.
    pub fn new(global_seed: u64, agent_ids: impl Iterator<Item = impl AsRef<str>>) -> Self {
        let inner = agent_ids
            .map(|id| AgentRng::new(global_seed, id.as_ref()))
            .collect();
        Self { inner }
    }

    /// Mutable reference to one agent's stream.
    #[inline]
    pub fn get_mut(&mut self, idx: usize) -> &mut AgentRng {
        &mut self.inner[idx]
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Return mutable references to the streams of a set of agents.
    ///
    /// Used by the parallel decision phase: the due-agent list is zipped with
    /// the returned refs and processed on the worker pool.
    ///
    /// # Precondition (enforced by caller)
    ///
    /// `indexes` must contain no duplicates and every index must be
    /// in-bounds.  Both hold for the engine's per-instant batches, which are
    /// grouped by agent before this call.
    pub fn get_many_mut(&mut self, indexes: &[usize]) -> Vec<&mut AgentRng> {
        debug_assert!(
            indexes.iter().all(|&i| i < self.inner.len()),
            "agent index out of bounds"
        );
        let ptr = self.inner.as_mut_ptr();
        // SAFETY: every index in `indexes` is unique (caller invariant) and
        // within bounds (checked above in debug builds; the engine never
        // constructs an index >= agent count).  Each pointer therefore
        // aliases a distinct element of `self.inner`, so no two returned
        // references overlap.
        indexes
            .iter()
            .map(|&i| unsafe { &mut *ptr.add(i) })
            .collect()
    }
}
