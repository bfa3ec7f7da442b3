//! The tracking store — the single source of truth for "what happened".
//!
//! Append-only: communications, responses, and workforce snapshots are never
//! removed or rewritten; the only in-place mutation is a delivery record's
//! status transition.  Every other component consults this store; none
//! bypasses it to mutate history.
//!
//! The store is not internally synchronized — the kernel wraps it in a
//! reader-writer lock (many readers, one writer) per its sharding policy.

use orgsim_core::{AgentId, CommId, IdSequence, ResponseId, SimTime, ThreadId};
use orgsim_comms::{
    Communication, DeliveryRecord, DeliveryStatus, Response,
};
use rustc_hash::FxHashMap;

// ── WorkforceSnapshot ─────────────────────────────────────────────────────────

/// Workforce averages captured by the end-of-day event (and at stop).
///
/// Metrics queries read these instead of touching agent locks.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorkforceSnapshot {
    pub at:               SimTime,
    pub day:              u64,
    pub avg_stress:       f64,
    pub avg_workload:     f64,
    pub avg_satisfaction: f64,
    pub agent_count:      usize,
}

// ── TrackingStore ─────────────────────────────────────────────────────────────

/// Authoritative log of every communication, delivery, and response, with
/// the indexes the rest of the kernel queries.
pub struct TrackingStore {
    communications: Vec<Communication>,
    responses:      Vec<Response>,

    comm_index:         FxHashMap<CommId, usize>,
    thread_index:       FxHashMap<ThreadId, Vec<usize>>,
    /// One `Vec` per communication, in recipient fan-out order.  Exactly one
    /// record per (communication, recipient).
    deliveries:         FxHashMap<CommId, Vec<DeliveryRecord>>,
    responses_by_comm:  FxHashMap<CommId, Vec<usize>>,
    responses_by_agent: FxHashMap<AgentId, Vec<usize>>,
    /// Communications addressed to each recipient, in delivery-record order.
    comms_by_recipient: FxHashMap<AgentId, Vec<usize>>,

    comm_ids:   IdSequence,
    resp_ids:   IdSequence,
    thread_ids: IdSequence,

    snapshots: Vec<WorkforceSnapshot>,

    escalations_promoted: u64,
    compliance_failures:  u64,
}

impl Default for TrackingStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackingStore {
    pub fn new() -> Self {
        Self {
            communications:       Vec::new(),
            responses:            Vec::new(),
            comm_index:           FxHashMap::default(),
            thread_index:         FxHashMap::default(),
            deliveries:           FxHashMap::default(),
            responses_by_comm:    FxHashMap::default(),
            responses_by_agent:   FxHashMap::default(),
            comms_by_recipient:   FxHashMap::default(),
            comm_ids:             IdSequence::new("comm"),
            resp_ids:             IdSequence::new("resp"),
            thread_ids:           IdSequence::new("thread"),
            snapshots:            Vec::new(),
            escalations_promoted: 0,
            compliance_failures:  0,
        }
    }

    // ── ID minting ────────────────────────────────────────────────────────
    //
    // Sequential minting lives with the store so that a seeded run's call
    // sequence reproduces the identical ID sequence.

    pub fn mint_comm_id(&mut self) -> CommId {
        CommId::new(self.comm_ids.mint())
    }

    pub fn mint_response_id(&mut self) -> ResponseId {
        ResponseId::new(self.resp_ids.mint())
    }

    pub fn mint_thread_id(&mut self) -> ThreadId {
        ThreadId::new(self.thread_ids.mint())
    }

    // ── Appends ───────────────────────────────────────────────────────────

    /// Append a communication.  IDs must be unique (minted by this store).
    pub fn record_communication(&mut self, comm: Communication) {
        debug_assert!(
            !self.comm_index.contains_key(&comm.id),
            "duplicate communication id {}",
            comm.id
        );
        let idx = self.communications.len();
        self.comm_index.insert(comm.id.clone(), idx);
        self.thread_index
            .entry(comm.thread_id.clone())
            .or_default()
            .push(idx);
        self.communications.push(comm);
    }

    /// Append a delivery record.  At most one per (communication, recipient).
    pub fn record_delivery(&mut self, record: DeliveryRecord) {
        let records = self.deliveries.entry(record.communication_id.clone()).or_default();
        debug_assert!(
            records.iter().all(|r| r.recipient_id != record.recipient_id),
            "duplicate delivery for ({}, {})",
            record.communication_id,
            record.recipient_id
        );
        if let Some(&comm_idx) = self.comm_index.get(&record.communication_id) {
            self.comms_by_recipient
                .entry(record.recipient_id.clone())
                .or_default()
                .push(comm_idx);
        }
        records.push(record);
    }

    /// Transition a delivery's status.  Returns `false` if no record exists.
    pub fn set_delivery_status(
        &mut self,
        comm_id: &CommId,
        recipient: &AgentId,
        status: DeliveryStatus,
        actual_time: Option<SimTime>,
    ) -> bool {
        let Some(records) = self.deliveries.get_mut(comm_id) else {
            return false;
        };
        let Some(record) = records.iter_mut().find(|r| &r.recipient_id == recipient) else {
            return false;
        };
        record.status = status;
        if actual_time.is_some() {
            record.actual_delivery_time = actual_time;
        }
        true
    }

    /// Append a response (immutable once written).
    pub fn record_response(&mut self, response: Response) {
        debug_assert!(
            self.comm_index.contains_key(&response.communication_id),
            "response to unknown communication {}",
            response.communication_id
        );
        let idx = self.responses.len();
        self.responses_by_comm
            .entry(response.communication_id.clone())
            .or_default()
            .push(idx);
        self.responses_by_agent
            .entry(response.agent_id.clone())
            .or_default()
            .push(idx);
        self.responses.push(response);
    }

    pub fn record_workforce_snapshot(&mut self, snapshot: WorkforceSnapshot) {
        self.snapshots.push(snapshot);
    }

    pub fn note_escalation_promoted(&mut self) {
        self.escalations_promoted += 1;
    }

    pub fn note_compliance_failure(&mut self) {
        self.compliance_failures += 1;
    }

    // ── Lookups ───────────────────────────────────────────────────────────

    pub fn communication(&self, id: &CommId) -> Option<&Communication> {
        self.comm_index.get(id).map(|&idx| &self.communications[idx])
    }

    pub fn communications(&self) -> &[Communication] {
        &self.communications
    }

    pub fn responses(&self) -> &[Response] {
        &self.responses
    }

    /// All communications of a thread, in creation order.
    pub fn thread_communications(&self, thread: &ThreadId) -> Vec<&Communication> {
        self.thread_index
            .get(thread)
            .map(|idxs| idxs.iter().map(|&i| &self.communications[i]).collect())
            .unwrap_or_default()
    }

    pub fn deliveries_for(&self, comm_id: &CommId) -> &[DeliveryRecord] {
        self.deliveries
            .get(comm_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn delivery(&self, comm_id: &CommId, recipient: &AgentId) -> Option<&DeliveryRecord> {
        self.deliveries
            .get(comm_id)?
            .iter()
            .find(|r| &r.recipient_id == recipient)
    }

    /// Every delivery still pending, across all communications.
    pub fn pending_deliveries(&self) -> Vec<(CommId, AgentId)> {
        let mut pending = Vec::new();
        for records in self.deliveries.values() {
            for r in records {
                if r.status == DeliveryStatus::Pending {
                    pending.push((r.communication_id.clone(), r.recipient_id.clone()));
                }
            }
        }
        pending
    }

    /// Responses to one communication, in generation order.
    pub fn responses_for(&self, comm_id: &CommId) -> Vec<&Response> {
        self.responses_by_comm
            .get(comm_id)
            .map(|idxs| idxs.iter().map(|&i| &self.responses[i]).collect())
            .unwrap_or_default()
    }

    /// Responses written by one agent, in generation order.
    pub fn responses_by(&self, agent: &AgentId) -> Vec<&Response> {
        self.responses_by_agent
            .get(agent)
            .map(|idxs| idxs.iter().map(|&i| &self.responses[i]).collect())
            .unwrap_or_default()
    }

    /// The most recent response by `agent` to `comm_id`.
    pub fn latest_response_by(&self, comm_id: &CommId, agent: &AgentId) -> Option<&Response> {
        self.responses_by_comm.get(comm_id)?.iter().rev().find_map(|&i| {
            let r = &self.responses[i];
            (&r.agent_id == agent).then_some(r)
        })
    }

    pub fn has_response(&self, comm_id: &CommId, agent: &AgentId) -> bool {
        self.latest_response_by(comm_id, agent).is_some()
    }

    /// Responses created in the half-open window `[from, to)`.
    pub fn responses_in_window(&self, from: SimTime, to: SimTime) -> Vec<&Response> {
        self.responses
            .iter()
            .filter(|r| r.created_at >= from && r.created_at < to)
            .collect()
    }

    /// Distinct communications at or above `min_priority` addressed to
    /// `agent` that have no engaged response from it yet.  Feeds the
    /// `priority_conflict` hesitation trigger.
    pub fn open_high_priority_for(&self, agent: &AgentId, min_priority: u8) -> u32 {
        let Some(comm_idxs) = self.comms_by_recipient.get(agent) else {
            return 0;
        };
        comm_idxs
            .iter()
            .filter(|&&idx| {
                let comm = &self.communications[idx];
                if comm.priority.get() < min_priority {
                    return false;
                }
                !self
                    .latest_response_by(&comm.id, agent)
                    .map(|r| r.kind.is_engaged())
                    .unwrap_or(false)
            })
            .count() as u32
    }

    // ── Counters ──────────────────────────────────────────────────────────

    pub fn communications_len(&self) -> usize {
        self.communications.len()
    }

    pub fn responses_len(&self) -> usize {
        self.responses.len()
    }

    pub fn escalations_promoted(&self) -> u64 {
        self.escalations_promoted
    }

    pub fn compliance_failures(&self) -> u64 {
        self.compliance_failures
    }

    pub fn workforce_snapshots(&self) -> &[WorkforceSnapshot] {
        &self.snapshots
    }

    pub fn latest_workforce_snapshot(&self) -> Option<&WorkforceSnapshot> {
        self.snapshots.last()
    }
}
