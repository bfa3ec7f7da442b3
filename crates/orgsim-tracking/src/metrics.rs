//! Read-only organizational metrics.
//!
//! A pure aggregation over the tracking store plus the registry's immutable
//! profiles.  Deliberately never touches agent dynamics locks — workforce
//! numbers come from the end-of-day snapshots the kernel writes into
//! tracking.

use orgsim_agents::AgentRegistry;
use orgsim_comms::DeliveryStatus;
use rustc_hash::FxHashMap;

use crate::store::{TrackingStore, WorkforceSnapshot};

/// Per-department response aggregates.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DepartmentMetrics {
    pub department:      String,
    pub agents:          usize,
    pub responses:       usize,
    /// Share of this department's responses that engaged (non-ignore).
    pub engagement_rate: f64,
    pub avg_confidence:  f64,
}

/// A point-in-time aggregate over the whole simulation.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OrganizationalMetrics {
    pub agent_count:          usize,
    pub department_count:     usize,
    pub communications_total: usize,
    pub responses_total:      usize,
    pub delivered_total:      usize,
    pub failed_deliveries:    usize,
    pub cancelled_deliveries: usize,
    /// Share of responses that engaged (any kind but ignore).
    pub response_rate:        f64,
    pub ignore_rate:          f64,
    pub escalations_promoted: u64,
    pub compliance_failures:  u64,
    /// Promotions per recorded communication.
    pub escalation_rate:      f64,
    pub avg_confidence:       f64,
    /// Mean simulated minutes between first delivery and first response,
    /// over (communication, recipient) pairs that have both.
    pub avg_reply_latency_minutes: f64,
    pub departments:          Vec<DepartmentMetrics>,
    /// Latest end-of-day workforce snapshot, if a day has closed.
    pub workforce:            Option<WorkforceSnapshot>,
}

impl OrganizationalMetrics {
    /// Compute the full aggregate.  Read-only; no agent locks.
    pub fn compute(store: &TrackingStore, registry: &AgentRegistry) -> Self {
        let responses = store.responses();
        let responses_total = responses.len();
        let engaged = responses.iter().filter(|r| r.kind.is_engaged()).count();
        let confidence_sum: f64 = responses.iter().map(|r| r.confidence).sum();

        // ── Delivery status tallies ───────────────────────────────────────
        let mut delivered = 0;
        let mut failed = 0;
        let mut cancelled = 0;
        for comm in store.communications() {
            for record in store.deliveries_for(&comm.id) {
                match record.status {
                    DeliveryStatus::Delivered => delivered += 1,
                    DeliveryStatus::Failed => failed += 1,
                    DeliveryStatus::Cancelled => cancelled += 1,
                    DeliveryStatus::Pending => {}
                }
            }
        }

        // ── Reply latency over first responses ────────────────────────────
        let mut latency_sum_minutes = 0.0;
        let mut latency_count = 0_usize;
        for comm in store.communications() {
            for record in store.deliveries_for(&comm.id) {
                let Some(delivered_at) = record.actual_delivery_time else {
                    continue;
                };
                // First response by this recipient, if any.
                if let Some(first) = store
                    .responses_for(&comm.id)
                    .into_iter()
                    .find(|r| r.agent_id == record.recipient_id)
                {
                    if first.created_at >= delivered_at {
                        latency_sum_minutes +=
                            first.created_at.since(delivered_at).as_minutes() as f64;
                        latency_count += 1;
                    }
                }
            }
        }

        // ── Per-department aggregates ─────────────────────────────────────
        let mut by_department: FxHashMap<&str, (usize, usize, f64)> = FxHashMap::default();
        for response in responses {
            if let Some(record) = registry.by_id(response.agent_id.as_str()) {
                let entry = by_department
                    .entry(record.profile.department.as_str())
                    .or_insert((0, 0, 0.0));
                entry.0 += 1;
                if response.kind.is_engaged() {
                    entry.1 += 1;
                }
                entry.2 += response.confidence;
            }
        }
        let mut departments: Vec<DepartmentMetrics> = registry
            .departments()
            .map(|department| {
                let (resp, engaged_dept, conf_sum) = by_department
                    .get(department)
                    .copied()
                    .unwrap_or((0, 0, 0.0));
                DepartmentMetrics {
                    department:      department.to_owned(),
                    agents:          registry.department_members(department).len(),
                    responses:       resp,
                    engagement_rate: ratio(engaged_dept, resp),
                    avg_confidence:  if resp == 0 { 0.0 } else { conf_sum / resp as f64 },
                }
            })
            .collect();
        departments.sort_by(|a, b| a.department.cmp(&b.department));

        let communications_total = store.communications_len();
        OrganizationalMetrics {
            agent_count: registry.len(),
            department_count: departments.len(),
            communications_total,
            responses_total,
            delivered_total: delivered,
            failed_deliveries: failed,
            cancelled_deliveries: cancelled,
            response_rate: ratio(engaged, responses_total),
            ignore_rate: ratio(responses_total - engaged, responses_total),
            escalations_promoted: store.escalations_promoted(),
            compliance_failures: store.compliance_failures(),
            escalation_rate: ratio(store.escalations_promoted() as usize, communications_total),
            avg_confidence: if responses_total == 0 {
                0.0
            } else {
                confidence_sum / responses_total as f64
            },
            avg_reply_latency_minutes: if latency_count == 0 {
                0.0
            } else {
                latency_sum_minutes / latency_count as f64
            },
            departments,
            workforce: store.latest_workforce_snapshot().cloned(),
        }
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}
