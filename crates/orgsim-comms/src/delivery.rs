//! Delivery records: one per (communication, recipient) pair.

use orgsim_core::{AgentId, CommId, SimTime};

/// Lifecycle of one delivery.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DeliveryStatus {
    /// Scheduled, not yet handed to the recipient.
    Pending,
    Delivered,
    /// The recipient does not exist (or vanished before delivery).
    Failed,
    /// The simulation stopped while the delivery was still pending.
    Cancelled,
}

impl DeliveryStatus {
    /// `true` once the delivery can no longer change state.
    pub fn is_terminal(self) -> bool {
        !matches!(self, DeliveryStatus::Pending)
    }
}

/// The authoritative record of one delivery attempt.
///
/// Exactly one record exists per (communication, recipient) pair, created
/// `Pending` at fan-out time.  Re-prompts of an ignored communication reuse
/// the original record — they are behavior events, not new deliveries.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeliveryRecord {
    pub communication_id:        CommId,
    pub recipient_id:            AgentId,
    pub status:                  DeliveryStatus,
    pub scheduled_delivery_time: SimTime,
    pub actual_delivery_time:    Option<SimTime>,
}

impl DeliveryRecord {
    /// A fresh `Pending` record scheduled for `at`.
    pub fn pending(communication_id: CommId, recipient_id: AgentId, at: SimTime) -> Self {
        Self {
            communication_id,
            recipient_id,
            status: DeliveryStatus::Pending,
            scheduled_delivery_time: at,
            actual_delivery_time: None,
        }
    }
}
