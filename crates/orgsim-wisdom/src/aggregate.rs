//! Streaming aggregation of the response stream.
//!
//! One [`Aggregate`] accumulates per communication and, when communications
//! share a `strategic_goal` tag, per goal.  Ingestion is incremental — O(1)
//! per response — and the full [`WisdomOfTheCrowd`] snapshot is recomputed
//! only on query.

use orgsim_core::SimDuration;
use orgsim_comms::{HesitationMarker, Response, ResponseKind};

/// Confidence above which a response weighs into approach-conflict
/// detection.
const APPROACH_CONFIDENCE: f64 = 0.6;

/// Bucket thresholds for the confidence distribution.
const CONFIDENCE_LOW: f64 = 0.4;
const CONFIDENCE_HIGH: f64 = 0.7;

// ── Snapshot types ────────────────────────────────────────────────────────────

/// Detected conflict classes.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ConflictKind {
    /// ≥ 2 respondents at capacity declined to act.
    Resource,
    /// Collective reply latency exceeded the declared deadline (the
    /// communication's TTL).
    Timeline,
    /// Confident respondents pulled in opposite directions.
    Approach,
}

/// One detected conflict with a human-readable descriptor.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PriorityConflict {
    pub kind:   ConflictKind,
    pub detail: String,
}

/// Follow-up actions the aggregate recommends to the operator.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RecommendedAction {
    ScheduleReview,
    ReduceScope,
    CascadeThroughLeads,
    ConveneCatchball,
    ReaffirmPriority,
}

/// Responses bucketed by confidence at 0.4 and 0.7.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConfidenceDistribution {
    pub low:    u32,
    pub medium: u32,
    pub high:   u32,
}

/// The queryable aggregate for one communication or topic.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WisdomOfTheCrowd {
    pub responses:               u32,
    /// 1 − normalized Shannon entropy of the confidence-weighted
    /// response-kind distribution.  1.0 means unanimity (and, by
    /// convention, an empty response set).
    pub consensus_level:         f64,
    pub confidence_distribution: ConfidenceDistribution,
    /// Count per hesitation marker, in [`HesitationMarker::ALL`] order.
    pub hesitation_counts:       Vec<(HesitationMarker, u32)>,
    pub priority_conflicts:      Vec<PriorityConflict>,
    pub recommended_actions:     Vec<RecommendedAction>,
}

// ── Aggregate ─────────────────────────────────────────────────────────────────

/// Incrementally maintained state for one key.
#[derive(Clone, Debug)]
pub struct Aggregate {
    /// Confidence mass per response kind, [`ResponseKind::ALL`] order.
    kind_confidence: [f64; 6],
    kind_counts:     [u32; 6],
    buckets:         ConfidenceDistribution,
    hesitation:      [u32; 6],
    departments:     Vec<String>,
    latency_sum:     SimDuration,
    responses:       u32,
    /// Declared deadline for timeline-conflict detection.
    deadline:        SimDuration,
    /// Respondents tagging `capacity_saturation` without taking action.
    saturation_refusals: u32,
    confident_action:    bool,
    confident_challenge: bool,
}

impl Aggregate {
    pub fn new(deadline: SimDuration) -> Self {
        Self {
            kind_confidence:     [0.0; 6],
            kind_counts:         [0; 6],
            buckets:             ConfidenceDistribution::default(),
            hesitation:          [0; 6],
            departments:         Vec::new(),
            latency_sum:         SimDuration::ZERO,
            responses:           0,
            deadline,
            saturation_refusals: 0,
            confident_action:    false,
            confident_challenge: false,
        }
    }

    /// Fold one response in.  `latency` is simulated prompt-to-response time.
    pub fn ingest(&mut self, response: &Response, department: &str, latency: SimDuration) {
        let kind_idx = ResponseKind::ALL
            .iter()
            .position(|&k| k == response.kind)
            .unwrap_or(0);
        // Zero-confidence responses still count once in the kind tally so a
        // stream of flat ignores is not invisible to the entropy term.
        self.kind_confidence[kind_idx] += response.confidence.max(0.05);
        self.kind_counts[kind_idx] += 1;

        if response.confidence < CONFIDENCE_LOW {
            self.buckets.low += 1;
        } else if response.confidence < CONFIDENCE_HIGH {
            self.buckets.medium += 1;
        } else {
            self.buckets.high += 1;
        }

        for (i, marker) in HesitationMarker::ALL.iter().enumerate() {
            if response.hesitation_markers.contains(marker) {
                self.hesitation[i] += 1;
            }
        }

        if !self.departments.iter().any(|d| d == department) {
            self.departments.push(department.to_owned());
        }

        self.latency_sum = self.latency_sum + latency;
        self.responses += 1;

        if response.has_marker(HesitationMarker::CapacitySaturation)
            && response.kind != ResponseKind::TakeAction
        {
            self.saturation_refusals += 1;
        }
        if response.confidence > APPROACH_CONFIDENCE {
            match response.kind {
                ResponseKind::TakeAction => self.confident_action = true,
                ResponseKind::Escalate | ResponseKind::SeekClarification => {
                    self.confident_challenge = true;
                }
                _ => {}
            }
        }
    }

    pub fn response_count(&self) -> u32 {
        self.responses
    }

    // ── Snapshot ──────────────────────────────────────────────────────────

    pub fn snapshot(&self) -> WisdomOfTheCrowd {
        WisdomOfTheCrowd {
            responses:               self.responses,
            consensus_level:         self.consensus(),
            confidence_distribution: self.buckets,
            hesitation_counts:       HesitationMarker::ALL
                .iter()
                .copied()
                .zip(self.hesitation.iter().copied())
                .collect(),
            priority_conflicts:      self.conflicts(),
            recommended_actions:     self.recommendations(),
        }
    }

    /// 1 − H/H_max over the confidence-weighted kind distribution, with
    /// H_max = ln(|kinds|).
    fn consensus(&self) -> f64 {
        let total: f64 = self.kind_confidence.iter().sum();
        if total <= 0.0 {
            return 1.0;
        }
        let mut entropy = 0.0;
        for &mass in &self.kind_confidence {
            if mass > 0.0 {
                let p = mass / total;
                entropy -= p * p.ln();
            }
        }
        let h_max = (ResponseKind::ALL.len() as f64).ln();
        (1.0 - entropy / h_max).clamp(0.0, 1.0)
    }

    fn conflicts(&self) -> Vec<PriorityConflict> {
        let mut conflicts = Vec::new();
        if self.saturation_refusals >= 2 {
            conflicts.push(PriorityConflict {
                kind:   ConflictKind::Resource,
                detail: format!(
                    "{} respondents at capacity declined to act",
                    self.saturation_refusals
                ),
            });
        }
        if self.responses >= 2 && self.latency_sum > self.deadline {
            conflicts.push(PriorityConflict {
                kind:   ConflictKind::Timeline,
                detail: format!(
                    "collective reply latency {} exceeds the declared deadline {}",
                    self.latency_sum, self.deadline
                ),
            });
        }
        if self.confident_action && self.confident_challenge {
            conflicts.push(PriorityConflict {
                kind:   ConflictKind::Approach,
                detail: "confident respondents split between acting and pushing back".into(),
            });
        }
        conflicts
    }

    /// Ordered rule table over the aggregate; first match order is stable.
    fn recommendations(&self) -> Vec<RecommendedAction> {
        let mut actions = Vec::new();
        let consensus = self.consensus();
        let conflicts = self.conflicts();
        let has = |kind: ConflictKind| conflicts.iter().any(|c| c.kind == kind);

        let needs_consensus = self.hesitation[HesitationMarker::ALL
            .iter()
            .position(|&m| m == HesitationMarker::NeedsConsensus)
            .unwrap_or(0)];
        let ignores = self.kind_counts[0];
        let escalations = self.kind_counts[4];

        if has(ConflictKind::Resource) {
            actions.push(RecommendedAction::ReduceScope);
        }
        if has(ConflictKind::Approach)
            || needs_consensus >= 2
            || (self.departments.len() >= 2 && consensus < 0.6)
        {
            actions.push(RecommendedAction::ConveneCatchball);
        }
        if consensus < 0.4 || has(ConflictKind::Timeline) {
            actions.push(RecommendedAction::ScheduleReview);
        }
        if self.responses >= 2 && ignores * 2 > self.responses {
            actions.push(RecommendedAction::ReaffirmPriority);
        }
        if escalations >= 2 {
            actions.push(RecommendedAction::CascadeThroughLeads);
        }
        actions
    }
}
