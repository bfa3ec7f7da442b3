//! Plain data row types written by output backends.

/// One persisted response.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseRow {
    pub response_id:      String,
    pub communication_id: String,
    pub agent_id:         String,
    /// Stable label of the response kind (`take_action`, `ignore`, …).
    pub kind:             String,
    pub confidence:       f64,
    pub fallback_used:    bool,
    pub sim_time_secs:    u64,
    pub unix_time_secs:   i64,
}

/// One end-of-day workforce summary.
#[derive(Debug, Clone, PartialEq)]
pub struct DaySummaryRow {
    pub day:              u64,
    pub unix_time_secs:   i64,
    pub avg_stress:       f64,
    pub avg_workload:     f64,
    pub avg_satisfaction: f64,
    pub agent_count:      u64,
}
