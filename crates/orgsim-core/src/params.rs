//! Per-simulation configuration.
//!
//! `SimulationParameters` is part of the control-protocol contract: the
//! start request carries a (possibly partial) JSON object of these knobs,
//! so every field has a serde default and the struct round-trips losslessly.
//! Validation happens once, at kernel construction.

use serde::{Deserialize, Serialize};

use crate::{Acceleration, SimDuration, SimError, SimResult};

/// Unix timestamp of Monday 2024-01-01 00:00 UTC — simulated day zero.
pub const DEFAULT_START_UNIX_SECS: i64 = 1_704_067_200;

/// Hard cap on the worker pool regardless of core count.
pub const MAX_WORKER_THREADS: usize = 64;

/// Top-level simulation configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParameters {
    /// Real-second → simulated-second acceleration factor.  `None` selects
    /// on-demand (as-fast-as-possible) mode.  Default: 144.
    pub acceleration_factor: Option<f64>,

    /// Base rate in [0, 1] for scheduler-driven background chatter.
    pub communication_frequency: f64,

    /// Delivery-delay window in simulated minutes, scaled by priority at
    /// draw time.
    pub response_delay_min_minutes: u64,
    pub response_delay_max_minutes: u64,

    /// Stress level above which an agent's response-kind distribution shifts
    /// toward escalate/ignore.
    pub stress_threshold: f64,

    /// In [0, 0.5]: damps stress for communications from high-affinity
    /// senders.
    pub collaboration_bonus: f64,

    /// N₁: ignored nudges before promotion to a recommendation.
    pub nudges_before_recommendation: u32,

    /// N₂: ignored recommendations before promotion to a direct order.
    pub recommendations_before_order: u32,

    /// Simulated minutes after which a non-response counts as ignored.
    /// Doubles as the re-prompt cadence for unanswered communications.
    pub ttl_minutes: u64,

    /// Master RNG seed.  `None` draws a fresh seed at start (nondeterministic
    /// run); the same seed always produces identical results.
    pub random_seed: Option<u64>,

    /// Real-time deadline for one generator-backend call, after which the
    /// rule-based path takes over.
    pub generator_timeout_ms: u64,

    /// Bound on queued communications awaiting fan-out.  Sends beyond it
    /// fail with `overloaded`.
    pub queue_capacity: usize,

    /// Worker thread count for the decision compute phase.  `None` uses
    /// min(4 × cores, 64).
    pub worker_threads: Option<usize>,

    /// Unix timestamp for simulated time zero.
    pub start_unix_secs: i64,

    /// Local hour of the daily maintenance event.
    pub maintenance_hour: u32,

    /// Local hour of the end-of-day event.
    pub end_of_day_hour: u32,

    /// Bound on each agent's interaction memory (newest kept).
    pub memory_limit: usize,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            acceleration_factor:          Some(Acceleration::DEFAULT_FACTOR),
            communication_frequency:      0.35,
            response_delay_min_minutes:   2,
            response_delay_max_minutes:   48,
            stress_threshold:             0.7,
            collaboration_bonus:          0.2,
            nudges_before_recommendation: 5,
            recommendations_before_order: 3,
            ttl_minutes:                  1_440,
            random_seed:                  None,
            generator_timeout_ms:         2_000,
            queue_capacity:               10_000,
            worker_threads:               None,
            start_unix_secs:              DEFAULT_START_UNIX_SECS,
            maintenance_hour:             9,
            end_of_day_hour:              17,
            memory_limit:                 64,
        }
    }
}

impl SimulationParameters {
    /// Check every knob's range once, before the kernel is built.
    pub fn validate(&self) -> SimResult<()> {
        if let Some(f) = self.acceleration_factor {
            if f.is_finite() && f <= 0.0 {
                return Err(SimError::InvalidArgument(format!(
                    "acceleration_factor must be positive, got {f}"
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.communication_frequency) {
            return Err(SimError::InvalidArgument(format!(
                "communication_frequency must be in [0, 1], got {}",
                self.communication_frequency
            )));
        }
        if self.response_delay_min_minutes > self.response_delay_max_minutes {
            return Err(SimError::InvalidArgument(format!(
                "response_delay range is inverted: {}..{}",
                self.response_delay_min_minutes, self.response_delay_max_minutes
            )));
        }
        if !(0.0..=1.0).contains(&self.stress_threshold) {
            return Err(SimError::InvalidArgument(format!(
                "stress_threshold must be in [0, 1], got {}",
                self.stress_threshold
            )));
        }
        if !(0.0..=0.5).contains(&self.collaboration_bonus) {
            return Err(SimError::InvalidArgument(format!(
                "collaboration_bonus must be in [0, 0.5], got {}",
                self.collaboration_bonus
            )));
        }
        if self.nudges_before_recommendation == 0 || self.recommendations_before_order == 0 {
            return Err(SimError::InvalidArgument(
                "escalation thresholds must be at least 1".into(),
            ));
        }
        if self.ttl_minutes == 0 {
            return Err(SimError::InvalidArgument("ttl_minutes must be positive".into()));
        }
        if self.queue_capacity == 0 {
            return Err(SimError::InvalidArgument("queue_capacity must be positive".into()));
        }
        if self.maintenance_hour >= 24 || self.end_of_day_hour >= 24 {
            return Err(SimError::InvalidArgument(
                "maintenance_hour and end_of_day_hour must be in 0..24".into(),
            ));
        }
        if self.memory_limit == 0 {
            return Err(SimError::InvalidArgument("memory_limit must be positive".into()));
        }
        Ok(())
    }

    /// The configured acceleration mode.
    pub fn acceleration(&self) -> Acceleration {
        Acceleration::from_factor(self.acceleration_factor)
    }

    /// Delivery-delay window as simulated durations.
    pub fn delay_range(&self) -> (SimDuration, SimDuration) {
        (
            SimDuration::from_minutes(self.response_delay_min_minutes),
            SimDuration::from_minutes(self.response_delay_max_minutes),
        )
    }

    /// Communication TTL as a simulated duration.
    pub fn ttl(&self) -> SimDuration {
        SimDuration::from_minutes(self.ttl_minutes)
    }

    /// Resolved worker pool size: explicit, or min(4 × cores, 64).
    pub fn worker_pool_size(&self) -> usize {
        self.worker_threads.unwrap_or_else(|| {
            let cores = std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1);
            (cores * 4).min(MAX_WORKER_THREADS)
        })
    }
}
