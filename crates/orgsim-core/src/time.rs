//! Simulated time model.
//!
//! # Design
//!
//! Time is a monotonically increasing count of whole simulated seconds from
//! simulation start ([`SimTime`]).  The mapping to wall-clock time is held by
//! [`SimClock`]:
//!
//!   unix_time = start_unix_secs + sim_time_secs
//!
//! Using integer seconds as the canonical unit keeps all schedule arithmetic
//! exact (no floating-point drift) and comparisons O(1).  The acceleration
//! factor only matters to whoever *advances* the clock — everything else in
//! the kernel reasons purely in simulated seconds.
//!
//! # Waiters
//!
//! `SimClock` supports `sleep_until`: callers park until the cursor reaches
//! their deadline.  Deadlines live in a heap and are released in
//! (deadline, registration) order when the clock advances, so waiter wakeup
//! is deterministic given identical advance sequences.  `halt()` releases
//! every waiter at shutdown.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt;

use parking_lot::{Condvar, Mutex};

// ── SimDuration ───────────────────────────────────────────────────────────────

/// A span of simulated time, in whole seconds.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimDuration(pub u64);

impl SimDuration {
    pub const ZERO: SimDuration = SimDuration(0);

    #[inline]
    pub const fn from_secs(secs: u64) -> Self {
        SimDuration(secs)
    }

    #[inline]
    pub const fn from_minutes(minutes: u64) -> Self {
        SimDuration(minutes * 60)
    }

    #[inline]
    pub const fn from_hours(hours: u64) -> Self {
        SimDuration(hours * 3_600)
    }

    #[inline]
    pub const fn from_days(days: u64) -> Self {
        SimDuration(days * 86_400)
    }

    #[inline]
    pub const fn as_secs(self) -> u64 {
        self.0
    }

    #[inline]
    pub const fn as_minutes(self) -> u64 {
        self.0 / 60
    }
}

impl std::ops::Add for SimDuration {
    type Output = SimDuration;
    #[inline]
    fn add(self, rhs: SimDuration) -> SimDuration {
        SimDuration(self.0 + rhs.0)
    }
}

impl std::ops::Mul<u64> for SimDuration {
    type Output = SimDuration;
    #[inline]
    fn mul(self, rhs: u64) -> SimDuration {
        SimDuration(self.0 * rhs)
    }
}

impl fmt::Display for SimDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (h, m, s) = (self.0 / 3_600, (self.0 % 3_600) / 60, self.0 % 60);
        write!(f, "{h}h{m:02}m{s:02}s")
    }
}

// ── SimTime ───────────────────────────────────────────────────────────────────

/// An absolute simulated instant: whole seconds since simulation start.
///
/// Stored as `u64`: at 1-second resolution a u64 lasts ~585 billion years,
/// far beyond any conceivable run.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimTime(pub u64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0);

    /// Simulated time elapsed from `earlier` to `self`.
    ///
    /// # Panics
    /// Panics in debug mode if `earlier > self`.
    #[inline]
    pub fn since(self, earlier: SimTime) -> SimDuration {
        debug_assert!(earlier <= self);
        SimDuration(self.0 - earlier.0)
    }
}

impl std::ops::Add<SimDuration> for SimTime {
    type Output = SimTime;
    #[inline]
    fn add(self, rhs: SimDuration) -> SimTime {
        SimTime(self.0 + rhs.0)
    }
}

impl std::ops::Sub for SimTime {
    type Output = SimDuration;
    #[inline]
    fn sub(self, rhs: SimTime) -> SimDuration {
        SimDuration(self.0 - rhs.0)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let days = self.0 / 86_400;
        let hours = (self.0 % 86_400) / 3_600;
        let minutes = (self.0 % 3_600) / 60;
        write!(f, "day {days} {hours:02}:{minutes:02}")
    }
}

// ── Acceleration ──────────────────────────────────────────────────────────────

/// How the clock cursor moves forward.
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum Acceleration {
    /// A driver paces real time: one real second maps to `factor` simulated
    /// seconds.  Default factor: 144 (ten simulated days per real hour).
    Paced(f64),

    /// As-fast-as-possible mode: time jumps on demand from one due event to
    /// the next.  Used by tests and scripted scenarios.
    OnDemand,
}

impl Acceleration {
    pub const DEFAULT_FACTOR: f64 = 144.0;

    /// Interpret an optional protocol-level factor: absent or non-finite
    /// means on-demand.
    pub fn from_factor(factor: Option<f64>) -> Self {
        match factor {
            Some(f) if f.is_finite() => Acceleration::Paced(f),
            _ => Acceleration::OnDemand,
        }
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// Outcome of a [`SimClock::sleep_until`] call.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum WaitOutcome {
    /// The clock reached the requested instant.
    Reached,
    /// The clock was halted before the deadline.
    Halted,
}

struct ClockState {
    now:        SimTime,
    halted:     bool,
    /// Pending `sleep_until` deadlines, popped in (deadline, seq) order as
    /// the cursor passes them.
    waiters:    BinaryHeap<Reverse<(SimTime, u64)>>,
    waiter_seq: u64,
}

/// The shared simulated clock.
///
/// The cursor only moves forward, and only via [`advance_to`]
/// ([`SimClock::advance_to`]) — the kernel's driver is the single advancing
/// party.  Every other component reads [`now`](SimClock::now) or parks on
/// [`sleep_until`](SimClock::sleep_until).
pub struct SimClock {
    /// Unix timestamp (seconds since epoch) of simulated time zero.
    start_unix_secs: i64,
    accel:           Acceleration,
    state:           Mutex<ClockState>,
    advanced:        Condvar,
}

impl SimClock {
    pub fn new(start_unix_secs: i64, accel: Acceleration) -> Self {
        Self {
            start_unix_secs,
            accel,
            state: Mutex::new(ClockState {
                now:        SimTime::ZERO,
                halted:     false,
                waiters:    BinaryHeap::new(),
                waiter_seq: 0,
            }),
            advanced: Condvar::new(),
        }
    }

    #[inline]
    pub fn acceleration(&self) -> Acceleration {
        self.accel
    }

    /// Current simulated instant.
    pub fn now(&self) -> SimTime {
        self.state.lock().now
    }

    /// Move the cursor forward to `t`, releasing every waiter whose deadline
    /// has passed.  A target at or before the current cursor is a no-op —
    /// the clock never rewinds.
    ///
    /// Returns the number of waiters released.
    pub fn advance_to(&self, t: SimTime) -> usize {
        let mut state = self.state.lock();
        if state.halted || t <= state.now {
            return 0;
        }
        state.now = t;

        let mut released = 0;
        while let Some(&Reverse((deadline, _seq))) = state.waiters.peek() {
            if deadline > t {
                break;
            }
            state.waiters.pop();
            released += 1;
        }
        self.advanced.notify_all();
        released
    }

    /// Park the calling thread until the cursor reaches `t` or the clock is
    /// halted.  Returns immediately if `t` has already passed.
    pub fn sleep_until(&self, t: SimTime) -> WaitOutcome {
        let mut state = self.state.lock();
        if state.now >= t {
            return WaitOutcome::Reached;
        }
        if state.halted {
            return WaitOutcome::Halted;
        }
        let seq = state.waiter_seq;
        state.waiter_seq += 1;
        state.waiters.push(Reverse((t, seq)));

        self.advanced
            .wait_while(&mut state, |s| s.now < t && !s.halted);

        if state.now >= t {
            WaitOutcome::Reached
        } else {
            WaitOutcome::Halted
        }
    }

    /// Halt the clock, releasing all current and future waiters.
    ///
    /// The cursor stays where it is; `now()` remains valid after a halt.
    pub fn halt(&self) {
        let mut state = self.state.lock();
        state.halted = true;
        state.waiters.clear();
        self.advanced.notify_all();
    }

    pub fn is_halted(&self) -> bool {
        self.state.lock().halted
    }

    /// Number of registered, not-yet-released waiters.
    pub fn waiter_count(&self) -> usize {
        self.state.lock().waiters.len()
    }

    // ── Wall-clock mapping ────────────────────────────────────────────────

    /// Unix timestamp corresponding to the simulated instant `t`.
    #[inline]
    pub fn unix_time(&self, t: SimTime) -> i64 {
        self.start_unix_secs + t.0 as i64
    }

    /// Seconds past local midnight for the simulated instant `t`.
    #[inline]
    pub fn time_of_day_secs(&self, t: SimTime) -> u64 {
        (self.unix_time(t).rem_euclid(86_400)) as u64
    }

    /// Days elapsed since simulated midnight of day 0.
    #[inline]
    pub fn day_index(&self, t: SimTime) -> u64 {
        (self.unix_time(t).div_euclid(86_400) - self.start_unix_secs.div_euclid(86_400)) as u64
    }

    /// The first simulated instant at or after `t` whose local time of day is
    /// `hour:00`.  Used by the recurring 09:00 / 17:00 cadences.
    pub fn next_daily(&self, t: SimTime, hour: u32) -> SimTime {
        let target = hour as u64 * 3_600;
        let tod = self.time_of_day_secs(t);
        let delta = if tod <= target {
            target - tod
        } else {
            86_400 - tod + target
        };
        t + SimDuration(delta)
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.now())
    }
}
