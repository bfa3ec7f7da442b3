//! Unit tests for orgsim-core.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::{
    Acceleration, AgentId, AgentRng, IdSequence, SimClock, SimDuration, SimRng, SimTime,
    SimulationParameters, WaitOutcome, params::DEFAULT_START_UNIX_SECS, stream_seed,
};

// ── Time arithmetic ───────────────────────────────────────────────────────────

mod time_tests {
    use super::*;

    #[test]
    fn duration_constructors_agree() {
        assert_eq!(SimDuration::from_minutes(3), SimDuration::from_secs(180));
        assert_eq!(SimDuration::from_hours(2), SimDuration::from_minutes(120));
        assert_eq!(SimDuration::from_days(1), SimDuration::from_hours(24));
    }

    #[test]
    fn simtime_add_and_since() {
        let t = SimTime(100) + SimDuration::from_secs(50);
        assert_eq!(t, SimTime(150));
        assert_eq!(t.since(SimTime(100)), SimDuration(50));
        assert_eq!(t - SimTime(0), SimDuration(150));
    }

    #[test]
    fn acceleration_from_factor() {
        assert_eq!(Acceleration::from_factor(None), Acceleration::OnDemand);
        assert_eq!(
            Acceleration::from_factor(Some(f64::INFINITY)),
            Acceleration::OnDemand
        );
        assert_eq!(
            Acceleration::from_factor(Some(144.0)),
            Acceleration::Paced(144.0)
        );
    }
}

// ── Clock ─────────────────────────────────────────────────────────────────────

mod clock_tests {
    use super::*;

    fn clock() -> SimClock {
        SimClock::new(DEFAULT_START_UNIX_SECS, Acceleration::OnDemand)
    }

    #[test]
    fn advance_is_monotonic() {
        let c = clock();
        c.advance_to(SimTime(100));
        assert_eq!(c.now(), SimTime(100));
        // A target in the past is a no-op, never a rewind.
        c.advance_to(SimTime(50));
        assert_eq!(c.now(), SimTime(100));
        c.advance_to(SimTime(100));
        assert_eq!(c.now(), SimTime(100));
    }

    #[test]
    fn sleep_until_past_deadline_returns_immediately() {
        let c = clock();
        c.advance_to(SimTime(10));
        assert_eq!(c.sleep_until(SimTime(5)), WaitOutcome::Reached);
    }

    #[test]
    fn waiter_released_on_advance() {
        let c = Arc::new(clock());
        let c2 = Arc::clone(&c);
        let handle = thread::spawn(move || c2.sleep_until(SimTime(1_000)));

        // Wait for the waiter to register, then advance past its deadline.
        for _ in 0..200 {
            if c.waiter_count() == 1 {
                break;
            }
            thread::sleep(Duration::from_millis(1));
        }
        let released = c.advance_to(SimTime(1_000));
        assert_eq!(released, 1);
        assert_eq!(handle.join().unwrap(), WaitOutcome::Reached);
    }

    #[test]
    fn halt_releases_waiters() {
        let c = Arc::new(clock());
        let c2 = Arc::clone(&c);
        let handle = thread::spawn(move || c2.sleep_until(SimTime(1_000_000)));

        for _ in 0..200 {
            if c.waiter_count() == 1 {
                break;
            }
            thread::sleep(Duration::from_millis(1));
        }
        c.halt();
        assert_eq!(handle.join().unwrap(), WaitOutcome::Halted);
        // The cursor survives a halt.
        assert_eq!(c.now(), SimTime::ZERO);
        assert!(c.is_halted());
    }

    #[test]
    fn next_daily_wraps_midnight() {
        let c = clock(); // day 0 starts at 00:00 local
        let nine = c.next_daily(SimTime::ZERO, 9);
        assert_eq!(nine, SimTime(9 * 3_600));

        // Just past 09:00 → tomorrow 09:00.
        let after = c.next_daily(SimTime(9 * 3_600 + 1), 9);
        assert_eq!(after, SimTime(33 * 3_600));
    }

    #[test]
    fn day_index_counts_midnights() {
        let c = clock();
        assert_eq!(c.day_index(SimTime::ZERO), 0);
        assert_eq!(c.day_index(SimTime(86_399)), 0);
        assert_eq!(c.day_index(SimTime(86_400)), 1);
    }
}

// ── RNG ───────────────────────────────────────────────────────────────────────

mod rng_tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let mut a = AgentRng::new(42, "vp-sales");
        let mut b = AgentRng::new(42, "vp-sales");
        for _ in 0..16 {
            assert_eq!(a.gen_range(0_u64..1_000_000), b.gen_range(0_u64..1_000_000));
        }
    }

    #[test]
    fn different_agents_different_streams() {
        let mut a = AgentRng::new(42, "vp-sales");
        let mut b = AgentRng::new(42, "vp-engineering");
        let va: Vec<u64> = (0..8).map(|_| a.gen_range(0_u64..u64::MAX)).collect();
        let vb: Vec<u64> = (0..8).map(|_| b.gen_range(0_u64..u64::MAX)).collect();
        assert_ne!(va, vb);
    }

    #[test]
    fn component_separator_matters() {
        // ("ab", "c") and ("a", "bc") must hash to different streams.
        assert_ne!(stream_seed(1, "ab", "c"), stream_seed(1, "a", "bc"));
    }

    #[test]
    fn component_streams_reproducible() {
        let mut a = SimRng::for_component(7, "chatter");
        let mut b = SimRng::for_component(7, "chatter");
        assert_eq!(a.gen_range(0_u32..1_000), b.gen_range(0_u32..1_000));
    }
}

// ── IDs ───────────────────────────────────────────────────────────────────────

mod id_tests {
    use super::*;

    #[test]
    fn sequence_mints_from_one() {
        let mut seq = IdSequence::new("comm");
        assert_eq!(seq.mint(), "comm-1");
        assert_eq!(seq.mint(), "comm-2");
        assert_eq!(seq.minted(), 2);
    }

    #[test]
    fn id_borrows_as_str() {
        let id = AgentId::new("ceo");
        assert_eq!(id.as_str(), "ceo");
        assert_eq!(id.to_string(), "ceo");
    }
}

// ── Parameters ────────────────────────────────────────────────────────────────

mod params_tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        SimulationParameters::default().validate().unwrap();
    }

    #[test]
    fn inverted_delay_range_rejected() {
        let params = SimulationParameters {
            response_delay_min_minutes: 50,
            response_delay_max_minutes: 10,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn out_of_range_knobs_rejected() {
        for params in [
            SimulationParameters { communication_frequency: 1.5, ..Default::default() },
            SimulationParameters { collaboration_bonus: 0.9, ..Default::default() },
            SimulationParameters { stress_threshold: -0.1, ..Default::default() },
            SimulationParameters { acceleration_factor: Some(-2.0), ..Default::default() },
            SimulationParameters { maintenance_hour: 24, ..Default::default() },
        ] {
            assert!(params.validate().is_err(), "{params:?} should be rejected");
        }
    }

    #[test]
    fn worker_pool_size_is_capped() {
        let params = SimulationParameters { worker_threads: Some(8), ..Default::default() };
        assert_eq!(params.worker_pool_size(), 8);
        let auto = SimulationParameters::default().worker_pool_size();
        assert!(auto >= 1 && auto <= crate::params::MAX_WORKER_THREADS);
    }
}
