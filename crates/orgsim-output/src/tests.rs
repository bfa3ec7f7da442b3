//! Unit tests for orgsim-output.

use orgsim_agents::{AgentSpec, PersonalitySpec};
use orgsim_core::{AgentId, SimDuration, SimulationParameters, params::DEFAULT_START_UNIX_SECS};
use orgsim_comms::CommunicationKind;
use orgsim_engine::{CommunicationDraft, KernelBuilder};
use tempfile::TempDir;

use crate::{CsvWriter, DaySummaryRow, KernelOutputObserver, OutputWriter, ResponseRow};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn response_row(n: u32) -> ResponseRow {
    ResponseRow {
        response_id:      format!("resp-{n}"),
        communication_id: "comm-1".into(),
        agent_id:         "vp".into(),
        kind:             "take_action".into(),
        confidence:       0.8,
        fallback_used:    false,
        sim_time_secs:    600,
        unix_time_secs:   DEFAULT_START_UNIX_SECS + 600,
    }
}

fn day_row() -> DaySummaryRow {
    DaySummaryRow {
        day:              0,
        unix_time_secs:   DEFAULT_START_UNIX_SECS + 61_200,
        avg_stress:       0.2,
        avg_workload:     0.4,
        avg_satisfaction: 0.7,
        agent_count:      2,
    }
}

// ── CSV backend ───────────────────────────────────────────────────────────────

mod csv_tests {
    use super::*;

    #[test]
    fn writes_headers_and_rows() {
        let dir = TempDir::new().unwrap();
        let mut writer = CsvWriter::new(dir.path()).unwrap();
        writer.write_responses(&[response_row(1), response_row(2)]).unwrap();
        writer.write_day_summary(&day_row()).unwrap();
        writer.finish().unwrap();
        writer.finish().unwrap(); // idempotent

        let responses = std::fs::read_to_string(dir.path().join("responses.csv")).unwrap();
        let mut lines = responses.lines();
        assert!(lines.next().unwrap().starts_with("response_id,communication_id"));
        assert_eq!(lines.count(), 2);
        assert!(responses.contains("resp-1,comm-1,vp,take_action,0.8,0"));

        let summaries = std::fs::read_to_string(dir.path().join("day_summaries.csv")).unwrap();
        assert_eq!(summaries.lines().count(), 2);
        assert!(summaries.contains("0.2,0.4,0.7,2"));
    }
}

// ── SQLite backend ────────────────────────────────────────────────────────────

#[cfg(feature = "sqlite")]
mod sqlite_tests {
    use super::*;
    use crate::SqliteWriter;

    #[test]
    fn round_trips_through_the_database() {
        let dir = TempDir::new().unwrap();
        let mut writer = SqliteWriter::new(dir.path()).unwrap();
        writer.write_responses(&[response_row(1)]).unwrap();
        writer.write_day_summary(&day_row()).unwrap();
        writer.finish().unwrap();

        let conn = rusqlite::Connection::open(dir.path().join("output.db")).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM responses", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
        let kind: String = conn
            .query_row("SELECT kind FROM responses", [], |r| r.get(0))
            .unwrap();
        assert_eq!(kind, "take_action");
        let days: i64 = conn
            .query_row("SELECT COUNT(*) FROM day_summaries", [], |r| r.get(0))
            .unwrap();
        assert_eq!(days, 1);
    }
}

// ── Observer bridge ───────────────────────────────────────────────────────────

mod observer_tests {
    use super::*;

    fn spec(id: &str) -> AgentSpec {
        AgentSpec {
            id:               id.into(),
            department:       "engineering".into(),
            role:             "contributor".into(),
            seniority:        2,
            expertise:        vec![],
            direct_reports:   vec![],
            capacity:         1.0,
            initial_workload: 0.3,
            personality:      PersonalitySpec { authority_response: 0.9, ..Default::default() },
        }
    }

    #[test]
    fn kernel_responses_stream_into_the_csv() {
        let dir = TempDir::new().unwrap();
        let writer = CsvWriter::new(dir.path()).unwrap();
        let observer = KernelOutputObserver::new(writer, DEFAULT_START_UNIX_SECS);
        let handle = observer.clone();

        let params = SimulationParameters {
            acceleration_factor:     None,
            communication_frequency: 0.0,
            random_seed:             Some(1),
            ..Default::default()
        };
        let kernel = KernelBuilder::new("acme")
            .params(params)
            .agents(vec![spec("ceo"), spec("vp")])
            .observer(Box::new(observer))
            .build()
            .unwrap();
        kernel.start().unwrap();
        kernel
            .send_communication(CommunicationDraft::new(
                "ceo",
                vec![AgentId::new("vp")],
                CommunicationKind::Nudge,
                "Q3 focus",
                "Please prioritise the Q3 initiative.",
            ))
            .unwrap();
        kernel.run_until_idle(SimDuration::from_days(2)).unwrap();
        kernel.stop().unwrap();

        assert!(handle.take_error().is_none());
        let responses = std::fs::read_to_string(dir.path().join("responses.csv")).unwrap();
        assert!(responses.contains("comm-1"), "{responses}");
        // At least one end-of-day summary was written before the stop.
        let summaries = std::fs::read_to_string(dir.path().join("day_summaries.csv")).unwrap();
        assert!(summaries.lines().count() >= 2);
    }
}
