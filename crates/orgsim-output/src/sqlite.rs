//! SQLite output backend (feature `sqlite`).
//!
//! Creates a single `output.db` file in the configured output directory with
//! two tables: `responses` and `day_summaries`.

use std::path::Path;

use rusqlite::Connection;

use crate::writer::OutputWriter;
use crate::{DaySummaryRow, OutputResult, ResponseRow};

/// Writes simulation output to an SQLite database.
pub struct SqliteWriter {
    conn:     Connection,
    finished: bool,
}

impl SqliteWriter {
    /// Open (or create) `output.db` in `dir` and initialise the schema.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let conn = Connection::open(dir.join("output.db"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous  = NORMAL;
             CREATE TABLE IF NOT EXISTS responses (
                 response_id      TEXT NOT NULL,
                 communication_id TEXT NOT NULL,
                 agent_id         TEXT NOT NULL,
                 kind             TEXT NOT NULL,
                 confidence       REAL NOT NULL,
                 fallback_used    INTEGER NOT NULL,
                 sim_time_secs    INTEGER NOT NULL,
                 unix_time_secs   INTEGER NOT NULL
             );
             CREATE TABLE IF NOT EXISTS day_summaries (
                 day              INTEGER PRIMARY KEY,
                 unix_time_secs   INTEGER NOT NULL,
                 avg_stress       REAL NOT NULL,
                 avg_workload     REAL NOT NULL,
                 avg_satisfaction REAL NOT NULL,
                 agent_count      INTEGER NOT NULL
             );",
        )?;

        Ok(Self { conn, finished: false })
    }
}

impl OutputWriter for SqliteWriter {
    fn write_responses(&mut self, rows: &[ResponseRow]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO responses \
                 (response_id, communication_id, agent_id, kind, confidence, \
                  fallback_used, sim_time_secs, unix_time_secs) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for row in rows {
                stmt.execute(rusqlite::params![
                    row.response_id,
                    row.communication_id,
                    row.agent_id,
                    row.kind,
                    row.confidence,
                    row.fallback_used as i64,
                    row.sim_time_secs as i64,
                    row.unix_time_secs,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn write_day_summary(&mut self, row: &DaySummaryRow) -> OutputResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO day_summaries \
             (day, unix_time_secs, avg_stress, avg_workload, avg_satisfaction, agent_count) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                row.day as i64,
                row.unix_time_secs,
                row.avg_stress,
                row.avg_workload,
                row.avg_satisfaction,
                row.agent_count as i64,
            ],
        )?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    }
}
