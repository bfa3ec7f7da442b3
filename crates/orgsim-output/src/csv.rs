//! CSV output backend.
//!
//! Creates two files in the configured output directory:
//! - `responses.csv`
//! - `day_summaries.csv`

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::writer::OutputWriter;
use crate::{DaySummaryRow, OutputResult, ResponseRow};

/// Writes simulation output to two CSV files.
pub struct CsvWriter {
    responses: Writer<File>,
    summaries: Writer<File>,
    finished:  bool,
}

impl CsvWriter {
    /// Open (or create) the two CSV files in `dir` and write the header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let mut responses = Writer::from_path(dir.join("responses.csv"))?;
        responses.write_record([
            "response_id",
            "communication_id",
            "agent_id",
            "kind",
            "confidence",
            "fallback_used",
            "sim_time_secs",
            "unix_time_secs",
        ])?;

        let mut summaries = Writer::from_path(dir.join("day_summaries.csv"))?;
        summaries.write_record([
            "day",
            "unix_time_secs",
            "avg_stress",
            "avg_workload",
            "avg_satisfaction",
            "agent_count",
        ])?;

        Ok(Self {
            responses,
            summaries,
            finished: false,
        })
    }
}

impl OutputWriter for CsvWriter {
    fn write_responses(&mut self, rows: &[ResponseRow]) -> OutputResult<()> {
        for row in rows {
            self.responses.write_record(&[
                row.response_id.clone(),
                row.communication_id.clone(),
                row.agent_id.clone(),
                row.kind.clone(),
                row.confidence.to_string(),
                (row.fallback_used as u8).to_string(),
                row.sim_time_secs.to_string(),
                row.unix_time_secs.to_string(),
            ])?;
        }
        Ok(())
    }

    fn write_day_summary(&mut self, row: &DaySummaryRow) -> OutputResult<()> {
        self.summaries.write_record(&[
            row.day.to_string(),
            row.unix_time_secs.to_string(),
            row.avg_stress.to_string(),
            row.avg_workload.to_string(),
            row.avg_satisfaction.to_string(),
            row.agent_count.to_string(),
        ])?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.responses.flush()?;
        self.summaries.flush()?;
        Ok(())
    }
}
