//! The `OutputWriter` trait implemented by all backend writers.

use crate::{DaySummaryRow, OutputResult, ResponseRow};

/// Trait implemented by the CSV and SQLite writers.
///
/// All methods are infallible from the observer's perspective — errors are
/// stored internally and retrieved with
/// [`KernelOutputObserver::take_error`][crate::KernelOutputObserver::take_error].
pub trait OutputWriter: Send {
    /// Write a batch of response rows.
    fn write_responses(&mut self, rows: &[ResponseRow]) -> OutputResult<()>;

    /// Write one end-of-day summary row.
    fn write_day_summary(&mut self, row: &DaySummaryRow) -> OutputResult<()>;

    /// Flush and close all underlying handles.
    ///
    /// Idempotent — safe to call more than once.
    fn finish(&mut self) -> OutputResult<()>;
}
