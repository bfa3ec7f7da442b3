//! `orgsim-output` — result writers fed by kernel observer hooks.
//!
//! | Module       | Contents                                        |
//! |--------------|--------------------------------------------------|
//! | [`row`]      | `ResponseRow`, `DaySummaryRow`                  |
//! | [`writer`]   | `OutputWriter` trait                            |
//! | [`csv`]      | `CsvWriter`                                     |
//! | [`sqlite`]   | `SqliteWriter` (feature `sqlite`)               |
//! | [`observer`] | `KernelOutputObserver<W>`                       |
//!
//! The kernel itself persists nothing; attach a
//! [`KernelOutputObserver`] at build time to stream responses and day
//! summaries into CSV or SQLite as the simulation runs.

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod writer;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use crate::csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use observer::KernelOutputObserver;
pub use row::{DaySummaryRow, ResponseRow};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteWriter;
pub use writer::OutputWriter;
