//! `KernelOutputObserver<W>` — bridges the kernel observer to an
//! `OutputWriter`.

use std::sync::Arc;

use parking_lot::Mutex;

use orgsim_comms::{Communication, Response};
use orgsim_core::SimTime;
use orgsim_engine::SimObserver;
use orgsim_tracking::WorkforceSnapshot;

use crate::row::{DaySummaryRow, ResponseRow};
use crate::writer::OutputWriter;
use crate::OutputError;

struct ObserverState<W> {
    writer:     W,
    last_error: Option<OutputError>,
}

/// A [`SimObserver`] that writes responses and day summaries to any
/// [`OutputWriter`] backend (CSV, SQLite).
///
/// The kernel takes ownership of the observer it is built with, so the
/// writer sits behind a shared handle: clone the observer before handing it
/// over and use the clone to collect errors (and trigger a final flush)
/// after `stop()`.  Writer errors are stored internally because observer
/// hooks have no return value; only the first error is kept.
pub struct KernelOutputObserver<W: OutputWriter> {
    inner:           Arc<Mutex<ObserverState<W>>>,
    start_unix_secs: i64,
}

impl<W: OutputWriter> Clone for KernelOutputObserver<W> {
    fn clone(&self) -> Self {
        Self {
            inner:           Arc::clone(&self.inner),
            start_unix_secs: self.start_unix_secs,
        }
    }
}

impl<W: OutputWriter> KernelOutputObserver<W> {
    /// Create an observer backed by `writer`; `start_unix_secs` anchors the
    /// wall-clock columns (use the simulation parameters' value).
    pub fn new(writer: W, start_unix_secs: i64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ObserverState {
                writer,
                last_error: None,
            })),
            start_unix_secs,
        }
    }

    /// Take the stored write error (if any) after the simulation stopped.
    ///
    /// Returns `None` if all writes succeeded.
    pub fn take_error(&self) -> Option<OutputError> {
        self.inner.lock().last_error.take()
    }

    fn unix_time(&self, at: SimTime) -> i64 {
        self.start_unix_secs + at.0 as i64
    }

    fn store_err(state: &mut ObserverState<W>, result: crate::OutputResult<()>) {
        if let Err(e) = result {
            // Keep only the first error.
            if state.last_error.is_none() {
                state.last_error = Some(e);
            }
        }
    }
}

impl<W: OutputWriter> SimObserver for KernelOutputObserver<W> {
    fn on_response(&mut self, _comm: &Communication, response: &Response) {
        let row = ResponseRow {
            response_id:      response.id.as_str().to_owned(),
            communication_id: response.communication_id.as_str().to_owned(),
            agent_id:         response.agent_id.as_str().to_owned(),
            kind:             response.kind.label().to_owned(),
            confidence:       response.confidence,
            fallback_used:    response.fallback_used,
            sim_time_secs:    response.created_at.0,
            unix_time_secs:   self.unix_time(response.created_at),
        };
        let mut state = self.inner.lock();
        let result = state.writer.write_responses(std::slice::from_ref(&row));
        Self::store_err(&mut state, result);
    }

    fn on_day_end(&mut self, snapshot: &WorkforceSnapshot) {
        let row = DaySummaryRow {
            day:              snapshot.day,
            unix_time_secs:   self.unix_time(snapshot.at),
            avg_stress:       snapshot.avg_stress,
            avg_workload:     snapshot.avg_workload,
            avg_satisfaction: snapshot.avg_satisfaction,
            agent_count:      snapshot.agent_count as u64,
        };
        let mut state = self.inner.lock();
        let result = state.writer.write_day_summary(&row);
        Self::store_err(&mut state, result);
    }

    fn on_stop(&mut self, _at: SimTime) {
        let mut state = self.inner.lock();
        let result = state.writer.finish();
        Self::store_err(&mut state, result);
    }
}
