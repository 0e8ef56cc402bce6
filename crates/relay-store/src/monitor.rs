use crate::store::ReportStore;
use relay_core::{Result, Status};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
pub struct WaitOptions {
    /// Wall-clock budget for the whole wait.
    pub timeout: Duration,
    /// Pause between polls; clamped to the store's configured minimum.
    pub poll_interval: Duration,
}

/// How a wait ended. Timing out is a caller-side giving-up, not a failure
/// of the report: the report is left exactly as it was. Cancellation
/// likewise has no side effect on the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome {
    Resolved(String),
    Failed(String),
    TimedOut,
    Cancelled,
}

/// Block until the report reaches a terminal state, the timeout elapses,
/// or `cancel` is raised.
///
/// Sleeps between polls and never holds the store lock, so any number of
/// waits can run concurrently against the same or different reports. The
/// cancel flag is honored at every poll boundary. A report that cannot be
/// found in either store surfaces `NotFound` immediately instead of
/// waiting out the timeout.
pub fn wait(
    store: &ReportStore,
    id: &str,
    opts: WaitOptions,
    cancel: &AtomicBool,
) -> Result<WaitOutcome> {
    let interval = opts.poll_interval.max(store.config().min_poll_interval());
    let started = Instant::now();
    loop {
        if cancel.load(Ordering::Relaxed) {
            return Ok(WaitOutcome::Cancelled);
        }

        let report = store.get(id)?;
        let notes = || report.latest_note_text().unwrap_or("").to_string();
        match report.status {
            Status::Resolved => return Ok(WaitOutcome::Resolved(notes())),
            Status::Failed => return Ok(WaitOutcome::Failed(notes())),
            Status::Pending | Status::InProgress => {}
        }

        let elapsed = started.elapsed();
        if elapsed >= opts.timeout {
            return Ok(WaitOutcome::TimedOut);
        }
        // Never oversleep the deadline; the final poll lands on it.
        std::thread::sleep(interval.min(opts.timeout - elapsed));
    }
}
