use crate::exit;
use relay_store::{monitor, resolver, ReportStore, WaitOptions, WaitOutcome};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub fn execute(
    repo_root: &Path,
    id: &str,
    target: Option<&str>,
    timeout: Option<u64>,
    poll_interval: Option<u64>,
) -> anyhow::Result<i32> {
    let target_root = resolver::resolve_target(repo_root, target)?;
    let store = ReportStore::open(&target_root);
    wait_and_report(&store, id, timeout, poll_interval)
}

/// Shared by `wait` and `report-error --wait`: block for the outcome and
/// translate it into an exit code. Ctrl-C cancels the wait at the next
/// poll without touching the report.
pub fn wait_and_report(
    store: &ReportStore,
    id: &str,
    timeout_secs: Option<u64>,
    poll_secs: Option<u64>,
) -> anyhow::Result<i32> {
    let opts = WaitOptions {
        timeout: timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| store.config().timeout()),
        poll_interval: poll_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| store.config().poll_interval()),
    };

    let cancel = Arc::new(AtomicBool::new(false));
    let flag = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed)) {
        eprintln!("warning: cannot install interrupt handler: {e}");
    }

    eprintln!(
        "Waiting for {id} (timeout {}s, poll every {}s, Ctrl-C to stop waiting)",
        opts.timeout.as_secs(),
        opts.poll_interval.as_secs()
    );
    match monitor::wait(store, id, opts, &cancel)? {
        WaitOutcome::Resolved(notes) => {
            println!("Resolved: {notes}");
            Ok(0)
        }
        WaitOutcome::Failed(notes) => {
            println!("Failed: {notes}");
            Ok(exit::REPORT_FAILED)
        }
        WaitOutcome::TimedOut => {
            println!("Timed out; the report stays queued for later inspection");
            Ok(exit::TIMED_OUT)
        }
        WaitOutcome::Cancelled => {
            println!("Cancelled; the report is untouched");
            Ok(exit::CANCELLED)
        }
    }
}
