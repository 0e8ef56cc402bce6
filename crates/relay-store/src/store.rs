use crate::lock::StoreLock;
use crate::paths::ReportPaths;
use crate::queue::PendingQueue;
use relay_core::report::Applied;
use relay_core::{
    Config, ErrorReport, PendingQueueEntry, RelayError, ReportDraft, Result, Status,
};
use std::path::{Path, PathBuf};

/// How many times a lost compare-and-swap is retried before surfacing
/// `Conflict` to the caller.
const CLAIM_RETRIES: usize = 3;

/// Result of a claim: the current report, and whether this caller won it.
/// A loser in a claim race gets `newly_claimed == false` and should pick
/// the next queue entry.
#[derive(Debug)]
pub struct Claimed {
    pub report: ErrorReport,
    pub newly_claimed: bool,
}

/// The durable report store of one target repository: report bodies under
/// `pending/` and `resolved/`, plus the pending queue index.
///
/// Reports move (never copy) from pending to resolved storage on a
/// terminal transition and are never deleted afterwards; the resolved
/// directory is the repository's append-only audit trail.
pub struct ReportStore {
    paths: ReportPaths,
    config: Config,
    queue: PendingQueue,
}

impl ReportStore {
    /// Open the store for a repository root, loading per-repo config
    /// overrides and the environment on top of the defaults.
    pub fn open(repo_root: impl Into<PathBuf>) -> Self {
        let paths = ReportPaths::discover(repo_root);
        let mut config = load_config(&paths);
        config.apply_env();
        Self::with_config(paths, config)
    }

    /// Open with an explicit config, skipping file and environment lookup.
    pub fn with_config(paths: ReportPaths, config: Config) -> Self {
        Self {
            queue: PendingQueue::new(paths.clone()),
            paths,
            config,
        }
    }

    pub fn paths(&self) -> &ReportPaths {
        &self.paths
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn queue(&self) -> &PendingQueue {
        &self.queue
    }

    /// Persist a new report and register it in the pending queue.
    ///
    /// Validation happens before any filesystem mutation. The report body
    /// is written first, the index second: a crash in between leaves a
    /// report without a queue entry, never an entry pointing at nothing.
    pub fn create(&self, draft: ReportDraft) -> Result<ErrorReport> {
        let report = ErrorReport::from_draft(draft, &self.config)?;
        self.paths.ensure_layout()?;
        self.write_report(&self.paths.pending_report(&report.id), &report)?;
        self.queue.enqueue(PendingQueueEntry::for_report(&report))?;
        tracing::debug!(id = %report.id, severity = %report.severity, target = %report.repositories.target.name, "created report");
        Ok(report)
    }

    /// Read a report, checking pending storage first, then resolved.
    pub fn get(&self, id: &str) -> Result<ErrorReport> {
        self.read_any(id).map(|(report, _)| report)
    }

    /// Mark a report `in_progress`, signaling exclusive intent to resolve
    /// it. No-op returning the current state if already claimed. Claiming
    /// a `failed` report is the retry path: the body moves back to pending
    /// storage and re-enters the queue under the same id.
    ///
    /// Optimistic concurrency: the revision observed before taking the
    /// lock must still match under it; a mismatch retries a bounded number
    /// of times. Two racing claimers: exactly one sees `newly_claimed`.
    pub fn claim(&self, id: &str) -> Result<Claimed> {
        for _ in 0..CLAIM_RETRIES {
            let (observed, _) = self.read_any(id)?;
            if observed.status == Status::InProgress {
                return Ok(Claimed {
                    report: observed,
                    newly_claimed: false,
                });
            }

            let lock = StoreLock::acquire(&self.paths)?;
            let (mut current, path) = self.read_any(id)?;
            if current.revision != observed.revision || current.status != observed.status {
                continue; // lost the race; retry against the fresh state
            }
            if !current.claim_transition()? {
                return Ok(Claimed {
                    report: current,
                    newly_claimed: false,
                });
            }
            current.revision += 1;

            let retrying = path == self.paths.resolved_report(id);
            self.write_report(&self.paths.pending_report(id), &current)?;
            if retrying {
                std::fs::remove_file(&path)?;
                match self
                    .queue
                    .enqueue_under_lock(PendingQueueEntry::for_report(&current), &lock)
                {
                    // A crash may have left the old entry behind; that is fine.
                    Err(RelayError::Duplicate(_)) | Ok(()) => {}
                    Err(e) => return Err(e),
                }
                tracing::debug!(id, "failed report re-entered the queue for retry");
            }
            tracing::debug!(id, "claimed report");
            return Ok(Claimed {
                report: current,
                newly_claimed: true,
            });
        }
        Err(RelayError::Conflict(id.to_string()))
    }

    /// `in_progress -> resolved`; archives the report.
    pub fn resolve(&self, id: &str, notes: &str) -> Result<ErrorReport> {
        self.finish(id, Status::Resolved, notes)
    }

    /// `in_progress -> failed`; archives the report, eligible for retry.
    pub fn fail(&self, id: &str, notes: &str) -> Result<ErrorReport> {
        self.finish(id, Status::Failed, notes)
    }

    fn finish(&self, id: &str, to: Status, notes: &str) -> Result<ErrorReport> {
        let lock = StoreLock::acquire(&self.paths)?;
        let (mut report, path) = self.read_any(id)?;
        let pending = self.paths.pending_report(id);

        match report.finish_transition(to, notes)? {
            Applied::Idempotent => {
                // A crash can leave a terminal body still under pending/;
                // finish the interrupted archival while we are here.
                if path == pending {
                    std::fs::rename(&pending, self.paths.resolved_report(id))?;
                    self.queue.dequeue_under_lock(id, &lock)?;
                }
                return Ok(report);
            }
            Applied::Changed => {}
        }

        report.revision += 1;
        self.write_report(&pending, &report)?;
        std::fs::rename(&pending, self.paths.resolved_report(id))?;
        self.queue.dequeue_under_lock(id, &lock)?;
        tracing::debug!(id, status = %to, "archived report");
        Ok(report)
    }

    /// Consumer-facing selection: the highest-priority queue entry whose
    /// report can still be claimed. Entries already `in_progress` are
    /// skipped, so the loser of a claim race lands on the next one.
    pub fn next_claimable(&self) -> Result<Option<PendingQueueEntry>> {
        for entry in self.queue.list()? {
            match self.get(&entry.id) {
                Ok(report) if report.status == Status::Pending => return Ok(Some(entry)),
                Ok(_) => continue,
                Err(RelayError::NotFound(_)) => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }

    fn read_any(&self, id: &str) -> Result<(ErrorReport, PathBuf)> {
        let pending = self.paths.pending_report(id);
        if pending.is_file() {
            return Ok((read_report(&pending)?, pending));
        }
        let resolved = self.paths.resolved_report(id);
        if resolved.is_file() {
            return Ok((read_report(&resolved)?, resolved));
        }
        Err(RelayError::NotFound(format!("report {id}")))
    }

    fn write_report(&self, path: &Path, report: &ErrorReport) -> Result<()> {
        let json = serde_json::to_string_pretty(report)?;
        crate::write_atomic(path, json.as_bytes())
    }
}

fn read_report(path: &Path) -> Result<ErrorReport> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Per-repo overrides from `error_reports/config.json`, over the defaults.
/// An unreadable file is ignored rather than blocking every operation.
fn load_config(paths: &ReportPaths) -> Config {
    if !paths.config_json.is_file() {
        return Config::default();
    }
    match std::fs::read_to_string(&paths.config_json)
        .map_err(|e| e.to_string())
        .and_then(|s| serde_json::from_str(&s).map_err(|e| e.to_string()))
    {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(path = %paths.config_json.display(), error = %e, "ignoring unreadable config");
            Config::default()
        }
    }
}
