use crate::lock::StoreLock;
use crate::paths::ReportPaths;
use relay_core::{PendingQueueEntry, RelayError, Result};

/// The priority-ordered index of unresolved reports for one repository,
/// stored as a single JSON array in `pending.index`.
///
/// Mutations are read-modify-write under the store lock plus atomic
/// rename, so concurrent enqueues and dequeues never lose an update.
/// Reads take no lock.
pub struct PendingQueue {
    paths: ReportPaths,
}

impl PendingQueue {
    pub fn new(paths: ReportPaths) -> Self {
        Self { paths }
    }

    /// Raw index content, unsorted. Missing or empty file is an empty queue.
    fn read_index(&self) -> Result<Vec<PendingQueueEntry>> {
        if !self.paths.index_file.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.paths.index_file)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn write_index(&self, entries: &[PendingQueueEntry]) -> Result<()> {
        let json = serde_json::to_string_pretty(entries)?;
        crate::write_atomic(&self.paths.index_file, json.as_bytes())
    }

    /// Register a report in the queue. `Duplicate` if the id is already
    /// present.
    pub fn enqueue(&self, entry: PendingQueueEntry) -> Result<()> {
        let lock = StoreLock::acquire(&self.paths)?;
        self.enqueue_under_lock(entry, &lock)
    }

    /// Enqueue while the caller already holds the store lock.
    pub(crate) fn enqueue_under_lock(
        &self,
        entry: PendingQueueEntry,
        _lock: &StoreLock,
    ) -> Result<()> {
        let mut entries = self.read_index()?;
        if entries.iter().any(|e| e.id == entry.id) {
            return Err(RelayError::Duplicate(entry.id));
        }
        tracing::debug!(id = %entry.id, severity = %entry.severity, "enqueue");
        entries.push(entry);
        self.write_index(&entries)
    }

    /// Remove a report from the queue. No-op if absent, so cleanup after
    /// archival stays idempotent.
    pub fn dequeue(&self, id: &str) -> Result<()> {
        let lock = StoreLock::acquire(&self.paths)?;
        self.dequeue_under_lock(id, &lock)
    }

    pub(crate) fn dequeue_under_lock(&self, id: &str, _lock: &StoreLock) -> Result<()> {
        let mut entries = self.read_index()?;
        let before = entries.len();
        entries.retain(|e| e.id != id);
        if entries.len() != before {
            tracing::debug!(id, "dequeue");
            self.write_index(&entries)?;
        }
        Ok(())
    }

    /// Priority-sorted view of the queue: severity rank first (critical
    /// before high before medium before low), oldest first within a rank.
    ///
    /// Entries whose report file no longer exists (a crash between the two
    /// atomic writes of create/resolve) are pruned here before returning.
    pub fn list(&self) -> Result<Vec<PendingQueueEntry>> {
        let mut entries = self.read_index()?;
        let has_file =
            |e: &PendingQueueEntry| self.paths.storage_path(&e.storage_path).is_file();

        if entries.iter().any(|e| !has_file(e)) {
            // Re-check under the lock; a concurrent writer may have moved on.
            let lock = StoreLock::acquire(&self.paths)?;
            let fresh = self.read_index()?;
            let live: Vec<_> = fresh.into_iter().filter(|e| has_file(e)).collect();
            tracing::debug!(kept = live.len(), "pruned orphaned queue entries");
            self.write_index(&live)?;
            drop(lock);
            entries = live;
        }

        sort_entries(&mut entries);
        Ok(entries)
    }
}

/// Severity rank, then ascending `createdAt`, then id: the sole tie-break
/// rule, deterministic and stable. RFC 3339 UTC timestamps compare
/// lexicographically in chronological order.
pub fn sort_entries(entries: &mut [PendingQueueEntry]) {
    entries.sort_by(|a, b| {
        a.severity
            .cmp(&b.severity)
            .then_with(|| a.created_at.cmp(&b.created_at))
            .then_with(|| a.id.cmp(&b.id))
    });
}
