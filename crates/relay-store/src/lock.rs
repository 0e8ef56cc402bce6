use crate::paths::ReportPaths;
use fs2::FileExt;
use relay_core::Result;
use std::fs::{File, OpenOptions};

/// Exclusive per-repository lock backed by `error_reports/LOCK`.
///
/// Writers hold it across every read-modify-write of the queue index or a
/// report file; readers never take it and tolerate a slightly stale view.
/// Blocks until acquired; released when dropped.
pub struct StoreLock {
    _file: File,
}

impl StoreLock {
    pub fn acquire(paths: &ReportPaths) -> Result<Self> {
        if let Some(parent) = paths.lock_file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&paths.lock_file)?;
        file.lock_exclusive()?;
        Ok(Self { _file: file })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_and_drop() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = ReportPaths::discover(tmp.path());

        let lock = StoreLock::acquire(&paths).unwrap();
        assert!(paths.lock_file.exists());

        // A second handle cannot take the lock while the first is held.
        let probe = OpenOptions::new()
            .write(true)
            .open(&paths.lock_file)
            .unwrap();
        assert!(probe.try_lock_exclusive().is_err());

        drop(lock);
        assert!(probe.try_lock_exclusive().is_ok());
    }
}
