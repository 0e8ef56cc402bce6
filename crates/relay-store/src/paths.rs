use relay_core::Result;
use std::path::{Path, PathBuf};

/// All well-known paths under `<repo>/error_reports/`.
#[derive(Debug, Clone)]
pub struct ReportPaths {
    pub root: PathBuf,
    pub reports_dir: PathBuf,
    pub pending_dir: PathBuf,
    pub resolved_dir: PathBuf,
    pub index_file: PathBuf,
    pub lock_file: PathBuf,
    pub config_json: PathBuf,
}

impl ReportPaths {
    /// Derive all paths from a repo root. Pure computation, no I/O.
    pub fn discover(repo_root: impl Into<PathBuf>) -> Self {
        let root = repo_root.into();
        let reports_dir = root.join("error_reports");
        Self {
            pending_dir: reports_dir.join("pending"),
            resolved_dir: reports_dir.join("resolved"),
            index_file: reports_dir.join("pending.index"),
            lock_file: reports_dir.join("LOCK"),
            config_json: reports_dir.join("config.json"),
            reports_dir,
            root,
        }
    }

    /// Create the storage directories. Idempotent.
    pub fn ensure_layout(&self) -> Result<()> {
        for dir in [&self.reports_dir, &self.pending_dir, &self.resolved_dir] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    /// Check whether `error_reports/` exists.
    pub fn is_initialized(&self) -> bool {
        self.reports_dir.is_dir()
    }

    pub fn pending_report(&self, id: &str) -> PathBuf {
        self.pending_dir.join(format!("{id}.json"))
    }

    pub fn resolved_report(&self, id: &str) -> PathBuf {
        self.resolved_dir.join(format!("{id}.json"))
    }

    /// Resolve an index row's relative `storagePath` against this store.
    pub fn storage_path(&self, relative: &str) -> PathBuf {
        self.reports_dir.join(relative)
    }

    /// Walk up from `start` looking for a directory containing `error_reports/`.
    /// Returns `None` if not found.
    pub fn find_root(start: &Path) -> Option<PathBuf> {
        let mut cur = start.to_path_buf();
        loop {
            if cur.join("error_reports").is_dir() {
                return Some(cur);
            }
            if !cur.pop() {
                return None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discover_builds_correct_paths() {
        let p = ReportPaths::discover("/tmp/repo");
        assert_eq!(p.reports_dir, PathBuf::from("/tmp/repo/error_reports"));
        assert_eq!(
            p.pending_dir,
            PathBuf::from("/tmp/repo/error_reports/pending")
        );
        assert_eq!(
            p.resolved_dir,
            PathBuf::from("/tmp/repo/error_reports/resolved")
        );
        assert_eq!(
            p.index_file,
            PathBuf::from("/tmp/repo/error_reports/pending.index")
        );
        assert_eq!(p.lock_file, PathBuf::from("/tmp/repo/error_reports/LOCK"));
        assert_eq!(
            p.pending_report("err_a"),
            PathBuf::from("/tmp/repo/error_reports/pending/err_a.json")
        );
        assert_eq!(
            p.storage_path("pending/err_a.json"),
            PathBuf::from("/tmp/repo/error_reports/pending/err_a.json")
        );
    }

    #[test]
    fn ensure_layout_creates_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let p = ReportPaths::discover(tmp.path());
        assert!(!p.is_initialized());
        p.ensure_layout().unwrap();
        assert!(p.is_initialized());
        assert!(p.pending_dir.is_dir());
        assert!(p.resolved_dir.is_dir());
    }

    #[test]
    fn find_root_walks_up() {
        let tmp = tempfile::tempdir().unwrap();
        let p = ReportPaths::discover(tmp.path());
        p.ensure_layout().unwrap();
        let nested = tmp.path().join("src").join("deep");
        std::fs::create_dir_all(&nested).unwrap();
        let found = ReportPaths::find_root(&nested).unwrap();
        assert_eq!(found, tmp.path());
        assert!(ReportPaths::find_root(Path::new("/nonexistent/zzz")).is_none());
    }
}
