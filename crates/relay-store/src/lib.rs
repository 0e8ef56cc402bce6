pub mod lock;
pub mod monitor;
pub mod paths;
pub mod queue;
pub mod resolver;
pub mod store;

pub use lock::StoreLock;
pub use monitor::{wait, WaitOptions, WaitOutcome};
pub use paths::ReportPaths;
pub use queue::PendingQueue;
pub use store::{Claimed, ReportStore};

use relay_core::Result;
use std::io::Write;
use std::path::Path;

/// Atomic write: write to a temp file in the same directory, sync, then
/// rename over the target. Concurrent readers see either the old content
/// or the new, never a partial write.
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| std::io::Error::other(format!("no parent dir for {}", path.display())))?;
    std::fs::create_dir_all(parent)?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_atomic_creates_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("out.json");
        write_atomic(&path, b"{\"ok\":true}").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{\"ok\":true}");
    }

    #[test]
    fn write_atomic_replaces_existing_content() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("out.json");
        write_atomic(&path, b"old").unwrap();
        write_atomic(&path, b"new").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
    }

    #[test]
    fn write_atomic_leaves_no_temp_files() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("sub").join("out.json");
        write_atomic(&path, b"x").unwrap();
        let entries: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .collect::<std::io::Result<_>>()
            .unwrap();
        assert_eq!(entries.len(), 1);
    }
}
