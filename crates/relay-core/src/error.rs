use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, RelayError>;

/// Every failure class the queue can surface, one variant per class so
/// callers (and the CLI exit-code map) can branch on it.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Bad input caught before any filesystem mutation.
    #[error("invalid report: {0}")]
    Validation(String),

    /// Repository name failed the sibling-only naming rule.
    #[error("invalid repository name {name:?}: only [A-Za-z0-9._-] names without \"..\" are allowed")]
    InvalidName { name: String },

    /// A report id or repository path that does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    #[error("target exists but is not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The target directory carries no version-control metadata.
    #[error("not a repository (no .git): {0}")]
    NotARepository(PathBuf),

    #[error("target repository is not writable: {0}")]
    PermissionDenied(PathBuf),

    /// Enqueue of an id that is already queued.
    #[error("report {0} is already queued")]
    Duplicate(String),

    /// A concurrent writer won every compare-and-swap attempt.
    #[error("concurrent modification of report {0}, giving up after retries")]
    Conflict(String),

    /// Second terminal transition with different notes; audit history is
    /// never overwritten.
    #[error("report {id} already {status}, refusing to overwrite its resolution")]
    AlreadyResolved { id: String, status: String },

    #[error("report {id} cannot go from {from} to {to}")]
    InvalidTransition {
        id: String,
        from: String,
        to: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("malformed record: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_failed_precondition() {
        let e = RelayError::InvalidName {
            name: "../etc".to_string(),
        };
        assert!(e.to_string().contains("../etc"));

        let e = RelayError::NotARepository(PathBuf::from("/tmp/scratch"));
        assert!(e.to_string().contains(".git"));
        assert!(e.to_string().contains("/tmp/scratch"));

        let e = RelayError::AlreadyResolved {
            id: "err_x".to_string(),
            status: "resolved".to_string(),
        };
        assert!(e.to_string().contains("err_x"));
        assert!(e.to_string().contains("refusing to overwrite"));
    }

    #[test]
    fn io_errors_convert() {
        fn read() -> Result<String> {
            Ok(std::fs::read_to_string("/definitely/not/here")?)
        }
        assert!(matches!(read(), Err(RelayError::Io(_))));
    }
}
