use relay_core::{RelayError, RepoRef, Result};
use std::path::{Path, PathBuf};

/// A target repository name is a plain sibling-directory name: ASCII
/// letters, digits, `.`, `_`, `-`, and never a `..` sequence. Everything
/// else (separators, traversal, empty) is rejected before any path is
/// computed. This is the sole defense against writing outside the parent
/// directory of the caller's repository.
pub fn is_valid_repo_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains("..")
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

/// Resolve the target repository for a report.
///
/// With no name, the target is the caller's own repository root. With a
/// name, the target is always `parent(caller_root)/name`: a sibling
/// directory, never an arbitrary path. The resolved path must exist, be a
/// directory, be a repository (contain `.git`), and be writable; each
/// precondition fails with its own error class. Validation only, nothing
/// is created here.
pub fn resolve_target(caller_root: &Path, name: Option<&str>) -> Result<PathBuf> {
    let target = match name {
        None => caller_root.to_path_buf(),
        Some(name) => {
            if !is_valid_repo_name(name) {
                return Err(RelayError::InvalidName {
                    name: name.to_string(),
                });
            }
            let parent = caller_root.parent().ok_or_else(|| {
                RelayError::NotFound(format!("parent directory of {}", caller_root.display()))
            })?;
            parent.join(name)
        }
    };
    validate_repo_dir(&target)?;
    Ok(target)
}

fn validate_repo_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(RelayError::NotFound(path.display().to_string()));
    }
    if !path.is_dir() {
        return Err(RelayError::NotADirectory(path.to_path_buf()));
    }
    // .git may be a directory or, for worktrees, a file.
    if !path.join(".git").exists() {
        return Err(RelayError::NotARepository(path.to_path_buf()));
    }
    if !is_writable(path) {
        return Err(RelayError::PermissionDenied(path.to_path_buf()));
    }
    Ok(())
}

#[cfg(unix)]
fn is_writable(path: &Path) -> bool {
    nix::unistd::access(path, nix::unistd::AccessFlags::W_OK).is_ok()
}

#[cfg(not(unix))]
fn is_writable(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|m| !m.permissions().readonly())
        .unwrap_or(false)
}

/// Build a `RepoRef` for a repository root.
pub fn repo_ref(root: &Path) -> RepoRef {
    let absolute = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
    let name = absolute
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| absolute.display().to_string());
    RepoRef {
        absolute_path: absolute,
        name,
        remote_url: None,
    }
}
