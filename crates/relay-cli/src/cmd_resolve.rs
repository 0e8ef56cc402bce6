use relay_core::{RelayError, Status};
use relay_store::{resolver, ReportStore};
use std::path::Path;

pub fn execute(
    repo_root: &Path,
    id: &str,
    status: &str,
    notes: &str,
    target: Option<&str>,
) -> anyhow::Result<i32> {
    let to = match status {
        "resolved" => Status::Resolved,
        "failed" => Status::Failed,
        other => {
            return Err(RelayError::Validation(format!(
                "--status must be resolved or failed, got {other:?}"
            ))
            .into())
        }
    };

    let target_root = resolver::resolve_target(repo_root, target)?;
    let store = ReportStore::open(&target_root);

    // Claim first if nobody has; already-terminal reports go straight to
    // the store, which enforces idempotency against the audit history.
    let current = store.get(id)?;
    if current.status == Status::Pending {
        store.claim(id)?;
    }

    let report = match to {
        Status::Resolved => store.resolve(id, notes)?,
        Status::Failed => store.fail(id, notes)?,
        _ => unreachable!(),
    };
    println!(
        "{} {}: {}",
        report.id,
        report.status,
        report.latest_note_text().unwrap_or("")
    );
    Ok(0)
}
