use relay_store::{resolver, ReportStore};
use std::path::Path;

pub fn execute(
    repo_root: &Path,
    repo: Option<&str>,
    list_only: bool,
    json: bool,
) -> anyhow::Result<i32> {
    let target_root = resolver::resolve_target(repo_root, repo)?;
    let store = ReportStore::open(&target_root);
    let entries = store.queue().list()?;

    if json {
        for e in &entries {
            println!("{}", serde_json::to_string(e)?);
        }
        return Ok(0);
    }

    if entries.is_empty() {
        println!("No pending reports in {}", target_root.display());
        return Ok(0);
    }

    println!(
        "{} pending report(s) in {}:",
        entries.len(),
        target_root.display()
    );
    for e in &entries {
        println!(
            "  {:<8} {:<13} {}  {}",
            e.severity.to_string(),
            e.category.to_string(),
            e.created_at,
            e.id
        );
    }

    if !list_only {
        if let Some(next) = store.next_claimable()? {
            println!();
            println!(
                "Next: relay resolve {} --status resolved --notes \"...\"",
                next.id
            );
        }
    }
    Ok(0)
}
