use relay_store::{resolver, ReportStore};
use std::path::Path;

pub fn execute(repo_root: &Path, id: &str, target: Option<&str>) -> anyhow::Result<i32> {
    let target_root = resolver::resolve_target(repo_root, target)?;
    let store = ReportStore::open(&target_root);
    let report = store.get(id)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(0)
}
