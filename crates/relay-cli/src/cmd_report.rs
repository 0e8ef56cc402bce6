use crate::cmd_wait;
use relay_core::{Category, ReportDraft, Repositories, Severity};
use relay_store::{resolver, ReportStore};
use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

pub struct ReportParams<'a> {
    pub repo_root: &'a Path,
    pub target: Option<&'a str>,
    pub message: &'a str,
    pub category: &'a str,
    pub severity: &'a str,
    pub stack_trace: Option<&'a str>,
    pub stack_trace_file: Option<&'a Path>,
    pub files: Vec<String>,
    pub modules: Vec<String>,
    pub context: &'a [String],
    pub wait: bool,
    pub timeout: Option<u64>,
    pub poll_interval: Option<u64>,
}

pub fn execute(p: ReportParams<'_>) -> anyhow::Result<i32> {
    let category: Category = p.category.parse()?;
    let severity: Severity = p.severity.parse()?;
    let context = parse_context(p.context)?;
    let stack_trace = read_stack_trace(p.stack_trace, p.stack_trace_file)?;

    let target_root = resolver::resolve_target(p.repo_root, p.target)?;
    let store = ReportStore::open(&target_root);

    let draft = ReportDraft {
        category,
        severity,
        message: p.message.to_string(),
        stack_trace,
        affected_files: p.files,
        affected_modules: p.modules.into_iter().collect::<BTreeSet<_>>(),
        context,
        repositories: Repositories {
            source: resolver::repo_ref(p.repo_root),
            target: resolver::repo_ref(&target_root),
        },
        ..Default::default()
    };
    let report = store.create(draft)?;
    println!(
        "Created {} ({severity} {category}) in {}",
        report.id, report.repositories.target.name
    );

    if p.wait {
        cmd_wait::wait_and_report(&store, &report.id, p.timeout, p.poll_interval)
    } else {
        Ok(0)
    }
}

/// Parse repeated `--context key=value` pairs into the opaque context bag.
fn parse_context(pairs: &[String]) -> anyhow::Result<serde_json::Map<String, serde_json::Value>> {
    let mut map = serde_json::Map::new();
    for pair in pairs {
        let (key, value) = pair.split_once('=').ok_or_else(|| {
            anyhow::anyhow!("context must be key=value, got {pair:?}")
        })?;
        map.insert(
            key.to_string(),
            serde_json::Value::String(value.to_string()),
        );
    }
    Ok(map)
}

/// Stack trace from `--stack-trace-file`, or `--stack-trace` ("-" = stdin).
fn read_stack_trace(
    literal: Option<&str>,
    file: Option<&Path>,
) -> anyhow::Result<Option<String>> {
    if let Some(path) = file {
        return Ok(Some(std::fs::read_to_string(path)?));
    }
    match literal {
        Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(Some(buf))
        }
        Some(text) => Ok(Some(text.to_string())),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_pairs_parse() {
        let pairs = vec![
            "agent=builder-3".to_string(),
            "task=compile shared-lib".to_string(),
            "cmd=cargo build".to_string(),
        ];
        let map = parse_context(&pairs).unwrap();
        assert_eq!(map["agent"], "builder-3");
        assert_eq!(map["task"], "compile shared-lib");
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn context_values_may_contain_equals() {
        let map = parse_context(&["env=RUST_LOG=debug".to_string()]).unwrap();
        assert_eq!(map["env"], "RUST_LOG=debug");
    }

    #[test]
    fn context_without_equals_is_rejected() {
        assert!(parse_context(&["agentless".to_string()]).is_err());
    }

    #[test]
    fn stack_trace_from_file_wins() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("trace.txt");
        std::fs::write(&path, "at frame 0").unwrap();
        let trace = read_stack_trace(Some("ignored"), Some(&path)).unwrap();
        assert_eq!(trace.as_deref(), Some("at frame 0"));
    }

    #[test]
    fn literal_stack_trace_passes_through() {
        let trace = read_stack_trace(Some("at frame 1"), None).unwrap();
        assert_eq!(trace.as_deref(), Some("at frame 1"));
        assert_eq!(read_stack_trace(None, None).unwrap(), None);
    }
}
