use clap::Subcommand;
use relay_core::{Config, RelayError};
use relay_store::ReportPaths;
use std::path::Path;

// ── CLI Schema ──

#[derive(Subcommand)]
pub enum ConfigCmd {
    /// Set a config value
    Set {
        /// Config key (e.g. timeout_secs)
        key: String,
        /// Numeric value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List effective config values (defaults plus overrides)
    List,
}

// ── Dispatch ──

pub fn run(cmd: ConfigCmd, repo_root: &Path) -> anyhow::Result<i32> {
    let paths = ReportPaths::discover(repo_root);
    match cmd {
        ConfigCmd::Set { key, value } => set(&paths, &key, &value),
        ConfigCmd::Get { key } => get(&paths, &key),
        ConfigCmd::List => list(&paths),
    }?;
    Ok(0)
}

// ── Command Implementations ──

const KEYS: [&str; 4] = [
    "timeout_secs",
    "poll_interval_secs",
    "min_poll_interval_ms",
    "max_stack_trace_len",
];

/// Read overrides from `error_reports/config.json`. Missing file or
/// non-object content is an empty override set.
fn read_overrides(paths: &ReportPaths) -> anyhow::Result<serde_json::Map<String, serde_json::Value>> {
    if !paths.config_json.exists() {
        return Ok(serde_json::Map::new());
    }
    let content = std::fs::read_to_string(&paths.config_json)?;
    match serde_json::from_str(&content)? {
        serde_json::Value::Object(map) => Ok(map),
        _ => Ok(serde_json::Map::new()),
    }
}

fn require_known_key(key: &str) -> anyhow::Result<()> {
    if KEYS.contains(&key) {
        return Ok(());
    }
    Err(RelayError::Validation(format!(
        "unknown config key {key:?} (expected one of: {})",
        KEYS.join(", ")
    ))
    .into())
}

/// `relay config set <key> <value>`
fn set(paths: &ReportPaths, key: &str, value: &str) -> anyhow::Result<()> {
    require_known_key(key)?;
    let n: u64 = value.parse().map_err(|_| {
        RelayError::Validation(format!("{key} takes a non-negative integer, got {value:?}"))
    })?;
    let mut overrides = read_overrides(paths)?;
    overrides.insert(key.to_string(), n.into());
    // Reject combinations the store would refuse to load.
    serde_json::from_value::<Config>(serde_json::Value::Object(overrides.clone()))?;
    paths.ensure_layout()?;
    let json = serde_json::to_string_pretty(&overrides)?;
    relay_store::write_atomic(&paths.config_json, json.as_bytes())?;
    println!("{key} = {value}");
    Ok(())
}

/// `relay config get <key>`
fn get(paths: &ReportPaths, key: &str) -> anyhow::Result<()> {
    require_known_key(key)?;
    let overrides = read_overrides(paths)?;
    match overrides.get(key) {
        Some(val) => println!("{val}"),
        None => println!("(not set)"),
    }
    Ok(())
}

/// `relay config list`
fn list(paths: &ReportPaths) -> anyhow::Result<()> {
    let overrides = read_overrides(paths)?;
    let defaults = serde_json::to_value(Config::default())?;
    for key in KEYS {
        match overrides.get(key) {
            Some(val) => println!("{key} = {val}"),
            None => println!("{key} = {} (default)", defaults[key]),
        }
    }
    Ok(())
}
