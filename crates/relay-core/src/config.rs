use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables for the report store and resolution monitor.
///
/// Defaults here, per-repository overrides in `error_reports/config.json`,
/// environment overrides on top, per-invocation flags last.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default wall-clock budget for a blocking wait, in seconds.
    pub timeout_secs: u64,
    /// Default pause between status polls, in seconds.
    pub poll_interval_secs: u64,
    /// Floor for the poll interval, bounding CPU and disk use.
    pub min_poll_interval_ms: u64,
    /// Stack traces are capped at this many characters at create time.
    pub max_stack_trace_len: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout_secs: 300,
            poll_interval_secs: 5,
            min_poll_interval_ms: 1_000,
            max_stack_trace_len: 10_000,
        }
    }
}

impl Config {
    pub const ENV_TIMEOUT: &'static str = "RELAY_TIMEOUT_SECS";
    pub const ENV_POLL_INTERVAL: &'static str = "RELAY_POLL_INTERVAL_SECS";

    /// Overlay environment overrides. Unparsable values are ignored.
    pub fn apply_env(&mut self) {
        if let Some(v) = read_env_u64(Self::ENV_TIMEOUT) {
            self.timeout_secs = v;
        }
        if let Some(v) = read_env_u64(Self::ENV_POLL_INTERVAL) {
            self.poll_interval_secs = v;
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn min_poll_interval(&self) -> Duration {
        Duration::from_millis(self.min_poll_interval_ms)
    }
}

fn read_env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok()?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = Config::default();
        assert_eq!(c.timeout(), Duration::from_secs(300));
        assert_eq!(c.poll_interval(), Duration::from_secs(5));
        assert_eq!(c.min_poll_interval(), Duration::from_millis(1_000));
        assert_eq!(c.max_stack_trace_len, 10_000);
    }

    #[test]
    fn partial_config_json_fills_defaults() {
        let c: Config = serde_json::from_str(r#"{"timeout_secs": 60}"#).unwrap();
        assert_eq!(c.timeout_secs, 60);
        assert_eq!(c.poll_interval_secs, 5);
        assert_eq!(c.max_stack_trace_len, 10_000);
    }

    #[test]
    fn round_trips() {
        let c = Config {
            timeout_secs: 10,
            poll_interval_secs: 2,
            min_poll_interval_ms: 100,
            max_stack_trace_len: 64,
        };
        let json = serde_json::to_string(&c).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }
}
