use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Report ID format: `err_<ulid>`
pub type ReportId = String;

/// Mint a fresh report id. ULIDs are time-ordered, so ids sort by creation.
pub fn new_report_id() -> ReportId {
    format!("err_{}", ulid::Ulid::new().to_string().to_lowercase())
}

/// Current UTC time as RFC 3339, truncated to whole seconds.
pub fn now_rfc3339() -> String {
    let now = time::OffsetDateTime::now_utc()
        .replace_nanosecond(0)
        .expect("zero nanosecond is always valid");
    now.format(&time::format_description::well_known::Rfc3339)
        .expect("RFC3339 formatting should not fail")
}

/// What kind of failure a report describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Build,
    Runtime,
    Test,
    Dependency,
    Configuration,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Build,
        Category::Runtime,
        Category::Test,
        Category::Dependency,
        Category::Configuration,
    ];
}

impl Default for Category {
    fn default() -> Self {
        Category::Runtime
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Build => write!(f, "build"),
            Category::Runtime => write!(f, "runtime"),
            Category::Test => write!(f, "test"),
            Category::Dependency => write!(f, "dependency"),
            Category::Configuration => write!(f, "configuration"),
        }
    }
}

impl std::str::FromStr for Category {
    type Err = crate::RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "build" => Ok(Category::Build),
            "runtime" => Ok(Category::Runtime),
            "test" => Ok(Category::Test),
            "dependency" => Ok(Category::Dependency),
            "configuration" => Ok(Category::Configuration),
            other => Err(crate::RelayError::Validation(format!(
                "unknown category {other:?} (expected one of: build, runtime, test, dependency, configuration)"
            ))),
        }
    }
}

/// Severity of a report. Variant order is priority order: `Critical` sorts
/// first, so deriving `Ord` gives the queue its ranking for free.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    /// Numeric rank, 0 = highest priority.
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Critical => 0,
            Severity::High => 1,
            Severity::Medium => 2,
            Severity::Low => 3,
        }
    }
}

impl Default for Severity {
    fn default() -> Self {
        Severity::Medium
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Critical => write!(f, "critical"),
            Severity::High => write!(f, "high"),
            Severity::Medium => write!(f, "medium"),
            Severity::Low => write!(f, "low"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = crate::RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "critical" => Ok(Severity::Critical),
            "high" => Ok(Severity::High),
            "medium" => Ok(Severity::Medium),
            "low" => Ok(Severity::Low),
            other => Err(crate::RelayError::Validation(format!(
                "unknown severity {other:?} (expected one of: critical, high, medium, low)"
            ))),
        }
    }
}

/// Where a report is in its lifecycle.
///
/// `Resolved` and `Failed` are terminal; `Failed` may be re-claimed for a
/// retry, which moves the report back to `InProgress` under the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Pending,
    InProgress,
    Resolved,
    Failed,
}

impl Status {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Resolved | Status::Failed)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Pending => write!(f, "pending"),
            Status::InProgress => write!(f, "in_progress"),
            Status::Resolved => write!(f, "resolved"),
            Status::Failed => write!(f, "failed"),
        }
    }
}

/// A reference to a repository on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoRef {
    pub absolute_path: PathBuf,
    pub name: String,
    #[serde(rename = "remoteURL", default, skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,
}

/// The source (reporting) and target (owning) repositories of a report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repositories {
    pub source: RepoRef,
    pub target: RepoRef,
}
