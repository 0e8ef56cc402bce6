use crate::config::Config;
use crate::error::{RelayError, Result};
use crate::sanitize::{scrub_secrets, scrub_stack_trace};
use crate::types::{
    new_report_id, now_rfc3339, Category, ReportId, Repositories, Severity, Status,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One entry in a report's resolution history. History is append-only: a
/// retried report keeps the notes of every earlier attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionNote {
    pub at: String,
    pub status: Status,
    pub text: String,
}

/// The unit of work: one durable error report owned by a target repository.
///
/// Wire format is camelCase JSON; fields this version does not know about
/// are carried in `extra` and written back untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
    pub id: ReportId,
    pub created_at: String,
    pub category: Category,
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub affected_files: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub affected_modules: BTreeSet<String>,
    /// Opaque task context (agent id, task description, command). Passed
    /// through, never interpreted.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub context: serde_json::Map<String, serde_json::Value>,
    pub repositories: Repositories,
    pub status: Status,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resolution_notes: Vec<ResolutionNote>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_at: Option<String>,
    /// Modification marker, bumped on every write. Compare-and-swap token
    /// for optimistic claims.
    #[serde(default)]
    pub revision: u64,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// What a reporter supplies; `create` fills in the rest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDraft {
    #[serde(default)]
    pub id: Option<ReportId>,
    #[serde(default)]
    pub created_at: Option<String>,
    pub category: Category,
    pub severity: Severity,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub stack_trace: Option<String>,
    #[serde(default)]
    pub affected_files: Vec<String>,
    #[serde(default)]
    pub affected_modules: BTreeSet<String>,
    #[serde(default)]
    pub context: serde_json::Map<String, serde_json::Value>,
    pub repositories: Repositories,
}

/// Whether a terminal transition changed anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Changed,
    /// Same terminal status, identical notes: nothing to do.
    Idempotent,
}

impl ErrorReport {
    /// Build a validated report from a draft. Sanitizes the message and
    /// stack trace and caps the trace; no filesystem is touched here, so a
    /// validation failure mutates nothing.
    pub fn from_draft(draft: ReportDraft, config: &Config) -> Result<Self> {
        if draft.message.trim().is_empty() {
            return Err(RelayError::Validation("message is required".to_string()));
        }
        let target = &draft.repositories.target;
        if target.absolute_path.as_os_str().is_empty() || target.name.is_empty() {
            return Err(RelayError::Validation(
                "repositories.target is required".to_string(),
            ));
        }

        Ok(Self {
            id: draft.id.unwrap_or_else(new_report_id),
            created_at: draft.created_at.unwrap_or_else(now_rfc3339),
            category: draft.category,
            severity: draft.severity,
            message: scrub_secrets(&draft.message),
            stack_trace: draft
                .stack_trace
                .map(|t| scrub_stack_trace(&t, config.max_stack_trace_len)),
            affected_files: draft.affected_files,
            affected_modules: draft.affected_modules,
            context: draft.context,
            repositories: draft.repositories,
            status: Status::Pending,
            resolution_notes: Vec::new(),
            resolved_at: None,
            failed_at: None,
            revision: 0,
            extra: serde_json::Map::new(),
        })
    }

    /// `pending|failed -> in_progress`. Returns `true` if the status
    /// changed, `false` for the in-progress no-op. Claiming a `failed`
    /// report is the retry path: it clears `failedAt` but keeps the notes
    /// of the earlier attempt.
    pub fn claim_transition(&mut self) -> Result<bool> {
        match self.status {
            Status::Pending => {
                self.status = Status::InProgress;
                Ok(true)
            }
            Status::Failed => {
                self.status = Status::InProgress;
                self.failed_at = None;
                Ok(true)
            }
            Status::InProgress => Ok(false),
            Status::Resolved => Err(RelayError::InvalidTransition {
                id: self.id.clone(),
                from: self.status.to_string(),
                to: Status::InProgress.to_string(),
            }),
        }
    }

    /// `in_progress -> resolved|failed`. Stamps the matching terminal
    /// timestamp and appends a resolution note. Re-running the identical
    /// transition is idempotent; anything else against a terminal report
    /// is `AlreadyResolved`.
    pub fn finish_transition(&mut self, to: Status, notes: &str) -> Result<Applied> {
        debug_assert!(to.is_terminal());
        match self.status {
            Status::InProgress => {
                let now = now_rfc3339();
                self.status = to;
                match to {
                    Status::Resolved => self.resolved_at = Some(now.clone()),
                    Status::Failed => self.failed_at = Some(now.clone()),
                    _ => unreachable!("finish_transition only targets terminal states"),
                }
                self.resolution_notes.push(ResolutionNote {
                    at: now,
                    status: to,
                    text: notes.to_string(),
                });
                Ok(Applied::Changed)
            }
            current if current.is_terminal() => {
                if current == to && self.latest_note_text() == Some(notes) {
                    Ok(Applied::Idempotent)
                } else {
                    Err(RelayError::AlreadyResolved {
                        id: self.id.clone(),
                        status: current.to_string(),
                    })
                }
            }
            Status::Pending => Err(RelayError::InvalidTransition {
                id: self.id.clone(),
                from: Status::Pending.to_string(),
                to: to.to_string(),
            }),
            _ => unreachable!(),
        }
    }

    /// Text of the most recent resolution note, if any.
    pub fn latest_note_text(&self) -> Option<&str> {
        self.resolution_notes.last().map(|n| n.text.as_str())
    }
}

/// A lightweight index row referencing a report. The queue never duplicates
/// report bodies; these rows exist so listing does not read every file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingQueueEntry {
    pub id: ReportId,
    pub created_at: String,
    pub category: Category,
    pub severity: Severity,
    /// Path relative to the `error_reports/` root.
    pub storage_path: String,
}

impl PendingQueueEntry {
    pub fn for_report(report: &ErrorReport) -> Self {
        Self {
            id: report.id.clone(),
            created_at: report.created_at.clone(),
            category: report.category,
            severity: report.severity,
            storage_path: format!("pending/{}.json", report.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RepoRef;
    use std::path::PathBuf;

    fn repos() -> Repositories {
        Repositories {
            source: RepoRef {
                absolute_path: PathBuf::from("/work/api"),
                name: "api".to_string(),
                remote_url: None,
            },
            target: RepoRef {
                absolute_path: PathBuf::from("/work/shared-lib"),
                name: "shared-lib".to_string(),
                remote_url: None,
            },
        }
    }

    fn draft() -> ReportDraft {
        ReportDraft {
            category: Category::Build,
            severity: Severity::High,
            message: "cannot find symbol parse_frame".to_string(),
            repositories: repos(),
            ..Default::default()
        }
    }

    #[test]
    fn from_draft_assigns_id_created_at_and_pending() {
        let r = ErrorReport::from_draft(draft(), &Config::default()).unwrap();
        assert!(r.id.starts_with("err_"));
        assert!(!r.created_at.is_empty());
        assert_eq!(r.status, Status::Pending);
        assert_eq!(r.revision, 0);
        assert!(r.resolved_at.is_none() && r.failed_at.is_none());
        assert!(r.resolution_notes.is_empty());
    }

    #[test]
    fn from_draft_keeps_supplied_id() {
        let mut d = draft();
        d.id = Some("err_fixed".to_string());
        d.created_at = Some("2026-08-01T00:00:00Z".to_string());
        let r = ErrorReport::from_draft(d, &Config::default()).unwrap();
        assert_eq!(r.id, "err_fixed");
        assert_eq!(r.created_at, "2026-08-01T00:00:00Z");
    }

    #[test]
    fn from_draft_rejects_empty_message() {
        let mut d = draft();
        d.message = "  ".to_string();
        let err = ErrorReport::from_draft(d, &Config::default()).unwrap_err();
        assert!(matches!(err, RelayError::Validation(_)));
    }

    #[test]
    fn from_draft_rejects_missing_target() {
        let mut d = draft();
        d.repositories.target.absolute_path = PathBuf::new();
        let err = ErrorReport::from_draft(d, &Config::default()).unwrap_err();
        assert!(matches!(err, RelayError::Validation(_)));
    }

    #[test]
    fn from_draft_scrubs_and_caps() {
        let mut d = draft();
        d.message = "auth failed: API_TOKEN=abc123".to_string();
        d.stack_trace = Some("x".repeat(500));
        let cfg = Config {
            max_stack_trace_len: 64,
            ..Config::default()
        };
        let r = ErrorReport::from_draft(d, &cfg).unwrap();
        assert!(!r.message.contains("abc123"));
        assert_eq!(r.stack_trace.as_ref().unwrap().chars().count(), 64);
    }

    #[test]
    fn claim_from_pending_and_noop_when_in_progress() {
        let mut r = ErrorReport::from_draft(draft(), &Config::default()).unwrap();
        assert!(r.claim_transition().unwrap());
        assert_eq!(r.status, Status::InProgress);
        assert!(!r.claim_transition().unwrap());
        assert_eq!(r.status, Status::InProgress);
    }

    #[test]
    fn claim_of_resolved_is_rejected() {
        let mut r = ErrorReport::from_draft(draft(), &Config::default()).unwrap();
        r.claim_transition().unwrap();
        r.finish_transition(Status::Resolved, "fixed import path").unwrap();
        assert!(matches!(
            r.claim_transition(),
            Err(RelayError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn resolve_stamps_exactly_one_terminal_timestamp() {
        let mut r = ErrorReport::from_draft(draft(), &Config::default()).unwrap();
        r.claim_transition().unwrap();
        r.finish_transition(Status::Resolved, "fixed").unwrap();
        assert!(r.resolved_at.is_some());
        assert!(r.failed_at.is_none());
        assert_eq!(r.latest_note_text(), Some("fixed"));

        let mut r = ErrorReport::from_draft(draft(), &Config::default()).unwrap();
        r.claim_transition().unwrap();
        r.finish_transition(Status::Failed, "no repro").unwrap();
        assert!(r.resolved_at.is_none());
        assert!(r.failed_at.is_some());
    }

    #[test]
    fn finish_is_idempotent_for_identical_notes_only() {
        let mut r = ErrorReport::from_draft(draft(), &Config::default()).unwrap();
        r.claim_transition().unwrap();
        assert_eq!(
            r.finish_transition(Status::Resolved, "fixed").unwrap(),
            Applied::Changed
        );
        assert_eq!(
            r.finish_transition(Status::Resolved, "fixed").unwrap(),
            Applied::Idempotent
        );
        assert_eq!(r.resolution_notes.len(), 1);
        assert!(matches!(
            r.finish_transition(Status::Resolved, "different"),
            Err(RelayError::AlreadyResolved { .. })
        ));
        assert!(matches!(
            r.finish_transition(Status::Failed, "fixed"),
            Err(RelayError::AlreadyResolved { .. })
        ));
    }

    #[test]
    fn finish_from_pending_is_rejected() {
        let mut r = ErrorReport::from_draft(draft(), &Config::default()).unwrap();
        assert!(matches!(
            r.finish_transition(Status::Resolved, "n"),
            Err(RelayError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn retry_appends_notes_and_clears_failed_at() {
        let mut r = ErrorReport::from_draft(draft(), &Config::default()).unwrap();
        r.claim_transition().unwrap();
        r.finish_transition(Status::Failed, "flaky, could not repro").unwrap();
        assert!(r.claim_transition().unwrap());
        assert_eq!(r.status, Status::InProgress);
        assert!(r.failed_at.is_none());
        r.finish_transition(Status::Resolved, "raced on init, fixed").unwrap();
        assert_eq!(r.resolution_notes.len(), 2);
        assert_eq!(r.resolution_notes[0].status, Status::Failed);
        assert_eq!(r.latest_note_text(), Some("raced on init, fixed"));
        assert!(r.resolved_at.is_some());
        assert!(r.failed_at.is_none());
    }

    #[test]
    fn wire_format_is_camel_case() {
        let r = ErrorReport::from_draft(draft(), &Config::default()).unwrap();
        let json = serde_json::to_value(&r).unwrap();
        assert!(json.get("createdAt").is_some());
        assert!(json.get("created_at").is_none());
        assert_eq!(json["status"], "pending");
        assert_eq!(json["repositories"]["target"]["name"], "shared-lib");
    }

    #[test]
    fn round_trip_preserves_unknown_fields() {
        let r = ErrorReport::from_draft(draft(), &Config::default()).unwrap();
        let mut json = serde_json::to_value(&r).unwrap();
        json.as_object_mut().unwrap().insert(
            "triageHint".to_string(),
            serde_json::json!({"assignee": "bot-7"}),
        );
        let back: ErrorReport = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(back.extra["triageHint"]["assignee"], "bot-7");
        let rewritten = serde_json::to_value(&back).unwrap();
        assert_eq!(rewritten["triageHint"]["assignee"], "bot-7");
        assert_eq!(rewritten["id"], json["id"]);
    }

    #[test]
    fn queue_entry_references_pending_storage() {
        let r = ErrorReport::from_draft(draft(), &Config::default()).unwrap();
        let e = PendingQueueEntry::for_report(&r);
        assert_eq!(e.id, r.id);
        assert_eq!(e.severity, r.severity);
        assert_eq!(e.storage_path, format!("pending/{}.json", r.id));
        let json = serde_json::to_value(&e).unwrap();
        assert!(json.get("storagePath").is_some());
    }
}
