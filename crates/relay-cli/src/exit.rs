use relay_core::RelayError;

/// Exit code for a wait that observed a terminal `failed` report.
pub const REPORT_FAILED: i32 = 8;
/// Exit code for a wait that gave up before resolution.
pub const TIMED_OUT: i32 = 9;
/// Conventional interrupt exit for a cancelled wait.
pub const CANCELLED: i32 = 130;

/// One exit code per failure class, so agent tooling can branch on the
/// code instead of parsing messages.
pub fn code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<RelayError>() {
        Some(RelayError::Validation(_) | RelayError::InvalidName { .. }) => 2,
        Some(RelayError::NotFound(_)) => 3,
        Some(RelayError::NotADirectory(_) | RelayError::NotARepository(_)) => 4,
        Some(RelayError::PermissionDenied(_)) => 5,
        Some(RelayError::Duplicate(_) | RelayError::Conflict(_)) => 6,
        Some(RelayError::AlreadyResolved { .. } | RelayError::InvalidTransition { .. }) => 7,
        Some(RelayError::Io(_) | RelayError::Json(_)) | None => 1,
    }
}
