pub mod config;
pub mod error;
pub mod report;
pub mod sanitize;
pub mod types;

pub use config::Config;
pub use error::{RelayError, Result};
pub use report::{ErrorReport, PendingQueueEntry, ReportDraft, ResolutionNote};
pub use types::*;
