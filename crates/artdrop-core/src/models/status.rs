use serde::{Deserialize, Serialize};

/// Per-file lifecycle status.
///
/// Status is tracked separately from file metadata so that a status
/// transition never disturbs field values or validation state. Variants
/// that need context carry it inline; matching on this enum must stay
/// exhaustive so new states cannot be silently ignored.
///
/// Transitions: `Pending -> Checking -> (Warning | Blocked | Accepted)`,
/// then `Uploading -> (Accepted | Warning | Error)` during a run. A stale
/// similarity response reverts the file to `Pending` for a fresh check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum FileStatus {
    /// Newly added, not yet checked against the catalog.
    Pending,
    /// A similarity check is in flight.
    Checking,
    /// Probable duplicate; the user may dismiss and proceed.
    Warning { reason: String },
    /// Confirmed duplicate; excluded from upload until removed.
    Blocked { reason: String },
    /// Cleared for upload, or confirmed created after a run.
    Accepted,
    /// Part of the in-flight batch; `percent` is overall run progress.
    Uploading { percent: u8 },
    /// The upload attempt for this file failed.
    Error { message: String },
}

impl FileStatus {
    pub fn is_blocked(&self) -> bool {
        matches!(self, FileStatus::Blocked { .. })
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, FileStatus::Warning { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, FileStatus::Error { .. })
    }

    /// Short label for logs and CLI tables.
    pub fn label(&self) -> &'static str {
        match self {
            FileStatus::Pending => "pending",
            FileStatus::Checking => "checking",
            FileStatus::Warning { .. } => "warning",
            FileStatus::Blocked { .. } => "blocked",
            FileStatus::Accepted => "accepted",
            FileStatus::Uploading { .. } => "uploading",
            FileStatus::Error { .. } => "error",
        }
    }
}
