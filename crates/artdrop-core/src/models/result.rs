use serde::{Deserialize, Serialize};

/// One problem file in the final run report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResultEntry {
    pub filename: String,
    pub message: String,
    /// True when the server flagged the file as a duplicate rather than a
    /// hard failure. Duplicate files still count as uploaded.
    pub duplicate: bool,
}

/// Aggregate outcome of one upload run.
///
/// Totals are tallied client-side from per-file outcomes so they always
/// agree with what the batch store recorded, even if a server's aggregate
/// counters drift.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResult {
    pub total_created: u32,
    pub total_warnings: u32,
    pub total_errors: u32,
    pub errors: Vec<UploadResultEntry>,
    pub message: String,
}

impl UploadResult {
    /// Human-readable one-line summary, also stored in `message`.
    pub fn summary(created: u32, warnings: u32, errors: u32) -> String {
        format!(
            "{} uploaded, {} duplicate warning(s), {} failed",
            created, warnings, errors
        )
    }

    pub fn is_clean(&self) -> bool {
        self.total_warnings == 0 && self.total_errors == 0
    }
}
