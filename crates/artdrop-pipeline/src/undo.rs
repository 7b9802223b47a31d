//! Single-slot undo stash for removed files.
//!
//! Removing a file parks its full state here instead of dropping it. The
//! slot holds at most one entry: removing a second file permanently drops
//! the first. Each entry carries an epoch so that the expiry timer of a
//! replaced stash cannot evict its successor.

use std::time::Duration;

use tokio::time::Instant;

use artdrop_core::models::{FieldValidation, FileStatus, UploadFile};

use crate::preview::Preview;

/// Everything needed to restore a removed file exactly as it was.
#[derive(Debug)]
pub struct UndoEntry {
    pub file: UploadFile,
    pub status: FileStatus,
    pub validation: FieldValidation,
    pub preview: Option<Preview>,
    /// Monotonic stash counter; the expiry timer only fires for its own epoch.
    pub epoch: u64,
    pub stashed_at: Instant,
}

impl UndoEntry {
    /// Time left before the undo window closes, clamped at zero.
    pub fn remaining(&self, window: Duration) -> Duration {
        window.saturating_sub(self.stashed_at.elapsed())
    }
}
