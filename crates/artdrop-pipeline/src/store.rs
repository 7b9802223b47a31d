//! Shared state store for the upload batch.
//!
//! [`BatchStore`] owns every file in the session: payloads, editable
//! character metadata, per-file status, validation state, previews, the
//! uploaded set, and the single undo slot. It is a cheap-to-clone handle
//! around one `Arc<RwLock<_>>`; multiple async tasks can read
//! simultaneously while mutations are serialized. Every externally
//! observable change is published on the session's [`PipelineNotifier`].

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::RwLock;
use tokio::time::Instant;
use uuid::Uuid;

use artdrop_core::models::{
    BulkDefaults, BulkField, FieldValidation, FileStatus, MetadataField, MetadataPatch,
    SimilarityRequest, UploadFile, UploadResult,
};
use artdrop_core::validation::sanitize_filename;
use artdrop_core::{AppError, IntakeError, IntakeValidator, PipelineEvent, PipelineNotifier,
    UploaderConfig};

use crate::preview::{self, Preview};
use crate::undo::UndoEntry;

/// A raw file handed to the store for intake.
#[derive(Debug, Clone)]
pub struct FileIntake {
    pub filename: String,
    pub content_type: String,
    pub payload: Bytes,
}

/// One file refused at intake and the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedFile {
    pub filename: String,
    pub reason: IntakeError,
}

/// Outcome of one intake call: ids that entered the batch plus rejections.
#[derive(Debug, Default)]
pub struct IntakeReport {
    pub added: Vec<Uuid>,
    pub rejected: Vec<RejectedFile>,
}

/// Claim on one similarity check, pinned to the file revision it was
/// dispatched against. Responses for older revisions are discarded.
#[derive(Debug, Clone, Copy)]
pub struct CheckTicket {
    pub id: Uuid,
    pub revision: u64,
}

/// What happened when a check response was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// The response matched the current revision and the status was set.
    Applied(FileStatus),
    /// The file was edited while the check was in flight; the response was
    /// discarded and the file reverted to `Pending` for a fresh check.
    Stale,
    /// The file left the batch while the check was in flight.
    Gone,
}

#[derive(Default)]
struct StoreInner {
    order: Vec<Uuid>,
    files: HashMap<Uuid, UploadFile>,
    statuses: HashMap<Uuid, FileStatus>,
    validations: HashMap<Uuid, FieldValidation>,
    previews: HashMap<Uuid, Preview>,
    uploaded: HashSet<Uuid>,
    bulk: BulkDefaults,
    undo: Option<UndoEntry>,
    undo_epoch: u64,
    last_result: Option<UploadResult>,
}

/// Thread-safe handle to the batch state.
#[derive(Clone)]
pub struct BatchStore {
    inner: Arc<RwLock<StoreInner>>,
    notifier: Arc<PipelineNotifier>,
    validator: Arc<IntakeValidator>,
    max_files: usize,
    undo_window: Duration,
}

impl BatchStore {
    pub fn new(config: &UploaderConfig, notifier: Arc<PipelineNotifier>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(StoreInner::default())),
            notifier,
            validator: Arc::new(IntakeValidator::new(
                config.max_file_size_bytes,
                config.allowed_content_types.clone(),
            )),
            max_files: config.max_files,
            undo_window: config.undo_window(),
        }
    }

    // ------------------------------- intake -------------------------------

    /// Validate and admit files, stamping current bulk defaults onto each.
    ///
    /// Intake is capacity-aware: once the batch holds `max_files`, remaining
    /// files are rejected with [`IntakeError::BatchFull`] rather than
    /// silently dropped.
    pub async fn add_files(&self, intakes: Vec<FileIntake>) -> IntakeReport {
        let mut report = IntakeReport::default();
        {
            let mut guard = self.inner.write().await;
            let inner = &mut *guard;
            for intake in intakes {
                if inner.order.len() >= self.max_files {
                    report.rejected.push(RejectedFile {
                        filename: intake.filename,
                        reason: IntakeError::BatchFull {
                            max: self.max_files,
                        },
                    });
                    continue;
                }
                match self
                    .validator
                    .validate(&intake.content_type, intake.payload.len() as u64)
                {
                    Ok(kind) => {
                        let file = UploadFile::new(
                            intake.filename,
                            intake.content_type,
                            kind,
                            intake.payload,
                            &inner.bulk,
                        );
                        let id = file.id;
                        inner.order.push(id);
                        inner.statuses.insert(id, FileStatus::Pending);
                        inner.validations.insert(id, FieldValidation::for_file(&file));
                        inner.files.insert(id, file);
                        report.added.push(id);
                    }
                    Err(reason) => {
                        tracing::debug!(filename = %intake.filename, reason = %reason, "File rejected at intake");
                        report.rejected.push(RejectedFile {
                            filename: intake.filename,
                            reason,
                        });
                    }
                }
            }
        }

        if !report.added.is_empty() || !report.rejected.is_empty() {
            tracing::info!(
                added = report.added.len(),
                rejected = report.rejected.len(),
                "Files added to batch"
            );
            self.notifier.publish(PipelineEvent::FilesAdded {
                added: report.added.len(),
                rejected: report.rejected.len(),
            });
        }
        report
    }

    // ------------------------------ accessors -----------------------------

    pub async fn file_count(&self) -> usize {
        self.inner.read().await.order.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.order.is_empty()
    }

    /// Ids in display order.
    pub async fn ordered_ids(&self) -> Vec<Uuid> {
        self.inner.read().await.order.clone()
    }

    pub async fn file(&self, id: Uuid) -> Option<UploadFile> {
        self.inner.read().await.files.get(&id).cloned()
    }

    /// All files in display order. Payloads are `Bytes`, so clones are cheap.
    pub async fn files_snapshot(&self) -> Vec<UploadFile> {
        let inner = self.inner.read().await;
        inner
            .order
            .iter()
            .filter_map(|id| inner.files.get(id).cloned())
            .collect()
    }

    pub async fn status_of(&self, id: Uuid) -> Option<FileStatus> {
        self.inner.read().await.statuses.get(&id).cloned()
    }

    pub(crate) async fn statuses_map(&self) -> HashMap<Uuid, FileStatus> {
        self.inner.read().await.statuses.clone()
    }

    pub async fn validation_of(&self, id: Uuid) -> Option<FieldValidation> {
        self.inner.read().await.validations.get(&id).copied()
    }

    /// Ids still awaiting a similarity check, in display order.
    pub async fn pending_ids(&self) -> Vec<Uuid> {
        let inner = self.inner.read().await;
        inner
            .order
            .iter()
            .filter(|id| matches!(inner.statuses.get(id), Some(FileStatus::Pending)))
            .copied()
            .collect()
    }

    pub async fn warning_count(&self) -> usize {
        let inner = self.inner.read().await;
        inner.statuses.values().filter(|s| s.is_warning()).count()
    }

    /// True when leaving now would lose work: files in the batch or bulk
    /// defaults the operator has filled in.
    pub async fn has_unsaved_changes(&self) -> bool {
        let inner = self.inner.read().await;
        !inner.order.is_empty() || !inner.bulk.is_unset()
    }

    // ------------------------------ metadata ------------------------------

    /// Apply one metadata edit and refresh that field's validation. Editing
    /// bumps the file revision, which invalidates in-flight checks.
    pub async fn update_metadata(&self, id: Uuid, patch: MetadataPatch) -> Result<(), AppError> {
        let mut guard = self.inner.write().await;
        let inner = &mut *guard;
        let file = inner.files.get_mut(&id).ok_or(AppError::UnknownFile(id))?;
        let changed = file.apply(patch);
        if let Some(field) = changed {
            if let Some(validation) = inner.validations.get_mut(&id) {
                validation.refresh(file, field);
            }
        }
        Ok(())
    }

    /// Mark a field touched so its error (if any) becomes visible.
    pub async fn touch_field(&self, id: Uuid, field: MetadataField) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        let validation = inner
            .validations
            .get_mut(&id)
            .ok_or(AppError::UnknownFile(id))?;
        validation.touch(field);
        Ok(())
    }

    /// Touch every field of every file, forcing all errors visible. Run
    /// before submission so nothing invalid hides behind an untouched field.
    pub async fn touch_all_fields(&self) {
        let mut inner = self.inner.write().await;
        for validation in inner.validations.values_mut() {
            validation.touch_all();
        }
    }

    // --------------------------- bulk defaults ----------------------------

    pub async fn bulk_defaults(&self) -> BulkDefaults {
        self.inner.read().await.bulk.clone()
    }

    /// Replace the bulk default template. Files already in the batch are
    /// untouched; use [`apply_bulk_to_all`](Self::apply_bulk_to_all) to
    /// stamp them explicitly.
    pub async fn set_bulk_defaults(&self, defaults: BulkDefaults) {
        self.inner.write().await.bulk = defaults;
    }

    /// One-shot stamp of the current template onto every file. Empty series
    /// and unset rarity are skipped so a partial template cannot blank out
    /// per-file values; the R18 flag is always stamped.
    pub async fn apply_bulk_to_all(&self) -> usize {
        let mut guard = self.inner.write().await;
        let inner = &mut *guard;
        let bulk = inner.bulk.clone();
        let ids = inner.order.clone();
        let mut stamped = 0usize;
        for id in ids {
            let file = match inner.files.get_mut(&id) {
                Some(file) => file,
                None => continue,
            };
            let mut changed: Vec<MetadataField> = Vec::new();
            if !bulk.series.trim().is_empty() {
                changed.extend(file.apply(MetadataPatch::Series(bulk.series.clone())));
            }
            if bulk.rarity.is_some() {
                changed.extend(file.apply(MetadataPatch::Rarity(bulk.rarity)));
            }
            file.apply(MetadataPatch::R18(bulk.r18));
            if let Some(validation) = inner.validations.get_mut(&id) {
                for field in changed {
                    validation.refresh(file, field);
                }
            }
            stamped += 1;
        }
        tracing::debug!(files = stamped, "Applied bulk defaults to batch");
        stamped
    }

    /// Copy one file's value for `field` onto every other file.
    pub async fn copy_to_all(&self, source: Uuid, field: BulkField) -> Result<usize, AppError> {
        let mut guard = self.inner.write().await;
        let inner = &mut *guard;
        let src = inner
            .files
            .get(&source)
            .ok_or(AppError::UnknownFile(source))?;
        let (series, rarity, r18) = (src.series.clone(), src.rarity, src.r18);

        let ids = inner.order.clone();
        let mut copied = 0usize;
        for id in ids {
            if id == source {
                continue;
            }
            let file = match inner.files.get_mut(&id) {
                Some(file) => file,
                None => continue,
            };
            let changed = match field {
                BulkField::Series => file.apply(MetadataPatch::Series(series.clone())),
                BulkField::Rarity => file.apply(MetadataPatch::Rarity(rarity)),
                BulkField::R18 => file.apply(MetadataPatch::R18(r18)),
            };
            if let Some(f) = changed {
                if let Some(validation) = inner.validations.get_mut(&id) {
                    validation.refresh(file, f);
                }
            }
            copied += 1;
        }
        tracing::debug!(source = %source, field = field.as_str(), files = copied, "Copied field to batch");
        Ok(copied)
    }

    // ------------------------------- status -------------------------------

    pub(crate) async fn set_status(&self, id: Uuid, status: FileStatus) {
        {
            let mut inner = self.inner.write().await;
            if !inner.files.contains_key(&id) {
                return;
            }
            inner.statuses.insert(id, status.clone());
        }
        self.notifier
            .publish(PipelineEvent::FileStatusChanged { id, status });
    }

    pub(crate) async fn set_statuses(&self, updates: Vec<(Uuid, FileStatus)>) {
        let mut applied = Vec::with_capacity(updates.len());
        {
            let mut inner = self.inner.write().await;
            for (id, status) in updates {
                if inner.files.contains_key(&id) {
                    inner.statuses.insert(id, status.clone());
                    applied.push((id, status));
                }
            }
        }
        for (id, status) in applied {
            self.notifier
                .publish(PipelineEvent::FileStatusChanged { id, status });
        }
    }

    /// Downgrade a duplicate warning to `Accepted` after the operator
    /// confirmed the file should be uploaded anyway.
    pub async fn dismiss_warning(&self, id: Uuid) -> Result<(), AppError> {
        {
            let mut inner = self.inner.write().await;
            match inner.statuses.get(&id) {
                Some(FileStatus::Warning { .. }) => {
                    inner.statuses.insert(id, FileStatus::Accepted);
                }
                Some(other) => {
                    return Err(AppError::InvalidInput(format!(
                        "Only warnings can be dismissed; file is {}",
                        other.label()
                    )))
                }
                None => return Err(AppError::UnknownFile(id)),
            }
        }
        self.notifier.publish(PipelineEvent::FileStatusChanged {
            id,
            status: FileStatus::Accepted,
        });
        Ok(())
    }

    // ---------------------------- duplicate checks ------------------------

    /// Claim a pending file for a similarity check: flips it to `Checking`
    /// and returns the request plus a ticket pinned to the current revision.
    /// Returns `None` when the file is missing or not `Pending`.
    pub async fn begin_check(&self, id: Uuid) -> Option<(CheckTicket, SimilarityRequest)> {
        let claimed = {
            let mut guard = self.inner.write().await;
            let inner = &mut *guard;
            let file = inner.files.get(&id)?;
            if !matches!(inner.statuses.get(&id), Some(FileStatus::Pending)) {
                return None;
            }
            let ticket = CheckTicket {
                id,
                revision: file.revision,
            };
            let request = SimilarityRequest {
                fingerprint: file.fingerprint.clone(),
                filename: sanitize_filename(&file.original_filename),
                name: file.name.clone(),
                series: file.series.clone(),
                kind: file.kind,
            };
            inner.statuses.insert(id, FileStatus::Checking);
            (ticket, request)
        };
        self.notifier.publish(PipelineEvent::FileStatusChanged {
            id,
            status: FileStatus::Checking,
        });
        Some(claimed)
    }

    /// Apply a check response. The response only lands if the file still
    /// exists and has not been edited since the ticket was issued; a stale
    /// response reverts the file to `Pending` so a fresh check can run.
    pub async fn apply_check(&self, ticket: CheckTicket, status: FileStatus) -> CheckOutcome {
        let (outcome, event_status) = {
            let mut guard = self.inner.write().await;
            let inner = &mut *guard;
            let file = match inner.files.get(&ticket.id) {
                Some(file) => file,
                None => return CheckOutcome::Gone,
            };
            if file.revision != ticket.revision {
                tracing::debug!(
                    file_id = %ticket.id,
                    ticket_revision = ticket.revision,
                    file_revision = file.revision,
                    "Discarding stale check response"
                );
                inner.statuses.insert(ticket.id, FileStatus::Pending);
                (CheckOutcome::Stale, FileStatus::Pending)
            } else {
                inner.statuses.insert(ticket.id, status.clone());
                (CheckOutcome::Applied(status.clone()), status)
            }
        };
        self.notifier.publish(PipelineEvent::FileStatusChanged {
            id: ticket.id,
            status: event_status,
        });
        outcome
    }

    // ------------------------------- upload -------------------------------

    /// Files eligible for the next run, in display order: everything not
    /// blocked and not already uploaded.
    pub async fn eligible_files(&self) -> Vec<UploadFile> {
        let inner = self.inner.read().await;
        inner
            .order
            .iter()
            .filter(|id| {
                let blocked = inner
                    .statuses
                    .get(id)
                    .map(|s| s.is_blocked())
                    .unwrap_or(false);
                !blocked && !inner.uploaded.contains(id)
            })
            .filter_map(|id| inner.files.get(id).cloned())
            .collect()
    }

    pub(crate) async fn mark_uploaded(&self, id: Uuid) {
        self.inner.write().await.uploaded.insert(id);
    }

    pub async fn is_uploaded(&self, id: Uuid) -> bool {
        self.inner.read().await.uploaded.contains(&id)
    }

    /// The first reason submission cannot proceed, or `None` when it can.
    /// Checks run in order: empty batch, blocked files, visible field
    /// errors, nothing left to upload.
    pub async fn submit_blockers(&self) -> Option<AppError> {
        let inner = self.inner.read().await;
        if inner.order.is_empty() {
            return Some(AppError::EmptyBatch);
        }
        let blocked = inner.statuses.values().filter(|s| s.is_blocked()).count();
        if blocked > 0 {
            return Some(AppError::BlockedFiles { count: blocked });
        }
        let invalid = inner
            .validations
            .values()
            .filter(|v| !v.no_visible_errors())
            .count();
        if invalid > 0 {
            return Some(AppError::InvalidFields { count: invalid });
        }
        let eligible = inner
            .order
            .iter()
            .filter(|id| !inner.uploaded.contains(id))
            .count();
        if eligible == 0 {
            return Some(AppError::EmptyBatch);
        }
        None
    }

    pub async fn can_submit(&self) -> bool {
        self.submit_blockers().await.is_none()
    }

    pub(crate) async fn record_result(&self, result: UploadResult) {
        self.inner.write().await.last_result = Some(result);
    }

    pub async fn last_result(&self) -> Option<UploadResult> {
        self.inner.read().await.last_result.clone()
    }

    // -------------------------------- undo --------------------------------

    /// Remove a file, parking it in the single undo slot for the configured
    /// window. A previously stashed file is dropped permanently.
    pub async fn remove_file_with_undo(&self, id: Uuid) -> Result<(), AppError> {
        let epoch = {
            let mut guard = self.inner.write().await;
            let inner = &mut *guard;
            let position = inner
                .order
                .iter()
                .position(|&x| x == id)
                .ok_or(AppError::UnknownFile(id))?;
            inner.order.remove(position);
            let file = inner.files.remove(&id).ok_or(AppError::UnknownFile(id))?;
            let status = match inner.statuses.remove(&id) {
                // An in-flight check will come back Gone; restore as Pending
                // so the file can be rechecked.
                Some(FileStatus::Checking) | None => FileStatus::Pending,
                Some(status) => status,
            };
            let validation = inner
                .validations
                .remove(&id)
                .unwrap_or_else(|| FieldValidation::for_file(&file));
            let preview = inner.previews.remove(&id);
            inner.uploaded.remove(&id);

            inner.undo_epoch += 1;
            let epoch = inner.undo_epoch;
            if let Some(dropped) = inner.undo.replace(UndoEntry {
                file,
                status,
                validation,
                preview,
                epoch,
                stashed_at: Instant::now(),
            }) {
                tracing::debug!(file_id = %dropped.file.id, "Undo slot reused; previous file dropped");
            }
            epoch
        };

        tracing::info!(file_id = %id, "File removed; undo available");
        self.notifier.publish(PipelineEvent::FileRemoved { id });

        let store = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(store.undo_window).await;
            store.expire_undo(epoch).await;
        });
        Ok(())
    }

    async fn expire_undo(&self, epoch: u64) {
        let expired = {
            let mut inner = self.inner.write().await;
            let matches_epoch = inner
                .undo
                .as_ref()
                .map(|entry| entry.epoch == epoch)
                .unwrap_or(false);
            if matches_epoch {
                inner.undo.take()
            } else {
                None
            }
        };
        if let Some(entry) = expired {
            tracing::debug!(file_id = %entry.file.id, "Undo window elapsed");
            self.notifier.publish(PipelineEvent::UndoExpired {
                id: entry.file.id,
            });
        }
    }

    /// Restore the stashed file with its status and validation intact. The
    /// file re-enters at the end of the display order. Restoring may
    /// briefly exceed `max_files`; intake re-enforces the cap.
    pub async fn undo_remove(&self) -> Option<Uuid> {
        let id = {
            let mut guard = self.inner.write().await;
            let inner = &mut *guard;
            let entry = inner.undo.take()?;
            let id = entry.file.id;
            inner.order.push(id);
            inner.statuses.insert(id, entry.status);
            inner.validations.insert(id, entry.validation);
            if let Some(preview) = entry.preview {
                inner.previews.insert(id, preview);
            }
            inner.files.insert(id, entry.file);
            id
        };
        tracing::info!(file_id = %id, "File restored from undo");
        self.notifier.publish(PipelineEvent::UndoRestored { id });
        Some(id)
    }

    /// Drop the stashed file immediately, making the removal permanent.
    /// Returns whether a stash was present.
    pub async fn dismiss_undo(&self) -> bool {
        self.inner.write().await.undo.take().is_some()
    }

    /// Time left in the undo window, if a stash is present.
    pub async fn undo_remaining(&self) -> Option<Duration> {
        let inner = self.inner.read().await;
        inner
            .undo
            .as_ref()
            .map(|entry| entry.remaining(self.undo_window))
    }

    // ------------------------------ previews ------------------------------

    /// Generate (or reuse) the thumbnail preview for a file. `Ok(None)` for
    /// videos, which have no client-side preview.
    pub async fn ensure_preview(&self, id: Uuid) -> Result<Option<PathBuf>, AppError> {
        let file = {
            let inner = self.inner.read().await;
            if let Some(preview) = inner.previews.get(&id) {
                return Ok(Some(preview.path().to_path_buf()));
            }
            inner
                .files
                .get(&id)
                .cloned()
                .ok_or(AppError::UnknownFile(id))?
        };

        // Decode outside the lock; a concurrent duplicate generation just
        // replaces the map entry and drops its temp file.
        match preview::generate(&file)? {
            None => Ok(None),
            Some(preview) => {
                let path = preview.path().to_path_buf();
                self.inner.write().await.previews.insert(id, preview);
                Ok(Some(path))
            }
        }
    }

    // -------------------------------- reset -------------------------------

    /// Clear the whole session: files, statuses, validations, previews,
    /// bulk defaults, undo stash, uploaded set, and last result.
    pub async fn reset(&self) {
        let mut guard = self.inner.write().await;
        *guard = StoreInner::default();
        tracing::debug!("Batch store reset");
    }
}
