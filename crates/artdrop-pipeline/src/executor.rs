//! Sequential batch upload executor.
//!
//! Eligible files are uploaded in fixed-size batches, one request at a
//! time. Per-file outcomes are tallied client-side; the run only stops
//! early when the service becomes unreachable or the operator cancels.
//! Files in batches that never settled revert to their pre-run status so
//! a later run can pick them up again.

use std::collections::HashMap;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use artdrop_core::models::{
    BatchItem, CharacterMeta, FileStatus, OutcomeStatus, UploadFile, UploadResult,
    UploadResultEntry,
};
use artdrop_core::remote::UploadTransport;
use artdrop_core::validation::sanitize_filename;
use artdrop_core::{AppError, PipelineEvent, PipelineNotifier};

use crate::store::BatchStore;

pub struct UploadExecutor {
    store: BatchStore,
    transport: Arc<dyn UploadTransport>,
    notifier: Arc<PipelineNotifier>,
    batch_size: usize,
}

impl UploadExecutor {
    pub fn new(
        store: BatchStore,
        transport: Arc<dyn UploadTransport>,
        notifier: Arc<PipelineNotifier>,
        batch_size: usize,
    ) -> Self {
        Self {
            store,
            transport,
            notifier,
            batch_size: batch_size.max(1),
        }
    }

    fn batch_item(file: &UploadFile) -> BatchItem {
        BatchItem {
            meta: CharacterMeta {
                ref_id: file.id,
                name: file.name.clone(),
                series: file.series.clone(),
                rarity: file.rarity,
                r18: file.r18,
                kind: file.kind,
            },
            filename: sanitize_filename(&file.original_filename),
            content_type: file.content_type.clone(),
            payload: file.payload.clone(),
        }
    }

    /// Upload every eligible file, batch by batch.
    ///
    /// Returns the aggregate result, which is also recorded on the store
    /// and published as [`PipelineEvent::RunCompleted`]. Cancellation takes
    /// effect between batches; the in-flight request is allowed to settle.
    pub async fn execute(&self, cancel: CancellationToken) -> Result<UploadResult, AppError> {
        let files = self.store.eligible_files().await;
        if files.is_empty() {
            return Err(AppError::EmptyBatch);
        }

        let pre_run: HashMap<Uuid, FileStatus> = self.store.statuses_map().await;
        let total = files.len();
        let batch_count = (total + self.batch_size - 1) / self.batch_size;
        tracing::info!(
            files = total,
            batches = batch_count,
            batch_size = self.batch_size,
            "Starting upload run"
        );

        let mut created = 0u32;
        let mut warnings = 0u32;
        let mut error_count = 0u32;
        let mut entries: Vec<UploadResultEntry> = Vec::new();
        let mut completed = 0usize;

        for (index, chunk) in files.chunks(self.batch_size).enumerate() {
            if cancel.is_cancelled() {
                tracing::info!(completed, total, "Upload run cancelled between batches");
                self.notifier.publish(PipelineEvent::RunAborted {
                    reason: "Cancelled".to_string(),
                });
                return Err(AppError::Cancelled);
            }

            // Overall run percent at the moment this batch goes out.
            let percent = ((completed * 100) / total) as u8;
            self.store
                .set_statuses(
                    chunk
                        .iter()
                        .map(|f| (f.id, FileStatus::Uploading { percent }))
                        .collect(),
                )
                .await;

            let items: Vec<BatchItem> = chunk.iter().map(Self::batch_item).collect();
            match self.transport.upload_batch(items).await {
                Ok(response) => {
                    let by_ref: HashMap<Uuid, _> = response
                        .results
                        .iter()
                        .map(|outcome| (outcome.ref_id, outcome))
                        .collect();

                    let mut updates = Vec::with_capacity(chunk.len());
                    for file in chunk {
                        match by_ref.get(&file.id) {
                            Some(outcome) => match outcome.status {
                                OutcomeStatus::Created => {
                                    created += 1;
                                    self.store.mark_uploaded(file.id).await;
                                    updates.push((file.id, FileStatus::Accepted));
                                }
                                OutcomeStatus::DuplicateWarning => {
                                    warnings += 1;
                                    let message = outcome
                                        .message
                                        .clone()
                                        .unwrap_or_else(|| "Duplicate detected on upload".to_string());
                                    entries.push(UploadResultEntry {
                                        filename: file.original_filename.clone(),
                                        message: message.clone(),
                                        duplicate: true,
                                    });
                                    // Created server-side despite the warning;
                                    // never re-upload on a later run.
                                    self.store.mark_uploaded(file.id).await;
                                    updates.push((file.id, FileStatus::Warning { reason: message }));
                                }
                                OutcomeStatus::Error => {
                                    error_count += 1;
                                    let message = outcome
                                        .message
                                        .clone()
                                        .unwrap_or_else(|| "Upload failed".to_string());
                                    entries.push(UploadResultEntry {
                                        filename: file.original_filename.clone(),
                                        message: message.clone(),
                                        duplicate: false,
                                    });
                                    updates.push((file.id, FileStatus::Error { message }));
                                }
                            },
                            None => {
                                error_count += 1;
                                let message = "No result returned for file".to_string();
                                entries.push(UploadResultEntry {
                                    filename: file.original_filename.clone(),
                                    message: message.clone(),
                                    duplicate: false,
                                });
                                updates.push((file.id, FileStatus::Error { message }));
                            }
                        }
                        completed += 1;
                    }
                    self.store.set_statuses(updates).await;
                }
                Err(err) if err.is_offline() => {
                    tracing::warn!(batch = index + 1, error = %err, "Service unreachable; aborting run");
                    // The in-flight batch never settled; put its files back.
                    let restore = chunk
                        .iter()
                        .filter_map(|f| {
                            pre_run.get(&f.id).map(|status| (f.id, status.clone()))
                        })
                        .collect();
                    self.store.set_statuses(restore).await;
                    self.notifier.publish(PipelineEvent::RunAborted {
                        reason: err.to_string(),
                    });
                    return Err(AppError::Transport(err));
                }
                Err(err) => {
                    tracing::warn!(batch = index + 1, error = %err, "Batch rejected; continuing run");
                    let message = err.to_string();
                    let mut updates = Vec::with_capacity(chunk.len());
                    for file in chunk {
                        error_count += 1;
                        entries.push(UploadResultEntry {
                            filename: file.original_filename.clone(),
                            message: message.clone(),
                            duplicate: false,
                        });
                        updates.push((
                            file.id,
                            FileStatus::Error {
                                message: message.clone(),
                            },
                        ));
                        completed += 1;
                    }
                    self.store.set_statuses(updates).await;
                }
            }

            self.notifier.publish(PipelineEvent::BatchProgress {
                completed: index + 1,
                total: batch_count,
            });
        }

        let result = UploadResult {
            total_created: created,
            total_warnings: warnings,
            total_errors: error_count,
            errors: entries,
            message: UploadResult::summary(created, warnings, error_count),
        };
        tracing::info!(
            created,
            warnings,
            errors = error_count,
            "Upload run finished"
        );
        self.store.record_result(result.clone()).await;
        self.notifier.publish(PipelineEvent::RunCompleted {
            result: result.clone(),
        });
        Ok(result)
    }
}
