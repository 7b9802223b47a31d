//! In-process pipeline notifier backed by a `tokio::sync::broadcast` channel.
//!
//! [`PipelineNotifier`] is a scoped publish/subscribe hub owned by one
//! upload session and handed to components explicitly. There is no global
//! registry: two sessions side by side cannot observe each other's events.
//! Publishing is fire-and-forget; a missing or slow subscriber never
//! affects the publisher.

use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::{FileStatus, UploadResult};

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// Everything observable about a running upload session.
///
/// Consumers match exhaustively; adding a variant is a compile-time signal
/// to every subscriber.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    /// Intake finished: `added` entered the batch, `rejected` did not.
    FilesAdded { added: usize, rejected: usize },
    FileStatusChanged { id: Uuid, status: FileStatus },
    FileRemoved { id: Uuid },
    /// A removed file was restored within the undo window.
    UndoRestored { id: Uuid },
    /// The undo window elapsed and the stashed file is gone for good.
    UndoExpired { id: Uuid },
    /// `completed` of `total` batches have settled, successfully or not.
    /// Published exactly once per settled batch, in order.
    BatchProgress { completed: usize, total: usize },
    RunCompleted { result: UploadResult },
    /// The run stopped early; unsettled files kept their pre-run status.
    RunAborted { reason: String },
    /// The service answered, but slower than the configured threshold.
    SlowConnection,
    /// A submission was refused because the service is unreachable.
    OfflineRejected,
}

impl PipelineEvent {
    /// Short name for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineEvent::FilesAdded { .. } => "files_added",
            PipelineEvent::FileStatusChanged { .. } => "file_status_changed",
            PipelineEvent::FileRemoved { .. } => "file_removed",
            PipelineEvent::UndoRestored { .. } => "undo_restored",
            PipelineEvent::UndoExpired { .. } => "undo_expired",
            PipelineEvent::BatchProgress { .. } => "batch_progress",
            PipelineEvent::RunCompleted { .. } => "run_completed",
            PipelineEvent::RunAborted { .. } => "run_aborted",
            PipelineEvent::SlowConnection => "slow_connection",
            PipelineEvent::OfflineRejected => "offline_rejected",
        }
    }
}

/// Session-scoped fan-out notifier.
///
/// Wraps a [`broadcast::Sender`] so any number of subscribers can
/// independently receive every published [`PipelineEvent`].
pub struct PipelineNotifier {
    sender: broadcast::Sender<PipelineEvent>,
}

impl PipelineNotifier {
    /// Create a notifier with a specific channel capacity.
    ///
    /// When the buffer is full the oldest unconsumed events are dropped and
    /// slow receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped.
    pub fn publish(&self, event: PipelineEvent) {
        // Ignore the SendError; it only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for PipelineNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
