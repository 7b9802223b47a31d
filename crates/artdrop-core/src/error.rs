//! Error types module
//!
//! Two layers: [`TransportError`] describes wire-level failures talking to
//! the character service, and [`AppError`] unifies everything the pipeline
//! can surface to a caller. Transport errors distinguish "the service is
//! unreachable" from "the service rejected the request" because the upload
//! executor aborts on the former and continues on the latter.

use std::io;

use uuid::Uuid;

/// Wire-level failure from the character service.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("API request failed with status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl TransportError {
    /// True when the failure means the service could not be reached at all.
    /// Reachability failures abort an upload run; API rejections are folded
    /// into per-file errors and the run continues.
    pub fn is_offline(&self) -> bool {
        matches!(self, TransportError::Connect(_) | TransportError::Timeout(_))
    }
}

/// Domain errors surfaced by the upload pipeline.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Offline: uploads cannot start without a connection")]
    Offline,

    #[error("Nothing to upload")]
    EmptyBatch,

    #[error("{count} file(s) are blocked as confirmed duplicates")]
    BlockedFiles { count: usize },

    #[error("{count} required field(s) are missing or invalid")]
    InvalidFields { count: usize },

    #[error("File not found in batch: {0}")]
    UnknownFile(Uuid),

    #[error("Upload run cancelled")]
    Cancelled,

    #[error("An upload run is already in progress")]
    RunInProgress,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Preview generation failed: {0}")]
    Preview(String),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl AppError {
    /// Get the error type name for log fields and CLI output
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::Offline => "Offline",
            AppError::EmptyBatch => "EmptyBatch",
            AppError::BlockedFiles { .. } => "BlockedFiles",
            AppError::InvalidFields { .. } => "InvalidFields",
            AppError::UnknownFile(_) => "UnknownFile",
            AppError::Cancelled => "Cancelled",
            AppError::RunInProgress => "RunInProgress",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::Preview(_) => "Preview",
            AppError::Transport(_) => "Transport",
            AppError::Internal(_) => "Internal",
        }
    }

    /// Whether retrying the same operation can reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::Offline | AppError::Cancelled | AppError::RunInProgress => true,
            AppError::Transport(e) => e.is_offline(),
            _ => false,
        }
    }
}
