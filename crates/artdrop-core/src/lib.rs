//! Artdrop Core Library
//!
//! This crate provides the domain models, error types, configuration, validation,
//! event notifier, and remote-service trait seams shared across all artdrop
//! components.

pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod remote;
pub mod validation;

// Re-export commonly used types
pub use config::UploaderConfig;
pub use error::{AppError, TransportError};
pub use events::{PipelineEvent, PipelineNotifier};
pub use remote::{HealthProbe, NameSource, SimilarityProbe, UploadTransport};
pub use validation::{IntakeError, IntakeValidator};
