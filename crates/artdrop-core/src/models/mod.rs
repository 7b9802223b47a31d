//! Domain models for the batch upload pipeline.

pub mod bulk;
pub mod fields;
pub mod media;
pub mod result;
pub mod status;
pub mod upload_file;
pub mod wire;

// Re-export commonly used types
pub use bulk::{BulkDefaults, BulkField};
pub use fields::{FieldState, FieldValidation};
pub use media::{MediaKind, Rarity};
pub use result::{UploadResult, UploadResultEntry};
pub use status::FileStatus;
pub use upload_file::{fingerprint_hex, MetadataField, MetadataPatch, UploadFile};
pub use wire::{
    BatchItem, BatchUploadResponse, CharacterHit, CharacterMeta, FileOutcome, OutcomeStatus,
    SearchResponse, SimilarityRequest, SimilarityVerdict,
};
