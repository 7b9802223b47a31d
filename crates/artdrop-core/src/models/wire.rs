//! Wire types for the character service API.
//!
//! Shared by the HTTP client and the pipeline's trait seams so that test
//! doubles speak exactly the same shapes as production.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::media::{MediaKind, Rarity};

/// Metadata part submitted alongside one file in a batch upload.
///
/// `ref` is the client-side file id; the server echoes it back in
/// [`FileOutcome`] so responses can be matched to batch entries without
/// relying on filename uniqueness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterMeta {
    #[serde(rename = "ref")]
    pub ref_id: Uuid,
    pub name: String,
    pub series: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rarity: Option<Rarity>,
    pub r18: bool,
    pub kind: MediaKind,
}

/// One file of a batch upload request: payload plus its metadata part.
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub meta: CharacterMeta,
    pub filename: String,
    pub content_type: String,
    pub payload: Bytes,
}

/// Server-side outcome for one uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Created,
    DuplicateWarning,
    Error,
}

/// Per-file outcome echoed back by the batch endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileOutcome {
    #[serde(rename = "ref")]
    pub ref_id: Uuid,
    pub filename: String,
    pub status: OutcomeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Response body of the batch upload endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchUploadResponse {
    pub results: Vec<FileOutcome>,
    pub created: u32,
    pub warnings: u32,
    pub errors: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Request body for a similarity check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityRequest {
    pub fingerprint: String,
    pub filename: String,
    pub name: String,
    pub series: String,
    pub kind: MediaKind,
}

/// Similarity verdict for one file against the existing catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum SimilarityVerdict {
    /// No similar character found.
    Clear,
    /// Looks similar to an existing character; upload may proceed.
    Possible { matched: String },
    /// Confirmed duplicate of an existing character.
    Confirmed { matched: String },
}

/// Search hit from the character search endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterHit {
    pub id: Uuid,
    pub name: String,
    pub series: String,
    pub rarity: Rarity,
    pub r18: bool,
}

/// Response body of the character search endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    pub results: Vec<CharacterHit>,
    pub count: usize,
}
