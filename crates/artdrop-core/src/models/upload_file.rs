use bytes::Bytes;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::bulk::BulkDefaults;
use super::media::{MediaKind, Rarity};
use crate::validation::default_name_from_filename;

/// One user-selected media item in the batch.
///
/// Files are immutable payload plus mutable character metadata. Every
/// metadata edit bumps `revision`, which lets in-flight similarity checks
/// detect that their response no longer describes the current file.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub id: Uuid,
    pub payload: Bytes,
    pub original_filename: String,
    pub content_type: String,
    pub kind: MediaKind,
    pub size: u64,
    /// SHA-256 of the payload, lowercase hex. Sent with similarity checks.
    pub fingerprint: String,
    pub added_at: DateTime<Utc>,
    // Character metadata, editable until upload
    pub name: String,
    pub series: String,
    pub rarity: Option<Rarity>,
    pub r18: bool,
    /// Bumped on every metadata edit. Guards against stale check responses.
    pub revision: u64,
}

impl UploadFile {
    /// Build a new batch entry, stamping the current bulk defaults and
    /// deriving the display name from the filename stem.
    pub fn new(
        original_filename: String,
        content_type: String,
        kind: MediaKind,
        payload: Bytes,
        defaults: &BulkDefaults,
    ) -> Self {
        let size = payload.len() as u64;
        let fingerprint = fingerprint_hex(&payload);
        let name = default_name_from_filename(&original_filename);

        Self {
            id: Uuid::new_v4(),
            payload,
            original_filename,
            content_type,
            kind,
            size,
            fingerprint,
            added_at: Utc::now(),
            name,
            series: defaults.series.clone(),
            rarity: defaults.rarity,
            r18: defaults.r18,
            revision: 0,
        }
    }

    /// Apply one metadata edit, bumping the revision.
    ///
    /// Returns the validated field that changed, or `None` for fields that
    /// carry no validation state (currently only the R18 flag).
    pub fn apply(&mut self, patch: MetadataPatch) -> Option<MetadataField> {
        let field = patch.field();
        match patch {
            MetadataPatch::Name(name) => self.name = name,
            MetadataPatch::Series(series) => self.series = series,
            MetadataPatch::Rarity(rarity) => self.rarity = rarity,
            MetadataPatch::R18(r18) => self.r18 = r18,
        }
        self.revision += 1;
        field
    }

    /// Whether the given field currently holds an acceptable value.
    pub fn field_is_valid(&self, field: MetadataField) -> bool {
        match field {
            MetadataField::Name => !self.name.trim().is_empty(),
            MetadataField::Series => !self.series.trim().is_empty(),
            MetadataField::Rarity => self.rarity.is_some(),
        }
    }
}

/// Metadata fields that participate in validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataField {
    Name,
    Series,
    Rarity,
}

impl MetadataField {
    pub const ALL: [MetadataField; 3] = [
        MetadataField::Name,
        MetadataField::Series,
        MetadataField::Rarity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetadataField::Name => "name",
            MetadataField::Series => "series",
            MetadataField::Rarity => "rarity",
        }
    }
}

/// A typed metadata edit applied through the batch store.
#[derive(Debug, Clone)]
pub enum MetadataPatch {
    Name(String),
    Series(String),
    Rarity(Option<Rarity>),
    R18(bool),
}

impl MetadataPatch {
    /// The validated field this patch touches, if any.
    pub fn field(&self) -> Option<MetadataField> {
        match self {
            MetadataPatch::Name(_) => Some(MetadataField::Name),
            MetadataPatch::Series(_) => Some(MetadataField::Series),
            MetadataPatch::Rarity(_) => Some(MetadataField::Rarity),
            MetadataPatch::R18(_) => None,
        }
    }
}

/// SHA-256 of `data` as lowercase hex.
pub fn fingerprint_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}
