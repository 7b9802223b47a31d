//! Intake validation for files entering the batch.
//!
//! Files are screened once, before they take up a batch slot: empty and
//! oversized payloads are rejected, and the content type must be an
//! allowed image or video type. Everything else in the pipeline can then
//! assume files are well-formed.

use crate::models::MediaKind;

const MAX_FILENAME_LEN: usize = 255;

/// Why a file was refused at intake.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntakeError {
    #[error("Empty file")]
    EmptyFile,

    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: u64, max: u64 },

    #[error("Unsupported content type: {0}")]
    UnsupportedType(String),

    #[error("Batch is full: limit of {max} files reached")]
    BatchFull { max: usize },
}

/// Screens raw files before they enter the batch.
pub struct IntakeValidator {
    max_file_size: u64,
    allowed_content_types: Vec<String>,
}

impl IntakeValidator {
    pub fn new(max_file_size: u64, allowed_content_types: Vec<String>) -> Self {
        Self {
            max_file_size,
            allowed_content_types,
        }
    }

    /// Validate size and content type, returning the media kind on success.
    pub fn validate(&self, content_type: &str, size: u64) -> Result<MediaKind, IntakeError> {
        if size == 0 {
            return Err(IntakeError::EmptyFile);
        }
        if size > self.max_file_size {
            return Err(IntakeError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }

        let normalized = content_type.to_lowercase();
        if !self.allowed_content_types.iter().any(|ct| ct == &normalized) {
            return Err(IntakeError::UnsupportedType(content_type.to_string()));
        }

        MediaKind::from_content_type(&normalized)
            .ok_or_else(|| IntakeError::UnsupportedType(content_type.to_string()))
    }
}

/// Sanitize a filename for wire transfer: strip any path component, cap the
/// length, and replace characters outside `[A-Za-z0-9._-]`.
pub fn sanitize_filename(filename: &str) -> String {
    let base = std::path::Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);
    if base.contains("..") {
        return "invalid_filename".to_string();
    }
    let s: String = base
        .chars()
        .take(MAX_FILENAME_LEN)
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if s.trim().is_empty() || s.len() < 3 {
        "file".to_string()
    } else {
        s
    }
}

/// Derive a default display name from a filename: the stem with underscores
/// turned into spaces. Falls back to "Unnamed" for degenerate inputs.
pub fn default_name_from_filename(filename: &str) -> String {
    let stem = std::path::Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename);

    let name = stem
        .replace('_', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    if name.is_empty() {
        "Unnamed".to_string()
    } else {
        name
    }
}
