//! Lazy thumbnail previews.
//!
//! Image files get a bounded PNG thumbnail written to a temp file on first
//! request; the file is removed when the preview is dropped. Video files
//! get no client-side preview (frame extraction needs the full service
//! pipeline), which callers must handle as a normal case, not an error.

use std::path::Path;

use tempfile::NamedTempFile;

use artdrop_core::models::{MediaKind, UploadFile};
use artdrop_core::AppError;

/// Longest edge of a generated thumbnail, in pixels.
pub const THUMBNAIL_EDGE: u32 = 256;

/// A generated thumbnail backed by a temp file.
///
/// Dropping the preview deletes the file.
#[derive(Debug)]
pub struct Preview {
    file: NamedTempFile,
    pub width: u32,
    pub height: u32,
}

impl Preview {
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// Generate a thumbnail for an image file; `Ok(None)` for videos.
pub fn generate(file: &UploadFile) -> Result<Option<Preview>, AppError> {
    match file.kind {
        MediaKind::Video => Ok(None),
        MediaKind::Image => {
            let decoded = image::load_from_memory(&file.payload)
                .map_err(|e| AppError::Preview(format!("Failed to decode image: {}", e)))?;
            let thumbnail = decoded.thumbnail(THUMBNAIL_EDGE, THUMBNAIL_EDGE);
            let (width, height) = (thumbnail.width(), thumbnail.height());

            let tmp = tempfile::Builder::new()
                .prefix("artdrop-preview-")
                .suffix(".png")
                .tempfile()
                .map_err(|e| AppError::Preview(format!("Failed to create temp file: {}", e)))?;
            thumbnail
                .save_with_format(tmp.path(), image::ImageFormat::Png)
                .map_err(|e| AppError::Preview(format!("Failed to write thumbnail: {}", e)))?;

            Ok(Some(Preview {
                file: tmp,
                width,
                height,
            }))
        }
    }
}
