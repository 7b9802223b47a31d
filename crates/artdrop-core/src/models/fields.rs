use serde::{Deserialize, Serialize};

use super::upload_file::{MetadataField, UploadFile};

/// Validity and touch state for one metadata field.
///
/// A field's error is only user-visible once the field has been touched,
/// so freshly added files never open covered in error markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldState {
    pub valid: bool,
    pub touched: bool,
}

impl FieldState {
    pub fn error_visible(&self) -> bool {
        self.touched && !self.valid
    }
}

/// Validation state for all validated fields of one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldValidation {
    pub name: FieldState,
    pub series: FieldState,
    pub rarity: FieldState,
}

impl FieldValidation {
    /// Compute fresh validation for a file. All fields start untouched.
    pub fn for_file(file: &UploadFile) -> Self {
        let state = |field| FieldState {
            valid: file.field_is_valid(field),
            touched: false,
        };
        Self {
            name: state(MetadataField::Name),
            series: state(MetadataField::Series),
            rarity: state(MetadataField::Rarity),
        }
    }

    pub fn get(&self, field: MetadataField) -> FieldState {
        match field {
            MetadataField::Name => self.name,
            MetadataField::Series => self.series,
            MetadataField::Rarity => self.rarity,
        }
    }

    fn get_mut(&mut self, field: MetadataField) -> &mut FieldState {
        match field {
            MetadataField::Name => &mut self.name,
            MetadataField::Series => &mut self.series,
            MetadataField::Rarity => &mut self.rarity,
        }
    }

    /// Recompute validity for one field after an edit. Editing never touches
    /// the field; visibility is driven by `touch`/`touch_all` alone.
    pub fn refresh(&mut self, file: &UploadFile, field: MetadataField) {
        let state = self.get_mut(field);
        state.valid = file.field_is_valid(field);
    }

    pub fn touch(&mut self, field: MetadataField) {
        self.get_mut(field).touched = true;
    }

    /// Mark every field touched, forcing errors visible before submission.
    pub fn touch_all(&mut self) {
        for field in MetadataField::ALL {
            self.get_mut(field).touched = true;
        }
    }

    /// True when no touched field is invalid. Untouched invalid fields do
    /// not block submission; submission touches everything first.
    pub fn no_visible_errors(&self) -> bool {
        MetadataField::ALL
            .iter()
            .all(|&field| !self.get(field).error_visible())
    }

    /// True when every field holds a valid value, touched or not.
    pub fn is_complete(&self) -> bool {
        MetadataField::ALL.iter().all(|&field| self.get(field).valid)
    }
}
