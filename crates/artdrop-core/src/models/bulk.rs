use serde::{Deserialize, Serialize};

use super::media::Rarity;

/// Session-scoped metadata template stamped onto files as they are added.
///
/// Changing the defaults never rewrites files already in the batch; the
/// store offers an explicit apply-to-all operation for that.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkDefaults {
    pub series: String,
    pub rarity: Option<Rarity>,
    pub r18: bool,
}

impl BulkDefaults {
    pub fn is_unset(&self) -> bool {
        *self == BulkDefaults::default()
    }
}

/// Fields that can be copied from one file to every other file.
///
/// Name is deliberately absent: duplicating one character name across the
/// whole batch is never what the operator wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkField {
    Series,
    Rarity,
    R18,
}

impl BulkField {
    pub fn as_str(&self) -> &'static str {
        match self {
            BulkField::Series => "series",
            BulkField::Rarity => "rarity",
            BulkField::R18 => "r18",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_start_unset() {
        let defaults = BulkDefaults::default();
        assert!(defaults.is_unset());
        assert!(defaults.series.is_empty());
        assert!(defaults.rarity.is_none());
        assert!(!defaults.r18);
    }

    #[test]
    fn test_defaults_with_values_are_set() {
        let defaults = BulkDefaults {
            series: "Onii-chan wa Oshimai!".to_string(),
            rarity: None,
            r18: false,
        };
        assert!(!defaults.is_unset());
    }
}
