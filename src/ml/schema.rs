//! Feature schema - centralized feature definition for the heart model
//!
//! **This file controls the tabular feature layout**
//!
//! ## Rules (NEVER break these):
//! 1. Add feature → increment FEATURE_VERSION
//! 2. Change order → increment FEATURE_VERSION
//! 3. Remove feature → increment FEATURE_VERSION
//!
//! The serving order below must stay identical to the column order used by
//! the training pipeline. Both sides consume this one definition; nothing
//! else may duplicate the field list.

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

/// Current feature layout version
/// MUST be incremented when layout changes
pub const FEATURE_VERSION: u8 = 1;

/// Feature names in exact order they appear in the vector
/// This is the SINGLE SOURCE OF TRUTH for the heart-model layout
pub const FEATURE_LAYOUT: &[&str] = &[
    "age",        // 0: Age in years
    "sex",        // 1: Sex (1 = male, 0 = female)
    "cp",         // 2: Chest pain type (0-3)
    "trestbps",   // 3: Resting blood pressure (mm Hg)
    "chol",       // 4: Serum cholesterol (mg/dl)
    "fbs",        // 5: Fasting blood sugar > 120 mg/dl (1/0)
    "restecg",    // 6: Resting ECG result (0-2)
    "thalach",    // 7: Maximum heart rate achieved
    "exang",      // 8: Exercise-induced angina (1/0)
    "oldpeak",    // 9: ST depression induced by exercise
    "slope",      // 10: Slope of the peak exercise ST segment
    "ca",         // 11: Number of major vessels colored by fluoroscopy
    "thal",       // 12: Thalassemia code
];

/// Total number of features
/// IMPORTANT: Must match FEATURE_LAYOUT.len()!
pub const FEATURE_COUNT: usize = 13;

/// Names of the fields parsed as yes/no style binaries rather than numerics
pub const BINARY_FIELDS: &[&str] = &["sex", "fbs", "exang"];

/// Compute CRC32 hash of the feature layout
/// Used to detect layout mismatches at runtime
pub fn compute_layout_hash() -> u32 {
    let mut hasher = Hasher::new();

    // Include version in hash
    hasher.update(&[FEATURE_VERSION]);

    // Hash all feature names in order
    for name in FEATURE_LAYOUT {
        hasher.update(name.as_bytes());
        hasher.update(&[0]); // Separator
    }

    hasher.finalize()
}

/// Get layout hash (inputs are const, so this is stable for the process)
pub fn layout_hash() -> u32 {
    compute_layout_hash()
}

/// Complete layout information for serialization/logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutInfo {
    pub version: u8,
    pub hash: u32,
    pub feature_count: usize,
    pub feature_names: Vec<String>,
}

impl LayoutInfo {
    pub fn current() -> Self {
        Self {
            version: FEATURE_VERSION,
            hash: layout_hash(),
            feature_count: FEATURE_COUNT,
            feature_names: FEATURE_LAYOUT.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Error when feature layout doesn't match expected
#[derive(Debug, Clone)]
pub struct LayoutMismatchError {
    pub expected_version: u8,
    pub expected_hash: u32,
    pub actual_version: u8,
    pub actual_hash: u32,
}

impl std::fmt::Display for LayoutMismatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Feature layout mismatch: expected v{} (hash: {:08x}), got v{} (hash: {:08x})",
            self.expected_version,
            self.expected_hash,
            self.actual_version,
            self.actual_hash
        )
    }
}

impl std::error::Error for LayoutMismatchError {}

/// Validate that incoming data matches current layout
pub fn validate_layout(incoming_version: u8, incoming_hash: u32) -> Result<(), LayoutMismatchError> {
    let current_hash = layout_hash();

    if incoming_version != FEATURE_VERSION || incoming_hash != current_hash {
        return Err(LayoutMismatchError {
            expected_version: FEATURE_VERSION,
            expected_hash: current_hash,
            actual_version: incoming_version,
            actual_hash: incoming_hash,
        });
    }

    Ok(())
}

/// Get feature index by name (O(n) but features are few)
pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_LAYOUT.iter().position(|&n| n == name)
}

/// Whether a field is parsed as a yes/no binary
pub fn is_binary_field(name: &str) -> bool {
    BINARY_FIELDS.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_count() {
        assert_eq!(FEATURE_COUNT, 13);
        assert_eq!(FEATURE_LAYOUT.len(), FEATURE_COUNT);
    }

    #[test]
    fn test_binary_fields_are_in_layout() {
        for name in BINARY_FIELDS {
            assert!(feature_index(name).is_some(), "{} missing from layout", name);
        }
    }

    #[test]
    fn test_layout_hash_consistency() {
        // Hash should be consistent across calls
        let hash1 = compute_layout_hash();
        let hash2 = compute_layout_hash();
        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_layout_hash_non_zero() {
        let hash = layout_hash();
        assert_ne!(hash, 0);
    }

    #[test]
    fn test_validate_layout_success() {
        let result = validate_layout(FEATURE_VERSION, layout_hash());
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_layout_version_mismatch() {
        let result = validate_layout(FEATURE_VERSION + 1, layout_hash());
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_layout_hash_mismatch() {
        let result = validate_layout(FEATURE_VERSION, layout_hash() ^ 1);
        assert!(result.is_err());
    }

    #[test]
    fn test_feature_index() {
        assert_eq!(feature_index("age"), Some(0));
        assert_eq!(feature_index("cp"), Some(2));
        assert_eq!(feature_index("thal"), Some(12));
        assert_eq!(feature_index("nonexistent"), None);
    }

    #[test]
    fn test_layout_info() {
        let info = LayoutInfo::current();
        assert_eq!(info.version, FEATURE_VERSION);
        assert_eq!(info.feature_count, FEATURE_COUNT);
        assert_eq!(info.feature_names.len(), FEATURE_COUNT);
    }
}
