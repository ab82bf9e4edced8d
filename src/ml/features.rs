//! Feature vector and form normalization
//!
//! Turns the raw, untyped form strings of a heart-disease submission into a
//! fixed-order numeric vector. Field order comes from the shared schema in
//! `schema.rs`, never from literals in this file.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::schema::{
    is_binary_field, layout_hash, validate_layout, LayoutMismatchError, FEATURE_COUNT,
    FEATURE_LAYOUT, FEATURE_VERSION,
};

/// Versioned feature vector with layout metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Feature layout version
    pub version: u8,
    /// CRC32 hash of the feature layout (for mismatch detection)
    pub layout_hash: u32,
    /// Feature values in order defined by FEATURE_LAYOUT
    pub values: [f32; FEATURE_COUNT],
}

/// Parse a string to f32. Unparseable or missing input becomes the default;
/// bad numerics are never an error on this path.
pub fn parse_float(value: Option<&str>) -> f32 {
    value
        .and_then(|v| v.trim().parse::<f32>().ok())
        .unwrap_or(0.0)
}

/// Parse a yes/no style field to 0.0 or 1.0.
///
/// Recognized spellings (case-insensitive): "1", "yes", "y", "true" → 1.0
/// and "0", "no", "n", "false" → 0.0. Every other value maps to 0.0, so a
/// malformed field is indistinguishable from a true negative. Retained as
/// observed behavior; see DESIGN.md.
pub fn parse_binary(value: Option<&str>) -> f32 {
    let Some(value) = value else {
        return 0.0;
    };
    match value.trim().to_lowercase().as_str() {
        "1" | "yes" | "y" | "true" => 1.0,
        "0" | "no" | "n" | "false" => 0.0,
        _ => 0.0,
    }
}

impl FeatureVector {
    /// Create a new zeroed feature vector with current version
    pub fn new() -> Self {
        Self {
            version: FEATURE_VERSION,
            layout_hash: layout_hash(),
            values: [0.0; FEATURE_COUNT],
        }
    }

    /// Create from raw values with current version
    pub fn from_values(values: [f32; FEATURE_COUNT]) -> Self {
        Self {
            version: FEATURE_VERSION,
            layout_hash: layout_hash(),
            values,
        }
    }

    /// Normalize a raw form-field map into a vector.
    ///
    /// Walks FEATURE_LAYOUT so the output order cannot drift from the order
    /// the model was trained with. Missing fields default to 0.0.
    pub fn from_form(form: &HashMap<String, String>) -> Self {
        let mut vector = Self::new();
        for (i, name) in FEATURE_LAYOUT.iter().enumerate() {
            let raw = form.get(*name).map(String::as_str);
            vector.values[i] = if is_binary_field(name) {
                parse_binary(raw)
            } else {
                parse_float(raw)
            };
        }
        vector
    }

    /// Get values as slice
    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    /// Get feature by name
    pub fn get_by_name(&self, name: &str) -> Option<f32> {
        super::schema::feature_index(name).map(|i| self.values[i])
    }

    /// Validate that this vector is compatible with current layout
    pub fn validate(&self) -> Result<(), LayoutMismatchError> {
        validate_layout(self.version, self.layout_hash)
    }

    /// Named values in layout order, for API responses
    pub fn named_values(&self) -> Vec<(&'static str, f32)> {
        FEATURE_LAYOUT
            .iter()
            .zip(self.values.iter())
            .map(|(name, value)| (*name, *value))
            .collect()
    }

    /// Readable digest of the inputs, stored in the prediction log instead
    /// of the raw submission
    pub fn input_summary(&self) -> String {
        FEATURE_LAYOUT
            .iter()
            .zip(self.values.iter())
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_float_valid() {
        assert_eq!(parse_float(Some("63")), 63.0);
        assert_eq!(parse_float(Some(" 2.3 ")), 2.3);
        assert_eq!(parse_float(Some("-1.5")), -1.5);
    }

    #[test]
    fn test_parse_float_unparseable_is_zero() {
        assert_eq!(parse_float(Some("abc")), 0.0);
        assert_eq!(parse_float(Some("12;4")), 0.0);
        assert_eq!(parse_float(Some("")), 0.0);
        assert_eq!(parse_float(None), 0.0);
    }

    #[test]
    fn test_parse_binary_recognized_spellings() {
        for positive in ["1", "yes", "y", "true", "YES", "Y", "True", " yes "] {
            assert_eq!(parse_binary(Some(positive)), 1.0, "{:?}", positive);
        }
        for negative in ["0", "no", "n", "false", "NO", "N", "False"] {
            assert_eq!(parse_binary(Some(negative)), 0.0, "{:?}", negative);
        }
    }

    #[test]
    fn test_parse_binary_unrecognized_is_zero() {
        for garbage in ["maybe", "2", "ja", "oui", "", "tru e"] {
            assert_eq!(parse_binary(Some(garbage)), 0.0, "{:?}", garbage);
        }
        assert_eq!(parse_binary(None), 0.0);
    }

    #[test]
    fn test_from_form_order_matches_layout() {
        let form = form(&[
            ("age", "63"),
            ("sex", "1"),
            ("cp", "3"),
            ("trestbps", "145"),
            ("chol", "233"),
            ("fbs", "1"),
            ("restecg", "0"),
            ("thalach", "150"),
            ("exang", "0"),
            ("oldpeak", "2.3"),
            ("slope", "0"),
            ("ca", "0"),
            ("thal", "1"),
        ]);

        let vector = FeatureVector::from_form(&form);
        assert_eq!(vector.values[0], 63.0); // age
        assert_eq!(vector.values[1], 1.0); // sex
        assert_eq!(vector.values[2], 3.0); // cp
        assert_eq!(vector.values[3], 145.0); // trestbps
        assert_eq!(vector.values[9], 2.3); // oldpeak
        assert_eq!(vector.values[12], 1.0); // thal
        assert!(vector.validate().is_ok());
    }

    #[test]
    fn test_from_form_missing_fields_default_to_zero() {
        let form = form(&[("age", "40")]);
        let vector = FeatureVector::from_form(&form);
        assert_eq!(vector.values[0], 40.0);
        for value in &vector.values[1..] {
            assert_eq!(*value, 0.0);
        }
    }

    #[test]
    fn test_from_form_binary_fields_use_binary_parsing() {
        let form = form(&[("sex", "yes"), ("fbs", "garbage"), ("exang", "TRUE")]);
        let vector = FeatureVector::from_form(&form);
        assert_eq!(vector.get_by_name("sex"), Some(1.0));
        assert_eq!(vector.get_by_name("fbs"), Some(0.0));
        assert_eq!(vector.get_by_name("exang"), Some(1.0));
    }

    #[test]
    fn test_input_summary_layout_order() {
        let form = form(&[("age", "63"), ("sex", "1")]);
        let summary = FeatureVector::from_form(&form).input_summary();
        assert!(summary.starts_with("age=63, sex=1, cp=0"));
        assert!(summary.ends_with("thal=0"));
    }

    #[test]
    fn test_named_values() {
        let vector = FeatureVector::from_values([1.0; FEATURE_COUNT]);
        let named = vector.named_values();
        assert_eq!(named.len(), FEATURE_COUNT);
        assert_eq!(named[0], ("age", 1.0));
        assert_eq!(named[12], ("thal", 1.0));
    }
}
