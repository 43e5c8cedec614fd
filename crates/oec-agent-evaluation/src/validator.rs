//! The opaque NWB Inspector capability (spec §4.5.3 step 2: "invoke the
//! validator" -- out of scope for this core, same seam pattern as
//! `ConversionLibrary` in the Conversion agent).

use std::path::Path;

use async_trait::async_trait;
use oec_protocol::{IssueSeverity, ValidationIssue};
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct ValidatorError {
    pub message: String,
    pub trace: String,
}

#[async_trait]
pub trait NwbValidator: Send + Sync {
    async fn validate(&self, nwb_path: &Path) -> Result<Vec<ValidationIssue>, ValidatorError>;
}

/// Reads back the JSON stand-in document [`crate::conversion_lib`]'s
/// counterpart in the Conversion agent wrote, and raises a handful of
/// best-practice checks against it rather than running the real NWB
/// Inspector rule set.
pub struct PlaceholderNwbValidator;

fn string_field(document: &Value, block: &str, field: &str) -> Option<String> {
    document
        .get(block)?
        .get(field)?
        .as_str()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl NwbValidator for PlaceholderNwbValidator {
    async fn validate(&self, nwb_path: &Path) -> Result<Vec<ValidationIssue>, ValidatorError> {
        let bytes = tokio::fs::read(nwb_path).await.map_err(|e| ValidatorError {
            message: format!("failed to read NWB file at {}", nwb_path.display()),
            trace: e.to_string(),
        })?;

        let document: Value = serde_json::from_slice(&bytes).map_err(|e| ValidatorError {
            message: "NWB file is not a well-formed document".to_string(),
            trace: e.to_string(),
        })?;

        let mut issues = Vec::new();

        if string_field(&document, "subject", "subject_id").is_none() {
            issues.push(ValidationIssue {
                severity: IssueSeverity::Critical,
                message: "subject_id is missing".to_string(),
                location: "/subject/subject_id".to_string(),
                check_name: "check_subject_id_exists".to_string(),
            });
        }
        if string_field(&document, "subject", "species").is_none() {
            issues.push(ValidationIssue {
                severity: IssueSeverity::Warning,
                message: "species is missing".to_string(),
                location: "/subject/species".to_string(),
                check_name: "check_subject_species_exists".to_string(),
            });
        }
        if string_field(&document, "file_level", "session_description").is_none() {
            issues.push(ValidationIssue {
                severity: IssueSeverity::Warning,
                message: "session_description is missing".to_string(),
                location: "/file_level/session_description".to_string(),
                check_name: "check_session_description_exists".to_string(),
            });
        }
        if string_field(&document, "device", "name").is_none() {
            issues.push(ValidationIssue {
                severity: IssueSeverity::Info,
                message: "device name is missing".to_string(),
                location: "/device/name".to_string(),
                check_name: "check_device_name_exists".to_string(),
            });
        }
        if document.get("compression").and_then(Value::as_str) != Some("gzip") {
            issues.push(ValidationIssue {
                severity: IssueSeverity::Info,
                message: "file is not compressed with gzip".to_string(),
                location: "/compression".to_string(),
                check_name: "check_compression_enabled".to_string(),
            });
        }

        Ok(issues)
    }
}
