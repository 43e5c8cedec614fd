//! LLM-driven metadata extraction (spec §4.5.1 step 3).

use std::collections::HashMap;

use oec_protocol::{ExtractionConfidence, MetadataField, NwbMetadata};

pub const METADATA_FIELDS: [&str; 10] = [
    "subject_id",
    "species",
    "age",
    "sex",
    "session_start_time",
    "experimenter",
    "device_name",
    "manufacturer",
    "recording_location",
    "description",
];

pub const EXTRACTION_SYSTEM_MESSAGE: &str = "You extract structured neurophysiology session \
metadata from free-form lab documentation. Respond with a single flat JSON object mapping each \
field name to a string value. Omit a key entirely if the documentation does not mention it. Do \
not include commentary, explanations, or markdown code fences.";

/// Build the schema-prescribing prompt sent with the concatenated
/// documentation (step 3: "a schema-prescribing prompt listing all NWB
/// metadata fields").
pub fn extraction_prompt(concatenated_docs: &str) -> String {
    format!(
        "Extract these NWB metadata fields as JSON: {}.\n\nDocumentation:\n{concatenated_docs}",
        METADATA_FIELDS.join(", "),
    )
}

/// Parse the LLM's raw text as a flat `field -> value` JSON object. `None`
/// means parsing failed (step 3: "if JSON parsing fails, store the raw text
/// and mark all fields empty").
pub fn parse_llm_json(raw: &str) -> Option<HashMap<String, String>> {
    serde_json::from_str(raw.trim()).ok()
}

/// Build [`NwbMetadata`] from the parsed extraction and the raw LLM text,
/// which is always preserved verbatim in `llm_extraction_log` regardless of
/// parse outcome.
pub fn metadata_from_extraction(parsed: Option<HashMap<String, String>>, raw_log: String) -> NwbMetadata {
    let mut metadata = NwbMetadata {
        llm_extraction_log: raw_log,
        ..Default::default()
    };

    let Some(fields) = parsed else {
        return metadata;
    };

    metadata.subject_id = field_or_empty(&fields, "subject_id");
    metadata.species = species_field(&fields);
    metadata.age = field_or_empty(&fields, "age");
    metadata.sex = field_or_empty(&fields, "sex");
    metadata.session_start_time = field_or_empty(&fields, "session_start_time");
    metadata.experimenter = field_or_empty(&fields, "experimenter");
    metadata.device_name = field_or_empty(&fields, "device_name");
    metadata.manufacturer = field_or_empty(&fields, "manufacturer");
    metadata.recording_location = field_or_empty(&fields, "recording_location");
    metadata.description = field_or_empty(&fields, "description");
    metadata
}

fn field_or_empty(fields: &HashMap<String, String>, key: &str) -> MetadataField {
    match fields.get(key).map(|v| v.trim()) {
        Some(v) if !v.is_empty() => MetadataField::with_value(v, ExtractionConfidence::High),
        _ => MetadataField::empty(),
    }
}

/// The one field the spec names explicitly as warranting a reasonable
/// default: free-text "mouse"/"mice" normalizes to the NWB-conventional
/// binomial name, tagged `default` rather than `high` (step 3).
fn species_field(fields: &HashMap<String, String>) -> MetadataField {
    match fields.get("species").map(|v| v.trim()) {
        Some(v) if v.eq_ignore_ascii_case("mouse") || v.eq_ignore_ascii_case("mice") => {
            MetadataField::with_value("Mus musculus", ExtractionConfidence::Default)
        }
        Some(v) if !v.is_empty() => MetadataField::with_value(v, ExtractionConfidence::High),
        _ => MetadataField::empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn species_mouse_normalizes_with_default_confidence() {
        let mut fields = HashMap::new();
        fields.insert("species".to_string(), "mouse".to_string());
        let field = species_field(&fields);
        assert_eq!(field.value.as_deref(), Some("Mus musculus"));
        assert_eq!(field.confidence, ExtractionConfidence::Default);
    }

    #[test]
    fn species_other_values_pass_through_at_high_confidence() {
        let mut fields = HashMap::new();
        fields.insert("species".to_string(), "Rattus norvegicus".to_string());
        let field = species_field(&fields);
        assert_eq!(field.value.as_deref(), Some("Rattus norvegicus"));
        assert_eq!(field.confidence, ExtractionConfidence::High);
    }

    #[test]
    fn missing_field_is_empty() {
        let fields = HashMap::new();
        let field = field_or_empty(&fields, "subject_id");
        assert_eq!(field.confidence, ExtractionConfidence::Empty);
        assert!(field.value.is_none());
    }

    #[test]
    fn malformed_json_yields_all_empty_fields_but_keeps_raw_log() {
        let metadata = metadata_from_extraction(None, "not json".to_string());
        assert_eq!(metadata.llm_extraction_log, "not json");
        assert!(metadata.fields().iter().all(|f| !f.is_present()));
    }
}
