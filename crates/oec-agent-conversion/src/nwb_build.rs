//! Building the NWB metadata substructures the conversion library consumes
//! (spec §4.5.2 step 2: "subject, file-level, device blocks; missing fields
//! left unset, session_start_time defaulted to 'now' if absent").

use chrono::Utc;
use oec_protocol::NwbMetadata;
use serde_json::{json, Value};

pub fn subject_block(metadata: &NwbMetadata) -> Value {
    json!({
        "subject_id": metadata.subject_id.value,
        "species": metadata.species.value,
        "age": metadata.age.value,
        "sex": metadata.sex.value,
    })
}

pub fn file_level_block(metadata: &NwbMetadata) -> Value {
    let session_start_time = metadata
        .session_start_time
        .value
        .clone()
        .unwrap_or_else(|| Utc::now().to_rfc3339());
    json!({
        "session_start_time": session_start_time,
        "experimenter": metadata.experimenter.value,
        "session_description": metadata.description.value,
    })
}

pub fn device_block(metadata: &NwbMetadata) -> Value {
    json!({
        "name": metadata.device_name.value,
        "manufacturer": metadata.manufacturer.value,
        "recording_location": metadata.recording_location.value,
    })
}
