//! The opaque OpenEphys -> NWB conversion capability (spec §1: "consumed by
//! the Conversion agent as an opaque 'run conversion with metadata'
//! capability" -- out of scope for this core).
//!
//! [`ConversionLibrary`] is the seam; [`PlaceholderConversionLibrary`] is a
//! stand-in adapter so the rest of the pipeline (evaluation, result
//! reporting) has a real artifact to operate on in this workspace.

use std::path::Path;
use std::time::Instant;

use async_trait::async_trait;
use oec_protocol::DatasetInfo;
use serde_json::{json, Value};

pub struct ConversionOutcome {
    pub duration_seconds: f64,
    pub warnings: Vec<String>,
    pub log: String,
}

#[derive(Debug, Clone)]
pub struct ConversionLibraryError {
    pub message: String,
    pub trace: String,
}

#[async_trait]
pub trait ConversionLibrary: Send + Sync {
    async fn convert(
        &self,
        dataset_info: &DatasetInfo,
        subject: &Value,
        file_level: &Value,
        device: &Value,
        output_path: &Path,
    ) -> Result<ConversionOutcome, ConversionLibraryError>;
}

/// Writes a deterministic JSON stand-in at the `.nwb` path with lossless
/// compression recorded as enabled (spec step 3), rather than performing a
/// real HDF5-backed NWB write.
pub struct PlaceholderConversionLibrary;

#[async_trait]
impl ConversionLibrary for PlaceholderConversionLibrary {
    async fn convert(
        &self,
        dataset_info: &DatasetInfo,
        subject: &Value,
        file_level: &Value,
        device: &Value,
        output_path: &Path,
    ) -> Result<ConversionOutcome, ConversionLibraryError> {
        let started = Instant::now();

        if dataset_info.file_count == 0 {
            return Err(ConversionLibraryError {
                message: "no recording files to convert".to_string(),
                trace: format!("dataset_info.file_count == 0 for {}", dataset_info.path),
            });
        }

        let document = json!({
            "nwb_version": "2.6.0",
            "compression": "gzip",
            "source_dataset": dataset_info.path,
            "subject": subject,
            "file_level": file_level,
            "device": device,
        });

        let bytes = serde_json::to_vec_pretty(&document).map_err(|e| ConversionLibraryError {
            message: "failed to serialize NWB document".to_string(),
            trace: e.to_string(),
        })?;

        if let Some(parent) = output_path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| ConversionLibraryError {
                message: "failed to create output directory".to_string(),
                trace: e.to_string(),
            })?;
        }

        tokio::fs::write(output_path, &bytes).await.map_err(|e| ConversionLibraryError {
            message: format!("failed to write NWB file to {}", output_path.display()),
            trace: e.to_string(),
        })?;

        Ok(ConversionOutcome {
            duration_seconds: started.elapsed().as_secs_f64(),
            warnings: Vec::new(),
            log: format!("wrote {} bytes to {}", bytes.len(), output_path.display()),
        })
    }
}
