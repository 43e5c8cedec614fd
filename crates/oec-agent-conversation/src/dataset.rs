//! Format detection and structure validation (spec §4.5.1, steps 1-2).

use std::fs;
use std::path::{Path, PathBuf};

use oec_protocol::DatasetFormat;

/// Settings-file names recognized across the two OpenEphys recording layouts
/// (legacy XML GUI and the newer binary format).
const SETTINGS_FILENAMES: &[&str] = &["settings.xml", "structure.oebin"];
/// Raw continuous-recording suffixes for the same two layouts.
const RAW_RECORDING_SUFFIXES: &[&str] = &[".continuous", ".dat"];
const DOCUMENTATION_SUFFIXES: &[&str] = &[".txt", ".md", ".json", ".yaml", ".yml", ".csv"];

#[derive(Debug, Default)]
pub struct DetectedDataset {
    pub format: DatasetFormat,
    pub settings_file: Option<PathBuf>,
    pub raw_recording_files: Vec<PathBuf>,
    pub documentation_files: Vec<PathBuf>,
}

/// Scan the top level of `dataset_path` for a settings file, raw-recording
/// files, and documentation files, and derive the format (step 1: "Return
/// `openephys` if the path contains a recognizable settings file OR one or
/// more raw-recording files with the OpenEphys suffix; else `unknown`").
pub fn detect(dataset_path: &Path) -> std::io::Result<DetectedDataset> {
    let mut detected = DetectedDataset::default();

    for entry in fs::read_dir(dataset_path)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_lowercase();

        if SETTINGS_FILENAMES.iter().any(|s| name == *s) {
            detected.settings_file = Some(path);
        } else if RAW_RECORDING_SUFFIXES.iter().any(|s| name.ends_with(s)) {
            detected.raw_recording_files.push(path);
        } else if DOCUMENTATION_SUFFIXES.iter().any(|s| name.ends_with(s)) {
            detected.documentation_files.push(path);
        }
    }

    detected.format = if detected.settings_file.is_some() || !detected.raw_recording_files.is_empty() {
        DatasetFormat::OpenEphys
    } else {
        DatasetFormat::Unknown
    };

    Ok(detected)
}

/// Require both the settings file and at least one raw-recording file
/// (step 2). Returns a precise message naming whichever is missing.
pub fn validate_structure(detected: &DetectedDataset) -> Result<(), String> {
    match (&detected.settings_file, detected.raw_recording_files.is_empty()) {
        (None, true) => Err("neither a settings file nor any raw-recording files were found".to_string()),
        (None, false) => Err("no settings file (settings.xml or structure.oebin) was found".to_string()),
        (Some(_), true) => Err("a settings file was found but no raw-recording files are present".to_string()),
        (Some(_), false) => Ok(()),
    }
}

/// Total byte size and file count across the whole dataset tree (step 2:
/// "collect total byte size, file count").
pub fn walk_stats(dir: &Path) -> std::io::Result<(u64, u64)> {
    let mut total_bytes = 0u64;
    let mut file_count = 0u64;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            let (bytes, count) = walk_stats(&path)?;
            total_bytes += bytes;
            file_count += count;
        } else if path.is_file() {
            total_bytes += entry.metadata()?.len();
            file_count += 1;
        }
    }
    Ok((total_bytes, file_count))
}

/// Concatenate every documentation file's contents, clearly delimited by
/// filename (step 3: "concatenate their contents (clearly delimited by
/// filename)"). Unreadable files are skipped rather than failing the whole
/// extraction.
pub fn concatenate_documentation(paths: &[PathBuf]) -> String {
    let mut buf = String::new();
    for path in paths {
        let Ok(content) = fs::read_to_string(path) else {
            continue;
        };
        buf.push_str(&format!("--- {} ---\n{content}\n\n", path.display()));
    }
    buf
}
