use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RunMetadata {
    pub recording_name: String,
    pub created_at: DateTime<Utc>,
    pub run_id: String,
    #[serde(skip)]
    pub output_dir: PathBuf,
}

/// Recording files (`*.json`) under `root`, or `root` itself if it is a file
pub fn list_recordings(root: &Path) -> Vec<PathBuf> {
    if root.is_file() {
        return vec![root.to_path_buf()];
    }

    let mut recordings: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|s| s.to_str())
                .map(|s| s.to_lowercase() == "json")
                .unwrap_or(false)
        })
        .map(|e| e.path().to_path_buf())
        .collect();
    recordings.sort();
    recordings
}

/// Run id for a recording: its file stem
pub fn run_id_for(recording_path: &Path) -> Result<String> {
    recording_path
        .file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("Invalid recording name: {:?}", recording_path))
}

pub fn create_run(output_root: &Path, recording_path: &Path) -> Result<RunMetadata> {
    let run_id = run_id_for(recording_path)?;
    let stem = run_id.as_str();

    let output_dir = output_root.join(stem);
    if output_dir.exists() {
        return Err(anyhow::anyhow!(
            "Output directory already exists for: {}",
            stem
        ));
    }

    fs::create_dir_all(&output_dir)?;

    let recording_name = recording_path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(stem)
        .to_string();

    let metadata = RunMetadata {
        recording_name,
        created_at: Utc::now(),
        run_id: run_id.clone(),
        output_dir: output_dir.clone(),
    };

    write_json_artifact(&metadata, "metadata.json", &metadata)?;
    tracing::info!("Created run {} at {:?}", metadata.run_id, output_dir);

    Ok(metadata)
}

/// Removes a run directory and everything written to it
pub fn discard_run(metadata: &RunMetadata) -> Result<()> {
    fs::remove_dir_all(&metadata.output_dir)?;
    tracing::info!("Discarded run {}", metadata.run_id);
    Ok(())
}

pub fn create_run_artifact_file(metadata: &RunMetadata, artifact_name: &str) -> Result<fs::File> {
    let path = metadata.output_dir.join(artifact_name);
    Ok(fs::File::create(path)?)
}

pub fn write_json_artifact<T: Serialize>(
    metadata: &RunMetadata,
    artifact_name: &str,
    value: &T,
) -> Result<()> {
    let path = metadata.output_dir.join(artifact_name);
    let content = serde_json::to_string_pretty(value)?;
    fs::write(path, content)?;
    Ok(())
}

pub fn list_runs(output_root: &Path) -> Result<Vec<RunMetadata>> {
    let mut runs = Vec::new();

    if !output_root.exists() {
        return Ok(runs);
    }

    for entry in fs::read_dir(output_root)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            let metadata_path = path.join("metadata.json");
            if metadata_path.exists() {
                let content = fs::read_to_string(metadata_path)?;
                let mut metadata: RunMetadata = serde_json::from_str(&content)?;
                metadata.output_dir = path.clone();
                runs.push(metadata);
            }
        }
    }

    runs.sort_by(|a, b| a.run_id.cmp(&b.run_id));
    Ok(runs)
}
