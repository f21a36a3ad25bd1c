use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::types::ChunkRecord;

/// Read one ingestion output file: a JSON array of chunk records.
pub fn load_chunk_file(path: &Path) -> Result<Vec<ChunkRecord>> {
    let raw = fs::read_to_string(path)?;
    let records: Vec<ChunkRecord> = serde_json::from_str(&raw)?;
    for (i, rec) in records.iter().enumerate() {
        if rec.text.trim().is_empty() {
            return Err(Error::InvalidInput(format!("{}: chunk {i} has empty text", path.display())));
        }
        if rec.page == 0 {
            return Err(Error::InvalidInput(format!("{}: chunk {i} has page 0", path.display())));
        }
    }
    debug!(path = %path.display(), chunks = records.len(), "loaded chunk file");
    Ok(records)
}

/// Load every `*.json` chunk file under `corpus_dir`.
///
/// Files are read in path order; the concatenated records are then stably
/// ordered by source priority so primary-source passages receive the lowest
/// ids.
pub fn load_corpus_dir(corpus_dir: &Path) -> Result<Vec<ChunkRecord>> {
    if !corpus_dir.is_dir() {
        return Err(Error::NotFound(format!("corpus directory {}", corpus_dir.display())));
    }
    let files = list_json_files(corpus_dir);
    let mut records = Vec::new();
    for (file_index, file_path) in files.iter().enumerate() {
        info!("Processing file {}/{}: {}", file_index + 1, files.len(), file_path.display());
        records.extend(load_chunk_file(file_path)?);
    }
    records.sort_by_key(|r| r.source.priority());
    info!("Loaded {} files into {} chunks", files.len(), records.len());
    Ok(records)
}

fn list_json_files(root: &Path) -> Vec<PathBuf> {
    let mut json_files = Vec::new();
    for entry in walkdir::WalkDir::new(root).into_iter().filter_map(std::result::Result::ok).filter(|e| e.file_type().is_file()) {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("json") { json_files.push(path.to_path_buf()); }
    }
    json_files.sort();
    json_files
}
