//! On-disk layout of a built corpus index.
//!
//! - `index.bin`: magic `SYIX`, format version (u32), dim (u32), row count
//!   (u64), then `count * dim` little-endian f32 values.
//! - `passages.json`: the passage records, ordered by id.
//! - `manifest.json`: embedder id, dim, count, blake3 of `passages.json` and
//!   the build timestamp. Used to detect a blob/metadata pair that drifted apart.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

use syllabus_core::error::{Error, Result};
use syllabus_core::Passage;

use crate::index::FlatIndex;
use crate::store::PassageStore;
use crate::CorpusIndex;

pub const INDEX_FILE: &str = "index.bin";
pub const PASSAGES_FILE: &str = "passages.json";
pub const MANIFEST_FILE: &str = "manifest.json";

const MAGIC: &[u8; 4] = b"SYIX";
const FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = 4 + 4 + 4 + 8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub embedder_id: String,
    pub dim: usize,
    pub count: usize,
    pub passages_hash: String,
    pub built_at: DateTime<Utc>,
}

pub fn save(index: &CorpusIndex, dir: &Path) -> Result<Manifest> {
    fs::create_dir_all(dir)?;
    let passages = serde_json::to_vec_pretty(index.passages().passages())?;
    let manifest = Manifest {
        embedder_id: index.embedder_id().to_string(),
        dim: index.dim(),
        count: index.len(),
        passages_hash: blake3::hash(&passages).to_hex().to_string(),
        built_at: Utc::now(),
    };
    fs::write(dir.join(INDEX_FILE), encode_index(index.vectors())?)?;
    fs::write(dir.join(PASSAGES_FILE), passages)?;
    fs::write(dir.join(MANIFEST_FILE), serde_json::to_vec_pretty(&manifest)?)?;
    info!(dir = %dir.display(), count = manifest.count, dim = manifest.dim, "Saved corpus index");
    Ok(manifest)
}

/// Load a persisted index. `Ok(None)` means nothing has been built at `dir`.
pub fn try_load(dir: &Path) -> Result<Option<CorpusIndex>> {
    let files = [INDEX_FILE, PASSAGES_FILE, MANIFEST_FILE];
    let present: Vec<bool> = files.iter().map(|f| dir.join(f).is_file()).collect();
    if present.iter().all(|p| !p) {
        return Ok(None);
    }
    if let Some(missing) = files.iter().zip(&present).find(|(_, p)| !**p).map(|(f, _)| f) {
        return Err(Error::Corrupt(format!("incomplete index at {}: {missing} is missing", dir.display())));
    }

    let manifest: Manifest = serde_json::from_slice(&fs::read(dir.join(MANIFEST_FILE))?)?;
    let passages_raw = fs::read(dir.join(PASSAGES_FILE))?;
    let hash = blake3::hash(&passages_raw).to_hex().to_string();
    if hash != manifest.passages_hash {
        return Err(Error::Corrupt(format!("{PASSAGES_FILE} does not match {MANIFEST_FILE}")));
    }
    let passages: Vec<Passage> = serde_json::from_slice(&passages_raw)?;
    let vectors = decode_index(&fs::read(dir.join(INDEX_FILE))?)?;
    if vectors.dim() != manifest.dim || vectors.len() != manifest.count {
        return Err(Error::Corrupt(format!(
            "{INDEX_FILE} holds {}x{} but manifest records {}x{}",
            vectors.len(),
            vectors.dim(),
            manifest.count,
            manifest.dim
        )));
    }
    let index = CorpusIndex::new(vectors, PassageStore::from_passages(passages)?, manifest.embedder_id)?;
    info!(dir = %dir.display(), count = index.len(), dim = index.dim(), "Loaded corpus index");
    Ok(Some(index))
}

/// Like `try_load`, but an absent index is `Error::IndexNotBuilt`.
pub fn load(dir: &Path) -> Result<CorpusIndex> {
    try_load(dir)?.ok_or_else(|| Error::IndexNotBuilt(dir.display().to_string()))
}

fn encode_index(index: &FlatIndex) -> Result<Vec<u8>> {
    let dim = u32::try_from(index.dim()).map_err(|_| Error::InvalidVector("dimension exceeds u32".to_string()))?;
    let rows = index.as_slice();
    let mut bytes = Vec::with_capacity(HEADER_LEN + std::mem::size_of_val(rows));
    bytes.extend_from_slice(MAGIC);
    bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    bytes.extend_from_slice(&dim.to_le_bytes());
    bytes.extend_from_slice(&(index.len() as u64).to_le_bytes());
    for &value in rows {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    Ok(bytes)
}

fn decode_index(bytes: &[u8]) -> Result<FlatIndex> {
    if bytes.len() < HEADER_LEN || &bytes[..4] != MAGIC {
        return Err(Error::Corrupt(format!("{INDEX_FILE} has no valid header")));
    }
    let version = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    if version != FORMAT_VERSION {
        return Err(Error::Corrupt(format!("{INDEX_FILE} format version {version} is not supported")));
    }
    let dim = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize;
    let mut count_bytes = [0u8; 8];
    count_bytes.copy_from_slice(&bytes[12..20]);
    let count = usize::try_from(u64::from_le_bytes(count_bytes))
        .map_err(|_| Error::Corrupt(format!("{INDEX_FILE} row count overflows")))?;
    let body = &bytes[HEADER_LEN..];
    let expected = count
        .checked_mul(dim)
        .and_then(|n| n.checked_mul(4))
        .ok_or_else(|| Error::Corrupt(format!("{INDEX_FILE} size overflows")))?;
    if body.len() != expected {
        return Err(Error::Corrupt(format!("{INDEX_FILE} body is {} bytes, expected {expected}", body.len())));
    }
    let mut data = Vec::with_capacity(count * dim);
    for chunk in body.chunks_exact(4) {
        let value = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        if !value.is_finite() {
            return Err(Error::Corrupt(format!("{INDEX_FILE} contains non-finite values")));
        }
        data.push(value);
    }
    FlatIndex::from_raw(dim, data)
}
