use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use syllabus_core::error::{Error, Result};
use syllabus_core::traits::Embedder;
use syllabus_core::ChunkRecord;

use crate::index::FlatIndex;
use crate::store::PassageStore;
use crate::CorpusIndex;

/// Embed every chunk and assemble a `CorpusIndex` with ids in input order.
///
/// This is the offline batch step; it runs single-threaded and is never on the
/// query path. An empty `records` list yields an empty, queryable index.
pub fn build_corpus_index(embedder: &dyn Embedder, records: Vec<ChunkRecord>, batch_size: usize) -> Result<CorpusIndex> {
    if let Some(pos) = records.iter().position(|r| r.text.trim().is_empty()) {
        return Err(Error::InvalidInput(format!("chunk {pos} has empty text")));
    }
    let batch_size = batch_size.max(1);
    let mut vectors = FlatIndex::new(embedder.dim());
    info!("Indexing {} chunks with {}", records.len(), embedder.embedder_id());
    let pb = ProgressBar::new(records.len() as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    for batch in records.chunks(batch_size) {
        let texts: Vec<String> = batch.iter().map(|r| r.text.clone()).collect();
        let embeddings = embedder.embed_batch(&texts).map_err(Error::EmbeddingProvider)?;
        if embeddings.len() != texts.len() {
            return Err(Error::EmbeddingProvider(anyhow::anyhow!(
                "embedder returned {} vectors for {} texts",
                embeddings.len(),
                texts.len()
            )));
        }
        vectors.add(&embeddings)?;
        pb.inc(batch.len() as u64);
    }
    pb.finish_with_message("done");
    let index = CorpusIndex::new(vectors, PassageStore::from_records(records), embedder.embedder_id())?;
    info!("Indexed {} chunks", index.len());
    Ok(index)
}
