//! Index build pipeline: ingest → chunk → embed → store.
//!
//! The build is a one-shot batch operation that runs before serving.
//! A persisted index in the index directory is reused instead of rebuilt.

use std::path::Path;
use std::sync::Arc;

use tracing::{error, info};

use crate::chunking::Chunker;
use crate::embedding::EmbeddingProvider;
use crate::error::{ChatError, Result};
use crate::index::ChunkIndex;
use crate::ingest;

/// Builds a [`ChunkIndex`] from a directory of documents.
pub struct IndexPipeline {
    chunker: Arc<dyn Chunker>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl IndexPipeline {
    /// Create a pipeline from a chunker and an embedding provider.
    pub fn new(chunker: Arc<dyn Chunker>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { chunker, embedder }
    }

    /// Ingest every supported file under `data_dir` into a fresh index.
    ///
    /// Files that fail to load are skipped (logged inside the ingestor).
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory is unreadable or if
    /// embedding fails; a broken embedding backend should stop the build
    /// rather than produce a partial index.
    pub async fn build(&self, data_dir: &Path) -> Result<ChunkIndex> {
        let documents = ingest::load_dir(data_dir)?;
        info!(document_count = documents.len(), data_dir = %data_dir.display(), "ingested documents");

        let mut index = ChunkIndex::new();
        for document in &documents {
            let mut chunks = self.chunker.chunk(document);
            if chunks.is_empty() {
                continue;
            }

            let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
            let embeddings = self.embedder.embed_batch(&texts).await.map_err(|e| {
                error!(filename = %document.meta.filename, error = %e, "embedding failed during build");
                e
            })?;
            if embeddings.len() != chunks.len() {
                return Err(ChatError::Index(format!(
                    "embedding count mismatch for '{}': {} chunks, {} vectors",
                    document.meta.filename,
                    chunks.len(),
                    embeddings.len()
                )));
            }

            for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
                chunk.embedding = embedding;
            }
            info!(filename = %document.meta.filename, chunk_count = chunks.len(), "indexed document");
            index.insert(chunks);
        }

        Ok(index)
    }

    /// Load the persisted index from `index_dir` if one exists, otherwise
    /// build from `data_dir` and persist the result.
    pub async fn load_or_build(&self, data_dir: &Path, index_dir: &Path) -> Result<ChunkIndex> {
        if ChunkIndex::is_built(index_dir) {
            info!(index_dir = %index_dir.display(), "persisted index found, skipping rebuild");
            return ChunkIndex::load(index_dir);
        }

        info!(index_dir = %index_dir.display(), "no persisted index, building");
        let index = self.build(data_dir).await?;
        index.save(index_dir)?;
        Ok(index)
    }
}
