//! In-memory vector index with JSON persistence.
//!
//! The index is built once by the pipeline, persisted to disk, and
//! thereafter read-only — it is shared across sessions via `Arc` with no
//! writer contention.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::document::{Chunk, SearchHit};
use crate::error::{ChatError, Result};

/// File inside the index directory whose presence marks a completed build.
const INDEX_FILE: &str = "index.json";

/// An in-memory vector index over embedded chunks.
///
/// Search ranks by cosine distance (lower is closer). Ties keep insertion
/// order, which makes downstream tie-breaking stable.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ChunkIndex {
    chunks: Vec<Chunk>,
}

/// Cosine distance between two vectors: `1 - cosine_similarity`.
///
/// Returns 1.0 (maximally distant) if either vector has zero magnitude or
/// the dimensions disagree.
fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 1.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - dot / (norm_a * norm_b)
}

impl ChunkIndex {
    /// Create a new empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append embedded chunks to the index.
    pub fn insert(&mut self, chunks: Vec<Chunk>) {
        self.chunks.extend(chunks);
    }

    /// Number of chunks in the index.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether the index holds no chunks.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Return the `top_k` chunks nearest to `embedding`, ascending by
    /// cosine distance. An empty index returns no hits.
    pub fn search(&self, embedding: &[f32], top_k: usize) -> Vec<SearchHit> {
        let mut hits: Vec<SearchHit> = self
            .chunks
            .iter()
            .map(|chunk| SearchHit {
                chunk: chunk.clone(),
                distance: cosine_distance(&chunk.embedding, embedding),
            })
            .collect();

        // Stable sort: equal distances keep insertion order.
        hits.sort_by(|a, b| {
            a.distance.partial_cmp(&b.distance).unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(top_k);
        hits
    }

    /// Whether a persisted index exists in `dir`.
    pub fn is_built(dir: &Path) -> bool {
        dir.join(INDEX_FILE).is_file()
    }

    /// Persist the index as JSON into `dir`, creating the directory if
    /// needed. The written file doubles as the "already built" marker.
    pub fn save(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)
            .map_err(|e| ChatError::Index(format!("cannot create '{}': {e}", dir.display())))?;
        let path = dir.join(INDEX_FILE);
        let data = serde_json::to_vec(self)
            .map_err(|e| ChatError::Index(format!("serialization failed: {e}")))?;
        std::fs::write(&path, data)
            .map_err(|e| ChatError::Index(format!("cannot write '{}': {e}", path.display())))?;
        info!(path = %path.display(), chunk_count = self.chunks.len(), "index saved");
        Ok(())
    }

    /// Load a previously persisted index from `dir`.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(INDEX_FILE);
        let data = std::fs::read(&path)
            .map_err(|e| ChatError::Index(format!("cannot read '{}': {e}", path.display())))?;
        let index: Self = serde_json::from_slice(&data)
            .map_err(|e| ChatError::Index(format!("corrupt index at '{}': {e}", path.display())))?;
        info!(path = %path.display(), chunk_count = index.chunks.len(), "index loaded");
        Ok(index)
    }
}
