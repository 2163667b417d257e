//! Data types for documents, chunks, and search hits.

use serde::{Deserialize, Serialize};

/// Provenance metadata attached to every document and inherited by its chunks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceMeta {
    /// The origin file name without extension (e.g. `handbook`).
    pub filename: String,
    /// The lowercased file extension including the dot (e.g. `.pdf`).
    pub filetype: String,
    /// The full path the document was loaded from.
    pub source_path: String,
}

/// A source document: normalized text plus provenance metadata.
///
/// Immutable once created by the ingestor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// The normalized text content.
    pub text: String,
    /// Provenance of the text.
    pub meta: SourceMeta,
}

impl Document {
    /// Create a document from text and metadata.
    pub fn new(text: impl Into<String>, meta: SourceMeta) -> Self {
        Self { text: text.into(), meta }
    }
}

/// A bounded-length segment of a [`Document`] with its vector embedding.
///
/// Chunk IDs are `{filename}#{chunk_index}`. Metadata is inherited from the
/// parent document unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Unique identifier within the index.
    pub id: String,
    /// The text content of the chunk.
    pub text: String,
    /// The embedding vector. Empty until the pipeline attaches one.
    pub embedding: Vec<f32>,
    /// Provenance inherited from the parent document.
    pub meta: SourceMeta,
}

/// A retrieved [`Chunk`] paired with a distance score.
///
/// Lower distance means more similar. The metric is cosine distance but
/// callers should treat it as an opaque total order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// Cosine distance between the query and the chunk (lower is closer).
    pub distance: f32,
}
