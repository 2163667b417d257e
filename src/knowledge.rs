//! Knowledge search tool over the embedded document index.

use std::sync::Arc;

use tracing::{debug, info};

use crate::document::SearchHit;
use crate::embedding::EmbeddingProvider;
use crate::error::Result;
use crate::index::ChunkIndex;
use crate::tools::{BLOCK_DELIMITER, ToolReply};

/// Queries the index, applies optional provenance filters, and formats the
/// surviving results.
///
/// Retrieval is read-only: the tool never mutates the index, and an empty
/// result set is a normal reply, not a failure.
pub struct KnowledgeSearchTool {
    index: Arc<ChunkIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    /// Nearest entries fetched from the index before filtering.
    retrieve_k: usize,
    /// Lowest-distance survivors kept after filtering.
    keep_top: usize,
}

impl KnowledgeSearchTool {
    /// Create a tool over a built index.
    pub fn new(
        index: Arc<ChunkIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
        retrieve_k: usize,
        keep_top: usize,
    ) -> Self {
        Self { index, embedder, retrieve_k, keep_top }
    }

    /// Search the index for `query`.
    ///
    /// The `retrieve_k` nearest hits are filtered to those matching
    /// `source` (exact filename) and `filetype` (exact extension) when
    /// supplied, then the `keep_top` lowest-distance survivors are kept.
    /// Equal distances keep the original retrieval order.
    ///
    /// # Errors
    ///
    /// Fails only if embedding the query fails; zero surviving hits is
    /// [`ToolReply::NothingFound`].
    pub async fn search(
        &self,
        query: &str,
        source: Option<&str>,
        filetype: Option<&str>,
    ) -> Result<ToolReply> {
        debug!(query, ?source, ?filetype, "knowledge search");

        let query_embedding = self.embedder.embed(query).await?;
        let hits = self.index.search(&query_embedding, self.retrieve_k);

        let mut filtered: Vec<SearchHit> = hits
            .into_iter()
            .filter(|hit| {
                source.is_none_or(|s| hit.chunk.meta.filename == s)
                    && filetype.is_none_or(|t| hit.chunk.meta.filetype == t)
            })
            .collect();

        if filtered.is_empty() {
            info!(query, "knowledge search found nothing");
            return Ok(ToolReply::NothingFound);
        }

        // Index hits arrive ascending by distance; the stable sort keeps
        // retrieval order for ties after filtering.
        filtered.sort_by(|a, b| {
            a.distance.partial_cmp(&b.distance).unwrap_or(std::cmp::Ordering::Equal)
        });
        filtered.truncate(self.keep_top);

        info!(query, result_count = filtered.len(), "knowledge search completed");

        let blocks: Vec<String> = filtered
            .iter()
            .map(|hit| format!("[source: {}]\n{}", hit.chunk.meta.filename, hit.chunk.text))
            .collect();

        Ok(ToolReply::Found(blocks.join(BLOCK_DELIMITER)))
    }
}
