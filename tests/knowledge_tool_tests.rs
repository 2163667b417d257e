//! Behavior of the knowledge search tool: sentinel, result cap, ordering,
//! and provenance filters.

mod common;

use std::sync::Arc;

use common::{MockEmbedder, embedded_chunk, meta};
use ragchat::index::ChunkIndex;
use ragchat::knowledge::KnowledgeSearchTool;
use ragchat::tools::{BLOCK_DELIMITER, ToolReply};

const DIM: usize = 64;

async fn two_file_index(embedder: &MockEmbedder) -> ChunkIndex {
    let mut index = ChunkIndex::new();
    index.insert(vec![
        embedded_chunk(embedder, "alpha#0", "the annual leave policy allows 20 days", meta("alpha", ".txt")).await,
        embedded_chunk(embedder, "alpha#1", "sick leave requires a doctor's note", meta("alpha", ".txt")).await,
        embedded_chunk(embedder, "beta#0", "quarterly revenue grew by twelve percent", meta("beta", ".pdf")).await,
        embedded_chunk(embedder, "beta#1", "operating costs were flat year over year", meta("beta", ".pdf")).await,
    ]);
    index
}

fn blocks(reply: &ToolReply) -> Vec<&str> {
    match reply {
        ToolReply::Found(text) => text.split(BLOCK_DELIMITER).collect(),
        ToolReply::NothingFound => Vec::new(),
    }
}

#[tokio::test]
async fn empty_index_returns_nothing_found() {
    let embedder = Arc::new(MockEmbedder::new(DIM));
    let tool = KnowledgeSearchTool::new(Arc::new(ChunkIndex::new()), embedder, 10, 5);

    let reply = tool.search("no data", None, None).await.unwrap();
    assert_eq!(reply, ToolReply::NothingFound);
}

#[tokio::test]
async fn verbatim_query_surfaces_its_source_first() {
    let embedder = Arc::new(MockEmbedder::new(DIM));
    let index = Arc::new(two_file_index(&embedder).await);
    let tool = KnowledgeSearchTool::new(index, embedder, 10, 5);

    let reply =
        tool.search("the annual leave policy allows 20 days", None, None).await.unwrap();
    let blocks = blocks(&reply);
    assert!(!blocks.is_empty());
    assert!(blocks[0].starts_with("[source: alpha]"));
    assert!(blocks[0].contains("the annual leave policy allows 20 days"));
}

#[tokio::test]
async fn never_returns_more_than_keep_top_results() {
    let embedder = Arc::new(MockEmbedder::new(DIM));
    let mut index = ChunkIndex::new();
    for i in 0..12 {
        index.insert(vec![
            embedded_chunk(&embedder, &format!("doc#{i}"), &format!("fact number {i}"), meta("doc", ".txt")).await,
        ]);
    }
    let tool = KnowledgeSearchTool::new(Arc::new(index), embedder, 10, 5);

    let reply = tool.search("fact number 3", None, None).await.unwrap();
    assert!(blocks(&reply).len() <= 5);
}

#[tokio::test]
async fn source_filter_restricts_to_that_filename() {
    let embedder = Arc::new(MockEmbedder::new(DIM));
    let index = Arc::new(two_file_index(&embedder).await);
    let tool = KnowledgeSearchTool::new(index, embedder, 10, 5);

    let reply = tool.search("leave policy", Some("alpha"), None).await.unwrap();
    let blocks = blocks(&reply);
    assert!(!blocks.is_empty());
    assert!(blocks.iter().all(|b| b.starts_with("[source: alpha]")));
}

#[tokio::test]
async fn filetype_filter_restricts_to_that_extension() {
    let embedder = Arc::new(MockEmbedder::new(DIM));
    let index = Arc::new(two_file_index(&embedder).await);
    let tool = KnowledgeSearchTool::new(index, embedder, 10, 5);

    let reply = tool.search("revenue", None, Some(".pdf")).await.unwrap();
    let blocks = blocks(&reply);
    assert!(!blocks.is_empty());
    assert!(blocks.iter().all(|b| b.starts_with("[source: beta]")));
}

#[tokio::test]
async fn combined_filters_are_a_conjunction() {
    let embedder = Arc::new(MockEmbedder::new(DIM));
    let index = Arc::new(two_file_index(&embedder).await);
    let tool = KnowledgeSearchTool::new(index, embedder, 10, 5);

    // "alpha" exists only as .txt, so alpha AND .pdf matches nothing.
    let reply = tool.search("leave policy", Some("alpha"), Some(".pdf")).await.unwrap();
    assert_eq!(reply, ToolReply::NothingFound);

    // The satisfiable conjunction still matches.
    let reply = tool.search("revenue", Some("beta"), Some(".pdf")).await.unwrap();
    assert!(matches!(reply, ToolReply::Found(_)));
}

#[tokio::test]
async fn unknown_source_returns_nothing_found() {
    let embedder = Arc::new(MockEmbedder::new(DIM));
    let index = Arc::new(two_file_index(&embedder).await);
    let tool = KnowledgeSearchTool::new(index, embedder, 10, 5);

    let reply = tool.search("anything", Some("gamma"), None).await.unwrap();
    assert_eq!(reply, ToolReply::NothingFound);
}
