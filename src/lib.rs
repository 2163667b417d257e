//! # ragchat
//!
//! A single-process retrieval-augmented chat assistant. Local documents are
//! ingested, chunked, embedded, and indexed for semantic search; a
//! conversational agent then answers questions in a configured target
//! language by consulting either the indexed corpus (`search_knowledge`) or
//! live web search (`web_search`), citing its sources.
//!
//! The index is built once (or loaded from disk when already persisted) and
//! is read-only afterwards, so it can be shared across sessions. Each
//! [`session::ChatSession`] owns its own bounded conversation history and
//! converts every per-turn failure into a user-visible message instead of
//! crashing the serving loop.

pub mod agent;
pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod index;
pub mod ingest;
pub mod knowledge;
pub mod model;
pub mod pipeline;
pub mod session;
pub mod tools;
pub mod websearch;

pub use agent::{Agent, Role, Turn};
pub use chunking::{Chunker, RecursiveChunker};
pub use config::{AppConfig, Credentials};
pub use document::{Chunk, Document, SearchHit, SourceMeta};
pub use embedding::{EmbeddingProvider, GeminiEmbeddingProvider};
pub use error::{ChatError, Result};
pub use index::ChunkIndex;
pub use knowledge::KnowledgeSearchTool;
pub use model::{ChatModel, GeminiChatModel, ModelStep};
pub use pipeline::IndexPipeline;
pub use session::ChatSession;
pub use tools::{ToolCall, ToolReply};
pub use websearch::{SearchProvider, TavilyProvider, WebSearchTool};
