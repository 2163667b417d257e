//! Error types for the `ragchat` crate.

use thiserror::Error;

/// Errors that can occur across ingestion, indexing, and chat operations.
#[derive(Debug, Error)]
pub enum ChatError {
    /// A document could not be read or parsed during ingestion.
    #[error("Ingest error ({path}): {message}")]
    Ingest {
        /// The file that failed to load.
        path: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    Embedding {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector index.
    #[error("Index error: {0}")]
    Index(String),

    /// The web search service failed (transport or service error).
    ///
    /// Distinct from an empty result set, which is not an error.
    #[error("Web search error: {0}")]
    WebSearch(String),

    /// The language model call failed.
    #[error("Model error ({provider}): {message}")]
    Model {
        /// The model provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// A tool received invalid arguments or failed during execution.
    #[error("Tool error: {0}")]
    Tool(String),

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// A convenience result type for ragchat operations.
pub type Result<T> = std::result::Result<T, ChatError>;
