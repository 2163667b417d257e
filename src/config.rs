//! Configuration for the assistant.

use serde::{Deserialize, Serialize};

use crate::error::{ChatError, Result};

/// Tunable parameters for ingestion, retrieval, and the agent loop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
    /// Number of nearest entries retrieved from the index per knowledge query.
    pub retrieve_k: usize,
    /// Number of lowest-distance results kept after filtering.
    pub keep_top: usize,
    /// Default number of web search results per request.
    pub web_results: usize,
    /// Maximum reasoning cycles per user message before the agent falls back.
    pub max_steps: usize,
    /// Maximum conversation turns retained per session (oldest dropped first).
    pub history_max_turns: usize,
    /// Natural language the assistant must answer in.
    pub reply_language: String,
    /// Timeout in seconds applied to every outbound HTTP call.
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            chunk_size: 512,
            chunk_overlap: 64,
            retrieve_k: 10,
            keep_top: 5,
            web_results: 5,
            max_steps: 6,
            history_max_turns: 20,
            reply_language: "Vietnamese".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl AppConfig {
    /// Create a new builder for constructing an [`AppConfig`].
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`AppConfig`].
#[derive(Debug, Clone, Default)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfigBuilder {
    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the number of nearest entries retrieved per knowledge query.
    pub fn retrieve_k(mut self, k: usize) -> Self {
        self.config.retrieve_k = k;
        self
    }

    /// Set the number of lowest-distance results kept after filtering.
    pub fn keep_top(mut self, n: usize) -> Self {
        self.config.keep_top = n;
        self
    }

    /// Set the default number of web search results.
    pub fn web_results(mut self, n: usize) -> Self {
        self.config.web_results = n;
        self
    }

    /// Set the maximum reasoning cycles per user message.
    pub fn max_steps(mut self, n: usize) -> Self {
        self.config.max_steps = n;
        self
    }

    /// Set the maximum conversation turns retained per session.
    pub fn history_max_turns(mut self, n: usize) -> Self {
        self.config.history_max_turns = n;
        self
    }

    /// Set the language the assistant answers in.
    pub fn reply_language(mut self, language: impl Into<String>) -> Self {
        self.config.reply_language = language.into();
        self
    }

    /// Set the timeout applied to outbound HTTP calls.
    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    /// Build the [`AppConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Config`] if:
    /// - `chunk_overlap >= chunk_size`
    /// - `retrieve_k == 0` or `keep_top == 0`
    /// - `keep_top > retrieve_k`
    /// - `max_steps == 0`
    pub fn build(self) -> Result<AppConfig> {
        let c = &self.config;
        if c.chunk_overlap >= c.chunk_size {
            return Err(ChatError::Config(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                c.chunk_overlap, c.chunk_size
            )));
        }
        if c.retrieve_k == 0 || c.keep_top == 0 {
            return Err(ChatError::Config(
                "retrieve_k and keep_top must be greater than zero".to_string(),
            ));
        }
        if c.keep_top > c.retrieve_k {
            return Err(ChatError::Config(format!(
                "keep_top ({}) must not exceed retrieve_k ({})",
                c.keep_top, c.retrieve_k
            )));
        }
        if c.max_steps == 0 {
            return Err(ChatError::Config("max_steps must be greater than zero".to_string()));
        }
        Ok(self.config)
    }
}

/// API credentials loaded from the environment at startup.
///
/// Missing credentials are a fatal startup error; the process must not
/// proceed to serve traffic without them.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Key for the Gemini model and embedding APIs.
    pub gemini_api_key: String,
    /// Key for the Tavily web search API.
    pub tavily_api_key: String,
}

impl Credentials {
    /// Load credentials from `GEMINI_API_KEY` (or `GOOGLE_API_KEY`) and
    /// `TAVILY_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let gemini_api_key = std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("GOOGLE_API_KEY"))
            .map_err(|_| {
                ChatError::Config(
                    "GEMINI_API_KEY or GOOGLE_API_KEY environment variable not set".to_string(),
                )
            })?;
        let tavily_api_key = std::env::var("TAVILY_API_KEY").map_err(|_| {
            ChatError::Config("TAVILY_API_KEY environment variable not set".to_string())
        })?;
        Ok(Self { gemini_api_key, tavily_api_key })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::builder().build().unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn rejects_overlap_not_smaller_than_chunk_size() {
        let err = AppConfig::builder().chunk_size(100).chunk_overlap(100).build();
        assert!(matches!(err, Err(ChatError::Config(_))));
    }

    #[test]
    fn rejects_keep_top_above_retrieve_k() {
        let err = AppConfig::builder().retrieve_k(3).keep_top(5).build();
        assert!(matches!(err, Err(ChatError::Config(_))));
    }

    #[test]
    fn rejects_zero_max_steps() {
        let err = AppConfig::builder().max_steps(0).build();
        assert!(matches!(err, Err(ChatError::Config(_))));
    }
}
