//! Web search tool with a pluggable provider.
//!
//! [`SearchProvider`] is the seam to the external search service; the
//! shipped implementation is [`TavilyProvider`]. Transport and service
//! errors propagate to the agent — only an empty hit list is a normal
//! "nothing found" reply.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error, info};

use crate::error::{ChatError, Result};
use crate::tools::{BLOCK_DELIMITER, ToolReply};

/// One web search result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebHit {
    /// Source URL of the result.
    pub url: String,
    /// Content snippet for the result.
    pub content: String,
}

/// An external web search service.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Provider name for logs.
    fn name(&self) -> &str;

    /// Execute one search request for at most `max_results` hits.
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<WebHit>>;
}

/// Tavily search provider.
pub struct TavilyProvider {
    client: reqwest::Client,
    api_key: String,
}

const TAVILY_SEARCH_URL: &str = "https://api.tavily.com/search";

impl TavilyProvider {
    /// Create a provider with the given API key and request timeout.
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(ChatError::WebSearch("Tavily API key must not be empty".to_string()));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChatError::WebSearch(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, api_key })
    }
}

#[async_trait]
impl SearchProvider for TavilyProvider {
    fn name(&self) -> &str {
        "Tavily"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<WebHit>> {
        let body = serde_json::json!({
            "api_key": self.api_key,
            "query": query,
            "max_results": max_results,
            "include_answer": false,
        });

        let response =
            self.client.post(TAVILY_SEARCH_URL).json(&body).send().await.map_err(|e| {
                error!(provider = "Tavily", error = %e, "request failed");
                ChatError::WebSearch(format!("Tavily request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            error!(provider = "Tavily", %status, "API error");
            return Err(ChatError::WebSearch(format!("Tavily returned {status}: {detail}")));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| ChatError::WebSearch(format!("failed to parse Tavily response: {e}")))?;

        let hits = data
            .get("results")
            .and_then(|r| r.as_array())
            .map(|items| {
                items
                    .iter()
                    .map(|item| WebHit {
                        url: item.get("url").and_then(|u| u.as_str()).unwrap_or("").to_string(),
                        content: item
                            .get("content")
                            .and_then(|c| c.as_str())
                            .unwrap_or("")
                            .to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(hits)
    }
}

/// Formats provider hits into the tool's observation blocks.
pub struct WebSearchTool {
    provider: Arc<dyn SearchProvider>,
    default_results: usize,
}

impl WebSearchTool {
    /// Create a tool over a search provider.
    pub fn new(provider: Arc<dyn SearchProvider>, default_results: usize) -> Self {
        Self { provider, default_results }
    }

    /// Run one web search.
    ///
    /// Requests at most `num_results` hits (the configured default when
    /// `None`). Zero hits is [`ToolReply::NothingFound`]; provider errors
    /// propagate so the agent can distinguish "no results" from "search
    /// failed".
    pub async fn run(&self, query: &str, num_results: Option<usize>) -> Result<ToolReply> {
        let max_results = num_results.unwrap_or(self.default_results);
        debug!(provider = self.provider.name(), query, max_results, "web search");

        let hits = self.provider.search(query, max_results).await?;
        if hits.is_empty() {
            info!(query, "web search found nothing");
            return Ok(ToolReply::NothingFound);
        }

        info!(query, result_count = hits.len(), "web search completed");

        let blocks: Vec<String> =
            hits.iter().map(|hit| format!("[URL: {}]\n{}", hit.url, hit.content)).collect();

        Ok(ToolReply::Found(blocks.join(BLOCK_DELIMITER)))
    }
}
