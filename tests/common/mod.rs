//! Shared test doubles: a deterministic embedder and stub search providers.

#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;

use ragchat::document::{Chunk, SourceMeta};
use ragchat::embedding::EmbeddingProvider;
use ragchat::error::{ChatError, Result};
use ragchat::model::{ChatModel, ModelRequest, ModelStep};
use ragchat::websearch::{SearchProvider, WebHit};

/// Deterministic hash-based embeddings: identical text always maps to the
/// identical vector, so verbatim queries land at distance zero.
pub struct MockEmbedder {
    dimensions: usize,
}

impl MockEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let hash = text.bytes().fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
        let mut emb = vec![0.0f32; self.dimensions];
        for (i, v) in emb.iter_mut().enumerate() {
            *v = ((hash.wrapping_add(i as u64)) as f32).sin();
        }
        let norm: f32 = emb.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            emb.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(emb)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// An embedder whose every call fails.
pub struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(ChatError::Embedding { provider: "stub".into(), message: "backend down".into() })
    }

    fn dimensions(&self) -> usize {
        4
    }
}

pub fn meta(filename: &str, filetype: &str) -> SourceMeta {
    SourceMeta {
        filename: filename.to_string(),
        filetype: filetype.to_string(),
        source_path: format!("dataset/{filename}{filetype}"),
    }
}

/// Build an embedded chunk through the mock embedder.
pub async fn embedded_chunk(
    embedder: &MockEmbedder,
    id: &str,
    text: &str,
    meta: SourceMeta,
) -> Chunk {
    Chunk {
        id: id.to_string(),
        text: text.to_string(),
        embedding: embedder.embed(text).await.unwrap(),
        meta,
    }
}

/// A web search provider returning a fixed hit list, truncated to the
/// requested maximum.
pub struct StubSearchProvider {
    pub hits: Vec<WebHit>,
}

#[async_trait]
impl SearchProvider for StubSearchProvider {
    fn name(&self) -> &str {
        "stub"
    }

    async fn search(&self, _query: &str, max_results: usize) -> Result<Vec<WebHit>> {
        Ok(self.hits.iter().take(max_results).cloned().collect())
    }
}

/// A web search provider whose every call fails.
pub struct FailingSearchProvider;

#[async_trait]
impl SearchProvider for FailingSearchProvider {
    fn name(&self) -> &str {
        "failing"
    }

    async fn search(&self, _query: &str, _max_results: usize) -> Result<Vec<WebHit>> {
        Err(ChatError::WebSearch("connection refused".to_string()))
    }
}

/// A scripted chat model: pops steps from a queue and records every
/// request it receives. When the script runs dry it keeps requesting the
/// same tool call, which is the adversarial non-terminating shape.
pub struct StubModel {
    script: Mutex<Vec<ModelStep>>,
    pub requests: Mutex<Vec<ModelRequest>>,
    exhausted_step: ModelStep,
}

impl StubModel {
    /// A model that follows `script` in order, then repeats `exhausted_step`.
    pub fn new(script: Vec<ModelStep>, exhausted_step: ModelStep) -> Self {
        // Stored reversed so pop() yields script order.
        let mut script = script;
        script.reverse();
        Self { script: Mutex::new(script), requests: Mutex::new(Vec::new()), exhausted_step }
    }

    /// A model that requests the given tool forever.
    pub fn always_calling(name: &str, args: serde_json::Value) -> Self {
        Self::new(Vec::new(), ModelStep::ToolRequest { name: name.to_string(), args })
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatModel for StubModel {
    fn name(&self) -> &str {
        "stub"
    }

    async fn generate(&self, request: ModelRequest) -> Result<ModelStep> {
        self.requests.lock().unwrap().push(request);
        let next = self.script.lock().unwrap().pop();
        Ok(next.unwrap_or_else(|| self.exhausted_step.clone()))
    }
}

/// A chat model whose every call fails.
pub struct FailingModel;

#[async_trait]
impl ChatModel for FailingModel {
    fn name(&self) -> &str {
        "failing"
    }

    async fn generate(&self, _request: ModelRequest) -> Result<ModelStep> {
        Err(ChatError::Model { provider: "stub".into(), message: "service unavailable".into() })
    }
}
