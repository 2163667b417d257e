//! Language model interface and the Gemini implementation.
//!
//! [`ChatModel`] is the seam the agent reasons through: one call per
//! reasoning step, yielding either a final answer or a tool request.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};

use crate::error::{ChatError, Result};
use crate::tools::FunctionDecl;

/// Role of a content entry sent to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelRole {
    /// User input or a tool observation fed back to the model.
    User,
    /// A previous model output (answer text or tool request).
    Model,
}

/// One part of a content entry.
#[derive(Debug, Clone)]
pub enum ModelPart {
    /// Plain text.
    Text(String),
    /// A tool request previously emitted by the model.
    FunctionCall {
        /// Requested tool name.
        name: String,
        /// Arguments object.
        args: Value,
    },
    /// A tool observation returned to the model.
    FunctionResponse {
        /// Name of the tool that produced the observation.
        name: String,
        /// Observation payload.
        response: Value,
    },
}

/// One content entry in the model's working context.
#[derive(Debug, Clone)]
pub struct ModelContent {
    /// Who produced this entry.
    pub role: ModelRole,
    /// The entry's parts.
    pub parts: Vec<ModelPart>,
}

impl ModelContent {
    /// A single-text content entry.
    pub fn text(role: ModelRole, text: impl Into<String>) -> Self {
        Self { role, parts: vec![ModelPart::Text(text.into())] }
    }
}

/// A request for one reasoning step.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    /// System instruction (language and citation contract).
    pub system: String,
    /// Conversation so far, including tool exchanges of the current turn.
    pub contents: Vec<ModelContent>,
    /// Tools the model may request.
    pub tools: Vec<FunctionDecl>,
}

/// What the model produced in one reasoning step.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelStep {
    /// A final answer for the user.
    Answer(String),
    /// A request to invoke one tool.
    ToolRequest {
        /// Requested tool name.
        name: String,
        /// Arguments object.
        args: Value,
    },
    /// The model produced neither text nor a tool request.
    ///
    /// The agent treats this as a recoverable parsing failure.
    Empty,
}

/// A language model that can answer or request one tool per step.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Model identifier for logs.
    fn name(&self) -> &str;

    /// Run one reasoning step.
    async fn generate(&self, request: ModelRequest) -> Result<ModelStep>;
}

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Default chat model.
pub const DEFAULT_CHAT_MODEL: &str = "gemini-2.0-flash";

/// A [`ChatModel`] backed by the Gemini `generateContent` API with
/// function calling.
pub struct GeminiChatModel {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiChatModel {
    /// Create a model client with the given API key, model name, and
    /// request timeout.
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(ChatError::Model {
                provider: "Gemini".into(),
                message: "API key must not be empty".into(),
            });
        }
        let client = reqwest::Client::builder().timeout(timeout).build().map_err(|e| {
            ChatError::Model {
                provider: "Gemini".into(),
                message: format!("failed to build HTTP client: {e}"),
            }
        })?;
        Ok(Self { client, api_key, model: model.into() })
    }
}

// ── Gemini API request/response types ──────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    system_instruction: WireContent,
    contents: Vec<WireContent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireToolSet>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireToolSet {
    function_declarations: Vec<FunctionDecl>,
}

#[derive(Serialize, Deserialize)]
struct WireContent {
    #[serde(default)]
    role: String,
    #[serde(default)]
    parts: Vec<WirePart>,
}

#[derive(Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct WirePart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_call: Option<WireFunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_response: Option<WireFunctionResponse>,
}

#[derive(Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    #[serde(default)]
    args: Value,
}

#[derive(Serialize, Deserialize)]
struct WireFunctionResponse {
    name: String,
    response: Value,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<WireContent>,
}

fn to_wire(content: &ModelContent) -> WireContent {
    let role = match content.role {
        ModelRole::User => "user",
        ModelRole::Model => "model",
    };
    let parts = content
        .parts
        .iter()
        .map(|part| match part {
            ModelPart::Text(text) => WirePart { text: Some(text.clone()), ..Default::default() },
            ModelPart::FunctionCall { name, args } => WirePart {
                function_call: Some(WireFunctionCall { name: name.clone(), args: args.clone() }),
                ..Default::default()
            },
            ModelPart::FunctionResponse { name, response } => WirePart {
                function_response: Some(WireFunctionResponse {
                    name: name.clone(),
                    response: response.clone(),
                }),
                ..Default::default()
            },
        })
        .collect();
    WireContent { role: role.to_string(), parts }
}

fn parse_step(response: GenerateResponse) -> ModelStep {
    let Some(content) = response.candidates.into_iter().next().and_then(|c| c.content) else {
        return ModelStep::Empty;
    };

    // A function call wins over any accompanying text.
    for part in &content.parts {
        if let Some(call) = &part.function_call {
            return ModelStep::ToolRequest { name: call.name.clone(), args: call.args.clone() };
        }
    }

    let text: String = content
        .parts
        .iter()
        .filter_map(|p| p.text.as_deref())
        .collect::<Vec<_>>()
        .join("");

    if text.trim().is_empty() { ModelStep::Empty } else { ModelStep::Answer(text) }
}

#[async_trait]
impl ChatModel for GeminiChatModel {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: ModelRequest) -> Result<ModelStep> {
        let body = GenerateRequest {
            system_instruction: WireContent {
                role: "user".to_string(),
                parts: vec![WirePart { text: Some(request.system), ..Default::default() }],
            },
            contents: request.contents.iter().map(to_wire).collect(),
            tools: if request.tools.is_empty() {
                Vec::new()
            } else {
                vec![WireToolSet { function_declarations: request.tools }]
            },
        };

        debug!(model = %self.model, content_count = body.contents.len(), "model request");

        let url = format!("{GEMINI_API_BASE}/{}:generateContent", self.model);
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = "Gemini", error = %e, "model request failed");
                ChatError::Model {
                    provider: "Gemini".into(),
                    message: format!("request failed: {e}"),
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            error!(provider = "Gemini", %status, "model API error");
            return Err(ChatError::Model {
                provider: "Gemini".into(),
                message: format!("API returned {status}: {detail}"),
            });
        }

        let parsed: GenerateResponse = response.json().await.map_err(|e| {
            error!(provider = "Gemini", error = %e, "failed to parse model response");
            ChatError::Model {
                provider: "Gemini".into(),
                message: format!("failed to parse response: {e}"),
            }
        })?;

        Ok(parse_step(parsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response_from(value: Value) -> GenerateResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn text_candidate_parses_as_answer() {
        let step = parse_step(response_from(json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": "xin chào"}]}}]
        })));
        assert_eq!(step, ModelStep::Answer("xin chào".to_string()));
    }

    #[test]
    fn function_call_wins_over_text() {
        let step = parse_step(response_from(json!({
            "candidates": [{"content": {"role": "model", "parts": [
                {"text": "let me look that up"},
                {"functionCall": {"name": "search_knowledge", "args": {"query": "q"}}}
            ]}}]
        })));
        assert_eq!(
            step,
            ModelStep::ToolRequest {
                name: "search_knowledge".to_string(),
                args: json!({"query": "q"})
            }
        );
    }

    #[test]
    fn missing_candidates_parse_as_empty() {
        assert_eq!(parse_step(response_from(json!({}))), ModelStep::Empty);
        let step = parse_step(response_from(json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": "   "}]}}]
        })));
        assert_eq!(step, ModelStep::Empty);
    }
}
