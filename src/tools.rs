//! Tool surface shared by the agent and the model layer.
//!
//! The agent exposes exactly two tools. A model reasoning step yields one
//! [`ToolCall`] variant with typed arguments; dispatch is a `match`, not
//! free-text parsing.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::{ChatError, Result};

/// Delimiter between formatted result blocks in tool output.
pub const BLOCK_DELIMITER: &str = "\n\n---\n\n";

/// Sentinel returned when no indexed chunk survives filtering.
pub const KNOWLEDGE_NOT_FOUND: &str = "No matching results found in the specified sources.";

/// Sentinel returned when a web search yields zero hits.
pub const WEB_NOT_FOUND: &str = "No results found on the web.";

/// Name of the internal knowledge search tool.
pub const SEARCH_KNOWLEDGE: &str = "search_knowledge";

/// Name of the web search tool.
pub const WEB_SEARCH: &str = "web_search";

/// Outcome of a successful tool execution.
///
/// "Nothing found" is a normal outcome, distinct from a failed execution
/// (which surfaces as an `Err`). The agent turns [`ToolReply::NothingFound`]
/// into the tool's fixed sentinel string.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolReply {
    /// Formatted result blocks.
    Found(String),
    /// The query succeeded but matched nothing.
    NothingFound,
}

impl ToolReply {
    /// Render the reply as the observation text the model sees, using
    /// `sentinel` for the empty case.
    pub fn into_observation(self, sentinel: &str) -> String {
        match self {
            ToolReply::Found(text) => text,
            ToolReply::NothingFound => sentinel.to_string(),
        }
    }
}

/// Arguments for the knowledge search tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchKnowledgeArgs {
    /// The search query.
    pub query: String,
    /// Restrict results to this exact source filename.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Restrict results to this exact file extension (e.g. `.pdf`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filetype: Option<String>,
}

/// Arguments for the web search tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WebSearchArgs {
    /// The search query.
    pub query: String,
    /// Maximum number of results to request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_results: Option<usize>,
}

/// A tool invocation chosen by the model in one reasoning step.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCall {
    /// Query the embedded document index.
    SearchKnowledge(SearchKnowledgeArgs),
    /// Query the external web search service.
    WebSearch(WebSearchArgs),
}

impl ToolCall {
    /// Parse a named function call with JSON arguments into a typed variant.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Tool`] for an unknown tool name or arguments
    /// that do not match the tool's schema. The agent treats this as a
    /// recoverable parsing error.
    pub fn parse(name: &str, args: Value) -> Result<Self> {
        match name {
            SEARCH_KNOWLEDGE => serde_json::from_value(args)
                .map(ToolCall::SearchKnowledge)
                .map_err(|e| ChatError::Tool(format!("invalid {SEARCH_KNOWLEDGE} arguments: {e}"))),
            WEB_SEARCH => serde_json::from_value(args)
                .map(ToolCall::WebSearch)
                .map_err(|e| ChatError::Tool(format!("invalid {WEB_SEARCH} arguments: {e}"))),
            other => Err(ChatError::Tool(format!("unknown tool '{other}'"))),
        }
    }

    /// The wire name of the invoked tool.
    pub fn name(&self) -> &'static str {
        match self {
            ToolCall::SearchKnowledge(_) => SEARCH_KNOWLEDGE,
            ToolCall::WebSearch(_) => WEB_SEARCH,
        }
    }
}

/// A function declaration advertised to the model.
#[derive(Debug, Clone, Serialize)]
pub struct FunctionDecl {
    /// Tool name the model calls it by.
    pub name: String,
    /// Natural-language description guiding tool selection.
    pub description: String,
    /// JSON schema for the arguments object.
    pub parameters: Value,
}

/// Declarations for the registered tool set.
pub fn declarations() -> Vec<FunctionDecl> {
    vec![
        FunctionDecl {
            name: SEARCH_KNOWLEDGE.to_string(),
            description: "Search the internal document knowledge base. Optionally restrict \
                          results to one source file or one file type."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search query"
                    },
                    "source": {
                        "type": "string",
                        "description": "Exact source filename to restrict results to"
                    },
                    "filetype": {
                        "type": "string",
                        "description": "Exact file extension to restrict results to, e.g. '.pdf'"
                    }
                },
                "required": ["query"]
            }),
        },
        FunctionDecl {
            name: WEB_SEARCH.to_string(),
            description: "Search the internet for current information. Returns result snippets \
                          with their source URLs."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search query"
                    },
                    "num_results": {
                        "type": "integer",
                        "description": "Maximum number of results (default 5)"
                    }
                },
                "required": ["query"]
            }),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_search_knowledge_with_filters() {
        let call = ToolCall::parse(
            SEARCH_KNOWLEDGE,
            json!({"query": "leave policy", "source": "handbook", "filetype": ".pdf"}),
        )
        .unwrap();
        let ToolCall::SearchKnowledge(args) = call else { panic!("wrong variant") };
        assert_eq!(args.query, "leave policy");
        assert_eq!(args.source.as_deref(), Some("handbook"));
        assert_eq!(args.filetype.as_deref(), Some(".pdf"));
    }

    #[test]
    fn parses_web_search_without_num_results() {
        let call = ToolCall::parse(WEB_SEARCH, json!({"query": "weather in Hue"})).unwrap();
        assert_eq!(call.name(), WEB_SEARCH);
    }

    #[test]
    fn unknown_tool_name_is_a_tool_error() {
        let err = ToolCall::parse("delete_everything", json!({})).unwrap_err();
        assert!(matches!(err, ChatError::Tool(_)));
    }

    #[test]
    fn missing_query_is_a_tool_error() {
        let err = ToolCall::parse(SEARCH_KNOWLEDGE, json!({"source": "handbook"})).unwrap_err();
        assert!(matches!(err, ChatError::Tool(_)));
    }
}
