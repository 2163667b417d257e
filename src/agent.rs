//! Conversation agent: the retrieval-augmented tool-selection loop.
//!
//! Each user message drives the loop
//! `Reasoning → {ToolCall → Observing → Reasoning}* → Responding`.
//! The model either answers or requests exactly one tool per step; tool
//! output is fed back as an observation and the loop re-enters reasoning.
//! The loop is bounded by `max_steps`, so an adversarial or mis-prompted
//! model can never hang a turn.

use std::sync::Arc;

use serde_json::json;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::Result;
use crate::knowledge::KnowledgeSearchTool;
use crate::model::{ChatModel, ModelContent, ModelPart, ModelRequest, ModelRole, ModelStep};
use crate::tools::{self, KNOWLEDGE_NOT_FOUND, ToolCall, WEB_NOT_FOUND};
use crate::websearch::WebSearchTool;

/// Who produced a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The human user.
    User,
    /// The assistant.
    Assistant,
}

/// One entry of the conversation history.
#[derive(Debug, Clone)]
pub struct Turn {
    /// Who spoke.
    pub role: Role,
    /// What was said.
    pub content: String,
}

impl Turn {
    /// A user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    /// An assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// Corrective note sent back when a model step is unparseable.
const REPROMPT_NOTE: &str = "Your previous reply could not be interpreted. Reply with either a \
                             final answer or a call to one of the available tools.";

/// The reasoning loop over the model and the two registered tools.
pub struct Agent {
    model: Arc<dyn ChatModel>,
    knowledge: KnowledgeSearchTool,
    web: WebSearchTool,
    max_steps: usize,
    reply_language: String,
}

impl Agent {
    /// Create an agent from its collaborators and the app configuration.
    pub fn new(
        model: Arc<dyn ChatModel>,
        knowledge: KnowledgeSearchTool,
        web: WebSearchTool,
        config: &AppConfig,
    ) -> Self {
        Self {
            model,
            knowledge,
            web,
            max_steps: config.max_steps,
            reply_language: config.reply_language.clone(),
        }
    }

    /// The behavioral contract: target language, tool guidance, citations.
    fn system_instruction(&self) -> String {
        format!(
            "You are a helpful research assistant.\n\
             - Always answer exclusively in {language}, regardless of the language of the \
               question or of tool output.\n\
             - Use the search_knowledge tool for questions about the internal document \
               collection; use the web_search tool for current public information.\n\
             - Cite sources inline: the source filename for knowledge results, the URL for \
               web results.\n\
             - If nothing was found, say so explicitly. Never invent content.\n\
             - Take the conversation history into account.",
            language = self.reply_language
        )
    }

    /// Answer one user message given the prior conversation.
    ///
    /// Runs at most `max_steps` reasoning cycles. Tool execution failures
    /// are fed back to the model as failure observations so it can produce
    /// a degraded answer; unparseable model output triggers a re-prompt.
    /// When the step budget runs out a fixed fallback answer is returned.
    ///
    /// # Errors
    ///
    /// Returns an error only if the model call itself fails; the caller
    /// (the session driver) converts it to a user-visible message.
    pub async fn respond(&self, history: &[Turn], message: &str) -> Result<String> {
        let mut contents: Vec<ModelContent> = history
            .iter()
            .map(|turn| {
                let role = match turn.role {
                    Role::User => ModelRole::User,
                    Role::Assistant => ModelRole::Model,
                };
                ModelContent::text(role, turn.content.clone())
            })
            .collect();
        contents.push(ModelContent::text(ModelRole::User, message));

        for step in 0..self.max_steps {
            let request = ModelRequest {
                system: self.system_instruction(),
                contents: contents.clone(),
                tools: tools::declarations(),
            };

            match self.model.generate(request).await? {
                ModelStep::Answer(text) => {
                    info!(step, "agent produced final answer");
                    return Ok(text);
                }
                ModelStep::Empty => {
                    warn!(step, "unparseable model step, re-prompting");
                    contents.push(ModelContent::text(ModelRole::User, REPROMPT_NOTE));
                }
                ModelStep::ToolRequest { name, args } => {
                    info!(step, tool = %name, "agent requested tool");
                    contents.push(ModelContent {
                        role: ModelRole::Model,
                        parts: vec![ModelPart::FunctionCall {
                            name: name.clone(),
                            args: args.clone(),
                        }],
                    });

                    let observation = match ToolCall::parse(&name, args) {
                        Ok(call) => self.execute(call).await,
                        Err(e) => {
                            warn!(step, tool = %name, error = %e, "invalid tool call");
                            format!("Invalid tool call: {e}. {REPROMPT_NOTE}")
                        }
                    };

                    contents.push(ModelContent {
                        role: ModelRole::User,
                        parts: vec![ModelPart::FunctionResponse {
                            name,
                            response: json!({ "content": observation }),
                        }],
                    });
                }
            }
        }

        warn!(max_steps = self.max_steps, "agent step budget exhausted, falling back");
        Ok(fallback_answer())
    }

    /// Dispatch one typed tool call and render its observation.
    ///
    /// A tool execution failure becomes a failure observation rather than
    /// an error: the model is told the lookup failed and asked to answer
    /// with what it has, keeping the session alive.
    async fn execute(&self, call: ToolCall) -> String {
        let tool_name = call.name();
        let result = match call {
            ToolCall::SearchKnowledge(args) => self
                .knowledge
                .search(&args.query, args.source.as_deref(), args.filetype.as_deref())
                .await
                .map(|reply| reply.into_observation(KNOWLEDGE_NOT_FOUND)),
            ToolCall::WebSearch(args) => self
                .web
                .run(&args.query, args.num_results)
                .await
                .map(|reply| reply.into_observation(WEB_NOT_FOUND)),
        };

        match result {
            Ok(observation) => observation,
            Err(e) => {
                warn!(tool = tool_name, error = %e, "tool execution failed");
                format!(
                    "The {tool_name} tool failed: {e}. Answer with the information you already \
                     have and tell the user the lookup failed."
                )
            }
        }
    }
}

/// Fixed answer returned when the step budget is exhausted.
pub fn fallback_answer() -> String {
    "I could not finish reasoning about this request. Please try rephrasing your question."
        .to_string()
}
