//! Console entry point: build or load the index, then serve a chat REPL.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ragchat::agent::Agent;
use ragchat::chunking::RecursiveChunker;
use ragchat::config::{AppConfig, Credentials};
use ragchat::embedding::GeminiEmbeddingProvider;
use ragchat::knowledge::KnowledgeSearchTool;
use ragchat::model::{DEFAULT_CHAT_MODEL, GeminiChatModel};
use ragchat::pipeline::IndexPipeline;
use ragchat::session::ChatSession;
use ragchat::websearch::{TavilyProvider, WebSearchTool};

/// Retrieval-augmented chat assistant over local documents.
#[derive(Debug, Parser)]
#[command(name = "ragchat", version, about)]
struct Cli {
    /// Directory holding the source documents.
    #[arg(long, default_value = "dataset")]
    data_dir: PathBuf,

    /// Directory holding the persisted vector index.
    #[arg(long, default_value = "dataset/vectorstores")]
    index_dir: PathBuf,

    /// Rebuild the index even if a persisted one exists.
    #[arg(long)]
    rebuild: bool,

    /// Chat model name.
    #[arg(long, default_value = DEFAULT_CHAT_MODEL)]
    model: String,

    /// Language the assistant answers in.
    #[arg(long)]
    language: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    // Fatal startup errors: missing credentials or invalid configuration
    // stop the process before it serves traffic.
    let credentials = Credentials::from_env().context("loading API credentials")?;
    let mut builder = AppConfig::builder();
    if let Some(language) = cli.language.clone() {
        builder = builder.reply_language(language);
    }
    let config = builder.build().context("validating configuration")?;

    let timeout = Duration::from_secs(config.request_timeout_secs);
    let embedder = Arc::new(
        GeminiEmbeddingProvider::new(&credentials.gemini_api_key, timeout)
            .context("creating embedding provider")?,
    );

    // One-shot batch build, skipped when the persisted index exists.
    let pipeline = IndexPipeline::new(
        Arc::new(RecursiveChunker::new(config.chunk_size, config.chunk_overlap)),
        embedder.clone(),
    );
    let index = if cli.rebuild {
        info!("--rebuild requested, ignoring any persisted index");
        let index = pipeline.build(&cli.data_dir).await?;
        index.save(&cli.index_dir)?;
        index
    } else {
        pipeline.load_or_build(&cli.data_dir, &cli.index_dir).await?
    };
    info!(chunk_count = index.len(), "index ready");
    let index = Arc::new(index);

    let knowledge =
        KnowledgeSearchTool::new(index, embedder, config.retrieve_k, config.keep_top);
    let web = WebSearchTool::new(
        Arc::new(
            TavilyProvider::new(&credentials.tavily_api_key, timeout)
                .context("creating web search provider")?,
        ),
        config.web_results,
    );
    let model = Arc::new(
        GeminiChatModel::new(&credentials.gemini_api_key, &cli.model, timeout)
            .context("creating chat model")?,
    );

    let agent = Arc::new(Agent::new(model, knowledge, web, &config));
    let mut session = ChatSession::new(agent, config.history_max_turns);

    println!("ragchat ready. Ask a question, or type 'exit' to quit.");
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    loop {
        print!("you> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let message = line.trim();
        if message.is_empty() {
            continue;
        }
        if message.eq_ignore_ascii_case("exit") || message.eq_ignore_ascii_case("quit") {
            break;
        }

        let answer = session.handle(message).await;
        println!("\nassistant> {answer}\n");
    }

    Ok(())
}
