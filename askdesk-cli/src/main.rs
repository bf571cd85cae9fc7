//! AskDesk launcher: `askdesk index` rebuilds the semantic index from the
//! knowledge base, `askdesk serve` runs the answering API.
//!
//! All configuration comes from the environment, read once at startup and
//! passed into the components by ownership.

use std::sync::Arc;

use anyhow::Context;
use askdesk_outline::OutlineClient;
use askdesk_rag::{AnswerPipeline, GatePolicy, OpenAIChat, OpenAIEmbeddings, PipelineConfig};
use askdesk_server::{AllowList, AppState, AuditLog, ServerConfig, SupportWebhook, run_server};
use clap::{Parser, Subcommand};
use tracing::info;

#[derive(Parser)]
#[command(name = "askdesk", about = "Knowledge-base answering service", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest the knowledge base and update the semantic index.
    Index {
        /// Restrict ingestion to a single collection id.
        #[arg(long)]
        collection: Option<String>,
    },
    /// Serve the answering API.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Index { collection } => index(collection.as_deref()).await,
        Command::Serve => serve().await,
    }
}

async fn index(collection: Option<&str>) -> anyhow::Result<()> {
    let outline_url = require_env("OUTLINE_API_URL")?;
    let outline_key = require_env("OUTLINE_API_KEY")?;

    let mut client = OutlineClient::new(outline_url, outline_key)?;
    if let Some(page_size) = env_parse::<usize>("ASKDESK_PAGE_SIZE")? {
        client = client.with_page_size(page_size);
    }

    let pipeline = build_pipeline()?;

    info!("ingesting knowledge base");
    let ingest = askdesk_outline::fetch_all(&client, collection).await?;
    println!("Ingested {} documents ({} skipped)", ingest.documents.len(), ingest.skipped);

    if ingest.documents.is_empty() {
        println!("Nothing to index.");
        return Ok(());
    }

    let report = pipeline.index_documents(&ingest.documents).await?;
    println!("Index now holds {} chunks ({} added or replaced)", report.total, report.added);
    Ok(())
}

async fn serve() -> anyhow::Result<()> {
    let pipeline = Arc::new(build_pipeline()?);
    info!(chunks = pipeline.chunk_count().await, "store loaded");

    let mut gate = GatePolicy::default();
    if let Some(min) = env_parse::<usize>("ASKDESK_MIN_ANSWER_CHARS")? {
        gate.min_answer_chars = min;
    }
    if let Some(strict) = env_parse::<bool>("ASKDESK_REQUIRE_SOURCE_URL")? {
        gate.require_source_url = strict;
    }
    if let Ok(markers) = std::env::var("ASKDESK_NEGATIVE_MARKERS") {
        gate.negative_markers =
            markers.split(',').map(str::trim).filter(|m| !m.is_empty()).map(String::from).collect();
    }
    if let Ok(fallback) = std::env::var("ASKDESK_FALLBACK_MESSAGE") {
        gate.fallback_message = fallback;
    }

    let access = match std::env::var("ASKDESK_ALLOWED_USERS") {
        Ok(csv) => AllowList::from_csv(&csv),
        Err(_) => AllowList::default(),
    };

    let audit_path =
        std::env::var("ASKDESK_AUDIT_LOG").unwrap_or_else(|_| "audit.jsonl".to_string());
    let audit = AuditLog::new(audit_path);

    let support = match std::env::var("ASKDESK_SUPPORT_WEBHOOK_URL") {
        Ok(url) => Some(SupportWebhook::new(url)?),
        Err(_) => None,
    };

    let bind = std::env::var("ASKDESK_BIND").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    let addr: std::net::SocketAddr =
        bind.parse().with_context(|| format!("invalid ASKDESK_BIND address: {bind}"))?;
    let config = ServerConfig { host: addr.ip().to_string(), port: addr.port() };

    let state = AppState::new(pipeline, gate, access, audit, support);
    run_server(config, state).await
}

fn build_pipeline() -> anyhow::Result<AnswerPipeline> {
    let openai_key = require_env("OPENAI_API_KEY")?;

    let mut embedder = OpenAIEmbeddings::new(openai_key.clone())?;
    if let Ok(model) = std::env::var("ASKDESK_EMBED_MODEL") {
        embedder = embedder.with_model(model);
    }

    let mut generator = OpenAIChat::new(openai_key)?;
    if let Ok(model) = std::env::var("ASKDESK_CHAT_MODEL") {
        generator = generator.with_model(model);
    }

    let mut config = PipelineConfig::builder();
    if let Some(top_k) = env_parse::<usize>("ASKDESK_TOP_K")? {
        config = config.top_k(top_k);
    }
    // A zero chunk size disables splitting: one record, one chunk.
    if let Some(max) = env_parse::<usize>("ASKDESK_MAX_CHUNK_CHARS")? {
        config = if max == 0 { config.unsplit() } else { config.max_chunk_chars(max) };
    }

    let store_dir =
        std::env::var("ASKDESK_STORE_DIR").unwrap_or_else(|_| "./storage".to_string());

    let pipeline = AnswerPipeline::builder()
        .config(config.build()?)
        .embedder(Arc::new(embedder))
        .generator(Arc::new(generator))
        .store_dir(store_dir)
        .build()?;
    Ok(pipeline)
}

fn require_env(key: &str) -> anyhow::Result<String> {
    std::env::var(key).with_context(|| format!("{key} environment variable not set"))
}

fn env_parse<T: std::str::FromStr>(key: &str) -> anyhow::Result<Option<T>>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(value) => {
            let parsed = value.parse::<T>().with_context(|| format!("invalid {key}: {value}"))?;
            Ok(Some(parsed))
        }
        Err(_) => Ok(None),
    }
}
