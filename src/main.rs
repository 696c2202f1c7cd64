use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use dotenv::dotenv;
use log::info;
use std::path::Path;

use scheme_research::embeddings::{EmbeddingsClient, EmbeddingsConfig};
use scheme_research::groq::{GroqClient, GroqConfig};
use scheme_research::loader::Document;
use scheme_research::rag::RagEngine;
use scheme_research::store::{StoreConfig, VectorStore};

/// Research assistant for government scheme documents: ingest scheme URLs or
/// PDFs, then generate a summary and ask questions
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Scheme URLs or local PDF/text files to ingest
    #[arg(index = 1)]
    inputs: Vec<String>,

    /// Name of the store to ingest into and query (defaults to the first input)
    #[arg(long)]
    store: Option<String>,

    /// Model used for summaries and answers
    #[arg(long, value_enum, default_value_t = ModelChoice::Fast)]
    model: ModelChoice,

    /// Number of chunks retrieved per question
    #[arg(long, default_value_t = 10)]
    top_k: u64,

    /// Print the scheme summary before the question loop
    #[arg(long)]
    summary: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModelChoice {
    /// llama3-8b-8192
    Fast,
    /// llama3-70b-8192
    Accurate,
}

impl ModelChoice {
    fn model_id(self) -> &'static str {
        match self {
            ModelChoice::Fast => "llama3-8b-8192",
            ModelChoice::Accurate => "llama3-70b-8192",
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize environment
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();

    if args.inputs.is_empty() && args.store.is_none() {
        return Err(anyhow::anyhow!(
            "Nothing to do: pass scheme URLs/files to ingest, or --store to query an existing store"
        ));
    }

    let store_name = args
        .store
        .clone()
        .unwrap_or_else(|| derive_store_name(&args.inputs[0]));
    info!("Using store: {}", store_name);

    // Load configuration from environment
    let store_config = StoreConfig::from_env().context("Missing QDRANT_URL")?;
    let embeddings_config = EmbeddingsConfig::from_env().context("Missing HF_API_TOKEN")?;
    let mut groq_config = GroqConfig::from_env().context("Missing GROQ_API_KEY")?;
    groq_config.model = args.model.model_id().to_string();

    let store = VectorStore::new(store_config)
        .await
        .context("Failed to initialize vector store")?;
    let embeddings = EmbeddingsClient::new(embeddings_config);
    let groq = GroqClient::new(groq_config);

    // Initialize RAG engine
    let engine = RagEngine::new(store, embeddings, groq, store_name.clone(), args.top_k);

    // Ingest every input (URL or file)
    let http = reqwest::Client::new();
    for input in &args.inputs {
        let document = Document::load(&http, input)
            .await
            .with_context(|| format!("Failed to load {}", input))?;
        let stored = engine
            .ingest(document)
            .await
            .with_context(|| format!("Failed to ingest {}", input))?;
        info!("Ingested {} chunks from {}", stored, input);
    }

    if !engine.store_exists().await? {
        return Err(anyhow::anyhow!(
            "Store '{}' has no ingested documents yet",
            store_name
        ));
    }

    if args.summary {
        let summary = engine
            .summarize()
            .await
            .context("Failed to generate summary")?;
        println!("\n{}", summary);
    }

    // Enter interactive Q&A loop
    engine.run_query_loop().await.context("Error in query loop")?;

    Ok(())
}

/// Default store name when --store is not given: the host for URLs, the
/// file name for local inputs.
fn derive_store_name(input: &str) -> String {
    if Document::is_url(input) {
        url::Url::parse(input)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| input.to_string())
    } else {
        Path::new(input)
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string)
            .unwrap_or_else(|| input.to_string())
    }
}
