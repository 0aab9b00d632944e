use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use termrag_core::chunker::Chunker;
use termrag_core::config::Settings;
use termrag_core::corpus::load_documents;
use termrag_core::traits::Embedder;
use termrag_embed::get_default_embedder;
use termrag_llm::OpenAiChat;
use termrag_rag::QueryOrchestrator;
use termrag_vector::VectorIndex;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Retrieval-augmented IT terminology assistant
#[derive(Parser, Debug)]
#[command(name = "termrag", version, long_about = None)]
struct Cli {
    /// Directory holding config.toml; relative data paths resolve against it
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    /// Configuration environment (config.<env>.toml)
    #[arg(long, global = true, env = "RUST_ENV", default_value = "dev")]
    env: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load the term corpus, build the vector index and save it
    Ingest {
        /// Corpus file or directory of *.json files (default: data.corpus_path)
        corpus: Option<PathBuf>,
        /// Output directory (default: data.index_dir)
        #[arg(long)]
        index_dir: Option<PathBuf>,
    },

    /// Answer a terminology question for a given field
    Ask {
        question: String,
        #[arg(short, long, default_value = "backend")]
        category: String,
    },

    /// Deepen a previous answer ("information", "code", or any free-form request)
    Elaborate {
        /// Previous answer as a JSON object with term, definition and example
        #[arg(long)]
        previous: String,
        #[arg(long, default_value = "information")]
        request: String,
        #[arg(short, long)]
        category: String,
    },

    /// Show the chunks retrieved for a query, without calling the model
    Search {
        query: String,
        #[arg(short, default_value_t = 4)]
        k: usize,
    },
}

fn main() -> Result<()> {
    // A missing .env is fine; OPENAI_API_KEY may come from the environment.
    let _ = dotenvy::dotenv();

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = Settings::load_from(&cli.root, &cli.env)
        .with_context(|| format!("loading configuration from {}", cli.root.display()))?;

    match cli.command {
        Commands::Ingest { corpus, index_dir } => {
            let corpus = corpus.unwrap_or_else(|| settings.corpus_path(&cli.root));
            let index_dir = index_dir.unwrap_or_else(|| settings.index_dir(&cli.root));
            ingest(&settings, &corpus, &index_dir)
        }
        Commands::Ask { question, category } => {
            let orchestrator = orchestrator(&settings)?;
            let index_dir = settings.index_dir(&cli.root);
            orchestrator
                .load_index(&index_dir)
                .with_context(|| format!("no usable index at {}; run `termrag ingest` first", index_dir.display()))?;
            let result = orchestrator.answer(&question, &category)?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Commands::Elaborate { previous, request, category } => {
            let previous: serde_json::Value =
                serde_json::from_str(&previous).context("--previous must be a JSON object")?;
            let result = orchestrator(&settings)?.elaborate_json(&previous, &request, &category)?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Commands::Search { query, k } => {
            let embedder = get_default_embedder(&settings.embedding)?;
            let index = VectorIndex::restore(&settings.index_dir(&cli.root))?;
            let hits = index.search(&query, k, embedder.as_ref())?;
            println!("{}", serde_json::to_string_pretty(&hits)?);
            Ok(())
        }
    }
}

fn orchestrator(settings: &Settings) -> Result<QueryOrchestrator> {
    let embedder: Arc<dyn Embedder> = Arc::from(get_default_embedder(&settings.embedding)?);
    let completer = Arc::new(OpenAiChat::from_settings(&settings.llm)?);
    Ok(QueryOrchestrator::from_settings(settings, embedder, completer)?)
}

fn ingest(settings: &Settings, corpus: &Path, index_dir: &Path) -> Result<()> {
    let documents = load_documents(corpus)?;
    if documents.is_empty() {
        bail!("no terms found in {}", corpus.display());
    }
    let chunker = Chunker::new(settings.chunker_config())?;
    info!(documents = documents.len(), corpus = %corpus.display(), "corpus loaded");

    let embedder = get_default_embedder(&settings.embedding)?;
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%)")?
            .progress_chars("#>-"),
    );
    let index = VectorIndex::from_documents(&documents, &chunker, embedder.as_ref(), &pb)?;
    index.persist(index_dir)?;

    println!("Indexed {} chunks from {} terms into {}", index.len(), documents.len(), index_dir.display());
    Ok(())
}
