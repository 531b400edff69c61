//! docqa admin CLI
//!
//! Run with: cargo run -p docqa --features cli --bin docqa -- <command>

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use docqa::config::{DocQaConfig, VectorBackend};
use docqa::ingestion::collect_documents;
use docqa::providers::{
    EmbeddingProvider, InMemoryVectorStore, OllamaEmbedder, VectorStoreProvider, WeaviateStore,
};
use docqa::server::state::AppState;
use docqa::Answer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const PREVIEW_CHARS: usize = 200;

#[derive(Parser)]
#[command(name = "docqa", about = "Index documents and query the docqa collection", version)]
struct Cli {
    /// TOML configuration file (defaults to $DOCQA_CONFIG)
    #[arg(long, global = true, env = "DOCQA_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Index PDF/PPT/PPTX files; directories are walked recursively
    Index {
        /// Files or directories
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Answer a question from the indexed documents
    Ask {
        /// The question
        question: String,
        /// Ollama model (defaults to llm.default_model)
        #[arg(long)]
        model: Option<String>,
    },

    /// Show the object count and a preview of the collection
    Inspect {
        /// Number of objects to preview
        #[arg(long, default_value = "5")]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docqa=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = DocQaConfig::load(cli.config.as_deref()).context("loading configuration")?;

    match cli.command {
        Command::Index { paths } => index(config, paths).await,
        Command::Ask { question, model } => ask(config, question, model).await,
        Command::Inspect { limit } => inspect(config, limit).await,
    }
}

async fn index(config: DocQaConfig, paths: Vec<PathBuf>) -> anyhow::Result<()> {
    let files = collect_documents(&paths);
    if files.is_empty() {
        bail!("no PDF or PowerPoint files found");
    }

    let state = AppState::new(config).await?;

    let bar = ProgressBar::new(files.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );
    bar.enable_steady_tick(Duration::from_millis(120));

    let mut failures = 0usize;
    let mut total_chunks = 0usize;
    for file in &files {
        let name = file.display().to_string();
        bar.set_message(name.clone());
        match state.pipeline().ingest_path(file).await {
            Ok(chunks) => {
                total_chunks += chunks;
                bar.println(format!("{} {} ({} chunks)", style("✓").green(), name, chunks));
            }
            Err(e) => {
                failures += 1;
                bar.println(format!("{} {}: {}", style("✗").red(), name, e));
            }
        }
        bar.inc(1);
    }
    bar.finish_and_clear();
    state.shutdown().await;

    println!(
        "{} files indexed, {} failed, {} chunks stored",
        style(files.len() - failures).bold(),
        style(failures).bold(),
        total_chunks
    );
    if failures > 0 {
        bail!("{} file(s) could not be indexed", failures);
    }
    Ok(())
}

async fn ask(config: DocQaConfig, question: String, model: Option<String>) -> anyhow::Result<()> {
    if question.trim().is_empty() {
        bail!("the question is empty");
    }

    let model = model.unwrap_or_else(|| config.llm.default_model.clone());
    let state = AppState::new(config).await?;

    let answer = state.rag().try_answer(&question, &model).await;
    state.shutdown().await;

    match answer? {
        Answer::Grounded(text) => {
            println!("{}", text);
            eprintln!("{}", style(format!("({}, answered from the documents)", model)).dim());
        }
        Answer::Ungrounded(text) => {
            println!("{}", text);
            eprintln!(
                "{}",
                style(format!("({}, no relevant context; answered without the documents)", model))
                    .yellow()
            );
        }
    }
    Ok(())
}

async fn inspect(config: DocQaConfig, limit: usize) -> anyhow::Result<()> {
    // Inspection never embeds, so the lazily-connecting Ollama embedder is enough
    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(OllamaEmbedder::new(
        &config.llm,
        config.embedding_dimensions(),
    )?);
    let store: Arc<dyn VectorStoreProvider> = match config.vector_db.backend {
        VectorBackend::Weaviate => Arc::new(WeaviateStore::new(&config.vector_db, embedder)?),
        VectorBackend::Memory => Arc::new(InMemoryVectorStore::new(
            config.vector_db.collection.clone(),
            embedder,
        )),
    };

    let collection = config.vector_db.collection.as_str();
    if !store.collection_exists(collection).await? {
        store.close().await?;
        bail!("collection '{}' does not exist", collection);
    }

    let total = store.count().await?;
    println!("Total objects in '{}': {}", collection, style(total).bold());

    if total > 0 {
        let records = store.fetch(limit).await?;
        println!("\nFirst {} objects:", records.len());
        for (i, record) in records.iter().enumerate() {
            let preview: String = record.content.chars().take(PREVIEW_CHARS).collect();
            let source = if record.source.is_empty() {
                "Non spécifié"
            } else {
                record.source.as_str()
            };
            println!("\n{}", style(format!("Object {}", i + 1)).cyan());
            println!("Content: {}...", preview);
            println!("Source: {} (page {})", source, record.page);
            println!("{}", "-".repeat(80));
        }
    }

    store.close().await?;
    Ok(())
}
