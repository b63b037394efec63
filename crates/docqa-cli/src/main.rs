//! CLI entry point for docqa.
//!
//! ```bash
//! docqa search "when did the solar system form" docs/ notes.txt -k 5
//! docqa chat docs/
//! docqa --offline chat docs/      # no Ollama needed, hashed word vectors
//! ```

mod chat;
mod output;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use docqa_core::config::to_toml;
use docqa_core::{
    app_data_dir, collect_documents, ingest_documents, load_config, status, ChunkConfig, Config,
    Embedder, HashEmbedder, IngestReport, OllamaClient, Store,
};
use tracing_subscriber::EnvFilter;

pub type DynStore = Store<Box<dyn Embedder>>;

#[derive(Parser)]
#[command(name = "docqa", version)]
#[command(about = "docqa: ask questions about your PDF, DOCX and TXT documents")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable info-level logging (RUST_LOG overrides).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use the offline hashing embedder instead of Ollama.
    #[arg(long, global = true)]
    offline: bool,

    /// Ollama base URL (default from config).
    #[arg(long, global = true)]
    ollama_url: Option<String>,

    /// Embedding model name (default from config).
    #[arg(long, global = true)]
    model: Option<String>,

    /// Chunk size in characters (default from config).
    #[arg(long, global = true)]
    chunk_size: Option<usize>,

    /// Characters shared by consecutive chunks (default from config).
    #[arg(long, global = true)]
    chunk_overlap: Option<usize>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Show backend status (for dev).
    Status,
    /// Show where docqa stores its config.
    DataDir,
    /// Print the effective configuration as TOML.
    Config,
    /// Index the given documents, then print the passages closest to QUERY.
    Search {
        query: String,
        /// Files or directories (searched recursively for pdf, docx, txt).
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<PathBuf>,
        /// Number of passages to return (default from config).
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
        /// Output results as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Index the given documents and answer questions read from stdin.
    Chat {
        #[arg(value_name = "PATH")]
        paths: Vec<PathBuf>,
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = effective_config(&cli);

    match cli.command.unwrap_or(Commands::Status) {
        Commands::Status => {
            println!("docqa backend");
            println!("  core: {}", status());
        }
        Commands::DataDir => match app_data_dir() {
            Some(p) => println!("{}", p.display()),
            None => eprintln!("Could not determine app data directory."),
        },
        Commands::Config => print!("{}", to_toml(&config)?),
        Commands::Search {
            query,
            paths,
            top_k,
            json,
        } => {
            let chunking = config.chunk_config()?;
            let mut store = open_store(&config, cli.offline).await?;
            let report = ingest(&mut store, &paths, &chunking).await?;
            output::print_report(&report);

            let top_k = top_k.unwrap_or(config.top_k);
            let hits = store.search(&query, top_k).await?;
            let rendered = if json {
                output::format_json(&query, &hits)?
            } else {
                output::format_human(&query, &hits)
            };
            println!("{rendered}");
        }
        Commands::Chat { paths, top_k } => {
            let chunking = config.chunk_config()?;
            let store = open_store(&config, cli.offline).await?;
            let mut session = chat::Session::new(store, chunking, top_k.unwrap_or(config.top_k));
            if !paths.is_empty() {
                session.load(&paths).await?;
            }
            session.run().await?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Config file values with command-line overrides applied.
fn effective_config(cli: &Cli) -> Config {
    let mut config = load_config();
    if let Some(url) = &cli.ollama_url {
        config.ollama_url = url.clone();
    }
    if let Some(model) = &cli.model {
        config.embed_model = model.clone();
    }
    if let Some(size) = cli.chunk_size {
        config.chunk_size = size;
    }
    if let Some(overlap) = cli.chunk_overlap {
        config.chunk_overlap = overlap;
    }
    config
}

/// Build the store once per run. A missing model is fatal here, not per query.
async fn open_store(config: &Config, offline: bool) -> Result<DynStore> {
    let embedder: Box<dyn Embedder> = if offline {
        Box::new(HashEmbedder::default())
    } else {
        let client = OllamaClient::connect(&config.ollama_url, &config.embed_model)
            .await
            .with_context(|| {
                format!(
                    "could not load embedding model {} from {} (is Ollama running? try --offline)",
                    config.embed_model, config.ollama_url
                )
            })?;
        Box::new(client)
    };
    Ok(Store::new(embedder))
}

pub async fn ingest(
    store: &mut DynStore,
    paths: &[PathBuf],
    chunking: &ChunkConfig,
) -> Result<IngestReport> {
    let documents = collect_documents(paths)?;
    Ok(ingest_documents(store, &documents, chunking).await)
}
