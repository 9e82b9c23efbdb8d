#![allow(clippy::doc_markdown)]
#![allow(clippy::uninlined_format_args)]
//! `docvec` CLI - operate a persisted document index
//!
//! Usage:
//!   `docvec index ./docs.jsonl`
//!   `docvec search "feline pets" -k 5`
//!   `docvec stats`
//!   `docvec snapshot --output vectors.jsonl`

mod import;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use docvec_core::{
    DocumentIndex, DocvecConfig, EmbeddingProvider, HashingEmbedder, ReducedSpaceModel,
    RerankStatus, SearchRequest,
};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "docvec")]
#[command(author, version, about = "docvec CLI - semantic document index")]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file
    #[arg(short, long, global = true, default_value = "docvec.toml")]
    config: PathBuf,

    /// Data directory (overrides `storage.data_dir`)
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Embedding dimension of the built-in hashing embedder
    #[arg(long, global = true, default_value_t = HashingEmbedder::DEFAULT_DIMENSION)]
    dimension: usize,

    #[command(subcommand)]
    command: Commands,
}

/// Output format
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum Format {
    #[default]
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Index documents from a JSON Lines file ({"id": ..., "text": ...})
    Index {
        /// Path to the JSONL file
        file: PathBuf,

        /// Documents per atomic batch (overrides `ingest.batch_size`)
        #[arg(long)]
        batch_size: Option<usize>,
    },

    /// Search the index
    Search {
        /// Query text
        query: String,

        /// Number of results (defaults to `search.default_k`)
        #[arg(short, long)]
        k: Option<usize>,

        /// Beam width override
        #[arg(long)]
        ef: Option<usize>,

        /// Re-rank with a reduced-space model file
        #[arg(long)]
        rerank_model: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: Format,
    },

    /// Show index statistics
    Stats {
        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: Format,
    },

    /// Export every (position, id, vector) as JSON Lines
    Snapshot {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the effective configuration as TOML
    Config,
}

fn init_logging(config: &DocvecConfig) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| config.logging.level.clone()),
    );
    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .init();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = DocvecConfig::load_from_path(&cli.config)?;
    if let Some(dir) = &cli.data_dir {
        config.storage.data_dir.clone_from(dir);
    }
    if let Commands::Index {
        batch_size: Some(size),
        ..
    } = &cli.command
    {
        config.ingest.batch_size = *size;
    }
    config.validate()?;
    init_logging(&config);

    if let Commands::Config = cli.command {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(HashingEmbedder::new(cli.dimension));
    let index = DocumentIndex::open(&config, embedder).with_context(|| {
        format!(
            "Failed to open index at {}",
            config.storage.data_dir.display()
        )
    })?;

    match cli.command {
        Commands::Index { file, .. } => {
            let stats = import::import_jsonl(&index, &file, config.ingest.batch_size)?;
            println!(
                "Indexed {} documents ({} skipped, {} malformed) in {} ms ({:.0} docs/s)",
                stats.accepted,
                stats.skipped,
                stats.errors,
                stats.duration_ms,
                stats.records_per_sec()
            );
            println!("Total documents: {}", stats.total_indexed);
        }
        Commands::Search {
            query,
            k,
            ef,
            rerank_model,
            format,
        } => {
            let mut request = SearchRequest::new(query, k.unwrap_or(config.search.default_k));
            if let Some(ef) = ef {
                request = request.with_ef(ef);
            }
            if let Some(path) = rerank_model {
                let model = ReducedSpaceModel::load(&path).with_context(|| {
                    format!("Failed to load re-ranking model {}", path.display())
                })?;
                index.attach_reranker(model)?;
                request = request.with_rerank(true);
            }
            let response = index.search(&request)?;
            match format {
                Format::Json => println!("{}", serde_json::to_string_pretty(&response)?),
                Format::Table => {
                    for (rank, hit) in response.hits.iter().enumerate() {
                        println!("{:>3}  {:<32}  {:.6}", rank + 1, hit.id, hit.score);
                    }
                    match response.rerank {
                        RerankStatus::NotRequested => {}
                        RerankStatus::Unavailable => println!("(re-ranking unavailable)"),
                        RerankStatus::Applied { consistent } => println!(
                            "(re-ranked, model {} the indexed corpus)",
                            if consistent { "matches" } else { "does not match" }
                        ),
                    }
                }
            }
        }
        Commands::Stats { format } => {
            let stats = index.stats();
            match format {
                Format::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
                Format::Table => {
                    println!("docvec index: {}", config.storage.data_dir.display());
                    println!("  documents:       {}", stats.documents);
                    println!("  dimension:       {}", stats.dimension);
                    println!("  max layer:       {}", stats.max_layer);
                    match stats.entry_point {
                        Some(entry) => println!("  entry point:     {}", entry),
                        None => println!("  entry point:     -"),
                    }
                    println!("  M:               {}", stats.params.max_connections);
                    println!("  ef_construction: {}", stats.params.ef_construction);
                    println!("  ef_search:       {}", stats.params.ef_search);
                    println!("  generation:      {}", stats.generation);
                    println!("  fingerprint:     {:08x}", stats.corpus_fingerprint);
                }
            }
        }
        Commands::Snapshot { output } => {
            let snapshot = index.snapshot()?;
            match output {
                Some(path) => {
                    let file = File::create(&path)
                        .with_context(|| format!("Failed to create {}", path.display()))?;
                    snapshot.write_jsonl(BufWriter::new(file))?;
                    info!(entries = snapshot.len(), path = %path.display(), "Snapshot written");
                }
                None => snapshot.write_jsonl(BufWriter::new(io::stdout().lock()))?,
            }
        }
        Commands::Config => {}
    }

    index.close()?;
    Ok(())
}
