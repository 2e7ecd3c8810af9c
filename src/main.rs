use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use code_embedder::config::load_dotenv;
use code_embedder::types::preview;
use code_embedder::{
    CodeEmbedder, Config, EmbedRequest, LazyBuildStrategy, SearchRequest, SearchResponse,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const VERSION_INFO: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_COMMIT_HASH"),
    ", built ",
    env!("BUILD_TIMESTAMP"),
    ")"
);

#[derive(Parser)]
#[command(name = "code-embedder")]
#[command(about = "Embed a codebase per git commit and search it semantically")]
#[command(version = VERSION_INFO)]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Embed a directory into the collection of a commit
    Embed {
        /// Directory to embed
        #[arg(short, long, default_value = ".")]
        directory: PathBuf,
        /// Vector store directory
        #[arg(short, long, env = "CODE_EMBEDDER_PERSIST_DIR")]
        persist_dir: Option<PathBuf>,
        /// Commit hash to embed under (default: current HEAD)
        #[arg(short, long)]
        commit: Option<String>,
    },
    /// Search the collection of a commit, building it first if needed
    Search {
        /// Search query
        query: String,
        /// Vector store directory
        #[arg(short, long, env = "CODE_EMBEDDER_PERSIST_DIR")]
        persist_dir: Option<PathBuf>,
        /// Commit hash to search (default: current HEAD)
        #[arg(short, long)]
        commit: Option<String>,
        /// Number of results
        #[arg(short, long)]
        k: Option<usize>,
        /// How to build a collection that does not exist yet
        #[arg(long, value_enum)]
        lazy_build: Option<LazyBuildStrategy>,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stdout)
        .with_target(false)
        .init();
}

/// Config file and environment, then command-line flags on top
fn load_config(
    persist_dir: Option<PathBuf>,
    lazy_build: Option<LazyBuildStrategy>,
) -> Result<Config> {
    let mut config = Config::new().context("Failed to load configuration")?;

    if let Some(dir) = persist_dir {
        config.store.persist_dir = dir;
    }
    if let Some(strategy) = lazy_build {
        config.search.lazy_build = strategy;
    }

    config.validate()?;
    Ok(config)
}

fn print_results(response: &SearchResponse, preview_chars: usize) {
    let rule = "-".repeat(80);

    println!("\nSearch results for: '{}'", response.query);
    println!("Commit: {}", response.commit_hash);
    println!("{}", rule);

    if response.results.is_empty() {
        println!("\nNo results.");
    }

    for hit in &response.results {
        println!("\nFile: {}", hit.source);
        println!("Distance: {:.4}", hit.distance);
        println!("Content:\n{}...", preview(&hit.text, preview_chars));
        println!("{}", rule);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Before parsing, so `.env` values reach env-backed flags
    let dotenv_path = load_dotenv();
    let cli = Cli::parse();

    init_tracing(cli.verbose);
    if let Some(path) = dotenv_path {
        tracing::debug!("Loaded environment from {}", path.display());
    }

    match cli.command {
        Commands::Embed {
            directory,
            persist_dir,
            commit,
        } => {
            let config = load_config(persist_dir, None)?;
            let persist_dir = config.store.persist_dir.clone();
            let client = CodeEmbedder::with_config(config).await?;

            let report = client
                .create_embeddings(EmbedRequest { directory, commit })
                .await?;

            tracing::info!(
                "Embeddings for commit {} saved to {}",
                report.commit_hash,
                persist_dir.display()
            );
        }
        Commands::Search {
            query,
            persist_dir,
            commit,
            k,
            lazy_build,
        } => {
            let config = load_config(persist_dir, lazy_build)?;
            let k = k.unwrap_or(config.search.k);
            let preview_chars = config.search.preview_chars;
            let client = CodeEmbedder::with_config(config).await?;

            let response = client
                .search_code(SearchRequest {
                    query,
                    commit,
                    k,
                    workdir: PathBuf::from("."),
                })
                .await?;

            print_results(&response, preview_chars);
        }
    }

    Ok(())
}
