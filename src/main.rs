use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use coursesearch::connector::api::{Container, ContainerConfig, Router};
use coursesearch::connector::EMBED_ENDPOINT_ENV;
use coursesearch::domain::{DEFAULT_DIMENSIONS, DEFAULT_MAX_SEQUENCE_LENGTH};
use coursesearch::{Commands, Pooling};

#[derive(Parser)]
#[command(name = "coursesearch")]
#[command(author, version, about = "Semantic search over course reviews", long_about = None)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory holding index.bin and metadata.json
    #[arg(long, global = true, default_value = "./db")]
    db: PathBuf,

    #[arg(long, global = true)]
    mock_embeddings: bool,

    /// HTTP embedding endpoint (falls back to $EMBED_ENDPOINT)
    #[arg(long, global = true)]
    embed_endpoint: Option<String>,

    /// Hugging Face model id for the local ONNX model
    #[arg(long, global = true)]
    model: Option<String>,

    /// Average token states instead of taking the CLS token (local model only)
    #[arg(long, global = true)]
    mean_pooling: bool,

    #[arg(long, global = true, default_value_t = DEFAULT_DIMENSIONS)]
    dimensions: usize,

    /// Input budget per text, in tokens for the local model and characters otherwise
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_SEQUENCE_LENGTH)]
    max_length: usize,

    /// Embedding calls in flight during a build
    #[arg(long, global = true, default_value = "1")]
    concurrency: usize,

    #[arg(long, global = true, default_value = "60")]
    timeout_secs: u64,

    /// Qdrant base URL (falls back to $QDRANT_URL)
    #[arg(long, global = true)]
    qdrant_url: Option<String>,

    /// Qdrant collection (falls back to $QDRANT_COLLECTION)
    #[arg(long, global = true)]
    collection: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG can raise other crates; --verbose only moves our own level.
    let level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::from_default_env().add_directive(format!("coursesearch={}", level).parse()?);
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let embed_endpoint = cli
        .embed_endpoint
        .or_else(|| std::env::var(EMBED_ENDPOINT_ENV).ok())
        .filter(|endpoint| !endpoint.is_empty());

    let container = Container::new(ContainerConfig {
        db_dir: cli.db,
        mock_embeddings: cli.mock_embeddings,
        embed_endpoint,
        model: cli.model,
        pooling: if cli.mean_pooling {
            Pooling::Mean
        } else {
            Pooling::Cls
        },
        dimensions: cli.dimensions,
        max_length: cli.max_length,
        concurrency: cli.concurrency,
        timeout: Duration::from_secs(cli.timeout_secs),
        qdrant_url: cli.qdrant_url,
        collection: cli.collection,
    });

    let router = Router::new(&container);
    let output = router.route(cli.command).await?;
    println!("{}", output);

    Ok(())
}
