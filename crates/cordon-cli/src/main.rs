//! Cordon - group access control over content-addressed storage

use clap::Parser;
use cordon_cli::{run_demo, AppState, CordonConfig};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "cordon")]
#[command(about = "Group-based access control with lazy revocation over IPFS")]
#[command(version)]
struct Args {
    /// File the member uploads (a sample is generated if omitted)
    #[arg(short, long, env = "CORDON_INPUT")]
    input: Option<PathBuf>,

    /// IPFS API URL
    #[arg(long, default_value = "http://localhost:5001", env = "CORDON_IPFS_URL")]
    ipfs_url: String,

    /// Use in-memory storage (for testing, data will not persist)
    #[arg(long, env = "CORDON_MEMORY_STORE")]
    memory_store: bool,

    /// RSA modulus size in bits
    #[arg(long, default_value = "2048", env = "CORDON_KEY_BITS")]
    key_bits: usize,

    /// Per-request IPFS timeout in seconds
    #[arg(long, default_value = "30", env = "CORDON_IPFS_TIMEOUT")]
    ipfs_timeout: u64,

    /// Directory for the sample and decrypted files
    #[arg(short, long, default_value = "cordon-output", env = "CORDON_OUTPUT_DIR")]
    output_dir: PathBuf,

    /// Enable debug logging
    #[arg(short, long, env = "CORDON_DEBUG")]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "cordon={level},cordon_cli={level},cordon_core={level},cordon_blockstore={level}",
                    level = log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = CordonConfig {
        ipfs_url: args.ipfs_url,
        use_memory_store: args.memory_store,
        key_bits: args.key_bits,
        ipfs_timeout_secs: args.ipfs_timeout,
        output_dir: args.output_dir,
    };
    tracing::info!(
        ipfs = %config.ipfs_url,
        memory = config.use_memory_store,
        key_bits = config.key_bits,
        "Starting Cordon walkthrough"
    );

    let state = AppState::new(config).await?;
    let outcome = run_demo(&state, args.input.as_deref()).await?;

    tracing::info!(
        group = %outcome.group,
        rekeyed = outcome.rekeyed_files,
        saved_to = %outcome.saved_to.display(),
        "Revocation verified"
    );
    Ok(())
}
