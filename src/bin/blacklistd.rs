//! Blacklist gRPC server.

use std::io::IsTerminal;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use blacklist_store::grpc::{self, BlacklistService};
use blacklist_store::{ChunkPolicy, Config, InMemoryItemStore, ItemStore};

#[derive(Parser, Debug)]
#[command(name = "blacklistd", about = "Serve blacklist records over gRPC")]
struct Args {
    #[arg(long, env = "BLACKLIST_HOST", default_value = "127.0.0.1")]
    host: String,

    #[arg(long, env = "BLACKLIST_PORT", default_value_t = 50051)]
    port: u16,

    /// Table holding the records.
    #[arg(long, env = "BLACKLIST_TABLE", default_value = blacklist_store::config::DEFAULT_TABLE)]
    table: String,

    /// Maximum items per batch call (1..=25).
    #[arg(long = "batch-size", env = "BLACKLIST_BATCH_SIZE", default_value_t = 25)]
    batch_size: usize,

    /// How streamed requests are grouped: `envelope` or `accumulate`.
    #[arg(long, env = "BLACKLIST_CHUNKING", default_value = "envelope")]
    chunking: ChunkPolicy,

    /// Store calls per batch before giving up on unprocessed items.
    #[arg(long = "retry-attempts", env = "BLACKLIST_RETRY_ATTEMPTS", default_value_t = 8)]
    retry_attempts: u32,

    #[arg(long = "retry-base-ms", env = "BLACKLIST_RETRY_BASE_MS", default_value_t = 50)]
    retry_base_ms: u64,

    #[arg(long = "retry-max-ms", env = "BLACKLIST_RETRY_MAX_MS", default_value_t = 2000)]
    retry_max_ms: u64,

    /// Override the store endpoint (e.g. a local DynamoDB).
    #[arg(long, env = "BLACKLIST_ENDPOINT")]
    endpoint: Option<String>,

    /// Keep records in process memory instead of the external store.
    #[arg(long = "in-memory", env = "BLACKLIST_IN_MEMORY", default_value_t = false)]
    in_memory: bool,
}

impl Args {
    fn config(&self) -> Config {
        Config::new(self.table.clone())
            .with_batch_size(self.batch_size)
            .with_chunking(self.chunking)
            .with_retry(
                self.retry_attempts,
                Duration::from_millis(self.retry_base_ms),
                Duration::from_millis(self.retry_max_ms),
            )
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let ansi = std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none();
    tracing_subscriber::fmt()
        .with_ansi(ansi)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,h2=warn,hyper=warn".into()),
        )
        .init();

    let args = Args::parse();
    let config = args.config();
    config.validate()?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", args.host, args.port))?;

    info!(
        table = %config.table,
        batch_size = config.batch_size,
        chunking = %config.chunking,
        "starting blacklistd"
    );

    #[cfg(feature = "dynamodb")]
    if !args.in_memory {
        let store =
            blacklist_store::DynamoItemStore::connect(config.table.clone(), args.endpoint.clone())
                .await;
        return run(store, &config, addr).await;
    }

    #[cfg(not(feature = "dynamodb"))]
    if !args.in_memory {
        info!("built without the dynamodb feature; using the in-memory store");
    }
    if args.endpoint.is_some() && args.in_memory {
        info!("--endpoint is ignored with --in-memory");
    }

    run(InMemoryItemStore::new(), &config, addr).await
}

async fn run<S: ItemStore + Clone + 'static>(
    store: S,
    config: &Config,
    addr: SocketAddr,
) -> anyhow::Result<()> {
    let service = BlacklistService::from_config(store, config);
    grpc::serve_with_shutdown(service, addr, async {
        let _ = tokio::signal::ctrl_c().await;
        info!("shutdown requested");
    })
    .await
    .context("gRPC server failed")?;
    info!("blacklistd stopped");
    Ok(())
}
