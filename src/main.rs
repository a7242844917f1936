use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vnforum::config::{NodeConfig, DEFAULT_SERVICE_PORT};
use vnforum::merge::parse_batch;
use vnforum::node::{ForumNode, NodeInfo, PeerClient, StartOutcome};

#[derive(Parser)]
#[command(
    name = "vnforum-node",
    version,
    about = "LAN forum sync node: peer discovery and post replication without a server",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true, default_value = "text")]
    log_format: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the sync node (default)
    Run(RunArgs),

    /// Probe a node's status endpoint
    Status(RemoteArgs),

    /// Print a node's posts as JSON
    Posts(RemoteArgs),

    /// Print a node's live peers as JSON
    Peers(RemoteArgs),

    /// Merge posts from a JSON file into a node
    Push {
        /// File holding a JSON array of posts
        #[arg(short, long)]
        file: PathBuf,

        #[command(flatten)]
        remote: RemoteArgs,
    },
}

#[derive(Args, Default)]
struct RunArgs {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Sync service port (overrides VNFORUM_PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Discovery port (overrides VNFORUM_DISCOVERY_PORT)
    #[arg(long)]
    discovery_port: Option<u16>,

    /// Data directory holding forum_posts.json and forum_peers.json
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

#[derive(Args)]
struct RemoteArgs {
    /// Base URL of the node's sync service
    #[arg(long, default_value_t = format!("http://127.0.0.1:{DEFAULT_SERVICE_PORT}"))]
    url: String,

    /// Request timeout in milliseconds
    #[arg(long, default_value = "2500")]
    timeout_ms: u64,
}

impl RemoteArgs {
    fn client(&self) -> Result<PeerClient> {
        PeerClient::new(Duration::from_millis(self.timeout_ms)).context("Failed to create HTTP client")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_tracing(&cli.log_format, cli.verbose)?;

    match cli.command.unwrap_or_else(|| Commands::Run(RunArgs::default())) {
        Commands::Run(args) => run(args).await?,
        Commands::Status(remote) => {
            let status = remote.client()?.status(&remote.url).await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Commands::Posts(remote) => {
            let posts = remote.client()?.posts(&remote.url).await?;
            println!("{}", serde_json::to_string_pretty(&posts)?);
        }
        Commands::Peers(remote) => {
            let peers = remote.client()?.peers(&remote.url).await?;
            println!("{}", serde_json::to_string_pretty(&peers)?);
        }
        Commands::Push { file, remote } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read posts file: {}", file.display()))?;
            let posts = serde_json::from_str(&content)
                .map_err(vnforum::error::Error::from)
                .and_then(parse_batch)
                .with_context(|| format!("Failed to parse posts file: {}", file.display()))?;

            tracing::info!(count = posts.len(), url = %remote.url, "Pushing posts");
            let total = remote.client()?.push_posts(&remote.url, &posts).await?;
            println!("Merged {} posts, node now holds {total}", posts.len());
        }
    }

    Ok(())
}

async fn run(args: RunArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => NodeConfig::from_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => NodeConfig::from_env().context("Failed to load config from environment")?,
    };

    if let Some(port) = args.port {
        config.service_port = port;
    }
    if let Some(port) = args.discovery_port {
        config.discovery_port = port;
    }
    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }
    config.validate()?;

    tracing::debug!("{}", NodeInfo::from_config(&config).display());

    let node = ForumNode::new(config)?;
    match node.start().await? {
        StartOutcome::AlreadyRunning(status) => {
            tracing::info!(host = %status.host, port = status.port, "Another node is serving here");
            Ok(())
        }
        StartOutcome::Started(handle) => {
            handle.wait().await?;
            Ok(())
        }
    }
}

fn setup_tracing(format: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("vnforum=debug,info")
    } else {
        tracing_subscriber::EnvFilter::new("vnforum=info,warn")
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}
