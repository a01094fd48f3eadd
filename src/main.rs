use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use ratelimit_gateway::config::{load_config, GatewayConfig};
use ratelimit_gateway::lifecycle::{spawn_signal_handler, Shutdown};
use ratelimit_gateway::observability::{logging, metrics};
use ratelimit_gateway::GatewayServer;

#[derive(Parser)]
#[command(name = "ratelimit-gateway")]
#[command(about = "Rate limiting HTTP gateway", long_about = None)]
struct Args {
    /// Path to the TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    logging::init_logging(&config.observability.log_level);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "ratelimit-gateway starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = ?config.upstream.address,
        store = ?config.store.backend,
        policy = ?config.limiter.policy,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    spawn_signal_handler(shutdown.clone());

    let server = GatewayServer::from_config(config).await;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
