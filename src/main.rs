//! Interface bridge host.
//!
//! Serves the bundled greeting bridge:
//!
//! ```text
//!   config.toml ─▶ logging / metrics
//!               ─▶ RouteDispatcher::mount(HelloApi) ─▶ BridgeServer ─▶ listener
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use interface_bridge::codec::SerializerProfiles;
use interface_bridge::config::{load_config, BridgeConfig};
use interface_bridge::greeter::{self, Greeter};
use interface_bridge::observability::{logging, metrics};
use interface_bridge::{BridgeServer, RouteDispatcher, Shutdown};

#[derive(Parser)]
#[command(name = "interface-bridge")]
#[command(about = "Serve bridged interfaces over HTTP", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Overrides `server.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => BridgeConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.server.bind_address = bind;
    }

    logging::init(&config.observability)?;
    tracing::info!("interface-bridge v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let definition = Arc::new(greeter::definition()?);
    let dispatcher = RouteDispatcher::new(SerializerProfiles::from_config(&config.serialization))
        .mount(Greeter::service(definition))?;

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        request_timeout_secs = config.server.request_timeout_secs,
        max_body_bytes = config.server.max_body_bytes,
        "Listening for connections"
    );

    let shutdown = Shutdown::new();
    let server = BridgeServer::new(&config, dispatcher);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("interface-bridge stopped");
    Ok(())
}
