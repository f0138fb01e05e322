use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use interface_bridge::config::{load_config, BridgeConfig};
use interface_bridge::greeter::{self, GreeterClient};
use interface_bridge::{BridgeClient, ClientError};

#[derive(Parser)]
#[command(name = "bridge-cli")]
#[command(about = "Call the greeting bridge from the command line", long_about = None)]
struct Cli {
    /// Base URL of the bridge host; overrides `client.base_url`.
    #[arg(short, long)]
    url: Option<String>,

    /// Bearer API key; overrides `client.api_key`.
    #[arg(short, long)]
    key: Option<String>,

    /// TOML configuration file with a `[client]` section.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask the host to greet someone
    Greet { name: String },
    /// List the operations of the greeting bridge
    Operations,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => BridgeConfig::default(),
    };
    if let Some(url) = cli.url {
        config.client.base_url = url;
    }
    if let Some(key) = cli.key {
        config.client.api_key = Some(key);
    }

    let definition = Arc::new(greeter::definition()?);
    match cli.command {
        Commands::Greet { name } => {
            let client = GreeterClient::new(BridgeClient::from_config(definition, &config)?);
            let token = CancellationToken::new();
            let ctrl_c = token.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    ctrl_c.cancel();
                }
            });
            match client.greet(&name, token).await {
                Ok(greeting) => println!("{greeting}"),
                Err(ClientError::UnsuccessfulStatus(envelope)) => {
                    eprintln!("Error: bridge returned status {}", envelope.status);
                    eprintln!("Response: {}", envelope.body_text());
                }
                Err(err) => return Err(err.into()),
            }
        }
        Commands::Operations => {
            for operation in definition.operations() {
                println!("{operation}");
            }
        }
    }

    Ok(())
}
