//! Command Center CLI
//!
//! Command-line interface for the API operations dashboard.

use std::path::PathBuf;

use clap::Parser;
use command_center::{load_config, CommandCenterBuilder, Config};
use tracing::Level;

#[derive(Parser)]
#[command(name = "command-center")]
#[command(about = "Operations dashboard for probing and exercising a remote HTTP API")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Dashboard port (overrides config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Target API base URL (overrides config file)
    #[arg(long)]
    base_url: Option<String>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: Level,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    tracing::debug!(
        "Parsed command line arguments: config={:?}, port={:?}, base_url={:?}, log_level={:?}",
        args.config,
        args.port,
        args.base_url,
        args.log_level
    );

    let mut config = if let Some(config_path) = &args.config {
        tracing::debug!("Loading configuration from {:?}", config_path);
        load_config(config_path)?
    } else {
        tracing::debug!("Using default configuration");
        Config::default()
    };

    if let Some(port) = args.port {
        config.dashboard.port = port;
    }
    if let Some(base_url) = args.base_url {
        config.target.base_url = base_url;
    }

    tracing::info!("Starting command center");
    tracing::debug!(
        "Target: {}, sweep on start: {}, sweep interval: {:?}",
        config.base_url(),
        config.sweep.on_start,
        config.sweep.interval
    );

    CommandCenterBuilder::new(config).build().await?.start().await?;

    Ok(())
}
