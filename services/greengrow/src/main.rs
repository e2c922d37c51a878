//! GreenGrow CLI
//!
//! Command-line interface for the greenhouse monitoring dashboard.

use std::path::PathBuf;

use clap::Parser;
use greengrow::{load_config, Config};
use tracing::Level;

#[derive(Parser)]
#[command(name = "greengrow")]
#[command(about = "Greenhouse monitoring dashboard")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Dashboard port (overrides config file)
    #[arg(long)]
    port: Option<u16>,

    /// Backend base URL (overrides config file)
    #[arg(long)]
    backend: Option<String>,

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
    if let Some(backend) = args.backend {
        config.backend.base_url = backend;
    }

    tracing::info!(
        "Starting greengrow dashboard against {}",
        config.backend.base_url
    );

    greengrow::run(config).await?;

    Ok(())
}
