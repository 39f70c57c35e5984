//! Command-line entry point for running the smoke scenarios by hand.

use anyhow::Result;
use clap::Parser;
use inventory_smoke::{Protocol, SmokeConfig, SmokeSuite};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "inventory-smoke")]
#[command(about = "Ordered CRUD smoke scenarios for the inventory service")]
struct Args {
    /// Override TEST_PROTOCOL (http or https)
    #[arg(long)]
    protocol: Option<Protocol>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut config = SmokeConfig::from_env()?;
    if let Some(protocol) = args.protocol {
        config.protocol = protocol;
    }
    info!(protocol = %config.protocol, "starting smoke run");

    SmokeSuite::new(config).run().await?;
    info!("all smoke scenarios passed");
    Ok(())
}
