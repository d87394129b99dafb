//! splitd - timer daemon for splitshell
//!
//! Subcommands:
//! - `splitd serve` - Run the daemon
//! - `splitd config` - Print the effective configuration

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use splitconf::SplitConfig;
use splitd::{serve, telemetry};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "splitd")]
#[command(about = "Speedrun timer daemon with remote control over WebSocket")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the timer daemon
    Serve {
        /// Config file used in place of ./splitshell.toml
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Listen address, overrides bind.http_addr
        #[arg(long)]
        addr: Option<String>,
    },

    /// Print the effective configuration as TOML
    Config {
        /// Config file used in place of ./splitshell.toml
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config, addr } => {
            let (mut config, sources) = SplitConfig::load_with_sources_from(config.as_deref())
                .context("Failed to load configuration")?;
            if let Some(addr) = addr {
                config.infra.bind.http_addr = addr;
            }

            let telemetry = telemetry::init(&config.infra.telemetry)?;
            for path in &sources.files {
                info!("Loaded config: {}", path.display());
            }
            for var in &sources.env_overrides {
                info!("Config override from env: {}", var);
            }

            let result = serve::run(config).await;
            telemetry.shutdown();
            result?;
        }
        Commands::Config { config } => {
            let config = SplitConfig::load_from(config.as_deref())
                .context("Failed to load configuration")?;
            print!("{}", config.to_toml());
        }
    }

    Ok(())
}
