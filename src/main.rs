//! CLI Entry Point for qubit-station
//!
//! Provides command-line interface for:
//! - Bringing up the control-station session against the configured cluster
//! - Validating the station and hardware configuration without hardware
//!
//! # Usage
//!
//! Bring up the station:
//! ```bash
//! qubit-station up
//! ```
//!
//! Bring up against the mock cluster (no hardware required):
//! ```bash
//! qubit-station up --dry-run
//! ```
//!
//! Check configuration only:
//! ```bash
//! qubit-station validate --config config/station.toml
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use qubit_station::config::StationConfig;
use qubit_station::hardware::{HardwareConfig, MockCluster};
use qubit_station::station::Station;
use qubit_station::telemetry;

#[derive(Parser)]
#[command(name = "qubit-station")]
#[command(about = "Control-station bootstrap for superconducting-qubit experiments", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bring up the control-station session
    Up {
        /// Path to station.toml (default: config/station.toml)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Use the mock cluster instead of connecting to hardware
        #[arg(long)]
        dry_run: bool,
    },

    /// Validate station and hardware configuration without touching hardware
    Validate {
        /// Path to station.toml (default: config/station.toml)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Up { config, dry_run } => {
            let config = load_config(config)?;
            telemetry::init_from_config(&config).map_err(|e| anyhow::anyhow!(e))?;

            let station = if dry_run {
                let cluster = Arc::new(MockCluster::new(&config.cluster.name));
                Station::bringup_with_cluster(config, cluster).await?
            } else {
                Station::bringup(config).await?
            };

            println!("{}", station.summary());
            station.shutdown().await?;
        }
        Commands::Validate { config } => {
            let config = load_config(config)?;
            config
                .validate()
                .map_err(|e| anyhow::anyhow!("station configuration: {e}"))?;

            let hardware = match &config.hardware.config_file {
                Some(path) => HardwareConfig::from_file(path)?,
                None => HardwareConfig::single_transmon_default(),
            };
            hardware.validate()?;

            println!(
                "configuration OK ({} cluster(s), {} element(s))",
                hardware.clusters.len(),
                config.enabled_elements().count()
            );
        }
    }

    Ok(())
}

fn load_config(path: Option<PathBuf>) -> Result<StationConfig> {
    let config = match path {
        Some(path) => StationConfig::load_from(path)?,
        None => StationConfig::load()?,
    };
    Ok(config)
}
