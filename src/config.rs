//! Station configuration using Figment
//!
//! This module provides strongly-typed configuration loading for the control
//! station. Configuration is loaded from:
//! 1. station.toml file (base configuration)
//! 2. Environment variables (prefixed with QSTATION_)
//!
//! Every field carries a default reproducing the reference single-transmon
//! setup, so a missing file yields a usable configuration.
//!
//! # Example
//! ```no_run
//! use qubit_station::config::StationConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = StationConfig::load()?;
//! println!("Station: {}", config.application.name);
//! # Ok(())
//! # }
//! ```

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::data::tuid::Tuid;
use crate::validation;

/// Top-level station configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationConfig {
    /// Application settings
    #[serde(default)]
    pub application: ApplicationConfig,
    /// Experiment data storage settings
    #[serde(default)]
    pub data: DataConfig,
    /// Cluster controller connection settings
    #[serde(default)]
    pub cluster: ClusterConnection,
    /// Hardware description source
    #[serde(default)]
    pub hardware: HardwareSource,
    /// Device elements managed by the quantum device
    #[serde(default = "default_elements")]
    pub elements: Vec<ElementDefinition>,
    /// Settings hydration from prior experiments
    #[serde(default)]
    pub hydration: HydrationConfig,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            application: ApplicationConfig::default(),
            data: DataConfig::default(),
            cluster: ClusterConnection::default(),
            hardware: HardwareSource::default(),
            elements: default_elements(),
            hydration: HydrationConfig::default(),
        }
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Station name, used in logs and the session summary
    pub name: String,
    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: "qubit-station".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Experiment data storage configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DataConfig {
    /// Data directory root. Defaults to `<home>/quantify-data` when unset.
    pub root: Option<PathBuf>,
}

/// Cluster controller connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConnection {
    /// Cluster instrument name (unique within the session registry)
    pub name: String,
    /// IPv4/IPv6 address of the cluster management module
    pub address: String,
    /// TCP control port
    #[serde(default = "default_cluster_port")]
    pub port: u16,
    /// Connection timeout
    #[serde(with = "humantime_serde", default = "default_connect_timeout")]
    pub connect_timeout: Duration,
}

impl Default for ClusterConnection {
    fn default() -> Self {
        Self {
            name: "clusterA".to_string(),
            address: "192.0.2.142".to_string(),
            port: default_cluster_port(),
            connect_timeout: default_connect_timeout(),
        }
    }
}

/// Where the hardware description comes from
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HardwareSource {
    /// Optional JSON file with the hardware description. When unset, the
    /// built-in single-transmon description is used.
    pub config_file: Option<PathBuf>,
}

/// Device element definition in configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementDefinition {
    /// Unique element name (e.g., "q00")
    pub name: String,
    /// Whether this element is registered at bringup
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

/// Settings hydration configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HydrationConfig {
    /// Whether previously persisted calibration settings are loaded onto
    /// elements at bringup. Off by default.
    #[serde(default)]
    pub enabled: bool,
    /// TUID of the experiment to load settings from. When unset, the most
    /// recent experiment container is used.
    pub tuid: Option<String>,
}

// Default value functions
fn default_cluster_port() -> u16 {
    5025
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_enabled() -> bool {
    true
}

fn default_elements() -> Vec<ElementDefinition> {
    vec![ElementDefinition {
        name: "q00".to_string(),
        enabled: true,
    }]
}

impl StationConfig {
    /// Load configuration from station.toml and environment variables
    ///
    /// Environment variables can override configuration with prefix QSTATION_
    /// Example: QSTATION_APPLICATION_NAME=lab-b
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from("config/station.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("QSTATION_").split("_"))
            .extract()
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), String> {
        // Validate log level
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.application.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.application.log_level,
                valid_levels.join(", ")
            ));
        }

        validation::is_not_empty(&self.cluster.name)
            .map_err(|e| format!("cluster.name: {e}"))?;
        validation::is_valid_ip(&self.cluster.address)
            .map_err(|e| format!("cluster.address '{}': {e}", self.cluster.address))?;
        validation::is_valid_port(self.cluster.port)
            .map_err(|e| format!("cluster.port: {e}"))?;

        // Element names must be non-empty and unique
        let mut seen = std::collections::HashSet::new();
        for element in &self.elements {
            validation::is_not_empty(&element.name)
                .map_err(|e| format!("elements.name: {e}"))?;
            if !seen.insert(element.name.as_str()) {
                return Err(format!("Duplicate element name '{}'", element.name));
            }
        }

        // A pinned hydration TUID must at least parse
        if let Some(tuid) = &self.hydration.tuid {
            Tuid::parse(tuid).map_err(|e| format!("hydration.tuid: {e}"))?;
        }

        Ok(())
    }

    /// Elements that are enabled for registration, in configuration order
    pub fn enabled_elements(&self) -> impl Iterator<Item = &ElementDefinition> {
        self.elements.iter().filter(|e| e.enabled)
    }
}
