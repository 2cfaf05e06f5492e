//! Atomic Hardware Capabilities
//!
//! This module defines fine-grained capability traits that instruments can
//! implement. Instead of one monolithic instrument trait, devices implement
//! the specific capabilities they actually support:
//!
//! - The cluster controller implements `Connectable + Resettable + StatusSource`
//! - A pure signal source would implement only `Connectable + Resettable`
//!
//! Each capability trait:
//! - Is async (uses #[async_trait])
//! - Is thread-safe (requires Send + Sync)
//! - Uses anyhow::Result for errors
//! - Focuses on ONE thing
//!
//! Bootstrap code works against trait objects, so the mock cluster and the
//! TCP driver are interchangeable behind `Arc<dyn ClusterInterface>`.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;

/// Capability: Connection Lifecycle
///
/// Devices reached over a transport that must be opened before use.
///
/// # Contract
/// - `connect` establishes the transport; calling it while connected is an
///   error
/// - `disconnect` is idempotent
#[async_trait]
pub trait Connectable: Send + Sync {
    /// Open the transport to the device.
    async fn connect(&self) -> Result<()>;

    /// Close the transport. Safe to call when already disconnected.
    async fn disconnect(&self) -> Result<()>;

    /// Whether the transport is currently open.
    async fn is_connected(&self) -> bool;
}

/// Capability: Reset
///
/// Devices that can be returned to a known power-on state.
#[async_trait]
pub trait Resettable: Send + Sync {
    /// Reset the device to its power-on state.
    async fn reset(&self) -> Result<()>;
}

/// Capability: Status Reporting
///
/// Devices that report an identity string and a structured system state.
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Identity string of the device (vendor, model, serial, firmware).
    async fn identity(&self) -> Result<String>;

    /// Current system state of the device.
    async fn system_state(&self) -> Result<SystemState>;
}

/// Everything the bootstrap needs from a cluster controller.
pub trait ClusterInterface: Connectable + Resettable + StatusSource {
    /// Instrument name the device was registered under.
    fn name(&self) -> &str;
}

/// Overall device health as reported by the status query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemStatus {
    /// All subsystems nominal.
    Okay,
    /// Degraded but operational (e.g., a PLL briefly unlocked).
    Warning,
    /// A subsystem is faulted; schedules must not run.
    Error,
}

/// Parsed reply of a system-state query.
///
/// Wire form is `STATUS` or `STATUS;flag1,flag2,...`, e.g.
/// `OKAY` or `WARNING;CARRIER_PLL_UNLOCKED`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemState {
    /// Overall status.
    pub status: SystemStatus,
    /// Active status flags, empty when nominal.
    pub flags: Vec<String>,
}

impl SystemState {
    /// A nominal state with no flags.
    pub fn okay() -> Self {
        Self {
            status: SystemStatus::Okay,
            flags: Vec::new(),
        }
    }
}

impl FromStr for SystemState {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.trim().splitn(2, ';');
        let status = match parts.next().unwrap_or("").to_ascii_uppercase().as_str() {
            "OKAY" | "OK" => SystemStatus::Okay,
            "WARNING" => SystemStatus::Warning,
            "ERROR" => SystemStatus::Error,
            other => bail!("unrecognized system status '{other}'"),
        };
        let flags = parts
            .next()
            .map(|f| {
                f.split(',')
                    .map(str::trim)
                    .filter(|f| !f.is_empty() && *f != "NONE")
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        Ok(SystemState { status, flags })
    }
}

impl fmt::Display for SystemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match self.status {
            SystemStatus::Okay => "OKAY",
            SystemStatus::Warning => "WARNING",
            SystemStatus::Error => "ERROR",
        };
        if self.flags.is_empty() {
            write!(f, "Status: {status}, Flags: NONE")
        } else {
            write!(f, "Status: {status}, Flags: {}", self.flags.join(","))
        }
    }
}
