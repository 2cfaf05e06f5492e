//! Custom error types for the application.
//!
//! This module defines the primary error type, `StationError`, for the entire
//! crate. Using the `thiserror` crate, it provides a centralized and consistent
//! way to handle the different kinds of errors that can occur during station
//! bringup, from configuration and filesystem issues to instrument-registry
//! conflicts and settings-snapshot problems.
//!
//! ## Error Hierarchy
//!
//! `StationError` is an enum that consolidates various error sources:
//!
//! - **`Config`**: Wraps errors from `figment`, typically related to file
//!   parsing or type mismatches in the station configuration.
//! - **`Configuration`**: Represents semantic errors in the configuration,
//!   such as values that parse correctly but are logically invalid (e.g., a
//!   malformed cluster address). These are caught during the validation step.
//! - **`Io`**: Wraps standard `std::io::Error`, covering data-directory and
//!   snapshot file I/O.
//! - **`HardwareConfig`**: Invariant violations in the hardware description
//!   handed to the scheduling backend (duplicate port/clock pairs, empty
//!   signal paths, out-of-range mixer parameters).
//! - **`Instrument`**: A general category for errors originating from the
//!   instrument layer, such as a failed status query.
//! - Registry conflicts (`DuplicateInstrument`, `UnknownInstrument`,
//!   `DuplicateElement`) enforce the register-by-name convention: every
//!   session object claims a unique name.
//! - Snapshot-store errors (`MalformedTuid`, `NoExperimentData`, `Snapshot`)
//!   cover the settings-hydration path. During element hydration these are
//!   collected into a report instead of aborting the loop.
//!
//! By using `#[from]`, `StationError` can be seamlessly created from
//! underlying error types, simplifying error handling throughout the crate
//! with the `?` operator.

use thiserror::Error;

/// Convenience alias for results using the application error type.
pub type StationResult<T> = std::result::Result<T, StationError>;

/// Central error type for station bringup and session management.
#[derive(Error, Debug)]
pub enum StationError {
    /// Configuration file or environment parsing failed.
    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    /// Configuration parsed but failed semantic validation.
    #[error("Configuration validation error: {0}")]
    Configuration(String),

    /// Filesystem or network I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The hardware description violates a backend invariant.
    #[error("Hardware configuration error: {0}")]
    HardwareConfig(String),

    /// An instrument-layer operation failed.
    #[error("Instrument error: {0}")]
    Instrument(String),

    /// A second session object tried to claim an already-registered name.
    #[error("Instrument '{0}' is already registered")]
    DuplicateInstrument(String),

    /// A name binding referenced an instrument that was never registered.
    #[error("Instrument '{0}' is not registered")]
    UnknownInstrument(String),

    /// A device element with the same name is already part of the device.
    #[error("Device element '{0}' is already registered")]
    DuplicateElement(String),

    /// The active data directory was queried before being set.
    #[error("Data directory has not been set")]
    DatadirUnset,

    /// No experiment containers exist under the active data directory.
    #[error("No experiment containers found under the data directory")]
    NoExperimentData,

    /// A TUID string did not match the `YYYYmmDD-HHMMSS-mmm-xxxxxx` form.
    #[error("Malformed TUID '{0}'")]
    MalformedTuid(String),

    /// A settings snapshot is missing, unreadable, or incomplete.
    #[error("Settings snapshot error: {0}")]
    Snapshot(String),

    /// JSON (de)serialization failed.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
