//! # Qubit Station Core Library
//!
//! This crate brings up a laboratory control stack for superconducting-qubit
//! experiments: it wires a physical cluster controller, a hardware
//! abstraction layer, measurement-control utilities, and a device
//! configuration registry into a running session. The binary (`main.rs`)
//! performs a one-shot bringup; embedding applications hold on to the
//! returned [`station::Station`] for the lifetime of an interactive session.
//!
//! ## Crate Structure
//!
//! The library is organized into several modules, each with a distinct
//! responsibility:
//!
//! - **`config`**: Strongly-typed station configuration loaded from
//!   `station.toml` and `QSTATION_`-prefixed environment variables.
//! - **`error`**: The central `StationError` enum for error handling across
//!   the crate.
//! - **`telemetry`**: Tracing initialization (level from config, multiple
//!   output formats).
//! - **`data`**: The active data directory, TUIDs, and the settings-snapshot
//!   store used for element hydration.
//! - **`hardware`**: The static hardware description consumed by the
//!   scheduling backend, capability traits, the TCP cluster driver, and its
//!   mock.
//! - **`registry`**: The name-keyed registry backing the framework's
//!   register-by-name convention.
//! - **`coordinator`**: The hardware-abstraction layer dispatching compiled
//!   schedules to physical instruments.
//! - **`measurement`**: Measurement controls, the live datapoint feed, and
//!   the plot/instrument monitors.
//! - **`device`**: Transmon elements and the quantum-device registry,
//!   including best-effort settings hydration.
//! - **`station`**: The four-stage bringup procedure and the session
//!   context object.
//! - **`validation`**: Small parameter validators shared by the
//!   configuration layers.

pub mod config;
pub mod coordinator;
pub mod data;
pub mod device;
pub mod error;
pub mod hardware;
pub mod measurement;
pub mod registry;
pub mod station;
pub mod telemetry;
pub mod validation;
