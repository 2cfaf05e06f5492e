//! Hardware layer.
//!
//! Three concerns live here:
//!
//! - **`config`**: the static hardware description (port/clock routing, LO
//!   frequencies, mixer corrections) consumed by the external scheduling
//!   backend. A data literal with validation, never mutated after
//!   construction.
//! - **`capabilities`**: fine-grained async traits instruments implement
//!   (`Connectable`, `Resettable`, `StatusSource`).
//! - **`cluster`** / **`mock`**: the TCP driver for the physical cluster
//!   controller and its in-memory stand-in for tests and dry runs.

pub mod capabilities;
pub mod cluster;
pub mod config;
pub mod mock;

pub use capabilities::{ClusterInterface, Connectable, Resettable, StatusSource, SystemState, SystemStatus};
pub use cluster::Cluster;
pub use config::HardwareConfig;
pub use mock::MockCluster;
