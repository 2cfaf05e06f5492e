//! Experiment data handling.
//!
//! This module owns the filesystem side of the station:
//!
//! - **`datadir`**: the process-wide active data directory where experiment
//!   recordings live (`<home>/quantify-data` by default).
//! - **`tuid`**: timestamp-based unique identifiers addressing one recorded
//!   experiment each.
//! - **`snapshot`**: the JSON settings-snapshot store used to hydrate device
//!   elements from prior experiment runs.

pub mod datadir;
pub mod snapshot;
pub mod tuid;

pub use datadir::{get_datadir, set_datadir};
pub use snapshot::Snapshot;
pub use tuid::Tuid;
