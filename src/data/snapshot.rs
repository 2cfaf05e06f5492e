//! Settings snapshots from prior experiments.
//!
//! Every recorded experiment lives in a container directory
//! `<datadir>/<YYYYmmDD>/<TUID>/` and may carry a `snapshot.json` describing
//! the calibration settings of each device element at the time the data was
//! taken. Hydration reads one such snapshot back and applies the per-element
//! settings onto freshly constructed elements.
//!
//! The snapshot format is a single JSON object mapping element names to their
//! serialized parameter records. Elements absent from a snapshot simply keep
//! their defaults; the caller decides whether that is an error.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::data::datadir::get_datadir;
use crate::data::tuid::Tuid;
use crate::error::{StationError, StationResult};

const SNAPSHOT_FILE: &str = "snapshot.json";

/// Calibration settings of every element at one point in time.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    /// Element name to serialized parameter record.
    pub elements: BTreeMap<String, serde_json::Value>,
}

impl Snapshot {
    /// Settings recorded for `element`, if any.
    pub fn element_settings(&self, element: &str) -> Option<&serde_json::Value> {
        self.elements.get(element)
    }

    /// Record settings for `element`, replacing any previous entry.
    pub fn insert<T: Serialize>(&mut self, element: &str, settings: &T) -> StationResult<()> {
        let value = serde_json::to_value(settings)?;
        self.elements.insert(element.to_string(), value);
        Ok(())
    }
}

/// The container directory of a recorded experiment.
///
/// Errors if the container does not exist under the active data directory.
pub fn experiment_container(tuid: &Tuid) -> StationResult<PathBuf> {
    let dir = get_datadir()?
        .join(tuid.date_prefix())
        .join(tuid.as_str());
    if dir.is_dir() {
        Ok(dir)
    } else {
        Err(StationError::Snapshot(format!(
            "no experiment container for TUID {tuid}"
        )))
    }
}

/// The most recent TUID with an experiment container under the data directory.
///
/// TUIDs order lexicographically by timestamp, so the maximum directory name
/// is the newest experiment. Directory entries that are not valid TUIDs are
/// ignored.
pub fn latest_tuid() -> StationResult<Tuid> {
    let datadir = get_datadir()?;
    let mut newest: Option<Tuid> = None;

    for day in std::fs::read_dir(&datadir)? {
        let day = day?;
        if !day.file_type()?.is_dir() {
            continue;
        }
        for entry in std::fs::read_dir(day.path())? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name();
            let Ok(tuid) = Tuid::parse(&name.to_string_lossy()) else {
                continue;
            };
            if newest.as_ref().map_or(true, |n| tuid > *n) {
                newest = Some(tuid);
            }
        }
    }

    newest.ok_or(StationError::NoExperimentData)
}

/// Write `snapshot` into the container for `tuid`, creating the container if
/// needed.
pub fn save_snapshot(tuid: &Tuid, snapshot: &Snapshot) -> StationResult<()> {
    let dir = get_datadir()?
        .join(tuid.date_prefix())
        .join(tuid.as_str());
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(snapshot)?;
    std::fs::write(dir.join(SNAPSHOT_FILE), json)?;
    Ok(())
}

/// Read the snapshot recorded in the container for `tuid`.
pub fn load_snapshot(tuid: &Tuid) -> StationResult<Snapshot> {
    let path = experiment_container(tuid)?.join(SNAPSHOT_FILE);
    let json = std::fs::read_to_string(&path).map_err(|e| {
        StationError::Snapshot(format!("cannot read {}: {e}", path.display()))
    })?;
    let snapshot = serde_json::from_str(&json)?;
    Ok(snapshot)
}
