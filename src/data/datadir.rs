//! The active data directory.
//!
//! Experiment recordings and settings snapshots are stored under a single
//! directory registered once at bringup. The directory is process-global
//! (mirroring the measurement framework's convention of a single active data
//! directory per session) and is created on first registration.
//!
//! `set_datadir` is idempotent: calling it again with the same base path
//! resolves to the same directory and does not error.

use once_cell::sync::Lazy;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::error::{StationError, StationResult};

static ACTIVE_DATADIR: Lazy<RwLock<Option<PathBuf>>> = Lazy::new(|| RwLock::new(None));

/// Default data directory base: `<home>/quantify-data`.
///
/// Falls back to the current directory when no home directory is available
/// (e.g., stripped-down CI environments).
pub fn default_datadir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("quantify-data")
}

/// Create `base` if missing and register it as the active data directory.
///
/// Returns the resolved (canonicalized) directory. Filesystem errors, such as
/// a permission-denied on creation, propagate unchanged.
pub fn set_datadir<P: AsRef<Path>>(base: P) -> StationResult<PathBuf> {
    let base = base.as_ref();
    std::fs::create_dir_all(base)?;
    let resolved = base.canonicalize()?;

    let mut guard = write_lock();
    *guard = Some(resolved.clone());
    Ok(resolved)
}

/// The currently active data directory.
///
/// Errors with [`StationError::DatadirUnset`] if `set_datadir` has not been
/// called in this process.
pub fn get_datadir() -> StationResult<PathBuf> {
    read_lock().clone().ok_or(StationError::DatadirUnset)
}

/// Clear the active data directory (used by tests to restore a clean state).
#[doc(hidden)]
pub fn clear_datadir() {
    *write_lock() = None;
}

// A poisoned lock only means a writer panicked mid-assignment of an Option,
// which cannot leave the value torn. Recover the guard.
fn write_lock() -> std::sync::RwLockWriteGuard<'static, Option<PathBuf>> {
    match ACTIVE_DATADIR.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn read_lock() -> std::sync::RwLockReadGuard<'static, Option<PathBuf>> {
    match ACTIVE_DATADIR.read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::tempdir;

    #[test]
    #[serial]
    fn set_creates_and_registers() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("quantify-data");
        assert!(!base.exists());

        let resolved = set_datadir(&base).unwrap();
        assert!(base.is_dir());
        assert_eq!(get_datadir().unwrap(), resolved);

        clear_datadir();
    }

    #[test]
    #[serial]
    fn set_is_idempotent() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("quantify-data");

        let first = set_datadir(&base).unwrap();
        let second = set_datadir(&base).unwrap();
        assert_eq!(first, second);
        assert_eq!(get_datadir().unwrap(), second);

        clear_datadir();
    }

    #[test]
    #[serial]
    fn get_before_set_errors() {
        clear_datadir();
        assert!(matches!(get_datadir(), Err(StationError::DatadirUnset)));
    }
}
