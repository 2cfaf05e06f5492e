//! Session instrument registry.
//!
//! The measurement framework addresses collaborators by name: the quantum
//! device stores the *name* of its measurement control, a measurement
//! control stores the *name* of its plot monitor. This registry is the
//! lookup table behind that convention. Every session object claims a unique
//! name at construction; a second claim on the same name is an error, and a
//! binding to an unregistered name is caught at bind time instead of at
//! first use.
//!
//! The `Station` owns the objects themselves; the registry records only
//! name and kind.

use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::error::{StationError, StationResult};

/// What kind of session object a registered name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstrumentKind {
    /// Physical instrument driver (the cluster controller).
    PhysicalInstrument,
    /// Hardware-abstraction coordinator.
    Coordinator,
    /// Coordinator component wrapping a physical instrument.
    CoordinatorComponent,
    /// Measurement-control manager.
    MeasurementControl,
    /// Live-plotting monitor.
    PlotMonitor,
    /// All-instrument parameter overview monitor.
    InstrumentMonitor,
    /// Device-configuration registry.
    QuantumDevice,
    /// Device element (qubit record).
    DeviceElement,
}

/// Name-keyed registry of every session object.
#[derive(Debug, Default)]
pub struct InstrumentRegistry {
    entries: RwLock<BTreeMap<String, InstrumentKind>>,
}

impl InstrumentRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `name` for an object of `kind`.
    pub fn register(&self, name: &str, kind: InstrumentKind) -> StationResult<()> {
        let mut entries = lock_write(&self.entries);
        if entries.contains_key(name) {
            return Err(StationError::DuplicateInstrument(name.to_string()));
        }
        entries.insert(name.to_string(), kind);
        Ok(())
    }

    /// Check that `name` is registered, erroring otherwise. Used when one
    /// object binds another by name.
    pub fn expect_registered(&self, name: &str) -> StationResult<InstrumentKind> {
        lock_read(&self.entries)
            .get(name)
            .copied()
            .ok_or_else(|| StationError::UnknownInstrument(name.to_string()))
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        lock_read(&self.entries).contains_key(name)
    }

    /// The kind registered under `name`, if any.
    pub fn kind_of(&self, name: &str) -> Option<InstrumentKind> {
        lock_read(&self.entries).get(name).copied()
    }

    /// All registered (name, kind) pairs in name order.
    pub fn entries(&self) -> Vec<(String, InstrumentKind)> {
        lock_read(&self.entries)
            .iter()
            .map(|(name, kind)| (name.clone(), *kind))
            .collect()
    }

    /// Number of registered objects.
    pub fn len(&self) -> usize {
        lock_read(&self.entries).len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        lock_read(&self.entries).is_empty()
    }
}

fn lock_read(
    lock: &RwLock<BTreeMap<String, InstrumentKind>>,
) -> std::sync::RwLockReadGuard<'_, BTreeMap<String, InstrumentKind>> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn lock_write(
    lock: &RwLock<BTreeMap<String, InstrumentKind>>,
) -> std::sync::RwLockWriteGuard<'_, BTreeMap<String, InstrumentKind>> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_lookup() {
        let registry = InstrumentRegistry::new();
        registry
            .register("meas_ctrl", InstrumentKind::MeasurementControl)
            .unwrap();
        assert!(registry.contains("meas_ctrl"));
        assert_eq!(
            registry.kind_of("meas_ctrl"),
            Some(InstrumentKind::MeasurementControl)
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn duplicate_name_rejected() {
        let registry = InstrumentRegistry::new();
        registry
            .register("clusterA", InstrumentKind::PhysicalInstrument)
            .unwrap();
        let err = registry
            .register("clusterA", InstrumentKind::PlotMonitor)
            .unwrap_err();
        assert!(matches!(err, StationError::DuplicateInstrument(name) if name == "clusterA"));
    }

    #[test]
    fn binding_to_unknown_name_caught() {
        let registry = InstrumentRegistry::new();
        let err = registry.expect_registered("plotmon").unwrap_err();
        assert!(matches!(err, StationError::UnknownInstrument(name) if name == "plotmon"));
    }

    #[test]
    fn entries_are_name_ordered() {
        let registry = InstrumentRegistry::new();
        registry
            .register("plotmon", InstrumentKind::PlotMonitor)
            .unwrap();
        registry
            .register("clusterA", InstrumentKind::PhysicalInstrument)
            .unwrap();
        let names: Vec<String> = registry.entries().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["clusterA", "plotmon"]);
    }
}
