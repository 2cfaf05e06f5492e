//! The quantum device registry.
//!
//! `QuantumDevice` ties the session together: it stores the names of the
//! measurement-control and instrument-coordinator instances (register-by-name
//! convention), owns the validated hardware description, and registers every
//! device element. The settings-hydration step loads previously persisted
//! calibration settings onto elements, best-effort: a failing element is
//! recorded and skipped, the rest still hydrate.

use std::fmt;
use tracing::{info, warn};

use crate::data::snapshot::{latest_tuid, load_snapshot};
use crate::data::tuid::Tuid;
use crate::device::element::{TransmonElement, TransmonParams};
use crate::error::{StationError, StationResult};
use crate::hardware::config::HardwareConfig;

/// Device-configuration registry for one quantum chip.
pub struct QuantumDevice {
    name: String,
    instr_measurement_control: Option<String>,
    instr_instrument_coordinator: Option<String>,
    hardware_config: Option<HardwareConfig>,
    elements: Vec<TransmonElement>,
}

impl QuantumDevice {
    /// An empty device registry named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instr_measurement_control: None,
            instr_instrument_coordinator: None,
            hardware_config: None,
            elements: Vec::new(),
        }
    }

    /// The device's registered name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bind the measurement control by name.
    pub fn set_instr_measurement_control(&mut self, name: impl Into<String>) {
        self.instr_measurement_control = Some(name.into());
    }

    /// Name of the bound measurement control, if any.
    pub fn instr_measurement_control(&self) -> Option<&str> {
        self.instr_measurement_control.as_deref()
    }

    /// Bind the instrument coordinator by name.
    pub fn set_instr_instrument_coordinator(&mut self, name: impl Into<String>) {
        self.instr_instrument_coordinator = Some(name.into());
    }

    /// Name of the bound instrument coordinator, if any.
    pub fn instr_instrument_coordinator(&self) -> Option<&str> {
        self.instr_instrument_coordinator.as_deref()
    }

    /// Attach the hardware description, validating it first. The description
    /// is owned by the scheduling backend from here on and never mutated.
    pub fn set_hardware_config(&mut self, config: HardwareConfig) -> StationResult<()> {
        config.validate()?;
        self.hardware_config = Some(config);
        Ok(())
    }

    /// The attached hardware description, if any.
    pub fn hardware_config(&self) -> Option<&HardwareConfig> {
        self.hardware_config.as_ref()
    }

    /// Register a device element. Element names must be unique.
    pub fn add_element(&mut self, element: TransmonElement) -> StationResult<()> {
        if self.element(element.name()).is_some() {
            return Err(StationError::DuplicateElement(element.name().to_string()));
        }
        info!(device = %self.name, element = %element.name(), "element registered");
        self.elements.push(element);
        Ok(())
    }

    /// Look up an element by name.
    pub fn element(&self, name: &str) -> Option<&TransmonElement> {
        self.elements.iter().find(|e| e.name() == name)
    }

    /// Registered element names, in registration order.
    pub fn element_names(&self) -> Vec<&str> {
        self.elements.iter().map(TransmonElement::name).collect()
    }

    /// Number of registered elements.
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Load persisted calibration settings onto every registered element.
    ///
    /// Settings come from the snapshot addressed by `tuid`, or from the most
    /// recent experiment container when `tuid` is `None`. Exactly one
    /// attempt is made per element; an element whose settings are missing or
    /// invalid is skipped with a reason and the loop continues. The per-
    /// element outcomes are returned as a report.
    pub fn hydrate(&mut self, tuid: Option<&Tuid>) -> HydrationReport {
        let resolved = match tuid {
            Some(tuid) => Ok(tuid.clone()),
            None => latest_tuid(),
        };

        let (source, snapshot) = match resolved {
            Ok(tuid) => match load_snapshot(&tuid) {
                Ok(snapshot) => (Some(tuid), Some(snapshot)),
                Err(e) => {
                    warn!(device = %self.name, %e, "settings snapshot unavailable");
                    (None, None)
                }
            },
            Err(e) => {
                warn!(device = %self.name, %e, "no settings source");
                (None, None)
            }
        };

        let mut entries = Vec::with_capacity(self.elements.len());
        for element in &mut self.elements {
            let outcome = match (&source, &snapshot) {
                (Some(tuid), Some(snapshot)) => {
                    match hydrate_element(element, snapshot) {
                        Ok(()) => HydrationOutcome::Loaded { tuid: tuid.clone() },
                        Err(reason) => HydrationOutcome::Skipped { reason },
                    }
                }
                _ => HydrationOutcome::Skipped {
                    reason: "no settings snapshot available".to_string(),
                },
            };
            match &outcome {
                HydrationOutcome::Loaded { tuid } => {
                    info!(element = %element.name(), %tuid, "settings loaded");
                }
                HydrationOutcome::Skipped { reason } => {
                    warn!(element = %element.name(), reason = %reason, "settings skipped");
                }
            }
            entries.push(HydrationEntry {
                element: element.name().to_string(),
                outcome,
            });
        }

        HydrationReport { entries }
    }
}

fn hydrate_element(
    element: &mut TransmonElement,
    snapshot: &crate::data::snapshot::Snapshot,
) -> Result<(), String> {
    let value = snapshot
        .element_settings(element.name())
        .ok_or_else(|| format!("snapshot has no settings for '{}'", element.name()))?;
    let params: TransmonParams = serde_json::from_value(value.clone())
        .map_err(|e| format!("settings for '{}' do not parse: {e}", element.name()))?;
    element.apply_params(params)
}

/// Per-element result of one hydration pass.
#[derive(Debug, Clone, PartialEq)]
pub enum HydrationOutcome {
    /// Settings were loaded from the named experiment.
    Loaded {
        /// Source experiment.
        tuid: Tuid,
    },
    /// The element kept its defaults.
    Skipped {
        /// Why the element was skipped.
        reason: String,
    },
}

/// One element's entry in a hydration report.
#[derive(Debug, Clone, PartialEq)]
pub struct HydrationEntry {
    /// Element name.
    pub element: String,
    /// What happened to it.
    pub outcome: HydrationOutcome,
}

/// Outcome of a hydration pass over every registered element.
///
/// Always contains exactly one entry per element, in registration order;
/// partial failure is observable instead of silently logged away.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HydrationReport {
    /// Per-element outcomes.
    pub entries: Vec<HydrationEntry>,
}

impl HydrationReport {
    /// Number of elements whose settings were loaded.
    pub fn loaded_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, HydrationOutcome::Loaded { .. }))
            .count()
    }

    /// Number of elements that kept their defaults.
    pub fn skipped_count(&self) -> usize {
        self.entries.len() - self.loaded_count()
    }

    /// The outcome recorded for `element`, if present.
    pub fn outcome_for(&self, element: &str) -> Option<&HydrationOutcome> {
        self.entries
            .iter()
            .find(|e| e.element == element)
            .map(|e| &e.outcome)
    }
}

impl fmt::Display for HydrationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} loaded, {} skipped of {} elements",
            self.loaded_count(),
            self.skipped_count(),
            self.entries.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::datadir::{clear_datadir, set_datadir};
    use crate::data::snapshot::{save_snapshot, Snapshot};
    use serial_test::serial;
    use tempfile::tempdir;

    fn device_with_elements(names: &[&str]) -> QuantumDevice {
        let mut device = QuantumDevice::new("quantum_device");
        for name in names {
            device.add_element(TransmonElement::new(*name)).unwrap();
        }
        device
    }

    #[test]
    fn name_bindings() {
        let mut device = QuantumDevice::new("quantum_device");
        device.set_instr_measurement_control("meas_ctrl");
        device.set_instr_instrument_coordinator("instrument_coordinator");
        assert_eq!(device.instr_measurement_control(), Some("meas_ctrl"));
        assert_eq!(
            device.instr_instrument_coordinator(),
            Some("instrument_coordinator")
        );
    }

    #[test]
    fn duplicate_element_rejected() {
        let mut device = device_with_elements(&["q00"]);
        let err = device.add_element(TransmonElement::new("q00")).unwrap_err();
        assert!(matches!(err, StationError::DuplicateElement(name) if name == "q00"));
        assert_eq!(device.element_count(), 1);
    }

    #[test]
    fn invalid_hardware_config_rejected_at_attach() {
        let mut device = QuantumDevice::new("quantum_device");
        let config = HardwareConfig::new(""); // empty backend
        assert!(device.set_hardware_config(config).is_err());
        assert!(device.hardware_config().is_none());
    }

    #[test]
    #[serial]
    fn hydration_attempts_every_element_despite_failures() {
        let dir = tempdir().unwrap();
        set_datadir(dir.path()).unwrap();

        let tuid = Tuid::parse("20230117-143522-481-9c5a1f").unwrap();
        let mut snapshot = Snapshot::default();
        snapshot
            .insert(
                "q00",
                &TransmonParams {
                    clock_freq: 5.312e9,
                    ro_freq: 7.197e9,
                    mw_amp180: 0.18,
                    ..TransmonParams::default()
                },
            )
            .unwrap();
        // q01's settings are present but invalid (amplitude out of range)
        snapshot
            .insert(
                "q01",
                &TransmonParams {
                    mw_amp180: 7.0,
                    ..TransmonParams::default()
                },
            )
            .unwrap();
        save_snapshot(&tuid, &snapshot).unwrap();

        let mut device = device_with_elements(&["q00", "q01", "q02"]);
        let report = device.hydrate(Some(&tuid));

        // All three stay registered, all three were attempted
        assert_eq!(device.element_count(), 3);
        assert_eq!(report.entries.len(), 3);
        assert_eq!(report.loaded_count(), 1);
        assert_eq!(report.skipped_count(), 2);

        assert!(matches!(
            report.outcome_for("q00"),
            Some(HydrationOutcome::Loaded { .. })
        ));
        assert!(matches!(
            report.outcome_for("q01"),
            Some(HydrationOutcome::Skipped { .. })
        ));
        assert!(matches!(
            report.outcome_for("q02"),
            Some(HydrationOutcome::Skipped { .. })
        ));

        // q00 actually carries the hydrated values, q01 kept defaults
        assert_eq!(device.element("q00").unwrap().params().clock_freq, 5.312e9);
        assert_eq!(
            device.element("q01").unwrap().params(),
            &TransmonParams::default()
        );

        clear_datadir();
    }

    #[test]
    #[serial]
    fn hydration_with_no_data_skips_everything() {
        let dir = tempdir().unwrap();
        set_datadir(dir.path()).unwrap();

        let mut device = device_with_elements(&["q00", "q01"]);
        let report = device.hydrate(None);

        assert_eq!(report.entries.len(), 2);
        assert_eq!(report.loaded_count(), 0);
        assert_eq!(report.to_string(), "0 loaded, 2 skipped of 2 elements");

        clear_datadir();
    }

    #[test]
    #[serial]
    fn hydration_without_explicit_tuid_uses_latest() {
        let dir = tempdir().unwrap();
        set_datadir(dir.path()).unwrap();

        let old = Tuid::parse("20230116-090000-000-aaaaaa").unwrap();
        let mut old_snapshot = Snapshot::default();
        old_snapshot
            .insert(
                "q00",
                &TransmonParams {
                    clock_freq: 1.0e9,
                    ..TransmonParams::default()
                },
            )
            .unwrap();
        save_snapshot(&old, &old_snapshot).unwrap();

        let new = Tuid::parse("20230117-143522-481-9c5a1f").unwrap();
        let mut new_snapshot = Snapshot::default();
        new_snapshot
            .insert(
                "q00",
                &TransmonParams {
                    clock_freq: 2.0e9,
                    ..TransmonParams::default()
                },
            )
            .unwrap();
        save_snapshot(&new, &new_snapshot).unwrap();

        let mut device = device_with_elements(&["q00"]);
        let report = device.hydrate(None);

        assert_eq!(report.loaded_count(), 1);
        assert!(matches!(
            report.outcome_for("q00"),
            Some(HydrationOutcome::Loaded { tuid }) if *tuid == new
        ));
        assert_eq!(device.element("q00").unwrap().params().clock_freq, 2.0e9);

        clear_datadir();
    }
}
