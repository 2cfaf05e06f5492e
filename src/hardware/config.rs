//! The static hardware description.
//!
//! Describes the signal routing from the quantum device to the control
//! hardware: which cluster module drives which port, against which clock,
//! at which local-oscillator frequency, and with which mixer corrections.
//! The structure is assembled once from literals (or loaded from a JSON
//! file), validated, handed to the scheduling backend by the quantum device,
//! and never mutated afterwards.
//!
//! The serialized shape is owned by the external backend and must be
//! reproduced exactly: cluster and module entries are flattened next to
//! their sibling keys, `ref` and the `dc_mixer_offset_I`/`_Q` spellings
//! included:
//!
//! ```json
//! {
//!   "backend": "quantify_scheduler.backends.qblox_backend.hardware_compile",
//!   "clusterA": {
//!     "ref": "internal",
//!     "instrument_type": "Cluster",
//!     "clusterA_module2": {
//!       "instrument_type": "QCM_RF",
//!       "complex_output_0": {
//!         "lo_freq": 5312327240.0,
//!         "dc_mixer_offset_I": 0.0,
//!         "dc_mixer_offset_Q": 0.0,
//!         "portclock_configs": [
//!           { "port": "q00:mw", "clock": "q00.01",
//!             "mixer_amp_ratio": 1.0, "mixer_phase_error_deg": 0.0 }
//!         ]
//!       }
//!     }
//!   }
//! }
//! ```
//!
//! Units: Hz for frequencies, degrees for mixer phase error.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use crate::error::{StationError, StationResult};

/// Compiler entry point of the scheduling backend this description targets.
pub const QBLOX_HARDWARE_COMPILE: &str =
    "quantify_scheduler.backends.qblox_backend.hardware_compile";

/// Complete hardware description handed to the scheduling backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HardwareConfig {
    /// Name of the backend compiler entry point.
    pub backend: String,
    /// Cluster name to cluster description.
    #[serde(flatten)]
    pub clusters: BTreeMap<String, ClusterDescription>,
}

/// One cluster: reference source, type tag, and its populated module slots.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClusterDescription {
    /// Frequency reference source.
    #[serde(rename = "ref")]
    pub ref_source: RefSource,
    /// Type tag the backend dispatches on; always `"Cluster"` here.
    pub instrument_type: String,
    /// Module-slot name (`<cluster>_module<N>`) to module description.
    #[serde(flatten)]
    pub modules: BTreeMap<String, ModuleDescription>,
}

/// 10 MHz reference source of a cluster.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RefSource {
    /// Cluster-internal reference oscillator.
    Internal,
    /// External reference input.
    External,
}

/// One signal-generation/acquisition module in a cluster slot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModuleDescription {
    /// Module type tag (e.g., `"QCM_RF"`, `"QRM_RF"`).
    pub instrument_type: String,
    /// The module's complex (I/Q) output path.
    pub complex_output_0: ComplexOutput,
}

/// An I/Q output path: LO frequency, mixer corrections, port/clock bindings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComplexOutput {
    /// Local-oscillator frequency in Hz.
    pub lo_freq: f64,
    /// DC offset applied to the I arm of the mixer.
    #[serde(rename = "dc_mixer_offset_I")]
    pub dc_mixer_offset_i: f64,
    /// DC offset applied to the Q arm of the mixer.
    #[serde(rename = "dc_mixer_offset_Q")]
    pub dc_mixer_offset_q: f64,
    /// Ordered port/clock bindings compiled onto this output.
    pub portclock_configs: Vec<PortClockConfig>,
}

/// Binding of a physical signal path to a logical clock reference.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PortClockConfig {
    /// Port identifier (e.g., `"q00:mw"`).
    pub port: String,
    /// Clock identifier (e.g., `"q00.01"`).
    pub clock: String,
    /// Mixer sideband amplitude ratio correction.
    pub mixer_amp_ratio: f64,
    /// Mixer quadrature phase error in degrees.
    pub mixer_phase_error_deg: f64,
}

impl PortClockConfig {
    /// An uncorrected binding (amp ratio 1, zero phase error).
    pub fn new(port: impl Into<String>, clock: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            clock: clock.into(),
            mixer_amp_ratio: 1.0,
            mixer_phase_error_deg: 0.0,
        }
    }
}

impl ComplexOutput {
    /// An output at `lo_freq` Hz with zero mixer offsets and no bindings.
    pub fn new(lo_freq: f64) -> Self {
        Self {
            lo_freq,
            dc_mixer_offset_i: 0.0,
            dc_mixer_offset_q: 0.0,
            portclock_configs: Vec::new(),
        }
    }

    /// Append a port/clock binding.
    pub fn with_portclock(mut self, portclock: PortClockConfig) -> Self {
        self.portclock_configs.push(portclock);
        self
    }
}

impl ClusterDescription {
    /// An empty cluster on the given reference source.
    pub fn new(ref_source: RefSource) -> Self {
        Self {
            ref_source,
            instrument_type: "Cluster".to_string(),
            modules: BTreeMap::new(),
        }
    }

    /// Insert a module under its slot name.
    pub fn with_module(mut self, slot: impl Into<String>, module: ModuleDescription) -> Self {
        self.modules.insert(slot.into(), module);
        self
    }
}

impl HardwareConfig {
    /// An empty description targeting `backend`.
    pub fn new(backend: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            clusters: BTreeMap::new(),
        }
    }

    /// Insert a cluster under its name.
    pub fn with_cluster(mut self, name: impl Into<String>, cluster: ClusterDescription) -> Self {
        self.clusters.insert(name.into(), cluster);
        self
    }

    /// The built-in description of the reference single-transmon setup:
    /// one cluster, a QCM_RF drive module in slot 2 and a QRM_RF readout
    /// module in slot 10, one qubit.
    pub fn single_transmon_default() -> Self {
        HardwareConfig::new(QBLOX_HARDWARE_COMPILE).with_cluster(
            "clusterA",
            ClusterDescription::new(RefSource::Internal)
                .with_module(
                    "clusterA_module2",
                    ModuleDescription {
                        instrument_type: "QCM_RF".to_string(),
                        complex_output_0: ComplexOutput::new(5_312_327_240.0)
                            .with_portclock(PortClockConfig::new("q00:mw", "q00.01")),
                    },
                )
                .with_module(
                    "clusterA_module10",
                    ModuleDescription {
                        instrument_type: "QRM_RF".to_string(),
                        complex_output_0: ComplexOutput::new(7_197_494_954.0)
                            .with_portclock(PortClockConfig::new("q00:res", "q00.ro")),
                    },
                ),
        )
    }

    /// Load a description from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> StationResult<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let config: HardwareConfig = serde_json::from_str(&json)?;
        Ok(config)
    }

    /// Check the backend invariants.
    ///
    /// - every module carries at least one port/clock binding;
    /// - a (port, clock) pair is claimed by at most one module per cluster;
    /// - LO frequencies are positive and finite;
    /// - mixer amplitude ratios lie in (0, 2].
    pub fn validate(&self) -> StationResult<()> {
        if self.backend.is_empty() {
            return Err(StationError::HardwareConfig(
                "backend must not be empty".to_string(),
            ));
        }

        for (cluster_name, cluster) in &self.clusters {
            let mut claimed: HashSet<(&str, &str)> = HashSet::new();

            for (slot, module) in &cluster.modules {
                let output = &module.complex_output_0;

                if output.portclock_configs.is_empty() {
                    return Err(StationError::HardwareConfig(format!(
                        "{slot}: portclock_configs must not be empty"
                    )));
                }
                if !(output.lo_freq.is_finite() && output.lo_freq > 0.0) {
                    return Err(StationError::HardwareConfig(format!(
                        "{slot}: lo_freq must be positive and finite"
                    )));
                }

                for portclock in &output.portclock_configs {
                    let ratio = portclock.mixer_amp_ratio;
                    if !(ratio.is_finite() && ratio > 0.0 && ratio <= 2.0) {
                        return Err(StationError::HardwareConfig(format!(
                            "{slot}: mixer_amp_ratio {ratio} out of range (0, 2]"
                        )));
                    }
                    let pair = (portclock.port.as_str(), portclock.clock.as_str());
                    if !claimed.insert(pair) {
                        return Err(StationError::HardwareConfig(format!(
                            "{cluster_name}: port/clock {}/{} claimed by more than one module",
                            portclock.port, portclock.clock
                        )));
                    }
                }
            }
        }

        Ok(())
    }

    /// All port/clock pairs across every cluster, in deterministic order.
    pub fn portclocks(&self) -> Vec<(&str, &str)> {
        self.clusters
            .values()
            .flat_map(|c| c.modules.values())
            .flat_map(|m| m.complex_output_0.portclock_configs.iter())
            .map(|pc| (pc.port.as_str(), pc.clock.as_str()))
            .collect()
    }
}
