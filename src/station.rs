//! Session bringup and the station context.
//!
//! `Station::bringup` runs the four-stage initialization procedure and
//! returns a context object owning every session singleton:
//!
//! 1. **Environment setup**: register the experiment data directory.
//! 2. **Static configuration assembly**: build and validate the hardware
//!    description.
//! 3. **Session construction**: connect and reset the cluster, wire the
//!    hardware-abstraction layer, the measurement controls, and the
//!    monitors, registering every object by name.
//! 4. **State hydration**: register device elements and, when enabled,
//!    load persisted calibration settings onto them (best-effort).
//!
//! Startup failures in stages 1-3 abort the bringup; only per-element
//! hydration in stage 4 is best-effort. The returned `Station` is passed by
//! reference to whatever runs the session and torn down once at the end.

use anyhow::{Context, Result};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::config::StationConfig;
use crate::coordinator::{ClusterComponent, CoordinatorComponent, InstrumentCoordinator};
use crate::data::datadir::{default_datadir, set_datadir};
use crate::data::tuid::Tuid;
use crate::device::{HydrationReport, QuantumDevice, TransmonElement};
use crate::hardware::capabilities::{ClusterInterface, Connectable, Resettable, StatusSource};
use crate::hardware::cluster::Cluster;
use crate::hardware::config::HardwareConfig;
use crate::measurement::{InstrumentMonitor, MeasurementControl, PlotMonitor};
use crate::registry::{InstrumentKind, InstrumentRegistry};

/// A running control-station session.
///
/// Owns every session singleton; collaborators reference each other by the
/// names recorded in the [`InstrumentRegistry`].
pub struct Station {
    config: StationConfig,
    registry: InstrumentRegistry,
    datadir: PathBuf,
    cluster: Arc<dyn ClusterInterface>,
    coordinator: InstrumentCoordinator,
    meas_ctrl: MeasurementControl,
    nested_meas_ctrl: MeasurementControl,
    plotmon: PlotMonitor,
    plotmon_nested: PlotMonitor,
    insmon: InstrumentMonitor,
    quantum_device: QuantumDevice,
    hydration: Option<HydrationReport>,
}

impl Station {
    /// Run the bringup against the physical cluster named in `config`.
    pub async fn bringup(config: StationConfig) -> Result<Station> {
        let ip: IpAddr = config
            .cluster
            .address
            .parse()
            .with_context(|| format!("invalid cluster address '{}'", config.cluster.address))?;
        let addr = SocketAddr::new(ip, config.cluster.port);
        let cluster = Arc::new(
            Cluster::new(&config.cluster.name, addr)
                .with_connect_timeout(config.cluster.connect_timeout),
        );
        Self::bringup_with_cluster(config, cluster).await
    }

    /// Run the bringup against an already constructed cluster driver.
    ///
    /// Used by dry runs and tests to substitute a mock cluster; everything
    /// else is identical to [`Station::bringup`].
    pub async fn bringup_with_cluster(
        config: StationConfig,
        cluster: Arc<dyn ClusterInterface>,
    ) -> Result<Station> {
        let started = Instant::now();
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("invalid station configuration: {e}"))?;

        // 1. Environment setup
        let base = config
            .data
            .root
            .clone()
            .unwrap_or_else(default_datadir);
        let datadir = set_datadir(&base)?;
        info!(datadir = %datadir.display(), "data directory set");

        // 2. Static configuration assembly
        let hardware_config = match &config.hardware.config_file {
            Some(path) => HardwareConfig::from_file(path)?,
            None => HardwareConfig::single_transmon_default(),
        };
        hardware_config.validate()?;
        info!(
            backend = %hardware_config.backend,
            clusters = hardware_config.clusters.len(),
            elapsed = ?started.elapsed(),
            "hardware description assembled"
        );

        // 3. Session construction
        let registry = InstrumentRegistry::new();

        registry.register(cluster.name(), InstrumentKind::PhysicalInstrument)?;
        cluster.connect().await?;
        let identity = cluster.identity().await?;
        cluster.reset().await?;
        let state = cluster.system_state().await?;
        info!(cluster = %cluster.name(), %identity, %state, "cluster ready");

        let mut coordinator = InstrumentCoordinator::new("instrument_coordinator");
        registry.register(coordinator.name(), InstrumentKind::Coordinator)?;
        let component = Arc::new(ClusterComponent::new(Arc::clone(&cluster)));
        registry.register(component.name(), InstrumentKind::CoordinatorComponent)?;
        coordinator.add_component(component)?;

        let mut meas_ctrl = MeasurementControl::new("meas_ctrl");
        let mut nested_meas_ctrl = MeasurementControl::new("nested_meas_ctrl");
        registry.register(meas_ctrl.name(), InstrumentKind::MeasurementControl)?;
        registry.register(nested_meas_ctrl.name(), InstrumentKind::MeasurementControl)?;

        // The main window shows the primary control's points, the secondary
        // window the nested control's.
        let mut plotmon = PlotMonitor::new("plotmon");
        registry.register(plotmon.name(), InstrumentKind::PlotMonitor)?;
        meas_ctrl.set_instr_plotmon(plotmon.name());
        plotmon.attach(meas_ctrl.subscribe().await);

        let mut plotmon_nested = PlotMonitor::new("plotmon_nested");
        registry.register(plotmon_nested.name(), InstrumentKind::PlotMonitor)?;
        nested_meas_ctrl.set_instr_plotmon(plotmon_nested.name());
        plotmon_nested.attach(nested_meas_ctrl.subscribe().await);

        let insmon = InstrumentMonitor::new("insmon");
        registry.register(insmon.name(), InstrumentKind::InstrumentMonitor)?;

        info!(elapsed = ?started.elapsed(), "finished loading instruments");

        // 4. Device configuration and state hydration
        let mut quantum_device = QuantumDevice::new("quantum_device");
        registry.register(quantum_device.name(), InstrumentKind::QuantumDevice)?;

        registry.expect_registered(meas_ctrl.name())?;
        quantum_device.set_instr_measurement_control(meas_ctrl.name());
        registry.expect_registered(coordinator.name())?;
        quantum_device.set_instr_instrument_coordinator(coordinator.name());

        quantum_device.set_hardware_config(hardware_config)?;

        for definition in config.enabled_elements() {
            registry.register(&definition.name, InstrumentKind::DeviceElement)?;
            quantum_device.add_element(TransmonElement::new(&definition.name))?;
        }

        let hydration = if config.hydration.enabled {
            let pinned = match &config.hydration.tuid {
                Some(raw) => Some(Tuid::parse(raw)?),
                None => None,
            };
            let report = quantum_device.hydrate(pinned.as_ref());
            info!(%report, "settings hydration finished");
            Some(report)
        } else {
            None
        };

        info!(elapsed = ?started.elapsed(), "finished loading settings");

        Ok(Station {
            config,
            registry,
            datadir,
            cluster,
            coordinator,
            meas_ctrl,
            nested_meas_ctrl,
            plotmon,
            plotmon_nested,
            insmon,
            quantum_device,
            hydration,
        })
    }

    /// Stop coordinator components and disconnect the cluster.
    pub async fn shutdown(&self) -> Result<()> {
        self.coordinator.stop().await?;
        self.cluster.disconnect().await?;
        info!(station = %self.config.application.name, "session torn down");
        Ok(())
    }

    /// Human-readable overview of the running session.
    pub fn summary(&self) -> String {
        let mut out = format!(
            "station '{}'\ndata directory: {}\n\nregistered instruments:\n{}",
            self.config.application.name,
            self.datadir.display(),
            self.insmon.render(&self.registry),
        );
        match &self.hydration {
            Some(report) => out.push_str(&format!("\nhydration: {report}\n")),
            None => out.push_str("\nhydration: disabled\n"),
        }
        out
    }

    /// The configuration the session was brought up with.
    pub fn config(&self) -> &StationConfig {
        &self.config
    }

    /// The session instrument registry.
    pub fn registry(&self) -> &InstrumentRegistry {
        &self.registry
    }

    /// The resolved experiment data directory.
    pub fn datadir(&self) -> &PathBuf {
        &self.datadir
    }

    /// The cluster driver.
    pub fn cluster(&self) -> &Arc<dyn ClusterInterface> {
        &self.cluster
    }

    /// The hardware-abstraction coordinator.
    pub fn coordinator(&self) -> &InstrumentCoordinator {
        &self.coordinator
    }

    /// The primary measurement control.
    pub fn meas_ctrl(&self) -> &MeasurementControl {
        &self.meas_ctrl
    }

    /// The nested measurement control.
    pub fn nested_meas_ctrl(&self) -> &MeasurementControl {
        &self.nested_meas_ctrl
    }

    /// The primary live-plot monitor.
    pub fn plotmon(&self) -> &PlotMonitor {
        &self.plotmon
    }

    /// The nested live-plot monitor.
    pub fn plotmon_nested(&self) -> &PlotMonitor {
        &self.plotmon_nested
    }

    /// The device-configuration registry.
    pub fn quantum_device(&self) -> &QuantumDevice {
        &self.quantum_device
    }

    /// The hydration report, when hydration ran.
    pub fn hydration_report(&self) -> Option<&HydrationReport> {
        self.hydration.as_ref()
    }
}
