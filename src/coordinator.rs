//! Hardware-abstraction layer.
//!
//! The `InstrumentCoordinator` presents a uniform control surface over
//! heterogeneous physical instruments: compiled experiment schedules are
//! later dispatched through it without the experiment flow knowing which
//! vendor hardware sits underneath. Each physical instrument is wrapped in a
//! `CoordinatorComponent` adapter and registered with the coordinator by
//! name.
//!
//! The bootstrap only composes this layer; schedule dispatch itself belongs
//! to the external compilation backend.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::hardware::capabilities::{ClusterInterface, Connectable, StatusSource, SystemStatus};

/// Adapter presenting one physical instrument to the coordinator.
#[async_trait]
pub trait CoordinatorComponent: Send + Sync {
    /// Component name (by convention `ic_<instrument name>`).
    fn name(&self) -> &str;

    /// Verify the instrument is ready to accept a compiled schedule.
    async fn prepare(&self) -> Result<()>;

    /// Start executing the prepared schedule.
    async fn start(&self) -> Result<()>;

    /// Stop execution and return the instrument to an idle state.
    async fn stop(&self) -> Result<()>;
}

/// Coordinator component wrapping a cluster controller.
pub struct ClusterComponent {
    name: String,
    cluster: Arc<dyn ClusterInterface>,
}

impl ClusterComponent {
    /// Wrap `cluster`; the component is named `ic_<cluster name>`.
    pub fn new(cluster: Arc<dyn ClusterInterface>) -> Self {
        Self {
            name: format!("ic_{}", cluster.name()),
            cluster,
        }
    }

    /// The wrapped cluster driver.
    pub fn cluster(&self) -> &Arc<dyn ClusterInterface> {
        &self.cluster
    }
}

#[async_trait]
impl CoordinatorComponent for ClusterComponent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn prepare(&self) -> Result<()> {
        if !self.cluster.is_connected().await {
            bail!("cluster '{}' is not connected", self.cluster.name());
        }
        let state = self.cluster.system_state().await?;
        match state.status {
            SystemStatus::Okay => Ok(()),
            SystemStatus::Warning => {
                warn!(component = %self.name, %state, "preparing despite degraded state");
                Ok(())
            }
            SystemStatus::Error => {
                bail!("cluster '{}' reports {state}", self.cluster.name())
            }
        }
    }

    async fn start(&self) -> Result<()> {
        // Sequencer arming is driven by the compiled schedule, not the
        // bootstrap; nothing to do until a schedule is dispatched.
        debug!(component = %self.name, "start");
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        debug!(component = %self.name, "stop");
        Ok(())
    }
}

/// Uniform control interface over all registered components.
pub struct InstrumentCoordinator {
    name: String,
    components: Vec<Arc<dyn CoordinatorComponent>>,
}

impl InstrumentCoordinator {
    /// An empty coordinator named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            components: Vec::new(),
        }
    }

    /// The coordinator's registered name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a component. Component names must be unique.
    pub fn add_component(&mut self, component: Arc<dyn CoordinatorComponent>) -> Result<()> {
        if self.get_component(component.name()).is_some() {
            bail!("component '{}' is already registered", component.name());
        }
        info!(coordinator = %self.name, component = %component.name(), "component added");
        self.components.push(component);
        Ok(())
    }

    /// Look up a component by name.
    pub fn get_component(&self, name: &str) -> Option<&Arc<dyn CoordinatorComponent>> {
        self.components.iter().find(|c| c.name() == name)
    }

    /// Names of all registered components, in registration order.
    pub fn component_names(&self) -> Vec<&str> {
        self.components.iter().map(|c| c.name()).collect()
    }

    /// Prepare every component, failing on the first that is not ready.
    pub async fn prepare(&self) -> Result<()> {
        for component in &self.components {
            component.prepare().await?;
        }
        Ok(())
    }

    /// Start every component.
    pub async fn start(&self) -> Result<()> {
        for component in &self.components {
            component.start().await?;
        }
        Ok(())
    }

    /// Stop every component. All components are stopped even if one fails;
    /// the first error is returned afterwards.
    pub async fn stop(&self) -> Result<()> {
        let mut first_error = None;
        for component in &self.components {
            if let Err(e) = component.stop().await {
                warn!(coordinator = %self.name, component = %component.name(), error = %e, "stop failed");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            None => Ok(()),
            Some(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::capabilities::{Connectable, SystemState};
    use crate::hardware::mock::MockCluster;

    #[tokio::test]
    async fn component_takes_cluster_name() {
        let cluster: Arc<dyn ClusterInterface> = Arc::new(MockCluster::new("clusterA"));
        let component = ClusterComponent::new(Arc::clone(&cluster));
        assert_eq!(component.name(), "ic_clusterA");
    }

    #[tokio::test]
    async fn duplicate_component_rejected() {
        let cluster: Arc<dyn ClusterInterface> = Arc::new(MockCluster::new("clusterA"));
        let mut coordinator = InstrumentCoordinator::new("instrument_coordinator");
        coordinator
            .add_component(Arc::new(ClusterComponent::new(Arc::clone(&cluster))))
            .unwrap();
        let err = coordinator
            .add_component(Arc::new(ClusterComponent::new(cluster)))
            .unwrap_err();
        assert!(err.to_string().contains("already registered"));
    }

    #[tokio::test]
    async fn prepare_requires_connection_and_health() {
        let cluster = Arc::new(MockCluster::new("clusterA"));
        let component = ClusterComponent::new(cluster.clone() as Arc<dyn ClusterInterface>);
        assert!(component.prepare().await.is_err());

        cluster.connect().await.unwrap();
        assert!(component.prepare().await.is_ok());
    }

    #[tokio::test]
    async fn prepare_fails_on_error_state() {
        let degraded: SystemState = "ERROR;MODULE_FAULT".parse().unwrap();
        let cluster = Arc::new(MockCluster::with_system_state("clusterA", degraded));
        cluster.connect().await.unwrap();
        let component = ClusterComponent::new(cluster as Arc<dyn ClusterInterface>);
        let err = component.prepare().await.unwrap_err();
        assert!(err.to_string().contains("MODULE_FAULT"));
    }

    #[tokio::test]
    async fn coordinator_fans_out() {
        let cluster = Arc::new(MockCluster::new("clusterA"));
        cluster.connect().await.unwrap();
        let mut coordinator = InstrumentCoordinator::new("instrument_coordinator");
        coordinator
            .add_component(Arc::new(ClusterComponent::new(
                cluster as Arc<dyn ClusterInterface>,
            )))
            .unwrap();

        assert_eq!(coordinator.component_names(), vec!["ic_clusterA"]);
        coordinator.prepare().await.unwrap();
        coordinator.start().await.unwrap();
        coordinator.stop().await.unwrap();
    }
}
