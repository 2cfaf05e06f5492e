//! Mock Hardware Implementations
//!
//! Provides a simulated cluster controller for testing and dry runs without
//! physical hardware. The mock implements the same capability traits as the
//! TCP driver, so bootstrap code cannot tell them apart behind
//! `Arc<dyn ClusterInterface>`.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::hardware::capabilities::{
    ClusterInterface, Connectable, Resettable, StatusSource, SystemState,
};

#[derive(Debug)]
struct MockState {
    connected: bool,
    reset_count: u32,
    fail_connect: bool,
    system_state: SystemState,
}

/// Mock cluster controller with scripted status and failure injection.
///
/// # Example
///
/// ```rust,ignore
/// let cluster = MockCluster::new("clusterA");
/// cluster.connect().await?;
/// cluster.reset().await?;
/// assert_eq!(cluster.reset_count().await, 1);
/// ```
pub struct MockCluster {
    name: String,
    state: Arc<RwLock<MockState>>,
}

impl MockCluster {
    /// Create a mock cluster reporting a nominal system state.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(RwLock::new(MockState {
                connected: false,
                reset_count: 0,
                fail_connect: false,
                system_state: SystemState::okay(),
            })),
        }
    }

    /// Create a mock cluster that reports the given system state.
    pub fn with_system_state(name: impl Into<String>, system_state: SystemState) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(RwLock::new(MockState {
                connected: false,
                reset_count: 0,
                fail_connect: false,
                system_state,
            })),
        }
    }

    /// Make subsequent `connect` calls fail (simulates an unreachable
    /// cluster).
    pub async fn fail_connections(&self, fail: bool) {
        self.state.write().await.fail_connect = fail;
    }

    /// Number of reset commands received.
    pub async fn reset_count(&self) -> u32 {
        self.state.read().await.reset_count
    }
}

#[async_trait]
impl Connectable for MockCluster {
    async fn connect(&self) -> Result<()> {
        let mut state = self.state.write().await;
        if state.fail_connect {
            bail!("mock cluster '{}' is unreachable", self.name);
        }
        if state.connected {
            bail!("cluster '{}' is already connected", self.name);
        }
        state.connected = true;
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.state.write().await.connected = false;
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        self.state.read().await.connected
    }
}

#[async_trait]
impl Resettable for MockCluster {
    async fn reset(&self) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.connected {
            bail!("cluster '{}' is not connected", self.name);
        }
        state.reset_count += 1;
        Ok(())
    }
}

#[async_trait]
impl StatusSource for MockCluster {
    async fn identity(&self) -> Result<String> {
        let state = self.state.read().await;
        if !state.connected {
            bail!("cluster '{}' is not connected", self.name);
        }
        Ok(format!("Mock,Cluster,{},0.0.0", self.name))
    }

    async fn system_state(&self) -> Result<SystemState> {
        let state = self.state.read().await;
        if !state.connected {
            bail!("cluster '{}' is not connected", self.name);
        }
        Ok(state.system_state.clone())
    }
}

impl ClusterInterface for MockCluster {
    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::capabilities::SystemStatus;

    #[tokio::test]
    async fn lifecycle_mirrors_the_real_driver() {
        let cluster = MockCluster::new("clusterA");
        assert!(!cluster.is_connected().await);
        assert!(cluster.reset().await.is_err());

        cluster.connect().await.unwrap();
        assert!(cluster.connect().await.is_err());

        cluster.reset().await.unwrap();
        cluster.reset().await.unwrap();
        assert_eq!(cluster.reset_count().await, 2);

        assert!(cluster.identity().await.unwrap().starts_with("Mock,Cluster"));
        assert_eq!(cluster.system_state().await.unwrap(), SystemState::okay());

        cluster.disconnect().await.unwrap();
        assert!(!cluster.is_connected().await);
    }

    #[tokio::test]
    async fn connection_failure_injection() {
        let cluster = MockCluster::new("clusterA");
        cluster.fail_connections(true).await;
        assert!(cluster.connect().await.is_err());
        cluster.fail_connections(false).await;
        assert!(cluster.connect().await.is_ok());
    }

    #[tokio::test]
    async fn scripted_system_state() {
        let degraded: SystemState = "WARNING;CARRIER_PLL_UNLOCKED".parse().unwrap();
        let cluster = MockCluster::with_system_state("clusterA", degraded.clone());
        cluster.connect().await.unwrap();
        let state = cluster.system_state().await.unwrap();
        assert_eq!(state.status, SystemStatus::Warning);
        assert_eq!(state, degraded);
    }
}
