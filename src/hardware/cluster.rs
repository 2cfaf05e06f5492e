//! TCP driver for the cluster controller.
//!
//! The cluster management module speaks a newline-terminated, SCPI-style text
//! protocol over a raw TCP socket. This driver owns that exchange: open the
//! socket (with a timeout), send `*IDN?` / `*RST` / `SYSTem:STATe?`, read the
//! single-line replies. The protocol itself is vendor-owned; nothing beyond
//! the three bootstrap commands is modeled.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufStream};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::hardware::capabilities::{
    ClusterInterface, Connectable, Resettable, StatusSource, SystemState,
};

/// Driver for a cluster controller reached over TCP.
pub struct Cluster {
    name: String,
    addr: SocketAddr,
    connect_timeout: Duration,
    stream: Mutex<Option<BufStream<TcpStream>>>,
}

impl Cluster {
    /// Create a driver for the cluster `name` at `addr`.
    ///
    /// Default connect timeout: 5 seconds.
    pub fn new(name: impl Into<String>, addr: SocketAddr) -> Self {
        Self {
            name: name.into(),
            addr,
            connect_timeout: Duration::from_secs(5),
            stream: Mutex::new(None),
        }
    }

    /// Set the connection timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// The network address this driver connects to.
    pub fn address(&self) -> SocketAddr {
        self.addr
    }

    /// Send a command that produces no reply.
    async fn command(&self, command: &str) -> Result<()> {
        let mut guard = self.stream.lock().await;
        let stream = guard
            .as_mut()
            .with_context(|| format!("cluster '{}' is not connected", self.name))?;
        debug!(cluster = %self.name, command, "sending command");
        stream.write_all(command.as_bytes()).await?;
        stream.write_all(b"\n").await?;
        stream.flush().await?;
        Ok(())
    }

    /// Send a query and read its single-line reply.
    async fn query(&self, command: &str) -> Result<String> {
        let mut guard = self.stream.lock().await;
        let stream = guard
            .as_mut()
            .with_context(|| format!("cluster '{}' is not connected", self.name))?;
        debug!(cluster = %self.name, command, "sending query");
        stream.write_all(command.as_bytes()).await?;
        stream.write_all(b"\n").await?;
        stream.flush().await?;

        let mut reply = String::new();
        let read = stream.read_line(&mut reply).await?;
        if read == 0 {
            bail!("cluster '{}' closed the connection", self.name);
        }
        Ok(reply.trim_end().to_string())
    }
}

#[async_trait]
impl Connectable for Cluster {
    async fn connect(&self) -> Result<()> {
        let mut guard = self.stream.lock().await;
        if guard.is_some() {
            bail!("cluster '{}' is already connected", self.name);
        }
        info!(cluster = %self.name, addr = %self.addr, "connecting");
        let stream = tokio::time::timeout(self.connect_timeout, TcpStream::connect(self.addr))
            .await
            .with_context(|| {
                format!(
                    "timed out connecting to cluster '{}' at {}",
                    self.name, self.addr
                )
            })?
            .with_context(|| {
                format!("failed to connect to cluster '{}' at {}", self.name, self.addr)
            })?;
        stream.set_nodelay(true)?;
        *guard = Some(BufStream::new(stream));
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        let mut guard = self.stream.lock().await;
        if let Some(mut stream) = guard.take() {
            // Flush anything buffered; socket close errors are not actionable
            let _ = stream.flush().await;
            info!(cluster = %self.name, "disconnected");
        }
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        self.stream.lock().await.is_some()
    }
}

#[async_trait]
impl Resettable for Cluster {
    async fn reset(&self) -> Result<()> {
        info!(cluster = %self.name, "reset");
        self.command("*RST").await
    }
}

#[async_trait]
impl StatusSource for Cluster {
    async fn identity(&self) -> Result<String> {
        self.query("*IDN?").await
    }

    async fn system_state(&self) -> Result<SystemState> {
        let reply = self.query("SYSTem:STATe?").await?;
        reply
            .parse()
            .with_context(|| format!("unparsable system state reply '{reply}'"))
    }
}

impl ClusterInterface for Cluster {
    fn name(&self) -> &str {
        &self.name
    }
}
