//! Measurement control.
//!
//! `MeasurementControl` manages acquisition loops and streams every recorded
//! datapoint into a fan-out feed consumed by live monitors. Two instances run
//! per session: the primary control, and a nested one for control loops that
//! run inside other control loops (e.g., a calibration sweep inside an
//! optimization). Each binds its plot monitor by name, following the
//! framework's register-by-name convention.

use anyhow::Result;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

pub mod monitor;

pub use monitor::{InstrumentMonitor, PlotMonitor};

/// One recorded value from an acquisition loop.
#[derive(Debug, Clone, PartialEq)]
pub struct DataPoint {
    /// Acquisition timestamp.
    pub timestamp: DateTime<Utc>,
    /// Logical channel (settable/gettable name).
    pub channel: String,
    /// Recorded value.
    pub value: f64,
    /// Physical unit of the value.
    pub unit: String,
}

impl DataPoint {
    /// A datapoint stamped with the current time.
    pub fn now(channel: impl Into<String>, value: f64, unit: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            channel: channel.into(),
            value,
            unit: unit.into(),
        }
    }
}

/// Fan-out distributor for multi-consumer datapoint streaming with
/// backpressure.
///
/// Each subscriber gets a dedicated mpsc channel, providing isolation and
/// true backpressure; a lagging monitor slows only its own channel. Sends go
/// to all subscribers in parallel, and subscribers whose receiving end was
/// dropped are pruned on the next broadcast.
pub struct LiveFeed<T: Clone> {
    subscribers: Mutex<Vec<mpsc::Sender<T>>>,
    capacity: usize,
}

impl<T: Clone> LiveFeed<T> {
    /// Creates a feed whose per-subscriber channels hold `capacity` items.
    pub fn new(capacity: usize) -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
            capacity,
        }
    }

    /// Subscribe to the feed, returning a new receiver.
    pub async fn subscribe(&self) -> mpsc::Receiver<T> {
        let (tx, rx) = mpsc::channel(self.capacity);
        self.subscribers.lock().await.push(tx);
        rx
    }

    /// Broadcast an item to all subscribers, pruning dead ones.
    pub async fn broadcast(&self, item: T) -> Result<()> {
        let mut subscribers = self.subscribers.lock().await;

        let sends: Vec<_> = subscribers
            .iter()
            .map(|sender| sender.send(item.clone()))
            .collect();
        let results = join_all(sends).await;

        let dead: Vec<usize> = results
            .iter()
            .enumerate()
            .filter_map(|(i, result)| result.is_err().then_some(i))
            .collect();
        for i in dead.iter().rev() {
            subscribers.swap_remove(*i);
        }

        Ok(())
    }

    /// Returns the number of active subscribers.
    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.lock().await.len()
    }
}

/// Manager for acquisition control loops.
///
/// During bringup only construction and monitor binding happen; acquisition
/// loops run later, driven interactively.
pub struct MeasurementControl {
    name: String,
    instr_plotmon: Option<String>,
    feed: LiveFeed<DataPoint>,
    points_recorded: std::sync::atomic::AtomicU64,
}

impl MeasurementControl {
    /// A measurement control registered under `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instr_plotmon: None,
            feed: LiveFeed::new(256),
            points_recorded: std::sync::atomic::AtomicU64::new(0),
        }
    }

    /// The control's registered name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bind the live-plotting monitor by name.
    pub fn set_instr_plotmon(&mut self, plotmon: impl Into<String>) {
        self.instr_plotmon = Some(plotmon.into());
    }

    /// Name of the bound live-plotting monitor, if any.
    pub fn instr_plotmon(&self) -> Option<&str> {
        self.instr_plotmon.as_deref()
    }

    /// Subscribe to the datapoint feed (monitors call this once).
    pub async fn subscribe(&self) -> mpsc::Receiver<DataPoint> {
        self.feed.subscribe().await
    }

    /// Record a datapoint and stream it to all subscribed monitors.
    pub async fn record(&self, point: DataPoint) -> Result<()> {
        debug!(control = %self.name, channel = %point.channel, value = point.value, "datapoint");
        self.points_recorded
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        self.feed.broadcast(point).await
    }

    /// Total datapoints recorded by this control.
    pub fn points_recorded(&self) -> u64 {
        self.points_recorded
            .load(std::sync::atomic::Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn feed_delivers_to_all_subscribers() {
        let feed = LiveFeed::new(8);
        let mut a = feed.subscribe().await;
        let mut b = feed.subscribe().await;

        feed.broadcast(1u32).await.unwrap();
        assert_eq!(a.recv().await, Some(1));
        assert_eq!(b.recv().await, Some(1));
    }

    #[tokio::test]
    async fn dead_subscribers_are_pruned() {
        let feed = LiveFeed::new(8);
        let a = feed.subscribe().await;
        let _b = feed.subscribe().await;
        assert_eq!(feed.subscriber_count().await, 2);

        drop(a);
        feed.broadcast(1u32).await.unwrap();
        assert_eq!(feed.subscriber_count().await, 1);
    }

    #[tokio::test]
    async fn control_records_and_counts() {
        let mut control = MeasurementControl::new("meas_ctrl");
        control.set_instr_plotmon("plotmon");
        assert_eq!(control.instr_plotmon(), Some("plotmon"));

        let mut rx = control.subscribe().await;
        control
            .record(DataPoint::now("q00:res", 0.0042, "V"))
            .await
            .unwrap();

        let point = rx.recv().await.unwrap();
        assert_eq!(point.channel, "q00:res");
        assert_eq!(control.points_recorded(), 1);
    }
}
