//! Live monitoring utilities.
//!
//! `PlotMonitor` is the headless counterpart of a live plotting window: it
//! consumes the datapoint feed of a measurement control and retains a
//! bounded window of recent points for rendering. `InstrumentMonitor` gives
//! an overview of every instrument registered in the session.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::measurement::DataPoint;
use crate::registry::InstrumentRegistry;

const DEFAULT_WINDOW: usize = 1024;

/// Bounded window over the most recent datapoints of one measurement
/// control.
pub struct PlotMonitor {
    name: String,
    window: Arc<Mutex<VecDeque<DataPoint>>>,
    capacity: usize,
    pump: Option<JoinHandle<()>>,
}

impl PlotMonitor {
    /// A monitor registered under `name` retaining the default window of
    /// 1024 points.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            window: Arc::new(Mutex::new(VecDeque::new())),
            capacity: DEFAULT_WINDOW,
            pump: None,
        }
    }

    /// Set the retained window size.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// The monitor's registered name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attach the monitor to a datapoint stream. Spawns a pump task that
    /// runs until the sending side is dropped.
    pub fn attach(&mut self, mut rx: mpsc::Receiver<DataPoint>) {
        let window = Arc::clone(&self.window);
        let capacity = self.capacity;
        self.pump = Some(tokio::spawn(async move {
            while let Some(point) = rx.recv().await {
                let mut window = lock_window(&window);
                if window.len() == capacity {
                    window.pop_front();
                }
                window.push_back(point);
            }
        }));
    }

    /// Number of points currently retained.
    pub fn len(&self) -> usize {
        lock_window(&self.window).len()
    }

    /// Whether no points have been retained yet.
    pub fn is_empty(&self) -> bool {
        lock_window(&self.window).is_empty()
    }

    /// Snapshot of the retained points, oldest first.
    pub fn points(&self) -> Vec<DataPoint> {
        lock_window(&self.window).iter().cloned().collect()
    }
}

impl Drop for PlotMonitor {
    fn drop(&mut self) {
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
    }
}

fn lock_window(
    window: &Mutex<VecDeque<DataPoint>>,
) -> std::sync::MutexGuard<'_, VecDeque<DataPoint>> {
    match window.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Overview of all instruments registered in the session.
pub struct InstrumentMonitor {
    name: String,
}

impl InstrumentMonitor {
    /// A monitor registered under `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// The monitor's registered name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Render a one-line-per-instrument overview of the registry.
    pub fn render(&self, registry: &InstrumentRegistry) -> String {
        let mut out = String::new();
        for (name, kind) in registry.entries() {
            out.push_str(&format!("{name:<28} {kind:?}\n"));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurement::LiveFeed;
    use crate::registry::InstrumentKind;

    #[tokio::test]
    async fn monitor_retains_streamed_points() {
        let feed = LiveFeed::new(8);
        let mut monitor = PlotMonitor::new("plotmon");
        monitor.attach(feed.subscribe().await);

        for i in 0..3 {
            feed.broadcast(DataPoint::now("q00:res", f64::from(i), "V"))
                .await
                .unwrap();
        }
        // Let the pump task drain the channel
        tokio::task::yield_now().await;
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        assert_eq!(monitor.len(), 3);
        assert_eq!(monitor.points()[0].value, 0.0);
    }

    #[tokio::test]
    async fn window_is_bounded() {
        let feed = LiveFeed::new(8);
        let mut monitor = PlotMonitor::new("plotmon").with_capacity(2);
        monitor.attach(feed.subscribe().await);

        for i in 0..5 {
            feed.broadcast(DataPoint::now("q00:res", f64::from(i), "V"))
                .await
                .unwrap();
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        assert_eq!(monitor.len(), 2);
        assert_eq!(monitor.points()[0].value, 3.0);
        assert_eq!(monitor.points()[1].value, 4.0);
    }

    #[test]
    fn instrument_monitor_renders_registry() {
        let registry = InstrumentRegistry::new();
        registry
            .register("clusterA", InstrumentKind::PhysicalInstrument)
            .unwrap();
        registry
            .register("meas_ctrl", InstrumentKind::MeasurementControl)
            .unwrap();

        let insmon = InstrumentMonitor::new("insmon");
        let rendered = insmon.render(&registry);
        assert!(rendered.contains("clusterA"));
        assert!(rendered.contains("MeasurementControl"));
    }
}
