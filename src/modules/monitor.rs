//! Network interface throughput.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Local;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use super::TelemetryModule;
use crate::api::{InterfaceHistory, InterfaceStats, SharedMonitorApi};
use crate::config::MonitorSettings;
use crate::data::format::{clock_label, clock_labels_back};
use crate::data::{RollingBuffer, Sample, SeriesSnapshot};
use crate::error::{ApiError, ValidationError};
use crate::poll::PollScheduler;

/// Channel indices in the monitor buffer.
pub const SENT: usize = 0;
pub const RECV: usize = 1;

const LOOPBACK: &str = "lo";

/// Request context captured when a fetch starts.
///
/// The generation changes on every resync, so results issued under an
/// earlier selection of the same interface are still recognised as stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchKey {
    pub interface: String,
    pub generation: u64,
}

#[derive(Debug)]
enum MonitorEvent {
    Stats {
        key: FetchKey,
        result: Result<InterfaceStats, ApiError>,
    },
    ChartTick {
        key: FetchKey,
        label: String,
    },
}

pub struct MonitorModule {
    api: SharedMonitorApi,
    settings: MonitorSettings,
    interfaces: Vec<String>,
    key: FetchKey,
    key_tx: watch::Sender<FetchKey>,
    events_rx: mpsc::UnboundedReceiver<MonitorEvent>,
    buffer: RollingBuffer<2>,
    stats: InterfaceStats,
    last_error: Option<String>,
    visible_points: usize,
    scheduler: PollScheduler,
}

impl MonitorModule {
    pub fn new(api: SharedMonitorApi, settings: MonitorSettings) -> Self {
        let key = FetchKey {
            interface: settings.fallback_interface.clone(),
            generation: 0,
        };
        let (key_tx, _) = watch::channel(key.clone());
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let buffer = RollingBuffer::new(settings.capacity);
        let visible_points = buffer.capacity();

        let mut scheduler = PollScheduler::new("monitor");

        let (task_api, task_key, task_tx) = (api.clone(), key_tx.subscribe(), events_tx.clone());
        scheduler.register(
            "stats",
            Duration::from_millis(settings.stats_period_ms),
            move || {
                let api = task_api.clone();
                let key = task_key.borrow().clone();
                let tx = task_tx.clone();
                async move {
                    let result = api.interface_stats(&key.interface).await;
                    let failure = result.as_ref().err().cloned();
                    tx.send(MonitorEvent::Stats { key, result })
                        .map_err(|_| anyhow::anyhow!("monitor module is gone"))?;
                    if let Some(e) = failure {
                        return Err(e.into());
                    }
                    Ok::<(), anyhow::Error>(())
                }
            },
        );

        let (task_key, task_tx) = (key_tx.subscribe(), events_tx.clone());
        scheduler.register(
            "chart",
            Duration::from_millis(settings.chart_period_ms),
            move || {
                let key = task_key.borrow().clone();
                let tx = task_tx.clone();
                async move {
                    let label = clock_label(Local::now());
                    tx.send(MonitorEvent::ChartTick { key, label })
                        .map_err(|_| anyhow::anyhow!("monitor module is gone"))?;
                    Ok::<(), anyhow::Error>(())
                }
            },
        );

        Self {
            api,
            settings,
            interfaces: Vec::new(),
            key,
            key_tx,
            events_rx,
            buffer,
            stats: InterfaceStats::default(),
            last_error: None,
            visible_points,
            scheduler,
        }
    }

    pub fn active(&self) -> &str {
        &self.key.interface
    }

    pub fn fetch_key(&self) -> &FetchKey {
        &self.key
    }

    pub fn interfaces(&self) -> &[String] {
        &self.interfaces
    }

    pub fn stats(&self) -> &InterfaceStats {
        &self.stats
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn series(&self) -> SeriesSnapshot<2> {
        self.buffer.snapshot()
    }

    pub fn buffer(&self) -> &RollingBuffer<2> {
        &self.buffer
    }

    /// Chart points for one channel, limited to what fits on screen.
    pub fn points(&self, channel: usize) -> Vec<(f64, f64)> {
        self.buffer.points(channel, self.visible_points)
    }

    pub fn visible_points(&self) -> usize {
        self.visible_points
    }

    pub fn is_polling(&self) -> bool {
        self.scheduler.is_running()
    }

    /// Switch to another interface.
    ///
    /// Returns `Ok(false)` when `id` is already active.
    pub async fn change_interface(&mut self, id: &str) -> Result<bool, ValidationError> {
        if id == self.key.interface {
            return Ok(false);
        }
        if !self.interfaces.iter().any(|i| i == id) {
            return Err(ValidationError::UnknownInterface(id.to_string()));
        }
        self.resync(id.to_string()).await;
        Ok(true)
    }

    /// Cycle forward through the known interfaces.
    pub async fn next_interface(&mut self) -> Option<String> {
        let next = self.neighbour(1)?;
        self.change_interface(&next).await.ok()?;
        Some(next)
    }

    pub async fn prev_interface(&mut self) -> Option<String> {
        let prev = self.neighbour(self.interfaces.len().saturating_sub(1))?;
        self.change_interface(&prev).await.ok()?;
        Some(prev)
    }

    fn neighbour(&self, step: usize) -> Option<String> {
        if self.interfaces.is_empty() {
            return None;
        }
        let len = self.interfaces.len();
        let pos = self
            .interfaces
            .iter()
            .position(|i| *i == self.key.interface)
            .unwrap_or(len - 1);
        self.interfaces.get((pos + step) % len).cloned()
    }

    /// Stop, swap the active interface, reseed, refetch, restart.
    async fn resync(&mut self, id: String) {
        self.scheduler.stop();
        self.key = FetchKey {
            interface: id,
            generation: self.key.generation + 1,
        };
        self.key_tx.send_replace(self.key.clone());
        self.buffer.clear();
        self.stats = InterfaceStats::default();
        self.last_error = None;
        info!(interface = %self.key.interface, generation = self.key.generation, "monitor resync");

        let seeded = self.api.interface_history(&self.key.interface).await;
        let fetched = self.api.interface_stats(&self.key.interface).await;

        let seeded = match seeded {
            Ok(history) if !history.is_empty() => {
                self.seed_from(history);
                true
            }
            Ok(_) => false,
            Err(e) => {
                warn!(interface = %self.key.interface, "history fetch failed: {e}");
                false
            }
        };
        let fetched = match fetched {
            Ok(stats) => {
                self.stats = stats;
                true
            }
            Err(e) => {
                warn!(interface = %self.key.interface, "stats fetch failed: {e}");
                self.last_error = Some(e.to_string());
                false
            }
        };
        if !(seeded && fetched) {
            self.seed_zero();
        }

        self.scheduler.start();
    }

    fn seed_from(&mut self, history: InterfaceHistory) {
        let samples = history
            .timestamp
            .into_iter()
            .zip(history.sent)
            .zip(history.recv)
            .map(|((label, sent), recv)| Sample::new(label, [sent, recv]));
        self.buffer.seed(samples);
    }

    fn seed_zero(&mut self) {
        let labels = clock_labels_back(
            Local::now(),
            self.buffer.capacity(),
            Duration::from_millis(self.settings.chart_period_ms),
        );
        self.buffer.seed(labels.into_iter().map(Sample::zero));
    }

    fn is_current(&self, key: &FetchKey) -> bool {
        *key == self.key
    }
}

/// First non-loopback interface, else the first one, else the fallback.
fn pick_default(interfaces: &[String], fallback: &str) -> String {
    interfaces
        .iter()
        .find(|i| i.as_str() != LOOPBACK)
        .or_else(|| interfaces.first())
        .cloned()
        .unwrap_or_else(|| fallback.to_string())
}

#[async_trait]
impl TelemetryModule for MonitorModule {
    fn name(&self) -> &'static str {
        "monitor"
    }

    async fn init(&mut self) {
        match self.api.interfaces().await {
            Ok(list) => self.interfaces = list,
            Err(e) => warn!("interface list fetch failed: {e}"),
        }
        let initial = pick_default(&self.interfaces, &self.settings.fallback_interface);
        self.resync(initial).await;
    }

    fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            match event {
                MonitorEvent::Stats { key, result } => {
                    if !self.is_current(&key) {
                        debug!(interface = %key.interface, generation = key.generation, "dropping stale stats");
                        continue;
                    }
                    match result {
                        Ok(stats) => {
                            self.stats = stats;
                            self.last_error = None;
                        }
                        // previous stats stay on screen
                        Err(e) => self.last_error = Some(e.to_string()),
                    }
                    applied += 1;
                }
                MonitorEvent::ChartTick { key, label } => {
                    if !self.is_current(&key) {
                        continue;
                    }
                    self.buffer
                        .push(label, [self.stats.sent_rate, self.stats.recv_rate]);
                    applied += 1;
                }
            }
        }
        applied
    }

    fn resize(&mut self, width: u16, _height: u16) {
        // y-axis labels and borders take roughly ten columns
        let usable = (width as usize).saturating_sub(10);
        self.visible_points = usable.clamp(2, self.buffer.capacity().max(2));
    }

    fn destroy(&mut self) {
        self.scheduler.stop();
        self.key.generation += 1;
        self.key_tx.send_replace(self.key.clone());
        while self.events_rx.try_recv().is_ok() {}
        self.buffer.clear();
        info!("monitor destroyed");
    }
}
