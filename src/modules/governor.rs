//! Governor service detail: status, speed chart, monthly usage, log tail.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{Datelike, Local};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::TelemetryModule;
use crate::api::{LogEntry, LogTail, SharedGovernorApi, StatusPayload, UsageHistory};
use crate::config::GovernorSettings;
use crate::data::format::{clock_label, clock_labels_back};
use crate::data::status::ToggleView;
use crate::data::{RollingBuffer, Sample, SeriesSnapshot, StatusView};
use crate::error::{ApiError, ValidationError};
use crate::poll::PollScheduler;

#[derive(Debug)]
enum GovernorEvent {
    Status(Result<StatusPayload, ApiError>),
    History {
        month: u32,
        result: Result<UsageHistory, ApiError>,
    },
    Logs(Result<LogTail, ApiError>),
}

pub struct GovernorDetail {
    api: SharedGovernorApi,
    settings: GovernorSettings,
    view: StatusView,
    speed: RollingBuffer<1>,
    last_quota_gb: f64,
    usage: UsageHistory,
    month: u32,
    month_tx: watch::Sender<u32>,
    logs: Vec<LogEntry>,
    events_tx: mpsc::UnboundedSender<GovernorEvent>,
    events_rx: mpsc::UnboundedReceiver<GovernorEvent>,
    scheduler: PollScheduler,
    /// One-shot fetches outside the scheduler; aborted on teardown.
    fetches: Vec<JoinHandle<()>>,
}

impl GovernorDetail {
    pub fn new(api: SharedGovernorApi, settings: GovernorSettings) -> Self {
        let month = Local::now().month();
        let (month_tx, _) = watch::channel(month);
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let mut scheduler = PollScheduler::new("governor");

        let (task_api, task_tx) = (api.clone(), events_tx.clone());
        scheduler.register(
            "status",
            Duration::from_millis(settings.status_period_ms),
            move || fetch_status(task_api.clone(), task_tx.clone()),
        );

        let (task_api, task_month, task_tx) = (api.clone(), month_tx.subscribe(), events_tx.clone());
        scheduler.register(
            "history",
            Duration::from_millis(settings.history_period_ms),
            move || fetch_usage(task_api.clone(), *task_month.borrow(), task_tx.clone()),
        );

        let (task_api, task_tx) = (api.clone(), events_tx.clone());
        scheduler.register(
            "logs",
            Duration::from_millis(settings.logs_period_ms),
            move || {
                let api = task_api.clone();
                let tx = task_tx.clone();
                async move {
                    let result = api.logs().await;
                    let failure = result.as_ref().err().cloned();
                    tx.send(GovernorEvent::Logs(result))
                        .map_err(|_| anyhow::anyhow!("governor module is gone"))?;
                    if let Some(e) = failure {
                        return Err(e.into());
                    }
                    Ok::<(), anyhow::Error>(())
                }
            },
        );

        let last_quota_gb = settings.default_quota_gb;
        let speed = RollingBuffer::new(settings.speed_capacity);

        Self {
            api,
            settings,
            view: StatusView::offline(last_quota_gb),
            speed,
            last_quota_gb,
            usage: UsageHistory::default(),
            month,
            month_tx,
            logs: Vec::new(),
            events_tx,
            events_rx,
            scheduler,
            fetches: Vec::new(),
        }
    }

    pub fn view(&self) -> &StatusView {
        &self.view
    }

    pub fn speed(&self) -> SeriesSnapshot<1> {
        self.speed.snapshot()
    }

    pub fn speed_buffer(&self) -> &RollingBuffer<1> {
        &self.speed
    }

    pub fn usage(&self) -> &UsageHistory {
        &self.usage
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn logs(&self) -> &[LogEntry] {
        &self.logs
    }

    pub fn last_quota_gb(&self) -> f64 {
        self.last_quota_gb
    }

    pub fn is_polling(&self) -> bool {
        self.scheduler.is_running()
    }

    /// Start or stop the service.
    ///
    /// The toggle control flips straight from the response. When the
    /// service came up, a status refresh follows after a short delay.
    pub async fn toggle_service(&mut self) -> Result<bool, ApiError> {
        let response = self.api.toggle().await?;
        info!(running = response.is_running, "service toggled");
        self.view.toggle = ToggleView::new(response.is_running);
        if response.is_running {
            self.spawn_status_fetch(Duration::from_millis(self.settings.toggle_followup_ms));
        }
        Ok(response.is_running)
    }

    /// One-shot status fetch, applied through the same path as polled ones.
    pub fn refresh_status(&mut self) {
        self.spawn_status_fetch(Duration::ZERO);
    }

    fn spawn_status_fetch(&mut self, delay: Duration) {
        let (api, tx) = (self.api.clone(), self.events_tx.clone());
        self.track(tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if let Err(e) = fetch_status(api, tx).await {
                debug!("status refresh failed: {e:#}");
            }
        }));
    }

    fn track(&mut self, handle: JoinHandle<()>) {
        self.fetches.retain(|h| !h.is_finished());
        self.fetches.push(handle);
    }

    /// Number of one-shot fetches still in flight.
    pub fn pending_fetches(&self) -> usize {
        self.fetches.iter().filter(|h| !h.is_finished()).count()
    }

    /// Select the month shown in the usage chart and fetch it right away.
    ///
    /// Returns `Ok(false)` when `month` is already selected.
    pub fn change_month(&mut self, month: u32) -> Result<bool, ValidationError> {
        if !(1..=12).contains(&month) {
            return Err(ValidationError::InvalidMonth(month));
        }
        if month == self.month {
            return Ok(false);
        }
        self.month = month;
        self.month_tx.send_replace(month);
        self.usage = UsageHistory::default();

        let (api, tx) = (self.api.clone(), self.events_tx.clone());
        self.track(tokio::spawn(async move {
            if let Err(e) = fetch_usage(api, month, tx).await {
                debug!(month, "usage fetch failed: {e:#}");
            }
        }));
        Ok(true)
    }

    pub fn next_month(&mut self) -> u32 {
        let month = self.month % 12 + 1;
        let _ = self.change_month(month);
        month
    }

    pub fn prev_month(&mut self) -> u32 {
        let month = (self.month + 10) % 12 + 1;
        let _ = self.change_month(month);
        month
    }

    fn apply_status(&mut self, result: Result<StatusPayload, ApiError>) {
        match result {
            Ok(payload) => {
                let view = StatusView::from_payload(&payload, self.last_quota_gb);
                self.last_quota_gb = view.quota_gb;
                self.speed
                    .push(clock_label(Local::now()), [payload.speed_mbps]);
                self.view = view;
            }
            Err(e) => {
                debug!("status poll failed, showing offline view: {e}");
                self.view = StatusView::offline(self.last_quota_gb);
            }
        }
    }

    fn seed_speed(&mut self) {
        let labels = clock_labels_back(
            Local::now(),
            self.speed.capacity(),
            Duration::from_millis(self.settings.status_period_ms),
        );
        self.speed.seed(labels.into_iter().map(Sample::zero));
    }
}

async fn fetch_status(
    api: SharedGovernorApi,
    tx: mpsc::UnboundedSender<GovernorEvent>,
) -> anyhow::Result<()> {
    let result = api.status().await;
    let failure = result.as_ref().err().cloned();
    tx.send(GovernorEvent::Status(result))
        .map_err(|_| anyhow::anyhow!("governor module is gone"))?;
    if let Some(e) = failure {
        return Err(e.into());
    }
    Ok(())
}

async fn fetch_usage(
    api: SharedGovernorApi,
    month: u32,
    tx: mpsc::UnboundedSender<GovernorEvent>,
) -> anyhow::Result<()> {
    let result = api.usage_history(month).await;
    let failure = result.as_ref().err().cloned();
    tx.send(GovernorEvent::History { month, result })
        .map_err(|_| anyhow::anyhow!("governor module is gone"))?;
    if let Some(e) = failure {
        return Err(e.into());
    }
    Ok(())
}

#[async_trait]
impl TelemetryModule for GovernorDetail {
    fn name(&self) -> &'static str {
        "governor"
    }

    async fn init(&mut self) {
        self.seed_speed();

        let status = self.api.status().await;
        if let Err(e) = &status {
            warn!("initial status fetch failed: {e}");
        }
        self.apply_status(status);

        match self.api.usage_history(self.month).await {
            Ok(usage) => self.usage = usage,
            Err(e) => warn!(month = self.month, "initial usage fetch failed: {e}"),
        }
        match self.api.logs().await {
            Ok(tail) => self.logs = tail.entries,
            Err(e) => warn!("initial log fetch failed: {e}"),
        }

        self.scheduler.start();
    }

    fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            match event {
                GovernorEvent::Status(result) => self.apply_status(result),
                GovernorEvent::History { month, result } => {
                    if month != self.month {
                        debug!(month, current = self.month, "dropping stale usage history");
                        continue;
                    }
                    match result {
                        Ok(usage) => self.usage = usage,
                        Err(e) => debug!(month, "usage poll failed: {e}"),
                    }
                }
                GovernorEvent::Logs(result) => match result {
                    Ok(tail) => self.logs = tail.entries,
                    Err(e) => debug!("log poll failed: {e}"),
                },
            }
            applied += 1;
        }
        applied
    }

    fn resize(&mut self, _width: u16, _height: u16) {}

    fn destroy(&mut self) {
        self.scheduler.stop();
        for handle in self.fetches.drain(..) {
            handle.abort();
        }
        while self.events_rx.try_recv().is_ok() {}
        self.speed.clear();
        self.logs.clear();
        info!("governor destroyed");
    }
}
