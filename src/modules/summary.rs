//! Compact governor status cards.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::TelemetryModule;
use crate::api::{SharedGovernorApi, StatusPayload};
use crate::config::SummarySettings;
use crate::data::format::{bytes_to_gib, format_rate, format_uptime_compact, mbps_to_kbps, usage_percent};
use crate::error::ApiError;
use crate::poll::PollScheduler;

/// The four summary cards, always replaced together.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryCards {
    pub speed_kbps: String,
    pub usage_gb: String,
    pub usage_percent: String,
    pub uptime: String,
}

impl SummaryCards {
    pub fn from_payload(payload: &StatusPayload, quota_gb: f64) -> Self {
        Self {
            speed_kbps: format_rate(mbps_to_kbps(payload.speed_mbps)),
            usage_gb: format!("{:.2} GB", bytes_to_gib(payload.today_bytes)),
            usage_percent: usage_percent(payload.today_bytes, quota_gb),
            uptime: format_uptime_compact(payload.uptime_seconds),
        }
    }

    pub fn zero() -> Self {
        Self::from_payload(&StatusPayload::default(), 0.0)
    }
}

#[derive(Debug)]
enum SummaryEvent {
    Cards(Result<StatusPayload, ApiError>),
    Status(Result<StatusPayload, ApiError>),
}

pub struct GovernorSummary {
    api: SharedGovernorApi,
    default_quota_gb: f64,
    quota_hint_gb: Option<f64>,
    cards: SummaryCards,
    running: bool,
    events_tx: mpsc::UnboundedSender<SummaryEvent>,
    events_rx: mpsc::UnboundedReceiver<SummaryEvent>,
    scheduler: PollScheduler,
    refreshes: Vec<JoinHandle<()>>,
}

impl GovernorSummary {
    pub fn new(api: SharedGovernorApi, settings: SummarySettings, default_quota_gb: f64) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let mut scheduler = PollScheduler::new("summary");

        let (task_api, task_tx) = (api.clone(), events_tx.clone());
        scheduler.register(
            "cards",
            Duration::from_millis(settings.cards_period_ms),
            move || fetch(task_api.clone(), task_tx.clone(), SummaryEvent::Cards),
        );
        let (task_api, task_tx) = (api.clone(), events_tx.clone());
        scheduler.register(
            "status",
            Duration::from_millis(settings.status_period_ms),
            move || fetch(task_api.clone(), task_tx.clone(), SummaryEvent::Status),
        );

        Self {
            api,
            default_quota_gb,
            quota_hint_gb: None,
            cards: SummaryCards::zero(),
            running: false,
            events_tx,
            events_rx,
            scheduler,
            refreshes: Vec::new(),
        }
    }

    /// Quota to fall back on when a payload carries none, typically taken
    /// from the loaded policy.
    pub fn set_quota_hint(&mut self, quota_gb: f64) {
        if quota_gb.is_finite() && quota_gb > 0.0 {
            self.quota_hint_gb = Some(quota_gb);
        }
    }

    pub fn cards(&self) -> &SummaryCards {
        &self.cards
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_polling(&self) -> bool {
        self.scheduler.is_running()
    }

    /// Fetch both cards and status now, outside the regular cadence.
    pub fn refresh(&mut self) {
        let (api, tx) = (self.api.clone(), self.events_tx.clone());
        self.refreshes.retain(|h| !h.is_finished());
        self.refreshes.push(tokio::spawn(async move {
            let result = api.status().await;
            let _ = tx.send(SummaryEvent::Status(result.clone()));
            let _ = tx.send(SummaryEvent::Cards(result));
        }));
    }

    fn quota_for(&self, payload: &StatusPayload) -> f64 {
        payload
            .quota_gb()
            .or(self.quota_hint_gb)
            .unwrap_or(self.default_quota_gb)
    }

    fn apply_cards(&mut self, result: Result<StatusPayload, ApiError>) {
        self.cards = match result {
            Ok(payload) => SummaryCards::from_payload(&payload, self.quota_for(&payload)),
            Err(e) => {
                debug!("summary cards poll failed: {e}");
                SummaryCards::zero()
            }
        };
    }

    fn apply_status(&mut self, result: Result<StatusPayload, ApiError>) {
        self.running = match result {
            Ok(payload) => payload.is_running,
            Err(e) => {
                debug!("summary status poll failed: {e}");
                false
            }
        };
    }
}

async fn fetch(
    api: SharedGovernorApi,
    tx: mpsc::UnboundedSender<SummaryEvent>,
    wrap: fn(Result<StatusPayload, ApiError>) -> SummaryEvent,
) -> anyhow::Result<()> {
    let result = api.status().await;
    let failure = result.as_ref().err().cloned();
    tx.send(wrap(result))
        .map_err(|_| anyhow::anyhow!("summary module is gone"))?;
    if let Some(e) = failure {
        return Err(e.into());
    }
    Ok(())
}

#[async_trait]
impl TelemetryModule for GovernorSummary {
    fn name(&self) -> &'static str {
        "summary"
    }

    async fn init(&mut self) {
        let result = self.api.status().await;
        self.apply_status(result.clone());
        self.apply_cards(result);
        self.scheduler.start();
    }

    fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            match event {
                SummaryEvent::Cards(result) => self.apply_cards(result),
                SummaryEvent::Status(result) => self.apply_status(result),
            }
            applied += 1;
        }
        applied
    }

    fn resize(&mut self, _width: u16, _height: u16) {}

    fn destroy(&mut self) {
        self.scheduler.stop();
        for handle in self.refreshes.drain(..) {
            handle.abort();
        }
        while self.events_rx.try_recv().is_ok() {}
        info!("summary destroyed");
    }
}
