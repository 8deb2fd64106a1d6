//! In-memory server used by the module tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use crate::api::{
    GovernorApi, InterfaceHistory, InterfaceStats, LogEntry, LogTail, MonitorApi, StatusPayload,
    ToggleResponse, UsageHistory,
};
use crate::data::{PolicyConfig, ServiceStatus};
use crate::error::ApiError;

type Scripted<T> = (Duration, Result<T, ApiError>);

#[derive(Debug)]
struct FakeState {
    interfaces: Result<Vec<String>, ApiError>,
    stats: HashMap<String, InterfaceStats>,
    stats_delay: HashMap<String, Duration>,
    stats_error: Option<ApiError>,
    history: HashMap<String, InterfaceHistory>,
    history_error: Option<ApiError>,

    status: Result<StatusPayload, ApiError>,
    status_script: VecDeque<Scripted<StatusPayload>>,
    running: bool,
    toggle_error: Option<ApiError>,
    usage: HashMap<u32, UsageHistory>,
    usage_delay: HashMap<u32, Duration>,
    logs: Result<LogTail, ApiError>,

    config: PolicyConfig,
    load_error: Option<ApiError>,
    save_error: Option<ApiError>,

    calls: HashMap<&'static str, usize>,
}

/// Scriptable implementation of both API traits.
#[derive(Debug, Clone)]
pub(crate) struct FakeApi {
    state: Arc<Mutex<FakeState>>,
}

pub(crate) fn running_payload(speed_mbps: f64) -> StatusPayload {
    StatusPayload {
        is_running: true,
        status: ServiceStatus::Running,
        speed_mbps,
        today_bytes: 2 * 1024 * 1024 * 1024,
        today_quota_gb: Some(100.0),
        today_quota_bytes: None,
        uptime_seconds: 3725,
    }
}

pub(crate) fn stats(sent_rate: f64, recv_rate: f64) -> InterfaceStats {
    InterfaceStats {
        sent_rate,
        recv_rate,
        total_sent: 1.0,
        total_recv: 2.0,
    }
}

pub(crate) fn history(points: &[(f64, f64)]) -> InterfaceHistory {
    InterfaceHistory {
        timestamp: (0..points.len()).map(|i| format!("h{i}")).collect(),
        sent: points.iter().map(|p| p.0).collect(),
        recv: points.iter().map(|p| p.1).collect(),
    }
}

impl FakeApi {
    pub fn new() -> Self {
        let state = FakeState {
            interfaces: Ok(vec!["lo".into(), "eth0".into(), "eth1".into()]),
            stats: HashMap::new(),
            stats_delay: HashMap::new(),
            stats_error: None,
            history: HashMap::new(),
            history_error: None,
            status: Ok(running_payload(8.0)),
            status_script: VecDeque::new(),
            running: false,
            toggle_error: None,
            usage: HashMap::new(),
            usage_delay: HashMap::new(),
            logs: Ok(LogTail::default()),
            config: PolicyConfig::default(),
            load_error: None,
            save_error: None,
            calls: HashMap::new(),
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    fn hit(&self, name: &'static str) {
        *self.lock().calls.entry(name).or_default() += 1;
    }

    pub fn calls(&self, name: &str) -> usize {
        self.lock().calls.get(name).copied().unwrap_or(0)
    }

    pub fn set_interfaces(&self, interfaces: Result<Vec<String>, ApiError>) {
        self.lock().interfaces = interfaces;
    }

    pub fn set_stats(&self, id: &str, stats: InterfaceStats) {
        self.lock().stats.insert(id.to_string(), stats);
    }

    pub fn delay_stats(&self, id: &str, delay: Duration) {
        self.lock().stats_delay.insert(id.to_string(), delay);
    }

    pub fn fail_stats(&self, error: Option<ApiError>) {
        self.lock().stats_error = error;
    }

    pub fn set_history(&self, id: &str, history: InterfaceHistory) {
        self.lock().history.insert(id.to_string(), history);
    }

    pub fn fail_history(&self, error: Option<ApiError>) {
        self.lock().history_error = error;
    }

    pub fn set_status(&self, status: Result<StatusPayload, ApiError>) {
        self.lock().status = status;
    }

    /// Queue a one-off status answer, taken by the next call and delivered
    /// after `delay`.
    pub fn script_status(&self, delay: Duration, result: Result<StatusPayload, ApiError>) {
        self.lock().status_script.push_back((delay, result));
    }

    pub fn set_running(&self, running: bool) {
        self.lock().running = running;
    }

    pub fn fail_toggle(&self, error: Option<ApiError>) {
        self.lock().toggle_error = error;
    }

    pub fn set_usage(&self, month: u32, usage: UsageHistory) {
        self.lock().usage.insert(month, usage);
    }

    pub fn delay_usage(&self, month: u32, delay: Duration) {
        self.lock().usage_delay.insert(month, delay);
    }

    pub fn set_logs(&self, logs: Result<LogTail, ApiError>) {
        self.lock().logs = logs;
    }

    pub fn set_config(&self, config: PolicyConfig) {
        self.lock().config = config;
    }

    pub fn server_config(&self) -> PolicyConfig {
        self.lock().config.clone()
    }

    pub fn fail_load(&self, error: Option<ApiError>) {
        self.lock().load_error = error;
    }

    pub fn fail_save(&self, error: Option<ApiError>) {
        self.lock().save_error = error;
    }
}

pub(crate) fn log_entries(messages: &[&str]) -> LogTail {
    LogTail {
        entries: messages
            .iter()
            .map(|m| LogEntry {
                time: "12:00:00".into(),
                msg: m.to_string(),
            })
            .collect(),
        max_entries: None,
    }
}

#[async_trait]
impl MonitorApi for FakeApi {
    async fn interfaces(&self) -> Result<Vec<String>, ApiError> {
        self.hit("interfaces");
        self.lock().interfaces.clone()
    }

    async fn interface_stats(&self, id: &str) -> Result<InterfaceStats, ApiError> {
        self.hit("interface_stats");
        let (delay, result) = {
            let state = self.lock();
            let delay = state.stats_delay.get(id).copied().unwrap_or_default();
            let result = match &state.stats_error {
                Some(e) => Err(e.clone()),
                None => state
                    .stats
                    .get(id)
                    .copied()
                    .ok_or_else(|| ApiError::Remote(format!("Interface {id} not found"))),
            };
            (delay, result)
        };
        tokio::time::sleep(delay).await;
        result
    }

    async fn interface_history(&self, id: &str) -> Result<InterfaceHistory, ApiError> {
        self.hit("interface_history");
        let state = self.lock();
        match &state.history_error {
            Some(e) => Err(e.clone()),
            None => Ok(state.history.get(id).cloned().unwrap_or_default()),
        }
    }
}

#[async_trait]
impl GovernorApi for FakeApi {
    async fn status(&self) -> Result<StatusPayload, ApiError> {
        self.hit("status");
        let scripted = self.lock().status_script.pop_front();
        match scripted {
            Some((delay, result)) => {
                tokio::time::sleep(delay).await;
                result
            }
            None => self.lock().status.clone(),
        }
    }

    async fn toggle(&self) -> Result<ToggleResponse, ApiError> {
        self.hit("toggle");
        let mut state = self.lock();
        if let Some(e) = &state.toggle_error {
            return Err(e.clone());
        }
        state.running = !state.running;
        Ok(ToggleResponse {
            is_running: state.running,
        })
    }

    async fn usage_history(&self, month: u32) -> Result<UsageHistory, ApiError> {
        self.hit("usage_history");
        let (delay, usage) = {
            let state = self.lock();
            (
                state.usage_delay.get(&month).copied().unwrap_or_default(),
                state.usage.get(&month).cloned().unwrap_or_default(),
            )
        };
        tokio::time::sleep(delay).await;
        Ok(usage)
    }

    async fn logs(&self) -> Result<LogTail, ApiError> {
        self.hit("logs");
        self.lock().logs.clone()
    }

    async fn load_config(&self) -> Result<PolicyConfig, ApiError> {
        self.hit("load_config");
        let state = self.lock();
        match &state.load_error {
            Some(e) => Err(e.clone()),
            None => Ok(state.config.clone()),
        }
    }

    async fn save_config(&self, config: &PolicyConfig) -> Result<(), ApiError> {
        self.hit("save_config");
        let mut state = self.lock();
        if let Some(e) = &state.save_error {
            return Err(e.clone());
        }
        state.config = config.clone();
        Ok(())
    }

    async fn reset_config(&self) -> Result<(), ApiError> {
        self.hit("reset_config");
        let mut state = self.lock();
        if let Some(e) = &state.save_error {
            return Err(e.clone());
        }
        state.config = PolicyConfig::default();
        Ok(())
    }
}
