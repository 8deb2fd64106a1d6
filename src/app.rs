//! Application state: module ownership, navigation and user actions.

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::{info, warn};

use crate::api::{SharedGovernorApi, SharedMonitorApi};
use crate::config::Settings;
use crate::data::PolicyField;
use crate::error::{PolicyError, ValidationError};
use crate::modules::{GovernorDetail, GovernorSummary, MonitorModule, PolicyEditor, TelemetryModule};
use crate::ui::Theme;

/// How long a notification stays in the status bar.
const MESSAGE_TTL: Duration = Duration::from_secs(3);

/// The current view/tab in the TUI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Interface throughput chart and counters.
    Monitor,
    /// Governor status, speed chart, monthly usage and log tail.
    Governor,
    /// Compact governor cards.
    Status,
    /// Policy form and URL list.
    Policy,
}

impl View {
    pub const ALL: [View; 4] = [View::Monitor, View::Governor, View::Status, View::Policy];

    /// Cycle to the next view.
    pub fn next(self) -> Self {
        match self {
            View::Monitor => View::Governor,
            View::Governor => View::Status,
            View::Status => View::Policy,
            View::Policy => View::Monitor,
        }
    }

    /// Cycle to the previous view.
    pub fn prev(self) -> Self {
        match self {
            View::Monitor => View::Policy,
            View::Governor => View::Monitor,
            View::Status => View::Governor,
            View::Policy => View::Status,
        }
    }

    /// Returns the display label for this view.
    pub fn label(&self) -> &'static str {
        match self {
            View::Monitor => "Monitor",
            View::Governor => "Governor",
            View::Status => "Status",
            View::Policy => "Policy",
        }
    }
}

/// Severity of a status bar notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Error,
}

/// What the text prompt is collecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    AddUrl,
    EditField(PolicyField),
    /// Fixed daily quota: sets minimum and maximum together.
    DailyQuota,
}

impl Prompt {
    pub fn title(&self) -> &'static str {
        match self {
            Prompt::AddUrl => "Add URL",
            Prompt::EditField(field) => field.label(),
            Prompt::DailyQuota => "Daily quota (GB)",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputState {
    pub prompt: Prompt,
    pub text: String,
}

/// A user action, produced by the key handler and run by [`App::execute`].
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Quit,
    NextView,
    PrevView,
    SetView(View),
    ToggleHelp,
    CloseHelp,
    SelectNext,
    SelectPrev,
    /// Next interface on the monitor view, next month on the governor view.
    NextSource,
    PrevSource,
    ChangeInterface(String),
    ChangeMonth(u32),
    ToggleService,
    Refresh,
    SaveConfig,
    RequestReset,
    ConfirmReset,
    CancelReset,
    BeginAddUrl,
    BeginEdit,
    BeginDailyQuota,
    InputChar(char),
    InputBackspace,
    SubmitInput,
    CancelInput,
    RemoveSelectedUrl,
    Export,
}

/// Main application state.
pub struct App {
    pub running: bool,
    pub current_view: View,
    pub show_help: bool,
    pub confirm_reset: bool,
    pub input: Option<InputState>,

    /// Cursor on the policy view: fields first, then URLs.
    pub policy_cursor: usize,

    pub monitor: MonitorModule,
    pub governor: GovernorDetail,
    pub summary: GovernorSummary,
    pub policy: PolicyEditor,

    pub endpoint: String,

    // UI
    pub theme: Theme,

    // Status message (temporary feedback)
    pub status_message: Option<(String, Level, Instant)>,
}

impl App {
    pub fn new(
        monitor_api: SharedMonitorApi,
        governor_api: SharedGovernorApi,
        settings: &Settings,
        theme: Theme,
    ) -> Self {
        Self {
            running: true,
            current_view: View::Monitor,
            show_help: false,
            confirm_reset: false,
            input: None,
            policy_cursor: 0,
            monitor: MonitorModule::new(monitor_api, settings.monitor.clone()),
            governor: GovernorDetail::new(governor_api.clone(), settings.governor.clone()),
            summary: GovernorSummary::new(
                governor_api.clone(),
                settings.summary.clone(),
                settings.governor.default_quota_gb,
            ),
            policy: PolicyEditor::new(governor_api),
            endpoint: settings.endpoint.clone(),
            theme,
            status_message: None,
        }
    }

    /// Boot every module: policy first so its quota can seed the summary
    /// cards, then the polled modules.
    pub async fn boot(&mut self) {
        if let Err(e) = self.policy.load().await {
            warn!("policy load failed, using defaults: {e}");
            self.notify(format!("Policy load failed: {e}"), Level::Error);
        }
        self.summary
            .set_quota_hint(self.policy.config().quota_hint_gb());

        self.governor.init().await;
        self.summary.init().await;
        self.monitor.init().await;
        info!(endpoint = %self.endpoint, "all modules booted");
    }

    /// Apply everything the poll tasks reported since the last frame.
    pub fn pump(&mut self) -> usize {
        self.telemetry_mut().into_iter().map(|m| m.pump()).sum()
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        for module in self.telemetry_mut() {
            module.resize(width, height);
        }
    }

    pub fn destroy(&mut self) {
        for module in self.telemetry_mut() {
            module.destroy();
        }
    }

    fn telemetry_mut(&mut self) -> [&mut dyn TelemetryModule; 3] {
        [&mut self.governor, &mut self.summary, &mut self.monitor]
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn notify(&mut self, message: impl Into<String>, level: Level) {
        self.status_message = Some((message.into(), level, Instant::now()));
    }

    /// Get the current status message if it hasn't expired.
    pub fn get_status_message(&self) -> Option<(&str, Level)> {
        match &self.status_message {
            Some((msg, level, time)) if time.elapsed() < MESSAGE_TTL => Some((msg, *level)),
            _ => None,
        }
    }

    /// Number of rows the policy cursor can visit.
    pub fn policy_rows(&self) -> usize {
        PolicyField::ALL.len() + self.policy.urls().len()
    }

    /// The field under the cursor, if the cursor is on a field row.
    pub fn selected_field(&self) -> Option<PolicyField> {
        PolicyField::ALL.get(self.policy_cursor).copied()
    }

    /// Index into the URL list, if the cursor is on a URL row.
    pub fn selected_url(&self) -> Option<usize> {
        self.policy_cursor
            .checked_sub(PolicyField::ALL.len())
            .filter(|i| *i < self.policy.urls().len())
    }

    fn clamp_cursor(&mut self) {
        self.policy_cursor = self
            .policy_cursor
            .min(self.policy_rows().saturating_sub(1));
    }

    /// Run one user action.
    pub async fn execute(&mut self, command: Command) {
        match command {
            Command::Quit => self.running = false,
            Command::NextView => self.current_view = self.current_view.next(),
            Command::PrevView => self.current_view = self.current_view.prev(),
            Command::SetView(view) => self.current_view = view,
            Command::ToggleHelp => self.show_help = !self.show_help,
            Command::CloseHelp => self.show_help = false,

            Command::SelectNext => {
                if self.current_view == View::Policy {
                    self.policy_cursor += 1;
                    self.clamp_cursor();
                }
            }
            Command::SelectPrev => {
                if self.current_view == View::Policy {
                    self.policy_cursor = self.policy_cursor.saturating_sub(1);
                }
            }

            Command::NextSource | Command::PrevSource => {
                let forward = command == Command::NextSource;
                match self.current_view {
                    View::Monitor => {
                        let changed = if forward {
                            self.monitor.next_interface().await
                        } else {
                            self.monitor.prev_interface().await
                        };
                        if let Some(id) = changed {
                            self.notify(format!("Interface: {id}"), Level::Info);
                        }
                    }
                    View::Governor => {
                        let month = if forward {
                            self.governor.next_month()
                        } else {
                            self.governor.prev_month()
                        };
                        self.notify(format!("Usage for month {month}"), Level::Info);
                    }
                    View::Status | View::Policy => {}
                }
            }
            Command::ChangeInterface(id) => match self.monitor.change_interface(&id).await {
                Ok(true) => self.notify(format!("Interface: {id}"), Level::Info),
                Ok(false) => {}
                Err(e) => self.notify(e.to_string(), Level::Error),
            },
            Command::ChangeMonth(month) => {
                if let Err(e) = self.governor.change_month(month) {
                    self.notify(e.to_string(), Level::Error);
                }
            }

            Command::ToggleService => self.toggle_service().await,
            Command::Refresh => {
                self.governor.refresh_status();
                self.summary.refresh();
                self.notify("Refreshing", Level::Info);
            }

            Command::SaveConfig => {
                let config = self.policy.config().clone();
                let result = self.policy.save(config).await;
                self.report_policy(result, "Policy saved");
            }
            Command::RequestReset => {
                if self.current_view == View::Policy {
                    self.confirm_reset = true;
                }
            }
            Command::CancelReset => self.confirm_reset = false,
            Command::ConfirmReset => {
                self.confirm_reset = false;
                let result = self.policy.reset_to_default().await;
                self.report_policy(result, "Policy reset to defaults");
                self.clamp_cursor();
            }

            Command::BeginAddUrl => {
                if self.current_view == View::Policy {
                    self.input = Some(InputState {
                        prompt: Prompt::AddUrl,
                        text: String::new(),
                    });
                }
            }
            Command::BeginEdit => {
                if let (View::Policy, Some(field)) = (self.current_view, self.selected_field()) {
                    self.input = Some(InputState {
                        prompt: Prompt::EditField(field),
                        text: self.policy.config().field_text(field),
                    });
                }
            }
            Command::BeginDailyQuota => {
                if matches!(self.current_view, View::Status | View::Policy) {
                    self.input = Some(InputState {
                        prompt: Prompt::DailyQuota,
                        text: self.policy.config().field_text(PolicyField::QuotaMax),
                    });
                }
            }
            Command::InputChar(c) => {
                if let Some(input) = &mut self.input {
                    input.text.push(c);
                }
            }
            Command::InputBackspace => {
                if let Some(input) = &mut self.input {
                    input.text.pop();
                }
            }
            Command::CancelInput => self.input = None,
            Command::SubmitInput => {
                if let Some(input) = self.input.take() {
                    self.submit_input(input).await;
                }
            }
            Command::RemoveSelectedUrl => {
                if let (View::Policy, Some(index)) = (self.current_view, self.selected_url()) {
                    match self.policy.remove_url(index).await {
                        Ok(url) => self.notify(format!("Removed {url}"), Level::Success),
                        Err(e) => self.notify(e.to_string(), Level::Error),
                    }
                    self.clamp_cursor();
                }
            }

            Command::Export => {
                let path = Path::new("govwatch_export.json");
                match self.export_state(path) {
                    Ok(()) => self.notify(format!("Exported to {}", path.display()), Level::Success),
                    Err(e) => self.notify(format!("Export failed: {e}"), Level::Error),
                }
            }
        }
    }

    async fn toggle_service(&mut self) {
        match self.governor.toggle_service().await {
            Ok(running) => {
                self.summary.refresh();
                let msg = if running { "Service started" } else { "Service stopped" };
                self.notify(msg, Level::Success);
            }
            Err(e) => self.notify(format!("Toggle failed: {e}"), Level::Error),
        }
    }

    async fn submit_input(&mut self, input: InputState) {
        let result = match input.prompt {
            Prompt::AddUrl => self.policy.add_url(&input.text).await,
            Prompt::EditField(field) => self.policy.set_field(field, &input.text).await,
            Prompt::DailyQuota => match input.text.trim().parse::<f64>() {
                Ok(gb) => self.policy.update_daily_quota(gb).await,
                Err(_) => Err(ValidationError::InvalidNumber {
                    field: "daily_quota_gb",
                    value: input.text.clone(),
                }
                .into()),
            },
        };
        let done = match input.prompt {
            Prompt::AddUrl => "URL added",
            Prompt::EditField(_) => "Policy saved",
            Prompt::DailyQuota => "Daily quota updated",
        };
        self.report_policy(result, done);
    }

    fn report_policy(&mut self, result: Result<(), PolicyError>, done: &str) {
        match result {
            Ok(()) => {
                self.summary
                    .set_quota_hint(self.policy.config().quota_hint_gb());
                self.notify(done, Level::Success);
            }
            Err(e) => self.notify(e.to_string(), Level::Error),
        }
    }

    /// Export the reconciled state of every module as pretty JSON.
    pub fn export_state(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.snapshot_json())?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn snapshot_json(&self) -> serde_json::Value {
        let series = self.monitor.series();
        let speed = self.governor.speed();
        serde_json::json!({
            "status": self.governor.view(),
            "summary": {
                "running": self.summary.is_running(),
                "cards": self.summary.cards(),
            },
            "monitor": {
                "interface": self.monitor.active(),
                "stats": self.monitor.stats(),
                "labels": series.labels,
                "sent": series.channels[0],
                "recv": series.channels[1],
            },
            "governor": {
                "month": self.governor.month(),
                "usage": self.governor.usage(),
                "speed": speed.channels[0],
                "logs": self.governor.logs(),
            },
            "policy": self.policy.config(),
        })
    }
}
