//! Mapping of the remote service status onto the governor widgets.
//!
//! A status payload is reconciled into one [`StatusView`] covering the toggle
//! control, the status badge and the four stat cards. Views are always built
//! whole and swapped in place, so a reader never sees a mixture of two polls.

use serde::{Deserialize, Serialize};

use super::format::{format_bytes, format_rate, format_uptime};
use crate::api::StatusPayload;

/// Remote service state as reported by `GET status`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ServiceStatus {
    Running,
    #[default]
    Stopped,
    Sleeping,
    OutOfSchedule,
    QuotaReached,
    /// A value this client does not know, kept verbatim.
    Other(String),
}

/// Visual style a status is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VisualClass {
    Running,
    Stopped,
    Sleeping,
}

impl From<String> for ServiceStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "running" => ServiceStatus::Running,
            "stopped" => ServiceStatus::Stopped,
            "sleeping" => ServiceStatus::Sleeping,
            "out_of_schedule" => ServiceStatus::OutOfSchedule,
            "quota_reached" => ServiceStatus::QuotaReached,
            _ => ServiceStatus::Other(value),
        }
    }
}

impl From<&str> for ServiceStatus {
    fn from(value: &str) -> Self {
        ServiceStatus::from(value.to_string())
    }
}

impl From<ServiceStatus> for String {
    fn from(status: ServiceStatus) -> Self {
        match status {
            ServiceStatus::Running => "running".to_string(),
            ServiceStatus::Stopped => "stopped".to_string(),
            ServiceStatus::Sleeping => "sleeping".to_string(),
            ServiceStatus::OutOfSchedule => "out_of_schedule".to_string(),
            ServiceStatus::QuotaReached => "quota_reached".to_string(),
            ServiceStatus::Other(raw) => raw,
        }
    }
}

impl ServiceStatus {
    pub fn label(&self) -> &str {
        match self {
            ServiceStatus::Running => "Running",
            ServiceStatus::Stopped => "Stopped",
            ServiceStatus::Sleeping => "Sleeping",
            ServiceStatus::OutOfSchedule => "Out of window",
            ServiceStatus::QuotaReached => "Quota reached",
            ServiceStatus::Other(raw) => raw,
        }
    }

    pub fn visual_class(&self) -> VisualClass {
        match self {
            ServiceStatus::Running => VisualClass::Running,
            ServiceStatus::Sleeping | ServiceStatus::OutOfSchedule | ServiceStatus::QuotaReached => {
                VisualClass::Sleeping
            }
            ServiceStatus::Stopped | ServiceStatus::Other(_) => VisualClass::Stopped,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonVariant {
    /// Pressing it stops the service.
    Danger,
    /// Pressing it starts the service.
    Success,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToggleView {
    pub is_running: bool,
    pub label: &'static str,
    pub variant: ButtonVariant,
}

impl ToggleView {
    pub fn new(is_running: bool) -> Self {
        if is_running {
            Self {
                is_running,
                label: "Stop service",
                variant: ButtonVariant::Danger,
            }
        } else {
            Self {
                is_running,
                label: "Start service",
                variant: ButtonVariant::Success,
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BadgeView {
    pub label: String,
    pub class: VisualClass,
}

impl From<&ServiceStatus> for BadgeView {
    fn from(status: &ServiceStatus) -> Self {
        Self {
            label: status.label().to_string(),
            class: status.visual_class(),
        }
    }
}

/// Formatted values for the four stat cards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatCards {
    pub speed: String,
    pub today: String,
    pub quota: String,
    pub uptime: String,
}

/// Complete widget state for one status poll.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusView {
    pub toggle: ToggleView,
    pub badge: BadgeView,
    pub cards: StatCards,
    /// Raw speed behind `cards.speed`, fed to the speed chart.
    #[serde(skip)]
    pub speed_mbps: f64,
    #[serde(skip)]
    pub quota_gb: f64,
}

impl StatusView {
    /// Reconcile a fresh payload. `fallback_quota_gb` is used when the
    /// payload carries no quota.
    pub fn from_payload(payload: &StatusPayload, fallback_quota_gb: f64) -> Self {
        let quota_gb = payload.quota_gb().unwrap_or(fallback_quota_gb);
        Self {
            toggle: ToggleView::new(payload.is_running),
            badge: BadgeView::from(&payload.status),
            cards: StatCards {
                speed: format_rate(payload.speed_mbps),
                today: format_bytes(payload.today_bytes),
                quota: format_quota(quota_gb),
                uptime: format_uptime(payload.uptime_seconds),
            },
            speed_mbps: payload.speed_mbps,
            quota_gb,
        }
    }

    /// Safe default after a failed poll: stopped, zero rates and usage,
    /// the last known quota kept.
    pub fn offline(preserved_quota_gb: f64) -> Self {
        let status = ServiceStatus::Stopped;
        Self {
            toggle: ToggleView::new(false),
            badge: BadgeView::from(&status),
            cards: StatCards {
                speed: format_rate(0.0),
                today: format_bytes(0),
                quota: format_quota(preserved_quota_gb),
                uptime: format_uptime(0),
            },
            speed_mbps: 0.0,
            quota_gb: preserved_quota_gb,
        }
    }

    pub fn is_running(&self) -> bool {
        self.toggle.is_running
    }
}

fn format_quota(gb: f64) -> String {
    if gb.fract() == 0.0 {
        format!("{:.0} GB", gb)
    } else {
        format!("{:.1} GB", gb)
    }
}
