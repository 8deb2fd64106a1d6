//! Governor policy model and its validation rules.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// The governor's tunable policy, as stored by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub speed_limit_mbps: f64,
    pub daily_quota_min_gb: f64,
    pub daily_quota_max_gb: f64,
    pub schedule_start: String,
    pub schedule_end: String,
    pub sleep_min_minutes: f64,
    pub sleep_max_minutes: f64,
    pub urls: Vec<String>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            speed_limit_mbps: 10.0,
            daily_quota_min_gb: 100.0,
            daily_quota_max_gb: 200.0,
            schedule_start: "00:00".to_string(),
            schedule_end: "23:59".to_string(),
            sleep_min_minutes: 10.0,
            sleep_max_minutes: 20.0,
            urls: Vec::new(),
        }
    }
}

/// Scalar fields editable from the policy form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyField {
    SpeedLimit,
    QuotaMin,
    QuotaMax,
    ScheduleStart,
    ScheduleEnd,
    SleepMin,
    SleepMax,
}

impl PolicyField {
    pub const ALL: [PolicyField; 7] = [
        PolicyField::SpeedLimit,
        PolicyField::QuotaMin,
        PolicyField::QuotaMax,
        PolicyField::ScheduleStart,
        PolicyField::ScheduleEnd,
        PolicyField::SleepMin,
        PolicyField::SleepMax,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PolicyField::SpeedLimit => "Speed limit (Mbps)",
            PolicyField::QuotaMin => "Daily quota min (GB)",
            PolicyField::QuotaMax => "Daily quota max (GB)",
            PolicyField::ScheduleStart => "Window start",
            PolicyField::ScheduleEnd => "Window end",
            PolicyField::SleepMin => "Sleep min (min)",
            PolicyField::SleepMax => "Sleep max (min)",
        }
    }

    fn key(&self) -> &'static str {
        match self {
            PolicyField::SpeedLimit => "speed_limit_mbps",
            PolicyField::QuotaMin => "daily_quota_min_gb",
            PolicyField::QuotaMax => "daily_quota_max_gb",
            PolicyField::ScheduleStart => "schedule_start",
            PolicyField::ScheduleEnd => "schedule_end",
            PolicyField::SleepMin => "sleep_min_minutes",
            PolicyField::SleepMax => "sleep_max_minutes",
        }
    }
}

impl PolicyConfig {
    /// Current value of a field, formatted for the edit prompt.
    pub fn field_text(&self, field: PolicyField) -> String {
        match field {
            PolicyField::SpeedLimit => trim_number(self.speed_limit_mbps),
            PolicyField::QuotaMin => trim_number(self.daily_quota_min_gb),
            PolicyField::QuotaMax => trim_number(self.daily_quota_max_gb),
            PolicyField::ScheduleStart => self.schedule_start.clone(),
            PolicyField::ScheduleEnd => self.schedule_end.clone(),
            PolicyField::SleepMin => trim_number(self.sleep_min_minutes),
            PolicyField::SleepMax => trim_number(self.sleep_max_minutes),
        }
    }

    /// Return a copy with one field replaced from user text.
    ///
    /// Only parsing happens here; cross-field rules are checked by
    /// [`PolicyConfig::validate`].
    pub fn with_field(&self, field: PolicyField, text: &str) -> Result<Self, ValidationError> {
        let text = text.trim();
        let mut next = self.clone();
        match field {
            PolicyField::ScheduleStart => next.schedule_start = parse_time(text)?,
            PolicyField::ScheduleEnd => next.schedule_end = parse_time(text)?,
            numeric => {
                let value: f64 = text
                    .parse()
                    .ok()
                    .filter(|v: &f64| v.is_finite())
                    .ok_or_else(|| ValidationError::InvalidNumber {
                        field: numeric.key(),
                        value: text.to_string(),
                    })?;
                match numeric {
                    PolicyField::SpeedLimit => next.speed_limit_mbps = value,
                    PolicyField::QuotaMin => next.daily_quota_min_gb = value,
                    PolicyField::QuotaMax => next.daily_quota_max_gb = value,
                    PolicyField::SleepMin => next.sleep_min_minutes = value,
                    PolicyField::SleepMax => next.sleep_max_minutes = value,
                    PolicyField::ScheduleStart | PolicyField::ScheduleEnd => {}
                }
            }
        }
        Ok(next)
    }

    /// Trim URLs, drop blanks and repeats. First occurrence wins.
    pub fn normalized(mut self) -> Self {
        let mut urls: Vec<String> = Vec::with_capacity(self.urls.len());
        for url in self.urls.drain(..) {
            let url = url.trim();
            if !url.is_empty() && !urls.iter().any(|u| u == url) {
                urls.push(url.to_string());
            }
        }
        self.urls = urls;
        self
    }

    /// Check every rule a saved policy must satisfy.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !positive(self.speed_limit_mbps) {
            return Err(ValidationError::NonPositiveSpeed);
        }
        if !positive(self.daily_quota_min_gb) || !positive(self.daily_quota_max_gb) {
            return Err(ValidationError::NonPositiveQuota);
        }
        if self.daily_quota_min_gb > self.daily_quota_max_gb {
            return Err(ValidationError::QuotaRange {
                min: self.daily_quota_min_gb,
                max: self.daily_quota_max_gb,
            });
        }
        parse_time(&self.schedule_start)?;
        parse_time(&self.schedule_end)?;
        if self.sleep_min_minutes > self.sleep_max_minutes {
            return Err(ValidationError::SleepRange {
                min: self.sleep_min_minutes,
                max: self.sleep_max_minutes,
            });
        }
        let mut seen: Vec<String> = Vec::with_capacity(self.urls.len());
        for url in &self.urls {
            let url = validate_url(url)?;
            if seen.contains(&url) {
                return Err(ValidationError::DuplicateUrl(url));
            }
            seen.push(url);
        }
        Ok(())
    }

    /// Midpoint of the daily quota range.
    pub fn quota_hint_gb(&self) -> f64 {
        (self.daily_quota_min_gb + self.daily_quota_max_gb) / 2.0
    }
}

/// Check URL syntax. Returns the trimmed URL.
pub fn validate_url(url: &str) -> Result<String, ValidationError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(ValidationError::EmptyUrl);
    }
    reqwest::Url::parse(url).map_err(|e| ValidationError::MalformedUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    Ok(url.to_string())
}

fn parse_time(text: &str) -> Result<String, ValidationError> {
    NaiveTime::parse_from_str(text.trim(), "%H:%M")
        .map(|t| t.format("%H:%M").to_string())
        .map_err(|_| ValidationError::InvalidTime(text.to_string()))
}

fn positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn trim_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        value.to_string()
    }
}
