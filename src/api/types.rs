//! Payloads exchanged with the governor server.
//!
//! Decoding is tolerant: missing numeric fields default to zero so a partial
//! body still yields a complete value.

use serde::{Deserialize, Deserializer, Serialize};

use crate::data::format::GIB;
use crate::data::status::ServiceStatus;

/// `GET status`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusPayload {
    #[serde(default)]
    pub is_running: bool,
    #[serde(default)]
    pub status: ServiceStatus,
    #[serde(default)]
    pub speed_mbps: f64,
    #[serde(default, deserialize_with = "whole_number")]
    pub today_bytes: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub today_quota_gb: Option<f64>,
    #[serde(
        default,
        deserialize_with = "optional_whole_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub today_quota_bytes: Option<u64>,
    #[serde(default, deserialize_with = "whole_number")]
    pub uptime_seconds: u64,
}

impl StatusPayload {
    /// Today's quota in GB, from whichever field the server sent.
    pub fn quota_gb(&self) -> Option<f64> {
        self.today_quota_gb
            .or_else(|| self.today_quota_bytes.map(|b| b as f64 / GIB))
    }
}

/// Byte and second counts arrive as integers or, when the server derived
/// them from a float (`quota_gb * 1024^3`), as floats.
#[derive(Deserialize)]
#[serde(untagged)]
enum WholeNumber {
    Int(u64),
    Float(f64),
}

impl WholeNumber {
    fn into_u64(self) -> u64 {
        match self {
            WholeNumber::Int(n) => n,
            // `as` saturates; negatives and NaN land on 0
            WholeNumber::Float(f) => f.round() as u64,
        }
    }
}

fn whole_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    WholeNumber::deserialize(deserializer).map(WholeNumber::into_u64)
}

fn optional_whole_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<u64>, D::Error> {
    Ok(Option::<WholeNumber>::deserialize(deserializer)?.map(WholeNumber::into_u64))
}

/// `POST toggle`
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ToggleResponse {
    #[serde(default)]
    pub is_running: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DayUsage {
    pub day: u32,
    #[serde(default, deserialize_with = "whole_number")]
    pub bytes: u64,
}

/// `GET history?month=M`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageHistory {
    #[serde(default)]
    pub days: Vec<DayUsage>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub msg: String,
}

/// `GET logs`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogTail {
    #[serde(default)]
    pub entries: Vec<LogEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_entries: Option<usize>,
}

/// `GET interface-stats/{id}`. Rates are KB/s, totals MB.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InterfaceStats {
    #[serde(default)]
    pub sent_rate: f64,
    #[serde(default)]
    pub recv_rate: f64,
    #[serde(default)]
    pub total_sent: f64,
    #[serde(default)]
    pub total_recv: f64,
}

/// Stats body as sent on the wire, possibly carrying an `error` field.
#[derive(Debug, Deserialize)]
pub(crate) struct RawInterfaceStats {
    #[serde(flatten)]
    pub stats: InterfaceStats,
    #[serde(default)]
    pub error: Option<String>,
}

/// `GET interface-history/{id}`: parallel arrays.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterfaceHistory {
    #[serde(default)]
    pub timestamp: Vec<String>,
    #[serde(default)]
    pub sent: Vec<f64>,
    #[serde(default)]
    pub recv: Vec<f64>,
}

impl InterfaceHistory {
    pub fn is_aligned(&self) -> bool {
        self.timestamp.len() == self.sent.len() && self.sent.len() == self.recv.len()
    }

    pub fn len(&self) -> usize {
        self.timestamp.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamp.is_empty()
    }
}

/// Body of `POST config` that restores the server defaults.
#[derive(Debug, Serialize)]
pub(crate) struct ResetRequest {
    pub reset_to_default: bool,
}
