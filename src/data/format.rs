//! Human-unit formatting for raw counters.
//!
//! Everything here is a pure function of its inputs.

use std::time::Duration;

use anyhow::{bail, Result};
use chrono::{DateTime, Local, TimeDelta};

/// Bytes per GiB, used for quota arithmetic.
pub const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Decimal thresholds, largest first.
const BYTE_UNITS: &[(f64, &str)] = &[(1e12, "TB"), (1e9, "GB"), (1e6, "MB"), (1e3, "KB")];

/// Suffix to nanoseconds multiplier (order matters: longer suffixes first)
const DURATION_UNITS: &[(&str, f64)] = &[
    ("ns", 1.0),
    ("µs", 1_000.0),
    ("us", 1_000.0),
    ("ms", 1_000_000.0),
    ("s", 1_000_000_000.0),
];

/// Format a byte count with decimal units and two decimals.
///
/// Returns values like `"999 B"`, `"1.50 MB"`, `"2.00 GB"`.
pub fn format_bytes(bytes: u64) -> String {
    let value = bytes as f64;
    for (threshold, unit) in BYTE_UNITS {
        if value >= *threshold {
            return format!("{:.2} {}", value / threshold, unit);
        }
    }
    format!("{} B", bytes)
}

/// Format seconds as `HH:MM:SS`. Hours are not wrapped at 24.
pub fn format_uptime(secs: u64) -> String {
    let h = secs / 3600;
    let m = (secs % 3600) / 60;
    let s = secs % 60;
    format!("{:02}:{:02}:{:02}", h, m, s)
}

/// Format seconds as `"1h 2m 5s"`.
pub fn format_uptime_compact(secs: u64) -> String {
    format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
}

/// Format a rate with two decimals.
pub fn format_rate(value: f64) -> String {
    if value.is_finite() {
        format!("{:.2}", value)
    } else {
        "0.00".to_string()
    }
}

/// 1 Mbps = 1000 / 8 = 125 KB/s.
pub fn mbps_to_kbps(mbps: f64) -> f64 {
    mbps * 125.0
}

pub fn bytes_to_gib(bytes: u64) -> f64 {
    bytes as f64 / GIB
}

/// Share of the daily quota consumed, as `"12.5%"`.
///
/// A non-positive quota yields `"0.0%"`.
pub fn usage_percent(used_bytes: u64, quota_gb: f64) -> String {
    if quota_gb > 0.0 && quota_gb.is_finite() {
        format!("{:.1}%", bytes_to_gib(used_bytes) / quota_gb * 100.0)
    } else {
        "0.0%".to_string()
    }
}

/// Chart label for a sample taken at `at`.
pub fn clock_label(at: DateTime<Local>) -> String {
    at.format("%H:%M:%S").to_string()
}

/// Labels for `count` samples ending at `now`, spaced `period` apart,
/// oldest first. Instants outside chrono's range get a blank clock.
pub fn clock_labels_back(now: DateTime<Local>, count: usize, period: Duration) -> Vec<String> {
    let step = TimeDelta::from_std(period).unwrap_or(TimeDelta::zero());
    (0..count)
        .rev()
        .map(|i| {
            i32::try_from(i)
                .ok()
                .and_then(|i| step.checked_mul(i))
                .and_then(|offset| now.checked_sub_signed(offset))
                .map(clock_label)
                .unwrap_or_else(|| BLANK_CLOCK.to_string())
        })
        .collect()
}

const BLANK_CLOCK: &str = "--:--:--";

/// Parse duration strings like `"100ms"`, `"2s"`, `"16.9µs"`.
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();

    for (suffix, multiplier) in DURATION_UNITS {
        if let Some(val_str) = s.strip_suffix(suffix) {
            let val: f64 = val_str.parse()?;
            if val < 0.0 {
                bail!("Negative duration: {}", s);
            }
            return Ok(Duration::from_nanos((val * multiplier) as u64));
        }
    }

    bail!("Unknown duration format: {}", s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_bytes_units() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(999), "999 B");
        assert_eq!(format_bytes(1_000), "1.00 KB");
        assert_eq!(format_bytes(1_500_000), "1.50 MB");
        assert_eq!(format_bytes(2_000_000_000), "2.00 GB");
        assert_eq!(format_bytes(3_210_000_000_000), "3.21 TB");
    }

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(0), "00:00:00");
        assert_eq!(format_uptime(3725), "01:02:05");
        assert_eq!(format_uptime(100 * 3600), "100:00:00");
    }

    #[test]
    fn test_format_uptime_compact() {
        assert_eq!(format_uptime_compact(3725), "1h 2m 5s");
        assert_eq!(format_uptime_compact(59), "0h 0m 59s");
    }

    #[test]
    fn test_rates_and_quota() {
        assert_eq!(format_rate(12.345), "12.35");
        assert_eq!(format_rate(f64::NAN), "0.00");
        assert_eq!(mbps_to_kbps(8.0), 1000.0);
        assert_eq!(usage_percent(15 * 1024 * 1024 * 1024, 150.0), "10.0%");
        assert_eq!(usage_percent(1024, 0.0), "0.0%");
    }

    #[test]
    fn test_clock_labels_back() {
        let now = Local.with_ymd_and_hms(2024, 3, 1, 10, 0, 4).unwrap();
        let labels = clock_labels_back(now, 3, Duration::from_secs(2));
        assert_eq!(labels, vec!["10:00:00", "10:00:02", "10:00:04"]);
    }

    #[test]
    fn test_clock_labels_back_out_of_range() {
        let now = Local.with_ymd_and_hms(2024, 3, 1, 10, 0, 4).unwrap();
        // one step back stays representable, two steps fall before year -262143
        let period = Duration::from_secs(86_400 * 365 * 200_000);
        let labels = clock_labels_back(now, 3, period);
        assert_eq!(labels.len(), 3);
        assert_eq!(labels[0], BLANK_CLOCK);
        assert_ne!(labels[1], BLANK_CLOCK);
        assert_eq!(labels[2], "10:00:04");
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("100ms").unwrap(), Duration::from_millis(100));
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("16.958µs").unwrap().as_nanos(), 16958);
        assert!(parse_duration("soon").is_err());
    }
}
