//! Utility functions for parsing loosely-typed telemetry values and
//! formatting them for display.

use chrono::{DateTime, FixedOffset, Utc};
use serde_json::Value;

/// Placeholder shown for any absent or unparseable value.
pub const PLACEHOLDER: &str = "--";

/// Interpret a raw telemetry value as a number.
///
/// Numbers pass through, strings are parsed, everything else
/// (including `"unavailable"` or `NaN`) is treated as absent.
///
/// # Example
///
/// ```
/// use cooker_card::utils::parse_numeric;
/// use serde_json::json;
///
/// assert_eq!(parse_numeric(&json!(57.5)), Some(57.5));
/// assert_eq!(parse_numeric(&json!("12")), Some(12.0));
/// assert_eq!(parse_numeric(&json!("unknown")), None);
/// ```
pub fn parse_numeric(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// Interpret a raw telemetry value as a boolean.
pub fn parse_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.as_str() {
            "true" | "on" => Some(true),
            "false" | "off" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Interpret a raw telemetry value as an RFC 3339 timestamp.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|t| t.with_timezone(&Utc)),
        _ => None,
    }
}

/// Interpret a raw telemetry value as a non-empty string.
pub fn parse_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// Format a temperature with one decimal and a degree sign.
///
/// # Example
///
/// ```
/// use cooker_card::utils::format_temperature;
///
/// assert_eq!(format_temperature(Some(57.0)), "57.0°");
/// assert_eq!(format_temperature(None), "--");
/// ```
pub fn format_temperature(celsius: Option<f64>) -> String {
    match celsius {
        Some(t) => format!("{:.1}°", t),
        None => PLACEHOLDER.to_string(),
    }
}

/// Format a number of minutes as `"{h}h{mm}"`.
pub fn format_duration(minutes: Option<f64>) -> String {
    match minutes {
        Some(m) if m.is_finite() && m >= 0.0 => {
            let h = (m / 60.0).floor() as u64;
            let rest = (m % 60.0).floor() as u64;
            format!("{}h{:02}", h, rest)
        }
        _ => PLACEHOLDER.to_string(),
    }
}

/// Format a timestamp as a wall-clock `"HH:MM"` in the given offset.
pub fn format_clock(time: Option<DateTime<Utc>>, offset: FixedOffset) -> String {
    match time {
        Some(t) => t.with_timezone(&offset).format("%H:%M").to_string(),
        None => PLACEHOLDER.to_string(),
    }
}

/// Format a heating rate as `"{:.2}°/min"`.
pub fn format_rate(rate: Option<f64>) -> String {
    match rate {
        Some(r) => format!("{:.2}°/min", r),
        None => PLACEHOLDER.to_string(),
    }
}
